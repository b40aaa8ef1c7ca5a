//
// CPAL-based microphone recorder for voice messages.
//
// A worker thread owns the input stream (cpal streams are not Send) and
// accumulates mono f32 samples while recording is active; the handle talks to
// it over channels.

use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample};

use crate::resample::resample_mono_f32;

pub const UPLOAD_SAMPLE_RATE_HZ: u32 = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum AudioCaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("audio worker failed: {0}")]
    Worker(String),

    #[error("audio worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("failed to resample: {0}")]
    Resample(#[from] anyhow::Error),

    #[error("internal channel error")]
    Channel,
}

pub struct CapturedAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl CapturedAudio {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1_000) / self.sample_rate_hz as u64
    }
}

enum Cmd {
    Start,
    Stop(mpsc::Sender<Vec<f32>>),
    Shutdown,
}

enum WorkerMsg {
    Ready,
    Error(String),
}

pub struct AudioRecorder {
    cmd_tx: mpsc::Sender<Cmd>,
    worker_handle: Option<std::thread::JoinHandle<()>>,
    sample_rate_hz: u32,
}

impl AudioRecorder {
    pub fn open_default() -> Result<Self, AudioCaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioCaptureError::NoInputDevice)?;

        // Capture at the device's native config; resampling to the upload
        // rate happens at stop time.
        let default_cfg = device.default_input_config()?;
        let sample_rate_hz = default_cfg.sample_rate().0;

        let (sample_tx, sample_rx) = mpsc::channel::<Vec<f32>>();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Cmd>();
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>();

        let worker_handle = std::thread::spawn(move || {
            let config = default_cfg;
            let channels = config.channels() as usize;

            let stream = match config.sample_format() {
                SampleFormat::F32 => {
                    build_input_stream::<f32>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::I16 => {
                    build_input_stream::<i16>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::U16 => {
                    build_input_stream::<u16>(&device, &config.clone().into(), channels, sample_tx)
                }
                _ => {
                    build_input_stream::<f32>(&device, &config.clone().into(), channels, sample_tx)
                }
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = worker_tx.send(WorkerMsg::Error(format!("build stream: {e}")));
                    log::error!("Audio stream build failed: {e}");
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = worker_tx.send(WorkerMsg::Error(format!("play stream: {e}")));
                log::error!("Audio stream play failed: {e}");
                return;
            }

            let _ = worker_tx.send(WorkerMsg::Ready);

            run_consumer(sample_rx, cmd_rx);
            drop(stream);
        });

        match worker_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(WorkerMsg::Ready) => {}
            Ok(WorkerMsg::Error(e)) => return Err(AudioCaptureError::Worker(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(AudioCaptureError::WorkerTimeout),
            Err(_) => return Err(AudioCaptureError::Channel),
        }

        Ok(Self {
            cmd_tx,
            worker_handle: Some(worker_handle),
            sample_rate_hz,
        })
    }

    pub fn start(&self) -> Result<(), AudioCaptureError> {
        self.cmd_tx
            .send(Cmd::Start)
            .map_err(|_| AudioCaptureError::Channel)
    }

    /// Stops recording and returns what was captured at the device rate.
    pub fn stop_captured(&self) -> Result<CapturedAudio, AudioCaptureError> {
        let (resp_tx, resp_rx) = mpsc::channel();
        self.cmd_tx
            .send(Cmd::Stop(resp_tx))
            .map_err(|_| AudioCaptureError::Channel)?;

        let samples = resp_rx
            .recv_timeout(Duration::from_secs(3))
            .map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => AudioCaptureError::StopTimeout,
                mpsc::RecvTimeoutError::Disconnected => AudioCaptureError::Channel,
            })?;

        Ok(CapturedAudio {
            sample_rate_hz: self.sample_rate_hz,
            samples,
        })
    }

    /// Stops recording and discards whatever was captured.
    pub fn cancel(&self) -> Result<(), AudioCaptureError> {
        let _ = self.stop_captured()?;
        Ok(())
    }

    pub fn close(mut self) -> Result<(), AudioCaptureError> {
        let _ = self.cmd_tx.send(Cmd::Shutdown);
        if let Some(h) = self.worker_handle.take() {
            let _ = h.join();
        }
        Ok(())
    }

    pub fn resample_for_upload(captured: &CapturedAudio) -> Result<Vec<f32>, AudioCaptureError> {
        Ok(resample_mono_f32(
            &captured.samples,
            captured.sample_rate_hz,
            UPLOAD_SAMPLE_RATE_HZ,
        )?)
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sample_tx: mpsc::Sender<Vec<f32>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let cb = move |data: &[T], _: &cpal::InputCallbackInfo| {
        let mut buf = Vec::with_capacity(data.len() / channels.max(1));

        if channels <= 1 {
            buf.extend(data.iter().map(|&s| s.to_sample::<f32>()));
        } else {
            for frame in data.chunks_exact(channels) {
                let mono =
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32;
                buf.push(mono);
            }
        }

        let _ = sample_tx.send(buf);
    };

    device.build_input_stream(
        config,
        cb,
        |err| {
            log::error!("Audio stream error: {err}");
        },
        None,
    )
}

fn run_consumer(sample_rx: mpsc::Receiver<Vec<f32>>, cmd_rx: mpsc::Receiver<Cmd>) {
    let mut recording = false;
    let mut captured: Vec<f32> = Vec::new();

    loop {
        // Drain commands promptly even if the stream is stalled.
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                Cmd::Start => {
                    recording = true;
                    captured.clear();
                }
                Cmd::Stop(resp) => {
                    recording = false;
                    let out = std::mem::take(&mut captured);
                    let _ = resp.send(out);
                }
                Cmd::Shutdown => return,
            }
        }

        match sample_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(samples) => {
                if recording {
                    captured.extend_from_slice(&samples);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_duration_is_sample_count_over_rate() {
        let captured = CapturedAudio {
            sample_rate_hz: 16_000,
            samples: vec![0.0; 8_000],
        };
        assert_eq!(captured.duration_ms(), 500);
    }
}
