//
// Single-slot audio output. Only one clip plays at a time: starting playback
// supersedes whatever was playing before.
//
// Like the recorder, a worker thread owns the cpal output stream and the
// handle talks to it over a channel.

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample};

use crate::playback::{PlaybackBuffer, PlaybackError};
use crate::resample::resample_mono_f32;

enum Cmd {
    Play(PlaybackBuffer),
    Stop,
    Shutdown,
}

pub struct Player {
    cmd_tx: mpsc::Sender<Cmd>,
    worker_handle: Option<std::thread::JoinHandle<()>>,
}

impl Player {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Cmd>();
        let worker_handle = std::thread::spawn(move || run_worker(cmd_rx));
        Self {
            cmd_tx,
            worker_handle: Some(worker_handle),
        }
    }

    /// Starts playing `buffer`, stopping any clip that is currently playing.
    pub fn play(&self, buffer: PlaybackBuffer) -> Result<(), PlaybackError> {
        self.cmd_tx
            .send(Cmd::Play(buffer))
            .map_err(|_| PlaybackError::Output("player worker gone".into()))
    }

    pub fn stop(&self) -> Result<(), PlaybackError> {
        self.cmd_tx
            .send(Cmd::Stop)
            .map_err(|_| PlaybackError::Output("player worker gone".into()))
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Cmd::Shutdown);
        if let Some(h) = self.worker_handle.take() {
            let _ = h.join();
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

fn run_worker(cmd_rx: mpsc::Receiver<Cmd>) {
    // Dropping the stream stops output; holding it keeps the clip going.
    let mut current: Option<cpal::Stream> = None;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            Cmd::Play(buffer) => {
                current = None;
                match open_output(buffer) {
                    Ok(stream) => current = Some(stream),
                    Err(e) => log::error!("Audio playback failed: {e}"),
                }
            }
            Cmd::Stop => current = None,
            Cmd::Shutdown => return,
        }
    }
}

fn open_output(buffer: PlaybackBuffer) -> Result<cpal::Stream, PlaybackError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| PlaybackError::Output("no output device".into()))?;
    let config = device
        .default_output_config()
        .map_err(|e| PlaybackError::Output(e.to_string()))?;

    let device_rate = config.sample_rate().0;
    let mono = buffer.to_mono();
    let samples = resample_mono_f32(&mono, buffer.sample_rate_hz, device_rate)
        .map_err(|e| PlaybackError::Output(e.to_string()))?;

    let channels = config.channels() as usize;
    let stream = match config.sample_format() {
        SampleFormat::F32 => {
            build_output_stream::<f32>(&device, &config.clone().into(), channels, samples)
        }
        SampleFormat::I16 => {
            build_output_stream::<i16>(&device, &config.clone().into(), channels, samples)
        }
        _ => build_output_stream::<f32>(&device, &config.clone().into(), channels, samples),
    }
    .map_err(|e| PlaybackError::Output(e.to_string()))?;

    stream
        .play()
        .map_err(|e| PlaybackError::Output(e.to_string()))?;
    Ok(stream)
}

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    samples: Vec<f32>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + cpal::FromSample<f32> + Send + 'static,
{
    let mut iter = samples.into_iter();

    let cb = move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        for frame in data.chunks_mut(channels.max(1)) {
            // Past the end of the clip the stream keeps running on silence
            // until it is superseded or stopped.
            let s = iter.next().unwrap_or(0.0);
            for slot in frame {
                *slot = T::from_sample(s);
            }
        }
    };

    device.build_output_stream(
        config,
        cb,
        |err| {
            log::error!("Audio output stream error: {err}");
        },
        None,
    )
}
