use parla_core::wire::SpeechFormat;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Raw-PCM synthesis output arrives at this fixed rate. The response format
/// tag is authoritative; payload bytes are never sniffed.
pub const SYNTHESIS_PCM_RATE_HZ: u32 = 24_000;

/// One synthesized clip as received from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub format: SpeechFormat,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackBuffer {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl PlaybackBuffer {
    /// Interleaved-to-mono downmix for single-channel playback paths.
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }
        let ch = self.channels as usize;
        self.samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("empty audio payload")]
    EmptyPayload,
    #[error("failed to decode mp3 audio: {0}")]
    Mp3(String),
    #[error("audio output failed: {0}")]
    Output(String),
}

/// Decodes a clip into playable f32 samples, branching on the format tag.
///
/// The synthesis backend changed vendors over time: older responses carry raw
/// 16-bit PCM, newer ones mp3. Both still occur, so both are supported.
pub fn decode_for_playback(clip: &AudioClip) -> Result<PlaybackBuffer, PlaybackError> {
    if clip.payload.is_empty() {
        return Err(PlaybackError::EmptyPayload);
    }

    match clip.format {
        SpeechFormat::Pcm => Ok(decode_pcm_s16le(&clip.payload)),
        SpeechFormat::Mp3 => decode_mp3(&clip.payload),
    }
}

fn decode_pcm_s16le(payload: &[u8]) -> PlaybackBuffer {
    // A trailing odd byte cannot form a sample and is ignored.
    let samples = payload
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32_768.0)
        .collect();

    PlaybackBuffer {
        sample_rate_hz: SYNTHESIS_PCM_RATE_HZ,
        channels: 1,
        samples,
    }
}

fn decode_mp3(payload: &[u8]) -> Result<PlaybackBuffer, PlaybackError> {
    let cursor = std::io::Cursor::new(payload.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::Mp3(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::Mp3("no audio track".into()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Mp3(e.to_string()))?;

    let mut sample_rate_hz = 0u32;
    let mut channels = 1u16;
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(PlaybackError::Mp3(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate_hz = spec.rate;
                channels = spec.channels.count() as u16;

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            // A corrupt frame is skipped; the stream may still recover.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(PlaybackError::Mp3(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(PlaybackError::Mp3("no decodable audio frames".into()));
    }

    Ok(PlaybackBuffer {
        sample_rate_hz,
        channels,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// A syntactically valid MPEG-1 Layer III mono frame at 128 kbps /
    /// 44.1 kHz: 417 bytes, zeroed side info and main data, which decodes as
    /// silence.
    fn silent_mp3_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 417];
        frame[0] = 0xFF;
        frame[1] = 0xFB;
        frame[2] = 0x90;
        frame[3] = 0xC0;
        frame
    }

    #[test]
    fn pcm_zero_samples_decode_to_zero_floats() {
        let clip = AudioClip {
            format: SpeechFormat::Pcm,
            payload: vec![0u8; 2_000],
        };
        let buf = decode_for_playback(&clip).unwrap();
        assert_eq!(buf.sample_rate_hz, SYNTHESIS_PCM_RATE_HZ);
        assert_eq!(buf.samples.len(), 1_000);
        assert!(buf.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn pcm_normalizes_full_scale_to_unit_range() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&i16::MAX.to_le_bytes());
        payload.extend_from_slice(&i16::MIN.to_le_bytes());
        payload.extend_from_slice(&0i16.to_le_bytes());

        let clip = AudioClip {
            format: SpeechFormat::Pcm,
            payload,
        };
        let buf = decode_for_playback(&clip).unwrap();
        assert_abs_diff_eq!(buf.samples[0], 32_767.0 / 32_768.0);
        assert_abs_diff_eq!(buf.samples[1], -1.0);
        assert_abs_diff_eq!(buf.samples[2], 0.0);
    }

    #[test]
    fn pcm_ignores_a_trailing_odd_byte() {
        let clip = AudioClip {
            format: SpeechFormat::Pcm,
            payload: vec![0u8; 5],
        };
        let buf = decode_for_playback(&clip).unwrap();
        assert_eq!(buf.samples.len(), 2);
    }

    #[test]
    fn mp3_frames_decode_to_a_non_empty_buffer() {
        let payload: Vec<u8> = std::iter::repeat_with(silent_mp3_frame)
            .take(4)
            .flatten()
            .collect();
        let clip = AudioClip {
            format: SpeechFormat::Mp3,
            payload,
        };
        let buf = decode_for_playback(&clip).unwrap();
        assert!(!buf.samples.is_empty());
        assert_eq!(buf.sample_rate_hz, 44_100);
        assert!(buf.samples.iter().all(|&s| s.abs() < 1e-4));
    }

    #[test]
    fn garbage_mp3_payload_fails_cleanly() {
        let clip = AudioClip {
            format: SpeechFormat::Mp3,
            payload: vec![0xAB; 64],
        };
        assert!(matches!(
            decode_for_playback(&clip),
            Err(PlaybackError::Mp3(_))
        ));
    }

    #[test]
    fn empty_payload_is_rejected_for_both_formats() {
        for format in [SpeechFormat::Mp3, SpeechFormat::Pcm] {
            let clip = AudioClip {
                format,
                payload: vec![],
            };
            assert_eq!(
                decode_for_playback(&clip),
                Err(PlaybackError::EmptyPayload)
            );
        }
    }

    #[test]
    fn stereo_downmix_averages_frames() {
        let buf = PlaybackBuffer {
            sample_rate_hz: 44_100,
            channels: 2,
            samples: vec![1.0, 0.0, 0.5, 0.5],
        };
        assert_eq!(buf.to_mono(), vec![0.5, 0.5]);
    }
}
