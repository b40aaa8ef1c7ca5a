use crate::recorder::UPLOAD_SAMPLE_RATE_HZ;

/// Recordings shorter than this are treated as accidental taps and discarded
/// before any encoding happens.
pub const MIN_UTTERANCE_MS: u64 = 1_000;

pub const UPLOAD_MIME_TYPE: &str = "audio/pcm;rate=16000";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("recording too short: {got_ms}ms (minimum {min_ms}ms)")]
    RecordingTooShort { got_ms: u64, min_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

pub fn duration_ms(samples: &[f32], sample_rate_hz: u32) -> u64 {
    if sample_rate_hz == 0 {
        return 0;
    }
    (samples.len() as u64 * 1_000) / sample_rate_hz as u64
}

/// Gate applied to a finished capture before it goes anywhere near the
/// upload path.
pub fn check_min_utterance(
    samples: &[f32],
    sample_rate_hz: u32,
    min_ms: u64,
) -> Result<(), EncodeError> {
    let got_ms = duration_ms(samples, sample_rate_hz);
    if got_ms < min_ms {
        return Err(EncodeError::RecordingTooShort { got_ms, min_ms });
    }
    Ok(())
}

/// Converts a 16 kHz mono capture to the transmittable upload form: s16le
/// PCM plus its mime tag. Base64 happens at the wire layer.
pub fn encode_for_upload(samples: &[f32]) -> EncodedUpload {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        let v = (s.clamp(-1.0, 1.0) * 32_767.0).round() as i16;
        bytes.extend_from_slice(&v.to_le_bytes());
    }

    EncodedUpload {
        bytes,
        mime_type: UPLOAD_MIME_TYPE.to_string(),
    }
}
