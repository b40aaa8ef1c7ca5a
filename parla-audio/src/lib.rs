pub mod cache;
pub mod encode;
pub mod playback;
pub mod player;
pub mod recorder;
pub mod resample;

pub use cache::ClipCache;
pub use encode::{
    EncodeError, EncodedUpload, MIN_UTTERANCE_MS, UPLOAD_MIME_TYPE, check_min_utterance,
    encode_for_upload,
};
pub use playback::{
    AudioClip, PlaybackBuffer, PlaybackError, SYNTHESIS_PCM_RATE_HZ, decode_for_playback,
};
pub use player::Player;
pub use recorder::{AudioCaptureError, AudioRecorder, CapturedAudio, UPLOAD_SAMPLE_RATE_HZ};
pub use resample::resample_mono_f32;
