use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced on the control path. The render path never returns errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no default output device available")]
    NoOutputDevice,

    #[error("failed to fetch output config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("reverb unavailable at {sample_rate} Hz: {reason}")]
    ReverbInit { sample_rate: f32, reason: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),
}
