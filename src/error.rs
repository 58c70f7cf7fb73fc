use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no default output device available")]
    NoOutputDevice,
    #[error("failed to fetch default output config: {0}")]
    OutputConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("voice pool must hold at least one voice")]
    EmptyPool,
    #[error("poly count {poly_count} must be between 1 and the pool size {pool_size}")]
    PolyCountOutOfRange { poly_count: usize, pool_size: usize },
    #[error("unison count {unison_count} must be between 1 and the pool size {pool_size}")]
    UnisonOutOfRange {
        unison_count: usize,
        pool_size: usize,
    },
    #[error("tuning reference must be a positive frequency, got {0}")]
    InvalidTuning(f32),

    #[error("MIDI input unavailable: {0}")]
    MidiInit(String),
    #[error("no MIDI input port matching {0:?}")]
    MidiPortNotFound(String),
}
