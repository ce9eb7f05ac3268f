use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("stats source closed")]
    ErrStatsSourceClosed,
    #[error("stats read failed: {0}")]
    ErrStatsReadFailed(String),
    #[error("driver stopped")]
    ErrDriverStopped,
    #[error("{0}")]
    Other(String),
}
