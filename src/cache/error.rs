use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache serialization error: {0}")]
    Serialization(String),
    #[error("cache io error: {0}")]
    Io(String),
}

pub type CacheResult<T> = Result<T, CacheError>;
