use thiserror::Error;

pub type HydroboxResult<T> = Result<T, HydroboxError>;

#[derive(Debug, Error)]
pub enum HydroboxError {
    #[error("config error: {0}")]
    Config(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
