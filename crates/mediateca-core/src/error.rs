use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediatecaError {
    #[error("media already registered: {0}")]
    Duplicate(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("file system error: {0}")]
    FileSystem(String),

    #[error("not in catalog: {0}")]
    NotFound(String),

    #[error("unsupported media format: {0}")]
    UnsupportedFormat(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
