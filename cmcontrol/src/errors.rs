use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CastError {
    #[error("cannot reach receiver {0}")]
    Unreachable(String),
    #[error("no active connection for handle {0}")]
    UnknownHandle(u32),
    #[error("media path {0} is not castable")]
    UnsupportedMedia(PathBuf),
    #[error("cast backend error: {0}")]
    Backend(String),
}

impl CastError {
    pub fn backend(message: impl ToString) -> Self {
        CastError::Backend(message.to_string())
    }
}
