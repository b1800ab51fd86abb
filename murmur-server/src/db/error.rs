use thiserror::Error;

/// Failures of store operations that enforce domain rules
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.into())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Database(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

