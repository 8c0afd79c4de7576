//! Error types shared across the ingestion engine.
//!
//! Rather than a type hierarchy, callers classify errors into the
//! `ErrorKind` taxonomy (transient / malformed / correlation-miss / policy /
//! fatal) and dispatch retry/log/abort policy off that tag.

use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Transient,
    Malformed,
    Correlation,
    Policy,
    Fatal,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("query rejected: {0}")]
    RejectedQuery(String),
    #[error("query timed out after {0:?}")]
    QueryTimeout(std::time::Duration),
    #[error("failed to open store file: {0}")]
    Open(#[source] std::io::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Db(_) => ErrorKind::Transient,
            StoreError::RejectedQuery(_) => ErrorKind::Policy,
            StoreError::QueryTimeout(_) => ErrorKind::Policy,
            StoreError::Open(_) => ErrorKind::Fatal,
        }
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed tap or log entry: {0}")]
    Malformed(String),
    #[error("correlation miss: {0}")]
    Correlation(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Store(e) => e.kind(),
            IngestError::Malformed(_) => ErrorKind::Malformed,
            IngestError::Correlation(_) => ErrorKind::Correlation,
            IngestError::Io(_) => ErrorKind::Transient,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("duplicate port {0} in service list")]
    DuplicatePort(u16),
    #[error("config root must be a mapping")]
    NotAMapping,
}
