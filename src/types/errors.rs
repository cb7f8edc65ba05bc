use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DelimiterError {
    #[error("Delimiter not allowed: {0:?}")]
    NotAllowed(String)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableNameError {
    #[error("Table name is empty")]
    Empty,
    #[error("Table name [{0}] is not a plain SQL identifier")]
    InvalidIdentifier(String)
}
