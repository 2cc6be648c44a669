use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid wordlist \"{spec}\": {reason}")]
    InvalidWordlist { spec: String, reason: String },
    #[error("Wordlist too small: {requested} words requested, {available} available")]
    InsufficientWordlist { requested: usize, available: usize },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Secure random source failed: {0}")]
    EntropySourceFailure(String),
}

impl Error {
    pub(crate) fn invalid_wordlist(spec: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidWordlist {
            spec: spec.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<getrandom::Error> for Error {
    fn from(value: getrandom::Error) -> Self {
        Self::EntropySourceFailure(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
