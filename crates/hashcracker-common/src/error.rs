use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Errors shared by the codec and by wire-type validation on both sides
/// of the manager/worker protocol.
#[derive(Clone, Debug, Deserialize, Error, PartialEq, Eq, Serialize)]
pub enum Error {
    #[error("alphabet must be non-empty and contain no duplicate symbols")]
    InvalidAlphabet,
    #[error("max_length must be at least 1")]
    InvalidMaxLength,
    #[error("search space of size {0} would overflow a 64-bit index")]
    SearchSpaceTooLarge(u64),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Returns a summary label for the error, suitable for a metric or
    /// log field.
    pub fn get_label(&self) -> &'static str {
        match self {
            Self::InvalidAlphabet => "invalid_alphabet",
            Self::InvalidMaxLength => "invalid_max_length",
            Self::SearchSpaceTooLarge(_) => "search_space_too_large",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}
