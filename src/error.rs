use serde_json;
use std::num::TryFromIntError;

#[derive(Debug, Clone, PartialEq, Fail)]
pub enum Error {
    #[fail(display = "the key or index does not exist")]
    NotFound,
    #[fail(display = "the element has the wrong type for this operation")]
    TypeMismatch,
    #[fail(display = "the value cannot be represented in a document")]
    UnsupportedValue,
    #[fail(display = "the position is outside the array")]
    OutOfBounds,
    #[fail(display = "the string is not valid JSON")]
    InvalidJson,
    #[fail(display = "the replica has no actor yet")]
    ActorUnset,
    #[fail(display = "the logical clock cannot advance any further")]
    ClockExhausted,
    /// The local tree and the operation stream have diverged. Continuing
    /// to apply operations risks corrupting the replica for good.
    #[fail(display = "inconsistent document: {}", _0)]
    Inconsistent(String),
}

impl Error {
    /// Returns true if the error is a consistency violation rather
    /// than a rejected request.
    pub fn is_fatal(&self) -> bool {
        match *self {
            Error::Inconsistent(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(_: serde_json::Error) -> Error {
        Error::InvalidJson
    }
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Error {
        Error::UnsupportedValue
    }
}
