use std::borrow::Cow;
use std::io;

/// Result type used across the writer implementation.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy surfaced by the sas7bdat writer.
///
/// `Argument` errors are raised synchronously at the call site and never
/// corrupt internal state; a subsequent valid call is guaranteed to succeed.
/// `State` and `IO` errors abort the write in progress and the file on disk
/// must be treated as unusable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument was null, out of range, or mis-typed.
    #[error("invalid argument: {details}")]
    Argument { details: Cow<'static, str> },

    /// The writer reached a state the file format cannot represent.
    #[error("invalid writer state: {details}")]
    State { details: Cow<'static, str> },

    /// I/O failure while writing to the underlying sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    #[must_use]
    pub fn argument(details: impl Into<Cow<'static, str>>) -> Self {
        Self::Argument {
            details: details.into(),
        }
    }

    #[must_use]
    pub fn state(details: impl Into<Cow<'static, str>>) -> Self {
        Self::State {
            details: details.into(),
        }
    }
}
