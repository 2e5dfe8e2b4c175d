//! Our error types for the DP7xx PSUs.

use thiserror::Error;

use crate::codec::CodecError;
use crate::ramp::InvalidRamp;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for Rigol DP7xx PSU communications.
///
/// Nothing is retried inside the driver, every variant reaches the caller as-is.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    TransportError(I),
    #[error("Communication timeout")]
    Timeout,
    #[error("Unexpected reply shape: {0}")]
    ProtocolError(&'static str),
    #[error("Reply is not a number")]
    ParseError,
    #[error("Invalid argument: {0}")]
    InvalidArgument(InvalidRamp),
    #[error("Reply does not fit in the receive buffer")]
    BufferError,
}

impl<I: embedded_io::Error> From<CodecError> for Error<I> {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Protocol(reason) => Error::ProtocolError(reason),
            CodecError::Parse => Error::ParseError,
            CodecError::Overflow => Error::BufferError,
        }
    }
}

impl<I: embedded_io::Error> From<InvalidRamp> for Error<I> {
    fn from(err: InvalidRamp) -> Self {
        Error::InvalidArgument(err)
    }
}
