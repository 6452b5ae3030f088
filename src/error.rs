//! Errors shared by both codecs.
//!
//! The encoders only know two kinds: the caller handed us buffers/lengths we
//! cannot work with, or the encoder hit a state it should never be able to
//! reach. Neither is retryable. [`CodecError::Io`] only comes out of the
//! reader-driven helpers in [`crate::harness`].

/// Error raised by the encoders
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// Bad chunk length, offset or buffer size; raised before any output is written
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A length value that no length field can represent. Either the caller
    /// bypassed the chunk size limits or the encoder is broken.
    #[error("internal error: {0}")]
    Internal(String),

    /// Reading chunks from a stream failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` for codec errors.
pub type Result<T> = std::result::Result<T, CodecError>;

macro_rules! invalid_arg {
    ($fmt:expr) => (crate::error::CodecError::InvalidArgument($fmt.to_owned()));
    ($fmt:expr, $($args:expr),*) => (crate::error::CodecError::InvalidArgument(format!($fmt, $($args),*)));
}
pub(crate) use invalid_arg;
