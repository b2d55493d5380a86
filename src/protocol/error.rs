//! Wire codec error types

use bytes::Bytes;
use thiserror::Error;

use super::NetworkId;

/// Wire protocol errors
#[derive(Error, Debug)]
pub enum Error {
    /// IO error (short read/write or transport failure)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload length exceeds the global cap
    #[error("message payload is too large: {size} bytes (max {max})")]
    OversizedPayload {
        /// Declared or encoded payload length
        size: u64,
        /// Global maximum
        max: u32,
    },

    /// Payload length exceeds the cap of the message type
    #[error("payload too large for [{command}]: {size} bytes (max {max})")]
    PayloadTooLargeForType {
        /// Command of the offending message
        command: &'static str,
        /// Declared or encoded payload length
        size: u64,
        /// Maximum for this type at the protocol version in use
        max: u32,
    },

    /// Header network id does not match
    #[error("message from other network: expected {expected}, got {found}")]
    WrongNetwork {
        /// Network the reader expects
        expected: NetworkId,
        /// Network found in the header
        found: NetworkId,
    },

    /// Command field is not printable text
    #[error("invalid command {raw:?}")]
    InvalidCommand {
        /// Command bytes with padding removed
        raw: Vec<u8>,
    },

    /// No message type is registered for the command
    #[error("unhandled command [{command}]")]
    UnknownCommand {
        /// Command text from the header
        command: String,
    },

    /// Payload checksum does not match the header
    #[error("payload checksum failed: header has {expected:02x?}, payload hashes to {found:02x?}")]
    ChecksumMismatch {
        /// Checksum prefix carried by the header
        expected: [u8; 4],
        /// Checksum prefix computed over the payload
        found: [u8; 4],
    },

    /// Command name does not fit the header field
    #[error("command [{command}] is too long (max {max})")]
    CommandTooLong {
        /// Offending command name
        command: String,
        /// Width of the command field
        max: usize,
    },

    /// Message body failed to encode or decode
    #[error(transparent)]
    Body(#[from] BodyError),
}

/// Body-level encode/decode failures raised by message variants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    /// Input ended before a field was complete
    #[error("truncated {field}: need {needed} bytes, have {remaining}")]
    Truncated {
        /// Field being read
        field: &'static str,
        /// Bytes the field needs
        needed: usize,
        /// Bytes left in the payload
        remaining: usize,
    },

    /// List carries more entries than allowed
    #[error("too many {kind} for [{command}]: {count} (max {max})")]
    TooManyItems {
        /// Command of the message
        command: &'static str,
        /// What is being counted
        kind: &'static str,
        /// Count found or requested
        count: u64,
        /// Maximum allowed
        max: u64,
    },

    /// Variable-length field is longer than allowed
    #[error("{field} is too long: {len} bytes (max {max})")]
    FieldTooLong {
        /// Field being read or written
        field: &'static str,
        /// Declared length
        len: u64,
        /// Maximum allowed
        max: u64,
    },

    /// Message is not valid at the negotiated protocol version
    #[error("[{command}] is not supported at protocol version {pver} (requires {required})")]
    UnsupportedVersion {
        /// Command of the message
        command: &'static str,
        /// Protocol version in use
        pver: u32,
        /// Lowest protocol version carrying the message
        required: u32,
    },

    /// Value is not valid for its field
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Field being read
        field: &'static str,
        /// What is wrong
        reason: &'static str,
    },
}

/// Failure of a read pipeline call, with stream position
#[derive(Error, Debug)]
#[error("read failed after {bytes_read} bytes: {source}")]
pub struct ReadError {
    /// Bytes consumed from the stream, including drained payload bytes
    pub bytes_read: usize,
    /// Raw payload, present when body decoding was attempted
    pub payload: Option<Bytes>,
    /// Underlying error
    pub source: Error,
}

impl ReadError {
    pub(crate) fn new(bytes_read: usize, source: impl Into<Error>) -> Self {
        Self {
            bytes_read,
            payload: None,
            source: source.into(),
        }
    }
}

/// Failure of a write pipeline call, with stream position
#[derive(Error, Debug)]
#[error("write failed after {bytes_written} bytes: {source}")]
pub struct WriteError {
    /// Bytes written to the stream before the failure
    pub bytes_written: usize,
    /// Underlying error
    pub source: Error,
}

impl WriteError {
    pub(crate) fn new(bytes_written: usize, source: impl Into<Error>) -> Self {
        Self {
            bytes_written,
            source: source.into(),
        }
    }
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Self {
        err.source
    }
}

impl From<WriteError> for Error {
    fn from(err: WriteError) -> Self {
        err.source
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for message body operations
pub type BodyResult<T> = std::result::Result<T, BodyError>;
