//! # Error Types
//!
//! Every failure the engine can report. Accessor and privilege failures are
//! carried unchanged inside [`BootError`] so callers can still tell a missing
//! variable from a denied one.

use crate::privilege::PrivilegeError;
use crate::variable::VariableError;
use alloc::string::String;

/// A [`LoadOption`](crate::LoadOption) that the firmware would reject.
///
/// These are programmer errors in whoever built the option, not runtime
/// conditions to recover from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("the device path list is empty")]
    EmptyDevicePath,
    #[error("device path node {index} declares {declared} bytes but serializes to {actual}")]
    NodeLengthMismatch {
        index: usize,
        declared: u16,
        actual: usize,
    },
    #[error("device path node payload of {0} bytes does not fit a 16-bit length")]
    NodeTooLong(usize),
    #[error("the device path does not end with an end-entire node")]
    MissingEndNode,
    #[error("device path node {0} terminates the path before its last node")]
    EarlyEndNode(usize),
    #[error("end-entire node {index} declares {length} bytes; it must be a bare 4-byte header")]
    MalformedEndNode { index: usize, length: u16 },
    #[error("the device path list of {0} bytes does not fit a 16-bit length")]
    FilePathListTooLong(usize),
    #[error("the text contains a NUL character")]
    EmbeddedNul,
    #[error("the character {0:?} cannot be represented in UCS-2")]
    NotUcs2(char),
}

/// A byte sequence that is not a well-formed load option.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("the buffer ends before the fixed load option header")]
    TruncatedHeader,
    #[error("the description is not NUL-terminated")]
    UnterminatedDescription,
    #[error("the file path list length {declared} exceeds the {available} bytes left")]
    FilePathListOutOfBounds { declared: usize, available: usize },
    #[error("device path node header at offset {offset} is truncated")]
    TruncatedNode { offset: usize },
    #[error("device path node at offset {offset} has invalid length {length}")]
    InvalidNodeLength { offset: usize, length: u16 },
    #[error("device path node data continues after the end-entire node")]
    TrailingNodes,
    #[error("end-entire node at offset {offset} has length {length} instead of 4")]
    MalformedEndNode { offset: usize, length: u16 },
    #[error("the device path does not end with an end-entire node")]
    MissingEndNode,
    #[error("node payload has {actual} bytes where {expected} were expected")]
    PayloadLength { expected: usize, actual: usize },
}

/// Failure of one step of registering and scheduling a boot entry.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error(transparent)]
    PrivilegeDenied(#[from] PrivilegeError),
    #[error("failed to read firmware variable {name}")]
    Read {
        name: String,
        #[source]
        source: VariableError,
    },
    #[error("failed to write firmware variable {name}")]
    Commit {
        name: String,
        #[source]
        source: VariableError,
    },
    #[error("the load option is malformed")]
    Encoding(#[from] EncodingError),
    #[error("no available boot slot")]
    SlotsExhausted,
    #[error("BootNext is already scheduled (pending: {pending:?})")]
    AlreadyScheduled { pending: Option<u16> },
    #[error("Secure Boot is enabled; unsigned boot entries are not supported")]
    SecureBootUnsupported,
}

impl BootError {
    /// The accessor failure behind a read or commit error, if any.
    #[must_use]
    pub const fn variable_error(&self) -> Option<&VariableError> {
        match self {
            Self::Read { source, .. } | Self::Commit { source, .. } => Some(source),
            _ => None,
        }
    }
}
