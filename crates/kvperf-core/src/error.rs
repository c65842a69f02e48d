//! Error types for kvperf operations
//!
//! All kvperf errors are represented by the KvError enum: usage mistakes,
//! codec corruption, configuration problems, and errors passed through
//! verbatim from the backing store.

use std::error::Error;
use std::fmt;

/// kvperf error types with detailed context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// I/O operation failed (usually the output sink)
    Io {
        /// The underlying I/O error kind
        kind: std::io::ErrorKind,
        /// Human-readable description
        message: String,
    },

    /// No command word was supplied
    MissingCommand,

    /// Command name is not one of set/get/delete/scan
    UnknownCommand {
        /// The name as given on the command line
        name: String,
    },

    /// Command was given fewer arguments than it needs
    WrongArity {
        /// Command name
        command: &'static str,
        /// Minimum number of arguments
        expected: usize,
        /// Number of arguments supplied
        got: usize,
    },

    /// Encoded key ended before a full 9-byte group
    Truncated {
        /// Offset of the incomplete group
        offset: usize,
        /// Bytes required for the group
        needed: usize,
        /// Bytes actually left
        available: usize,
    },

    /// Group marker byte implies more than 8 padding bytes
    InvalidMarker {
        /// Offset of the marker byte
        offset: usize,
        /// Marker byte found
        marker: u8,
    },

    /// Padding bytes of the terminal group are not all zero
    NonZeroPadding {
        /// Offset of the group
        offset: usize,
        /// Declared padding count
        padding: usize,
    },

    /// Key does not exist (transactional read)
    NotFound {
        /// The key as requested
        key: Vec<u8>,
    },

    /// Transaction was already committed or rolled back
    TxnClosed,

    /// Store client was closed
    StoreClosed,

    /// Request issued before the client was dialed
    NotConnected,

    /// Batch put with differing numbers of keys and values
    BatchLengthMismatch {
        /// Number of keys
        keys: usize,
        /// Number of values
        values: usize,
    },

    /// Error reported by the backing store, carried verbatim
    Store {
        /// Store error message
        message: String,
    },

    /// Configuration failed validation
    InvalidConfig {
        /// What was wrong
        reason: String,
    },

    /// Scan was requested on a raw client without an order-preserving codec
    ScanRequiresCodec,

    /// Sequential counter has issued `u64::MAX` and cannot advance
    SequenceExhausted {
        /// Value the counter started from
        start: u64,
    },
}

impl KvError {
    /// True for the corruption class of errors raised by the codec.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            KvError::Truncated { .. }
                | KvError::InvalidMarker { .. }
                | KvError::NonZeroPadding { .. }
        )
    }

    /// True for errors caused by how the plugin was invoked.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            KvError::MissingCommand | KvError::UnknownCommand { .. } | KvError::WrongArity { .. }
        )
    }
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvError::Io { kind, message } => write!(f, "I/O error: {} ({})", message, kind),

            KvError::MissingCommand => write!(f, "no command given"),

            KvError::UnknownCommand { name } => write!(f, "unknown command: {:?}", name),

            KvError::WrongArity { command, expected, got } => {
                write!(f, "wrong number of args for {}: need {}, got {}", command, expected, got)
            }

            KvError::Truncated { offset, needed, available } => {
                write!(
                    f,
                    "encoded key truncated at offset {}: need {} bytes, only {} available",
                    offset, needed, available
                )
            }

            KvError::InvalidMarker { offset, marker } => {
                write!(f, "invalid group marker 0x{:02x} at offset {}", marker, offset)
            }

            KvError::NonZeroPadding { offset, padding } => {
                write!(
                    f,
                    "non-zero padding in group at offset {} ({} padding bytes)",
                    offset, padding
                )
            }

            KvError::NotFound { key } => {
                write!(f, "key not found: {}", String::from_utf8_lossy(key))
            }

            KvError::TxnClosed => write!(f, "transaction already committed or rolled back"),

            KvError::StoreClosed => write!(f, "store client is closed"),

            KvError::NotConnected => write!(f, "client is not connected; dial first"),

            KvError::BatchLengthMismatch { keys, values } => {
                write!(f, "batch put has {} keys but {} values", keys, values)
            }

            KvError::Store { message } => write!(f, "store error: {}", message),

            KvError::InvalidConfig { reason } => write!(f, "invalid configuration: {}", reason),

            KvError::ScanRequiresCodec => {
                write!(f, "scan requires an order-preserving key codec")
            }

            KvError::SequenceExhausted { start } => {
                write!(f, "sequence counter started at {} is exhausted", start)
            }
        }
    }
}

impl Error for KvError {}

/// Convert std::io::Error to KvError::Io
impl From<std::io::Error> for KvError {
    fn from(err: std::io::Error) -> Self {
        KvError::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for kvperf operations
pub type KvResult<T> = Result<T, KvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KvError::InvalidMarker { offset: 18, marker: 0x10 };

        let display = format!("{}", err);
        assert!(display.contains("invalid group marker"));
        assert!(display.contains("0x10"));
        assert!(display.contains("18"));
    }

    #[test]
    fn test_arity_display() {
        let err = KvError::WrongArity { command: "set", expected: 2, got: 1 };
        assert_eq!(err.to_string(), "wrong number of args for set: need 2, got 1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let kv_err: KvError = io_err.into();

        match kv_err {
            KvError::Io { kind, .. } => assert_eq!(kind, std::io::ErrorKind::BrokenPipe),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_classes() {
        assert!(KvError::Truncated { offset: 0, needed: 9, available: 3 }.is_corruption());
        assert!(KvError::NonZeroPadding { offset: 0, padding: 2 }.is_corruption());
        assert!(!KvError::TxnClosed.is_corruption());
        assert!(KvError::MissingCommand.is_usage());
        assert!(KvError::UnknownCommand { name: "put".into() }.is_usage());
        assert!(!KvError::ScanRequiresCodec.is_usage());
        assert!(!KvError::SequenceExhausted { start: 0 }.is_corruption());
    }

    #[test]
    fn test_display_lowercase() {
        let errors = [
            KvError::Truncated { offset: 0, needed: 9, available: 3 },
            KvError::InvalidMarker { offset: 8, marker: 0x10 },
            KvError::NonZeroPadding { offset: 0, padding: 2 },
            KvError::SequenceExhausted { start: u64::MAX },
            KvError::MissingCommand,
        ];
        for err in errors {
            let display = err.to_string();
            assert!(display.starts_with(char::is_lowercase), "{}", display);
        }
    }
}
