//! # Error Types
//!
//! Two layers of errors are used throughout starbridge:
//!
//! - [`TransportError`]: a fault raised by a collaborator (transport,
//!   discovery provider, session step). It carries the underlying message.
//! - [`StarbridgeError`]: the caller-facing taxonomy. Every public operation
//!   resolves to exactly one of these, with a stable [`ErrorKind`].
//!
//! Transport faults only ever reach callers through
//! [`TransportError::into_operation_error`], which re-tags the fault with the
//! kind of the operation that was running and keeps the original message.

use serde::Serialize;
use thiserror::Error;

/// Stable error kinds exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Malformed or missing caller input. No device I/O was attempted.
    InvalidArgument,
    /// The discovery scan could not run.
    DiscoveryFailed,
    /// Status query failed.
    StatusFailed,
    /// Print job failed.
    PrintFailed,
    /// Cash drawer pulse failed.
    DrawerFailed,
    /// An image payload could not be decoded. Recoverable.
    ImageDecodeFailed,
}

impl ErrorKind {
    /// Wire code for this kind, as reported by the RPC surface.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::DiscoveryFailed => "SEARCH_ERROR",
            ErrorKind::StatusFailed => "STATUS_ERROR",
            ErrorKind::PrintFailed => "PRINT_ERROR",
            ErrorKind::DrawerFailed => "DRAWER_ERROR",
            ErrorKind::ImageDecodeFailed => "IMAGE_DECODE_ERROR",
        }
    }
}

/// Main error type for starbridge operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StarbridgeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("Status failed: {0}")]
    StatusFailed(String),

    #[error("Print failed: {0}")]
    PrintFailed(String),

    #[error("Drawer failed: {0}")]
    DrawerFailed(String),

    #[error("Image decode failed: {0}")]
    ImageDecodeFailed(String),
}

impl StarbridgeError {
    /// Build an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::InvalidArgument => StarbridgeError::InvalidArgument(message),
            ErrorKind::DiscoveryFailed => StarbridgeError::DiscoveryFailed(message),
            ErrorKind::StatusFailed => StarbridgeError::StatusFailed(message),
            ErrorKind::PrintFailed => StarbridgeError::PrintFailed(message),
            ErrorKind::DrawerFailed => StarbridgeError::DrawerFailed(message),
            ErrorKind::ImageDecodeFailed => StarbridgeError::ImageDecodeFailed(message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StarbridgeError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StarbridgeError::DiscoveryFailed(_) => ErrorKind::DiscoveryFailed,
            StarbridgeError::StatusFailed(_) => ErrorKind::StatusFailed,
            StarbridgeError::PrintFailed(_) => ErrorKind::PrintFailed,
            StarbridgeError::DrawerFailed(_) => ErrorKind::DrawerFailed,
            StarbridgeError::ImageDecodeFailed(_) => ErrorKind::ImageDecodeFailed,
        }
    }

    /// The human-readable message, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            StarbridgeError::InvalidArgument(m)
            | StarbridgeError::DiscoveryFailed(m)
            | StarbridgeError::StatusFailed(m)
            | StarbridgeError::PrintFailed(m)
            | StarbridgeError::DrawerFailed(m)
            | StarbridgeError::ImageDecodeFailed(m) => m,
        }
    }
}

/// Faults raised by transports, discovery providers and session steps.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach or open the device
    #[error("Connection failed: {0}")]
    Connection(String),

    /// I/O error while talking to the device
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A device step did not complete in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The transport cannot perform this operation
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The device answered, but reported a failure
    #[error("Device error: {0}")]
    Device(String),

    /// A session step was requested from a state that does not allow it
    #[error("Cannot {action} a session in state {from}")]
    InvalidTransition { from: String, action: &'static str },

    /// A background task running device I/O died
    #[error("Task error: {0}")]
    Task(String),
}

impl TransportError {
    /// Re-tag this fault as the caller-facing error of the running operation.
    pub fn into_operation_error(self, kind: ErrorKind) -> StarbridgeError {
        StarbridgeError::new(kind, self.to_string())
    }
}

impl From<tokio::task::JoinError> for TransportError {
    fn from(e: tokio::task::JoinError) -> Self {
        TransportError::Task(e.to_string())
    }
}

/// Result type for caller-facing operations
pub type Result<T, E = StarbridgeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        let kinds = [
            ErrorKind::InvalidArgument,
            ErrorKind::DiscoveryFailed,
            ErrorKind::StatusFailed,
            ErrorKind::PrintFailed,
            ErrorKind::DrawerFailed,
            ErrorKind::ImageDecodeFailed,
        ];
        for kind in kinds {
            let err = StarbridgeError::new(kind, "boom");
            assert_eq!(err.kind(), kind);
            assert_eq!(err.message(), "boom");
        }
    }

    #[test]
    fn test_codes_match_plugin_channel() {
        assert_eq!(ErrorKind::DiscoveryFailed.code(), "SEARCH_ERROR");
        assert_eq!(ErrorKind::StatusFailed.code(), "STATUS_ERROR");
        assert_eq!(ErrorKind::PrintFailed.code(), "PRINT_ERROR");
        assert_eq!(ErrorKind::DrawerFailed.code(), "DRAWER_ERROR");
    }

    #[test]
    fn test_transport_error_keeps_message() {
        let err = TransportError::Connection("192.168.1.50:9100: refused".into())
            .into_operation_error(ErrorKind::PrintFailed);
        assert_eq!(err.kind(), ErrorKind::PrintFailed);
        assert!(err.message().contains("192.168.1.50:9100: refused"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = TransportError::InvalidTransition {
            from: "Closed".into(),
            action: "execute",
        };
        assert_eq!(err.to_string(), "Cannot execute a session in state Closed");
    }
}
