//! Error types shared across the chansync crates.

use thiserror::Error;

/// The outcome taxonomy for a single command transport request.
///
/// The transport decides *when* a request has failed (it owns the
/// timeouts); this type decides *what kind* of failure it was, which is
/// what the retry classifier keys on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The device did not answer within the transport's deadline.
    #[error("request timed out")]
    Timeout,

    /// The mesh has no route to the requested node.
    #[error("target node not found")]
    NotFound,

    /// The transport gave up waiting for a response packet.
    #[error("response not received")]
    NotReceived,

    /// The device refused to issue a session passkey.
    #[error("session passkey denied: {0}")]
    PasskeyDenied(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    /// Whether a failed fetch is worth re-asking within the retry budget.
    ///
    /// Timeouts, missing routes, and dropped responses are the radio being
    /// a radio; anything else is treated as permanent for this run. An
    /// untyped error still counts as transient when its message names one
    /// of those conditions.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::NotFound | Self::NotReceived => true,
            Self::PasskeyDenied(_) => false,
            Self::Other(message) => {
                let message = message.to_ascii_lowercase();
                message.contains("timeout")
                    || message.contains("timed out")
                    || message.contains("not received")
                    || message.contains("not found")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_transient_variants() {
        assert!(CommandError::Timeout.is_transient());
        assert!(CommandError::NotFound.is_transient());
        assert!(CommandError::NotReceived.is_transient());
    }

    #[test]
    fn passkey_denial_is_permanent() {
        assert!(!CommandError::PasskeyDenied("busy".into()).is_transient());
    }

    #[test]
    fn untyped_error_classified_by_message() {
        assert!(CommandError::Other("Request timed out after 30s".into()).is_transient());
        assert!(CommandError::Other("ack not received".into()).is_transient());
        assert!(CommandError::Other("node not found in mesh".into()).is_transient());
        assert!(!CommandError::Other("malformed admin frame".into()).is_transient());
    }

    #[test]
    fn error_display() {
        assert_eq!(CommandError::Timeout.to_string(), "request timed out");
        assert_eq!(
            CommandError::PasskeyDenied("session table full".into()).to_string(),
            "session passkey denied: session table full"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CommandError>();
    }
}
