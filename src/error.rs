//! Error types

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving or dialing connection targets
#[derive(Debug, Error)]
pub enum Error {
    /// Inconsistent or unusable connection settings
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A setting could not be parsed
    #[error("invalid value for {field}: {value:?}")]
    Parse {
        /// Name of the offending setting
        field: &'static str,
        /// Raw text that failed to parse
        value: String,
    },

    /// Socket level failure
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The target did not answer before the connect timeout
    #[error("timed out after {timeout:?} connecting to {address}")]
    Timeout {
        /// Address being dialed
        address: String,
        /// Configured deadline
        timeout: Duration,
    },

    /// TLS handshake failure
    #[error("tls error: {0}")]
    Tls(String),

    /// Server answered `N` to SSLRequest while the ssl mode demands encryption
    #[error("server at {0} does not support TLS")]
    TlsRejected(String),

    /// Unix socket peer is not the required user
    #[error("requirepeer failed: expected {expected:?}, peer is {actual:?}")]
    PeerMismatch {
        /// Value of `requirepeer`
        expected: String,
        /// User name owning the server process
        actual: String,
    },

    /// Unexpected bytes from the server
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Whether this error stems from the connection settings themselves.
    ///
    /// Configuration defects apply to every target, so a failover driver should
    /// stop rather than move on to the next candidate.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_config() {
        assert!(Error::Config("bad".into()).is_config());
        assert!(Error::Parse {
            field: "connect_timeout",
            value: "x".into()
        }
        .is_config());
        assert!(!Error::TlsRejected("a:5432".into()).is_config());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")).is_config());
    }

    #[test]
    fn test_display() {
        let err = Error::Parse {
            field: "connect_timeout",
            value: "ten".into(),
        };
        assert_eq!(err.to_string(), "invalid value for connect_timeout: \"ten\"");

        let err = Error::PeerMismatch {
            expected: "postgres".into(),
            actual: "alice".into(),
        };
        assert!(err.to_string().contains("postgres"));
        assert!(err.to_string().contains("alice"));
    }
}
