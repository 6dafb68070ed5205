//! Connection string settings relevant to choosing targets
//!
//! Textual parsing (URI or `key=value` form) happens upstream; this is the
//! already-split representation. Multi-valued settings are parallel arrays:
//! `host=a,b port=5432` becomes `host: ["a", "b"], port: ["5432"]`.

use crate::connection::SslMode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target-selection settings of a Postgres connection string
///
/// Deserializes from configuration with every field optional:
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cs: pgtwixt::ConnectionString = serde_json::from_str(
///     r#"{ "host": ["db1", "db2"], "sslmode": "verify-full", "connect_timeout": "5" }"#,
/// )?;
/// assert_eq!(cs.host.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionString {
    /// Host names, or socket directories when starting with `/`
    pub host: Vec<String>,
    /// Numeric addresses, dialed instead of resolving `host`
    pub hostaddr: Vec<String>,
    /// Ports as decimal text
    pub port: Vec<String>,
    /// TLS policy for TCP targets
    pub sslmode: SslMode,
    /// Connect deadline in whole seconds (empty = none)
    pub connect_timeout: String,
    /// Required user name of the server process on Unix sockets (empty = unchecked)
    pub requirepeer: String,
    /// PEM file of trusted root certificates (empty = platform roots)
    pub sslrootcert: String,
}

impl ConnectionString {
    /// Empty connection string: one Unix target at `/tmp/.s.PGSQL.5432`
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host list
    pub fn with_host<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the numeric address list
    pub fn with_hostaddr<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hostaddr = addrs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the port list
    pub fn with_port<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.port = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Set SSL/TLS mode
    pub fn with_sslmode(mut self, mode: SslMode) -> Self {
        self.sslmode = mode;
        self
    }

    /// Set the connect timeout, in seconds as text
    pub fn with_connect_timeout(mut self, seconds: impl Into<String>) -> Self {
        self.connect_timeout = seconds.into();
        self
    }

    /// Require Unix socket peers to run as `user`
    pub fn with_requirepeer(mut self, user: impl Into<String>) -> Self {
        self.requirepeer = user.into();
        self
    }

    /// Trust root certificates from a PEM file
    pub fn with_sslrootcert(mut self, path: impl Into<String>) -> Self {
        self.sslrootcert = path.into();
        self
    }

    /// Parse a whole number of seconds, as used by `connect_timeout`.
    ///
    /// Surrounding whitespace is ignored. Zero means "no deadline" and yields
    /// `None`, as it does for libpq.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` for anything that is not a non-negative integer.
    pub fn seconds_duration(value: &str) -> Result<Option<Duration>> {
        let secs: u64 = value.trim().parse().map_err(|_| Error::Parse {
            field: "connect_timeout",
            value: value.to_string(),
        })?;

        if secs == 0 {
            return Ok(None);
        }
        Ok(Some(Duration::from_secs(secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let cs = ConnectionString::new();
        assert!(cs.host.is_empty());
        assert!(cs.hostaddr.is_empty());
        assert!(cs.port.is_empty());
        assert_eq!(cs.sslmode, SslMode::Prefer);
        assert!(cs.connect_timeout.is_empty());
        assert!(cs.requirepeer.is_empty());
    }

    #[test]
    fn test_builder() {
        let cs = ConnectionString::new()
            .with_host(["a", "b"])
            .with_hostaddr(vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()])
            .with_port(["5433"])
            .with_sslmode(SslMode::VerifyFull)
            .with_connect_timeout("3")
            .with_requirepeer("postgres")
            .with_sslrootcert("/etc/ssl/root.crt");

        assert_eq!(cs.host, vec!["a", "b"]);
        assert_eq!(cs.hostaddr, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(cs.port, vec!["5433"]);
        assert_eq!(cs.sslmode, SslMode::VerifyFull);
        assert_eq!(cs.connect_timeout, "3");
        assert_eq!(cs.requirepeer, "postgres");
        assert_eq!(cs.sslrootcert, "/etc/ssl/root.crt");
    }

    #[test]
    fn test_seconds_duration() {
        assert_eq!(
            ConnectionString::seconds_duration("10").unwrap(),
            Some(Duration::from_secs(10))
        );
        assert_eq!(
            ConnectionString::seconds_duration(" 2 ").unwrap(),
            Some(Duration::from_secs(2))
        );
        assert_eq!(ConnectionString::seconds_duration("0").unwrap(), None);
    }

    #[test]
    fn test_seconds_duration_invalid() {
        for bad in ["ten", "1.5", "-1", "10s", ""] {
            let err = ConnectionString::seconds_duration(bad).unwrap_err();
            assert!(
                matches!(err, Error::Parse { field: "connect_timeout", .. }),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let cs: ConnectionString =
            serde_json::from_str(r#"{ "port": ["5433"], "sslmode": "require" }"#).unwrap();
        assert!(cs.host.is_empty());
        assert_eq!(cs.port, vec!["5433"]);
        assert_eq!(cs.sslmode, SslMode::Require);
    }

    #[test]
    fn test_deserialize_invalid_sslmode() {
        let result = serde_json::from_str::<ConnectionString>(r#"{ "sslmode": "bogus" }"#);
        assert!(result.is_err());
    }
}
