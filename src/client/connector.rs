//! Resolution of a connection string into ordered dialers

use super::connection_string::ConnectionString;
use super::hook::{DiagnosticHook, TracingHook};
use crate::connection::{Dialer, TcpDialer, TlsParams, UnixDialer};
use crate::metrics::labels;
use crate::protocol::constants::{DEFAULT_PORT, DEFAULT_SOCKET_DIR, SOCKET_FILE_PREFIX};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Turns connection strings into failover-ordered [`Dialer`]s.
///
/// Resolution performs no I/O and keeps no state, so one connector can be
/// shared freely between tasks.
#[derive(Clone)]
pub struct Connector {
    debug: Arc<dyn DiagnosticHook>,
}

impl Default for Connector {
    fn default() -> Self {
        Self::new(TracingHook)
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector").finish_non_exhaustive()
    }
}

impl Connector {
    /// Create a connector whose dialers report to `hook`
    pub fn new(hook: impl DiagnosticHook + 'static) -> Self {
        Self {
            debug: Arc::new(hook),
        }
    }

    /// Create a connector sharing an existing hook
    pub fn with_hook(hook: Arc<dyn DiagnosticHook>) -> Self {
        Self { debug: hook }
    }

    /// Resolve every target of `cs`, in failover order.
    ///
    /// One dialer is produced per entry of `host` or `hostaddr`, whichever is
    /// longer, and always at least one.
    ///
    /// # Errors
    ///
    /// - `Error::Config` when two of `host`, `hostaddr` and `port` both hold
    ///   more than one entry and their lengths differ
    /// - `Error::Parse` when `connect_timeout` is set but not whole seconds
    ///
    /// On error no dialers are returned.
    pub fn resolve(&self, cs: &ConnectionString) -> Result<Vec<Dialer>> {
        let result = self.resolve_targets(cs);

        match &result {
            Ok(dialers) => {
                tracing::debug!(targets = dialers.len(), "resolved connection targets");
                for dialer in dialers {
                    let kind = match dialer {
                        Dialer::Tcp(_) => labels::KIND_TCP,
                        Dialer::Unix(_) => labels::KIND_UNIX,
                    };
                    crate::metrics::counters::target_resolved(kind);
                }
                crate::metrics::counters::resolve_completed(labels::RESULT_OK);
            }
            Err(e) => {
                tracing::debug!(error = %e, "connection string rejected");
                crate::metrics::counters::resolve_completed(crate::metrics::error_outcome(e));
            }
        }

        result
    }

    fn resolve_targets(&self, cs: &ConnectionString) -> Result<Vec<Dialer>> {
        check_lengths("host", &cs.host, "hostaddr", &cs.hostaddr)?;
        check_lengths("host", &cs.host, "port", &cs.port)?;
        check_lengths("hostaddr", &cs.hostaddr, "port", &cs.port)?;

        let count = cs.host.len().max(cs.hostaddr.len()).max(1);
        if cs.port.len() > count {
            self.debug.log(&format!(
                "ignoring {} of {} ports: only {} target(s)",
                cs.port.len() - count,
                cs.port.len(),
                count
            ));
        }

        (0..count).map(|i| self.target(cs, i)).collect()
    }

    fn target(&self, cs: &ConnectionString, i: usize) -> Result<Dialer> {
        let port = cs
            .port
            .get(i)
            .or_else(|| cs.port.first())
            .map_or(DEFAULT_PORT, String::as_str);

        let host = cs.host.get(i);
        let hostaddr = cs.hostaddr.get(i);

        if hostaddr.is_none() && host.map_or(true, |h| h.starts_with('/')) {
            let dir = host.map_or(DEFAULT_SOCKET_DIR, String::as_str);
            self.unix_dialer(dir, port, cs).map(Dialer::Unix)
        } else {
            let host = host.map_or("", String::as_str);
            let hostaddr = hostaddr.map_or("", String::as_str);
            self.tcp_dialer(host, hostaddr, port, cs).map(Dialer::Tcp)
        }
    }

    fn tcp_dialer(
        &self,
        host: &str,
        hostaddr: &str,
        port: &str,
        cs: &ConnectionString,
    ) -> Result<TcpDialer> {
        let address = if hostaddr.is_empty() {
            join_host_port(host, port)
        } else {
            join_host_port(hostaddr, port)
        };

        // SNI and certificate checks use the logical host, not hostaddr
        let mut tls = TlsParams::new(host);
        if !cs.sslrootcert.is_empty() {
            tls = tls.root_cert(cs.sslrootcert.as_str());
        }

        Ok(TcpDialer {
            address,
            sslmode: cs.sslmode,
            tls,
            timeout: connect_timeout(cs)?,
            debug: self.debug.clone(),
        })
    }

    fn unix_dialer(&self, dir: &str, port: &str, cs: &ConnectionString) -> Result<UnixDialer> {
        Ok(UnixDialer {
            address: format!("{}/{}{}", dir, SOCKET_FILE_PREFIX, port),
            require_peer: cs.requirepeer.clone(),
            timeout: connect_timeout(cs)?,
            debug: self.debug.clone(),
        })
    }
}

/// Fail when both lists are multi-valued and disagree in length
fn check_lengths(a_name: &str, a: &[String], b_name: &str, b: &[String]) -> Result<()> {
    if a.len() > 1 && b.len() > 1 && a.len() != b.len() {
        return Err(Error::Config(format!(
            "{} and {} lengths do not match: {:?} versus {:?}",
            a_name, b_name, a, b
        )));
    }
    Ok(())
}

fn connect_timeout(cs: &ConnectionString) -> Result<Option<Duration>> {
    if cs.connect_timeout.is_empty() {
        return Ok(None);
    }
    ConnectionString::seconds_duration(&cs.connect_timeout)
}

/// `host:port`, bracketing IPv6 literals
fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
