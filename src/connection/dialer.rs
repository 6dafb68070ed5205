//! Dialers: fully resolved connection attempts

use super::tls::{parse_server_name, SslMode, TlsParams};
use super::transport::Transport;
use crate::client::DiagnosticHook;
use crate::metrics::labels;
use crate::{Error, Result};
use rustls_pki_types::ServerName;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UnixStream;

/// One candidate server, ready to be dialed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialer {
    /// TCP target, optionally TLS-encrypted
    Tcp(TcpDialer),
    /// Unix domain socket target
    Unix(UnixDialer),
}

impl Dialer {
    /// Address that will be connected to (`host:port` or socket path)
    pub fn address(&self) -> &str {
        match self {
            Dialer::Tcp(d) => &d.address,
            Dialer::Unix(d) => &d.address,
        }
    }

    /// Connect deadline, if any
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Dialer::Tcp(d) => d.timeout,
            Dialer::Unix(d) => d.timeout,
        }
    }

    /// Open a byte stream to this target
    pub async fn dial(&self) -> Result<Transport> {
        match self {
            Dialer::Tcp(d) => d.dial().await,
            Dialer::Unix(d) => d.dial().await,
        }
    }

    /// The TCP dialer, if this is a TCP target
    pub fn as_tcp(&self) -> Option<&TcpDialer> {
        match self {
            Dialer::Tcp(d) => Some(d),
            Dialer::Unix(_) => None,
        }
    }

    /// The Unix dialer, if this is a Unix socket target
    pub fn as_unix(&self) -> Option<&UnixDialer> {
        match self {
            Dialer::Tcp(_) => None,
            Dialer::Unix(d) => Some(d),
        }
    }
}

/// Connection attempt over TCP
#[derive(Clone)]
pub struct TcpDialer {
    /// `host:port` to connect to
    pub address: String,
    /// Whether and how TLS is negotiated
    pub sslmode: SslMode,
    /// TLS settings used when TLS is negotiated
    pub tls: TlsParams,
    /// Deadline covering connect and TLS negotiation
    pub timeout: Option<Duration>,
    pub(crate) debug: Arc<dyn DiagnosticHook>,
}

impl TcpDialer {
    /// Connect, then negotiate TLS as `sslmode` dictates.
    ///
    /// `allow` connects in plaintext; `prefer` falls back to plaintext on the
    /// same connection when the server declines TLS. The opposite attempt for
    /// either mode is available through [`TcpDialer::fallback`].
    pub async fn dial(&self) -> Result<Transport> {
        let start = Instant::now();
        let result = with_deadline(&self.address, self.timeout, self.connect()).await;
        record_dial(labels::KIND_TCP, start, &result);
        result
    }

    /// The second attempt for the opportunistic modes.
    ///
    /// After an `allow` attempt fails (for example because `pg_hba.conf`
    /// demands encryption) a failover driver may retry with TLS; after a
    /// `prefer` attempt fails it may retry in plaintext. Other modes have no
    /// second attempt.
    pub fn fallback(&self) -> Option<TcpDialer> {
        let sslmode = match self.sslmode {
            SslMode::Allow => SslMode::Require,
            SslMode::Prefer => SslMode::Disable,
            _ => return None,
        };
        Some(TcpDialer {
            sslmode,
            ..self.clone()
        })
    }

    async fn connect(&self) -> Result<Transport> {
        // resolve the TLS name before any I/O so a bad host fails fast
        let server_name = if self.sslmode.tries_tls_first() {
            Some(self.server_name()?)
        } else {
            None
        };

        self.debug
            .log(&format!("dialing tcp {} (sslmode={})", self.address, self.sslmode));
        let mut transport = Transport::connect_tcp(&self.address).await?;

        let Some(server_name) = server_name else {
            return Ok(transport);
        };

        if !transport.request_ssl().await? {
            if self.sslmode.requires_tls() {
                return Err(Error::TlsRejected(self.address.clone()));
            }
            self.debug
                .log(&format!("server at {} declined TLS, continuing in plaintext", self.address));
            return Ok(transport);
        }

        let client_config = self.tls.client_config(self.sslmode)?;
        let transport = transport.upgrade_to_tls(client_config, server_name).await?;
        self.debug
            .log(&format!("tls established with {}", self.address));
        Ok(transport)
    }

    /// Name used for the TLS handshake.
    ///
    /// Only `verify-full` checks the name against the certificate, so only
    /// there is a missing or malformed host fatal. Otherwise a host that is
    /// not usable as a TLS name (empty for `hostaddr`-only targets, or a
    /// socket directory paired with a `hostaddr`) gives way to the dialed IP.
    fn server_name(&self) -> Result<ServerName<'static>> {
        let host = self.tls.server_name.as_str();
        if self.sslmode.verifies_hostname() {
            if host.is_empty() {
                return Err(Error::Config(format!(
                    "sslmode={} requires a host name for {}",
                    self.sslmode, self.address
                )));
            }
            return parse_server_name(host);
        }

        if !host.is_empty() {
            match parse_server_name(host) {
                Ok(name) => return Ok(name),
                Err(e) => self.debug.log(&format!(
                    "host {:?} is not a TLS name ({}), using the address of {}",
                    host, e, self.address
                )),
            }
        }

        parse_server_name(dialed_host(&self.address)).map_err(|_| {
            Error::Tls(format!("no usable TLS server name for {}", self.address))
        })
    }
}

impl std::fmt::Debug for TcpDialer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpDialer")
            .field("address", &self.address)
            .field("sslmode", &self.sslmode)
            .field("tls", &self.tls)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// The hook is not part of a dialer's value
impl PartialEq for TcpDialer {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
            && self.sslmode == other.sslmode
            && self.tls == other.tls
            && self.timeout == other.timeout
    }
}

impl Eq for TcpDialer {}

/// Connection attempt over a Unix domain socket
#[derive(Clone)]
pub struct UnixDialer {
    /// Socket file path (`<dir>/.s.PGSQL.<port>`)
    pub address: String,
    /// User the server process must run as (empty = unchecked)
    pub require_peer: String,
    /// Connect deadline
    pub timeout: Option<Duration>,
    pub(crate) debug: Arc<dyn DiagnosticHook>,
}

impl UnixDialer {
    /// Connect to the socket file and check the peer if `require_peer` is set
    pub async fn dial(&self) -> Result<Transport> {
        let start = Instant::now();
        let result = with_deadline(&self.address, self.timeout, self.connect()).await;
        record_dial(labels::KIND_UNIX, start, &result);
        result
    }

    async fn connect(&self) -> Result<Transport> {
        self.debug.log(&format!("dialing unix {}", self.address));
        let transport = Transport::connect_unix(&self.address).await?;

        if let Transport::Unix(stream) = &transport {
            if !self.require_peer.is_empty() {
                let actual = peer_user_name(stream)?;
                if actual != self.require_peer {
                    return Err(Error::PeerMismatch {
                        expected: self.require_peer.clone(),
                        actual,
                    });
                }
                self.debug
                    .log(&format!("peer of {} is {}", self.address, actual));
            }
        }

        Ok(transport)
    }
}

impl std::fmt::Debug for UnixDialer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixDialer")
            .field("address", &self.address)
            .field("require_peer", &self.require_peer)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PartialEq for UnixDialer {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
            && self.require_peer == other.require_peer
            && self.timeout == other.timeout
    }
}

impl Eq for UnixDialer {}

/// User name owning the process on the other end of `stream`
fn peer_user_name(stream: &UnixStream) -> Result<String> {
    let cred = stream.peer_cred()?;
    let uid = nix::unistd::Uid::from_raw(cred.uid());
    match nix::unistd::User::from_uid(uid) {
        Ok(Some(user)) => Ok(user.name),
        Ok(None) => Err(Error::Config(format!(
            "requirepeer: no local user with uid {}",
            uid
        ))),
        Err(errno) => Err(Error::Io(errno.into())),
    }
}

/// Host part of a `host:port` address, without IPv6 brackets
fn dialed_host(address: &str) -> &str {
    address
        .rsplit_once(':')
        .map(|(host, _)| host.trim_start_matches('[').trim_end_matches(']'))
        .unwrap_or(address)
}

async fn with_deadline<F>(address: &str, timeout: Option<Duration>, fut: F) -> Result<Transport>
where
    F: Future<Output = Result<Transport>>,
{
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout {
                address: address.to_string(),
                timeout,
            })?,
        None => fut.await,
    }
}

fn record_dial(kind: &'static str, start: Instant, result: &Result<Transport>) {
    let outcome = match result {
        Ok(_) => labels::RESULT_OK,
        Err(e) => {
            tracing::debug!(kind, error = %e, "dial failed");
            crate::metrics::error_outcome(e)
        }
    };
    crate::metrics::counters::dial_completed(kind, outcome);
    crate::metrics::histograms::dial_duration(kind, crate::metrics::millis(start.elapsed()));
}
