//! Connection targets
//!
//! This module handles:
//! * Dialers for TCP and Unix socket targets
//! * Transport abstraction (TCP vs Unix socket)
//! * TLS configuration and support

mod dialer;
mod tls;
mod transport;

pub use dialer::{Dialer, TcpDialer, UnixDialer};
pub use tls::{parse_server_name, Renegotiation, SslMode, TlsParams, TlsVersion};
pub use transport::{request_ssl, TcpVariant, Transport};
