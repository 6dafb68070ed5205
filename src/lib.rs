//! pgtwixt: connection target resolution for Postgres clients
//!
//! A libpq-style connection string may name several hosts, addresses and ports
//! in parallel arrays. This crate turns such a string into an ordered list of
//! [`Dialer`]s, one per candidate server, which a failover driver attempts in
//! order until one connects.
//!
//! ```no_run
//! # async fn example() -> pgtwixt::Result<()> {
//! use pgtwixt::{ConnectionString, Connector};
//!
//! let cs = ConnectionString::new()
//!     .with_host(["db1.example.com", "db2.example.com"])
//!     .with_port(["5432"])
//!     .with_connect_timeout("10");
//!
//! let dialers = Connector::default().resolve(&cs)?;
//! for dialer in &dialers {
//!     match dialer.dial().await {
//!         Ok(_transport) => break, // hand off to the protocol layer
//!         Err(e) if e.is_config() => return Err(e),
//!         Err(_) => continue,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod protocol;

pub use client::{ConnectionString, Connector, DiagnosticHook, TracingHook};
pub use connection::{Dialer, SslMode, TcpDialer, Transport, UnixDialer};
pub use error::{Error, Result};
