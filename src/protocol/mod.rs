//! The slice of the Postgres wire protocol needed before a stream is handed off
//!
//! Only the SSLRequest preamble lives here; startup and authentication belong
//! to whichever protocol layer consumes the dialed [`Transport`](crate::Transport).

pub mod constants;
pub mod encode;

pub use encode::encode_ssl_request;
