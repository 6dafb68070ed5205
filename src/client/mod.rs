//! Client-side target resolution

mod connection_string;
mod connector;
mod hook;

pub use connection_string::ConnectionString;
pub use connector::Connector;
pub use hook::{DiagnosticHook, TracingHook};
