//! Label keys and values

/// Outcome label key
pub const RESULT: &str = "result";

/// Target kind label key
pub const KIND: &str = "kind";

/// Successful outcome
pub const RESULT_OK: &str = "ok";

/// Configuration error outcome
pub const RESULT_CONFIG_ERROR: &str = "config_error";

/// Malformed field value outcome
pub const RESULT_PARSE_ERROR: &str = "parse_error";

/// Any other failure
pub const RESULT_ERROR: &str = "error";

/// TCP target
pub const KIND_TCP: &str = "tcp";

/// Unix socket target
pub const KIND_UNIX: &str = "unix";
