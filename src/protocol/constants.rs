//! Postgres protocol and libpq default constants

/// SSLRequest code (80877103 = 1234 << 16 | 5679)
pub const SSL_REQUEST_CODE: i32 = 0x04D2_162F;

/// Total SSLRequest length, including the length field itself
pub const SSL_REQUEST_LEN: i32 = 8;

/// Server response bytes to SSLRequest
pub mod ssl_response {
    /// Server will proceed with a TLS handshake
    pub const ACCEPTED: u8 = b'S';

    /// Server does not do TLS; continue in plaintext or hang up
    pub const REJECTED: u8 = b'N';

    /// Pre-7.0 servers answer SSLRequest with an ErrorResponse
    pub const ERROR: u8 = b'E';
}

/// Port used when the connection string names none
pub const DEFAULT_PORT: &str = "5432";

/// Socket directory used when a Unix target has no host
pub const DEFAULT_SOCKET_DIR: &str = "/tmp";

/// Socket file name prefix; the full name is this followed by the port
pub const SOCKET_FILE_PREFIX: &str = ".s.PGSQL.";
