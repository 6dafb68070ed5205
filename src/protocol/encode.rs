//! Protocol message encoding

use super::constants::{SSL_REQUEST_CODE, SSL_REQUEST_LEN};
use bytes::{BufMut, BytesMut};

/// Encode the SSLRequest preamble sent before any startup message
pub fn encode_ssl_request() -> BytesMut {
    let mut buf = BytesMut::with_capacity(SSL_REQUEST_LEN as usize);
    buf.put_i32(SSL_REQUEST_LEN); // Length (includes itself)
    buf.put_i32(SSL_REQUEST_CODE);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ssl_request() {
        let buf = encode_ssl_request();

        // SSLRequest is exactly 8 bytes: 4-byte length (8) + 4-byte code (80877103)
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[0..4], &[0x00, 0x00, 0x00, 0x08]);
        assert_eq!(&buf[4..8], &[0x04, 0xD2, 0x16, 0x2F]);
    }
}
