//! TLS parameters and rustls client configuration for TCP targets.
//!
//! A [`TlsParams`] is plain data carried by every TCP dialer. The rustls
//! `ClientConfig` is only built when a dial actually needs TLS, with a
//! certificate verifier chosen by the target's [`SslMode`].

use crate::{Error, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::server::ParsedCertificate;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pemfile::Item;
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::sync::Arc;

/// SSL/TLS connection mode matching PostgreSQL `sslmode` parameter.
///
/// Controls whether and how TLS is negotiated with the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    /// No TLS (plaintext connection)
    Disable,
    /// Plaintext first; TLS only if the plaintext attempt is refused
    Allow,
    /// TLS first; plaintext if the server does not support TLS
    #[default]
    Prefer,
    /// TLS required, but server certificate is not verified
    Require,
    /// TLS required, server certificate must be signed by a trusted CA
    VerifyCa,
    /// TLS required, server certificate must be signed by a trusted CA and hostname must match
    VerifyFull,
}

impl SslMode {
    /// Whether the connection must end up encrypted
    pub fn requires_tls(&self) -> bool {
        matches!(self, Self::Require | Self::VerifyCa | Self::VerifyFull)
    }

    /// Whether the first attempt sends SSLRequest
    pub fn tries_tls_first(&self) -> bool {
        !matches!(self, Self::Disable | Self::Allow)
    }

    /// Whether this mode requires certificate verification (CA or full)
    pub fn requires_verification(&self) -> bool {
        matches!(self, Self::VerifyCa | Self::VerifyFull)
    }

    /// Whether the certificate must match the server name
    pub fn verifies_hostname(&self) -> bool {
        matches!(self, Self::VerifyFull)
    }
}

impl std::fmt::Display for SslMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disable => write!(f, "disable"),
            Self::Allow => write!(f, "allow"),
            Self::Prefer => write!(f, "prefer"),
            Self::Require => write!(f, "require"),
            Self::VerifyCa => write!(f, "verify-ca"),
            Self::VerifyFull => write!(f, "verify-full"),
        }
    }
}

impl std::str::FromStr for SslMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "disable" => Ok(Self::Disable),
            "allow" => Ok(Self::Allow),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            _ => Err(Error::Parse {
                field: "sslmode",
                value: s.to_string(),
            }),
        }
    }
}

/// Lowest TLS protocol version a client will negotiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlsVersion {
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

static TLS13_ONLY: &[&rustls::SupportedProtocolVersion] = &[&rustls::version::TLS13];

impl TlsVersion {
    fn supported(&self) -> &'static [&'static rustls::SupportedProtocolVersion] {
        match self {
            Self::Tls12 => rustls::ALL_VERSIONS,
            Self::Tls13 => TLS13_ONLY,
        }
    }
}

/// Client policy toward server-initiated renegotiation.
///
/// rustls never renegotiates, so with the bundled transport every policy
/// behaves as `Never`. The value is kept so a transport that does support
/// renegotiation can honor it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Renegotiation {
    /// Refuse renegotiation
    Never,
    /// Allow a single renegotiation per connection
    OnceAsClient,
    /// Allow the server to renegotiate as often as it likes
    FreelyAsClient,
}

/// TLS settings resolved for one TCP target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TlsParams {
    /// Minimum protocol version
    pub min_version: TlsVersion,
    /// Renegotiation policy
    pub renegotiation: Renegotiation,
    /// Name presented for SNI and matched against the certificate.
    ///
    /// Always the logical host name, even when the dialed address is a
    /// pre-resolved `hostaddr`. May be empty.
    pub server_name: String,
    /// PEM bundle of trusted roots (None = platform roots)
    pub root_cert: Option<String>,
}

impl TlsParams {
    /// Parameters used for every Postgres TCP target: TLS 1.2 or newer, free
    /// renegotiation, SNI from `server_name`
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            min_version: TlsVersion::Tls12,
            renegotiation: Renegotiation::FreelyAsClient,
            server_name: server_name.into(),
            root_cert: None,
        }
    }

    /// Trust the certificates in the PEM file at `path` instead of platform roots
    pub fn root_cert(mut self, path: impl Into<String>) -> Self {
        self.root_cert = Some(path.into());
        self
    }

    /// Build the rustls client configuration for `sslmode`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the root certificate file cannot be read or holds no certificates
    /// - no platform or bundled roots are available
    /// - the crypto provider rejects the protocol versions
    pub fn client_config(&self, sslmode: SslMode) -> Result<Arc<ClientConfig>> {
        let provider = crypto_provider();
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(self.min_version.supported())
            .map_err(|e| Error::Tls(e.to_string()))?;

        let config = match sslmode {
            SslMode::VerifyFull => builder
                .with_root_certificates(self.root_store()?)
                .with_no_client_auth(),
            SslMode::VerifyCa => {
                let roots = Arc::new(self.root_store()?);
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(ChainOnlyVerifier { roots, provider }))
                    .with_no_client_auth()
            }
            // require and the opportunistic modes encrypt without authenticating
            _ => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
                .with_no_client_auth(),
        };

        Ok(Arc::new(config))
    }

    fn root_store(&self) -> Result<RootCertStore> {
        match &self.root_cert {
            Some(path) => load_custom_ca(path),
            None => load_system_roots(),
        }
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

/// Platform roots via rustls-native-certs, or the bundled Mozilla set when the
/// platform store is empty
fn load_system_roots() -> Result<RootCertStore> {
    let result = rustls_native_certs::load_native_certs();

    let mut store = RootCertStore::empty();
    let (added, _ignored) = store.add_parsable_certificates(result.certs);

    if added == 0 {
        if !result.errors.is_empty() {
            tracing::warn!(errors = ?result.errors, "failed to load platform root certificates");
        }
        store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    Ok(store)
}

/// Load a custom CA certificate from a PEM file.
fn load_custom_ca(ca_path: &str) -> Result<RootCertStore> {
    let ca_cert_data = fs::read(ca_path).map_err(|e| {
        Error::Config(format!(
            "failed to read root certificate file '{}': {}",
            ca_path, e
        ))
    })?;

    let mut reader = std::io::Cursor::new(&ca_cert_data);
    let mut root_store = RootCertStore::empty();
    let mut found_certs = 0;

    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(Item::X509Certificate(cert))) => {
                let (added, _) = root_store.add_parsable_certificates(std::iter::once(cert));
                found_certs += added;
            }
            // keys and CRLs may share the bundle
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(_) => {
                return Err(Error::Config(format!(
                    "failed to parse root certificate from '{}'",
                    ca_path
                )));
            }
        }
    }

    if found_certs == 0 {
        return Err(Error::Config(format!(
            "no valid certificates found in '{}'",
            ca_path
        )));
    }

    Ok(root_store)
}

/// Parse server name from hostname for TLS SNI (Server Name Indication).
///
/// IP literals become `ServerName::IpAddress`, for which rustls sends no SNI
/// but still matches IP SANs. Anything else must be a valid DNS name.
pub fn parse_server_name(hostname: &str) -> Result<ServerName<'static>> {
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(ServerName::IpAddress(ip.into()));
    }

    let hostname = hostname.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(Error::Config(format!(
            "invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Config(format!("invalid hostname for TLS: '{}'", hostname)))
}

/// Verifier for `sslmode=require` and below: any certificate is accepted, handshake
/// signatures are still checked
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Verifier for `sslmode=verify-ca`: the chain must lead to a trusted root,
/// the subject name is not checked
#[derive(Debug)]
struct ChainOnlyVerifier {
    roots: Arc<RootCertStore>,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for ChainOnlyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let cert = ParsedCertificate::try_from(end_entity)?;
        rustls::client::verify_server_cert_signed_by_trust_anchor(
            &cert,
            &self.roots,
            intermediates,
            now,
            self.provider.signature_verification_algorithms.all,
        )?;
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_params_defaults() {
        let params = TlsParams::new("db.example.com");
        assert_eq!(params.min_version, TlsVersion::Tls12);
        assert_eq!(params.renegotiation, Renegotiation::FreelyAsClient);
        assert_eq!(params.server_name, "db.example.com");
        assert!(params.root_cert.is_none());
    }

    #[test]
    fn test_client_config_require() {
        let params = TlsParams::new("localhost");
        assert!(params.client_config(SslMode::Require).is_ok());
    }

    #[test]
    fn test_client_config_missing_root_cert() {
        let params = TlsParams::new("localhost").root_cert("/nonexistent/root.crt");
        let err = params.client_config(SslMode::VerifyFull).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_client_config_root_cert_without_certificates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pem");
        std::fs::write(&path, "not a certificate\n").unwrap();

        let params = TlsParams::new("localhost").root_cert(path.to_string_lossy());
        assert!(params.client_config(SslMode::VerifyCa).is_err());
    }

    #[test]
    fn test_parse_server_name_valid() {
        assert!(parse_server_name("localhost").is_ok());
        assert!(parse_server_name("example.com").is_ok());
        assert!(parse_server_name("db.internal.example.com").is_ok());
    }

    #[test]
    fn test_parse_server_name_trailing_dot() {
        assert!(parse_server_name("example.com.").is_ok());
    }

    #[test]
    fn test_parse_server_name_ip() {
        assert!(matches!(
            parse_server_name("10.0.0.7").unwrap(),
            ServerName::IpAddress(_)
        ));
        assert!(matches!(
            parse_server_name("::1").unwrap(),
            ServerName::IpAddress(_)
        ));
    }

    #[test]
    fn test_parse_server_name_invalid() {
        assert!(parse_server_name("").is_err());
        assert!(parse_server_name("bad host").is_err());
    }

    #[test]
    fn test_ssl_mode_from_str() {
        assert_eq!("disable".parse::<SslMode>().unwrap(), SslMode::Disable);
        assert_eq!("allow".parse::<SslMode>().unwrap(), SslMode::Allow);
        assert_eq!("prefer".parse::<SslMode>().unwrap(), SslMode::Prefer);
        assert_eq!("require".parse::<SslMode>().unwrap(), SslMode::Require);
        assert_eq!("verify-ca".parse::<SslMode>().unwrap(), SslMode::VerifyCa);
        assert_eq!(
            "verify-full".parse::<SslMode>().unwrap(),
            SslMode::VerifyFull
        );
    }

    #[test]
    fn test_ssl_mode_from_str_invalid() {
        assert!("invalid".parse::<SslMode>().is_err());
        assert!("Require".parse::<SslMode>().is_err());
    }

    #[test]
    fn test_ssl_mode_display_round_trips_serde() {
        for mode in [
            SslMode::Disable,
            SslMode::Allow,
            SslMode::Prefer,
            SslMode::Require,
            SslMode::VerifyCa,
            SslMode::VerifyFull,
        ] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode));
        }
    }

    #[test]
    fn test_ssl_mode_default() {
        assert_eq!(SslMode::default(), SslMode::Prefer);
    }

    #[test]
    fn test_ssl_mode_policies() {
        assert!(!SslMode::Disable.tries_tls_first());
        assert!(!SslMode::Allow.tries_tls_first());
        assert!(SslMode::Prefer.tries_tls_first());
        assert!(!SslMode::Prefer.requires_tls());
        assert!(SslMode::Require.requires_tls());
        assert!(!SslMode::Require.requires_verification());
        assert!(SslMode::VerifyCa.requires_verification());
        assert!(!SslMode::VerifyCa.verifies_hostname());
        assert!(SslMode::VerifyFull.verifies_hostname());
    }
}
