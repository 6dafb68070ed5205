//! Integration tests against a real Postgres
//!
//! These tests require a running Postgres instance. Point them at it with
//! `PGTWIXT_TEST_HOST` (comma separated, socket directories allowed) and
//! `PGTWIXT_TEST_PORT`.

use pgtwixt::{ConnectionString, Connector, SslMode};

#[tokio::test]
#[ignore] // Requires Postgres running
async fn test_dial_first_reachable_server() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let hosts = std::env::var("PGTWIXT_TEST_HOST").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("PGTWIXT_TEST_PORT").unwrap_or_else(|_| "5432".into());

    let cs = ConnectionString::new()
        .with_host(hosts.split(','))
        .with_port([port])
        .with_sslmode(SslMode::Prefer)
        .with_connect_timeout("5");
    let dialers = Connector::default().resolve(&cs).expect("resolve");

    let mut last_err = None;
    for dialer in &dialers {
        match dialer.dial().await {
            Ok(mut transport) => {
                transport.shutdown().await.expect("shutdown");
                return;
            }
            Err(e) => last_err = Some(e),
        }
    }
    panic!("no target reachable: {:?}", last_err);
}
