#![no_main]

use libfuzzer_sys::fuzz_target;
use pgtwixt::{ConnectionString, Connector, Error};

// Input layout: three length bytes (host, hostaddr, port), then
// NUL-separated strings; the final string is connect_timeout.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let (lens, rest) = data.split_at(3);
    let mut fields = rest
        .split(|b| *b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned());

    let mut take = |n: u8| -> Vec<String> {
        (0..n % 8).filter_map(|_| fields.next()).collect()
    };
    let host = take(lens[0]);
    let hostaddr = take(lens[1]);
    let port = take(lens[2]);
    let connect_timeout = fields.next().unwrap_or_default();

    let cs = ConnectionString::new()
        .with_host(host.clone())
        .with_hostaddr(hostaddr.clone())
        .with_port(port.clone())
        .with_connect_timeout(connect_timeout);

    match Connector::new(|_: &str| {}).resolve(&cs) {
        Ok(dialers) => {
            assert_eq!(dialers.len(), host.len().max(hostaddr.len()).max(1));
        }
        Err(Error::Config(_)) | Err(Error::Parse { .. }) => {}
        Err(e) => panic!("resolve must only fail on configuration: {}", e),
    }
});
