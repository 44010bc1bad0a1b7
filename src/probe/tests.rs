use std::net::TcpListener;
use std::time::Duration;

use super::{PortProbe, TcpProbe};
use crate::dns::tests::StubDns;

const TIMEOUT: Duration = Duration::from_secs(2);

fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

/// A loopback port with nothing listening on it.
fn closed_port() -> u16 {
    let (listener, port) = listener();
    drop(listener);
    port
}

#[test]
fn returns_first_open_port_in_order() {
    let (_a, open_a) = listener();
    let (_b, open_b) = listener();
    let closed = closed_port();
    let probe = TcpProbe::new(StubDns::new());

    let found = probe.probe("127.0.0.1", &[closed, open_b, open_a], TIMEOUT);
    assert_eq!(found, Some(open_b));
}

#[test]
fn none_when_everything_is_closed() {
    let probe = TcpProbe::new(StubDns::new());
    assert_eq!(probe.probe("127.0.0.1", &[closed_port()], TIMEOUT), None);
    assert_eq!(probe.probe("127.0.0.1", &[], TIMEOUT), None);
}

#[test]
fn parallel_mode_keeps_table_order() {
    let (_a, first) = listener();
    let (_b, second) = listener();
    let closed = closed_port();
    let probe = TcpProbe::new(StubDns::new()).parallel(true);

    assert_eq!(
        probe.probe("127.0.0.1", &[closed, second, first], TIMEOUT),
        Some(second)
    );
    assert_eq!(
        probe.probe("127.0.0.1", &[first, second], TIMEOUT),
        Some(first)
    );
}

#[test]
fn names_are_resolved_through_dns() {
    let (_l, open) = listener();
    let dns = StubDns::new().with_ip("imap.example.com", "127.0.0.1");
    let probe = TcpProbe::new(dns);

    assert_eq!(probe.probe("imap.example.com", &[open], TIMEOUT), Some(open));
    assert_eq!(probe.probe("unknown.example.com", &[open], TIMEOUT), None);
}
