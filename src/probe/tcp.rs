use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use crate::dns::{Error as DnsError, LookupKind, MailDns};

use super::PortProbe;

/// Connects with [`TcpStream::connect_timeout`] to every address of the host.
/// Names are resolved through `D`; IP literals are used as-is.
#[derive(Debug, Clone)]
pub struct TcpProbe<D> {
    dns: D,
    parallel: bool,
}

impl<D: MailDns> TcpProbe<D> {
    pub fn new(dns: D) -> Self {
        Self {
            dns,
            parallel: false,
        }
    }

    /// Try all ports of a host at once. The answer is still the first open
    /// port in the given order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn addresses(&self, host: &str) -> Vec<IpAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return vec![ip];
        }
        match self.dns.lookup_ip(host) {
            Ok(addrs) => addrs,
            Err(err) => {
                let err = DnsError::lookup(LookupKind::Address, host, err);
                tracing::debug!(error = %err, "candidate does not resolve");
                Vec::new()
            }
        }
    }
}

impl<D: MailDns> PortProbe for TcpProbe<D> {
    fn probe(&self, host: &str, ports: &[u16], timeout: Duration) -> Option<u16> {
        let addrs = self.addresses(host);
        if addrs.is_empty() || ports.is_empty() {
            return None;
        }

        let found = if self.parallel && ports.len() > 1 {
            probe_concurrently(&addrs, ports, timeout)
        } else {
            ports
                .iter()
                .copied()
                .find(|&port| port_open(&addrs, port, timeout))
        };
        tracing::debug!(host, ?ports, ?found, "probed");
        found
    }
}

fn probe_concurrently(addrs: &[IpAddr], ports: &[u16], timeout: Duration) -> Option<u16> {
    thread::scope(|scope| {
        let handles: Vec<_> = ports
            .iter()
            .map(|&port| scope.spawn(move || port_open(addrs, port, timeout)))
            .collect();
        // join in table order so the earliest port wins regardless of timing
        handles
            .into_iter()
            .zip(ports)
            .find_map(|(handle, &port)| handle.join().unwrap_or(false).then_some(port))
    })
}

fn port_open(addrs: &[IpAddr], port: u16, timeout: Duration) -> bool {
    addrs
        .iter()
        .any(|ip| connect(SocketAddr::new(*ip, port), timeout))
}

fn connect(addr: SocketAddr, timeout: Duration) -> bool {
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(stream) => {
            stream.shutdown(Shutdown::Both).ok();
            true
        }
        Err(err) => {
            tracing::trace!(%addr, error = %err, "connect failed");
            false
        }
    }
}
