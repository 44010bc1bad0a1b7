//! TCP port-liveness probing.
//!
//! [`PortProbe`] answers one question: which is the first port, in the given
//! order, on which `host` accepts a TCP connection? Nothing is sent over the
//! socket; it is shut down as soon as the handshake completes.

mod tcp;

pub use tcp::TcpProbe;

use std::time::Duration;

pub trait PortProbe {
    /// First port of `ports` (in order) accepting a connection within
    /// `timeout`, or `None` when every attempt fails. Never errors.
    fn probe(&self, host: &str, ports: &[u16], timeout: Duration) -> Option<u16>;
}

#[cfg(test)]
mod tests;
