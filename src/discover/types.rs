use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Transport security implied by the port a server answered on.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encryption {
    /// Implicit TLS from the first byte (IMAPS 993, SMTPS 465).
    Ssl,
    /// Plain connection upgraded with STARTTLS (submission 587).
    Tls,
}

impl Encryption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ssl => "ssl",
            Self::Tls => "tls",
        }
    }
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const IMAP_PREFIXES: &[&str] = &["imap.", "mail.", "pop3."];
const SMTP_PREFIXES: &[&str] = &["smtp.", "mail."];

const IMAP_PORTS: &[(u16, Option<Encryption>)] = &[(993, Some(Encryption::Ssl)), (143, None)];
const SMTP_PORTS: &[(u16, Option<Encryption>)] = &[
    (587, Some(Encryption::Tls)),
    (465, Some(Encryption::Ssl)),
    (25, None),
];

/// Mail service family being discovered. Owns the fixed hostname prefixes
/// and the port table, both in probing order.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Imap,
    Smtp,
}

impl Protocol {
    pub fn prefixes(self) -> &'static [&'static str] {
        match self {
            Self::Imap => IMAP_PREFIXES,
            Self::Smtp => SMTP_PREFIXES,
        }
    }

    pub fn port_table(self) -> &'static [(u16, Option<Encryption>)] {
        match self {
            Self::Imap => IMAP_PORTS,
            Self::Smtp => SMTP_PORTS,
        }
    }

    pub fn ports(self) -> Vec<u16> {
        self.port_table().iter().map(|(port, _)| *port).collect()
    }

    /// Settings for a server answering on `port`; `None` when the port is not
    /// part of this protocol's table.
    pub fn settings_for(self, host: &str, port: u16) -> Option<ServerSettings> {
        self.port_table()
            .iter()
            .find(|(listed, _)| *listed == port)
            .map(|(_, encryption)| ServerSettings {
                host: host.to_string(),
                port,
                encryption: *encryption,
            })
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imap => f.write_str("imap"),
            Self::Smtp => f.write_str("smtp"),
        }
    }
}

/// Connection settings for a discovered server.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub encryption: Option<Encryption>,
}

impl fmt::Display for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encryption {
            Some(encryption) => write!(f, "{}:{} ({encryption})", self.host, self.port),
            None => write!(f, "{}:{} (none)", self.host, self.port),
        }
    }
}

/// Top-priority MX host of the last domain that had one, with its root
/// domain.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxInfo {
    pub server: String,
    pub root: String,
}

impl MxInfo {
    pub fn new(server: impl Into<String>) -> Self {
        let server = server.into();
        let root = root_domain(&server);
        Self { server, root }
    }
}

/// Where a probed hostname came from.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// `prefix + domain`
    Prefix,
    /// The MX host itself.
    MxHost,
    /// `prefix + root(reverse DNS of the MX address)`
    ReverseMxRoot,
    /// `prefix + root(MX host)`
    MxRoot,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prefix => "prefix",
            Self::MxHost => "mx-host",
            Self::ReverseMxRoot => "reverse-mx-root",
            Self::MxRoot => "mx-root",
        })
    }
}

/// One probe performed during a discovery call.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub host: String,
    pub source: CandidateSource,
    pub port: Option<u16>,
}

/// Report produced by [`Discover::discover`](super::Discover::discover).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub protocol: Protocol,
    pub email: String,
    pub settings: Option<ServerSettings>,
    /// MX information gathered by this call only.
    pub mx: Option<MxInfo>,
    pub attempts: Vec<Attempt>,
}

impl Discovery {
    pub fn is_found(&self) -> bool {
        self.settings.is_some()
    }

    /// How the discovered host was obtained. A winning candidate is always
    /// the last probe of the call.
    pub fn source(&self) -> Option<CandidateSource> {
        self.settings.as_ref()?;
        self.attempts.last().map(|a| a.source)
    }
}

/// Last two dot-separated labels of `host` (`mail.example.com` →
/// `example.com`). Shorter names are returned unchanged.
pub fn root_domain(host: &str) -> String {
    let host = host.trim_end_matches('.');
    let labels: Vec<&str> = host.split('.').collect();
    labels[labels.len().saturating_sub(2)..].join(".")
}
