//! IMAP/SMTP server discovery.
//!
//! For every hostname prefix of the protocol (`imap.`, `mail.`, ...) the
//! engine probes `prefix + domain`, then falls back on the domain's MX host:
//! the MX host itself, `prefix + root(reverse DNS of the MX address)` and
//! finally `prefix + root(MX host)`. The first candidate accepting a TCP
//! connection on one of the protocol's ports wins; the encryption mode
//! follows from the port.

mod error;
mod options;
mod types;

pub use error::DiscoverError;
pub use options::DiscoverOptions;
pub use types::{
    Attempt, CandidateSource, Discovery, Encryption, MxInfo, Protocol, ServerSettings,
    root_domain,
};

use std::collections::HashMap;
use std::time::Duration;

use crate::dns::{self, MailDns, SystemDns};
use crate::probe::{PortProbe, TcpProbe};
use crate::validator::normalize_email;

/// Discovers the IMAP server of `email` with the system resolver and default
/// options.
pub fn discover_imap(email: &str) -> Result<Option<ServerSettings>, DiscoverError> {
    discover_imap_with_options(email, &DiscoverOptions::default())
}

pub fn discover_imap_with_options(
    email: &str,
    options: &DiscoverOptions,
) -> Result<Option<ServerSettings>, DiscoverError> {
    let mut engine = Discover::from_system_conf(options.clone())?;
    Ok(engine.discover_imap(email)?.settings)
}

/// Discovers the SMTP server of `email` with the system resolver and default
/// options.
pub fn discover_smtp(email: &str) -> Result<Option<ServerSettings>, DiscoverError> {
    discover_smtp_with_options(email, &DiscoverOptions::default())
}

pub fn discover_smtp_with_options(
    email: &str,
    options: &DiscoverOptions,
) -> Result<Option<ServerSettings>, DiscoverError> {
    let mut engine = Discover::from_system_conf(options.clone())?;
    Ok(engine.discover_smtp(email)?.settings)
}

/// Discovery engine.
///
/// The engine remembers the MX host of the last domain that had one (see
/// [`Discover::mx_info`]); it is overwritten by later calls that find an MX
/// host and kept otherwise, across IMAP and SMTP calls alike. Each
/// [`Discovery`] report also carries the MX information of its own call.
/// Methods take `&mut self`: run concurrent discoveries on separate engines.
#[derive(Debug)]
pub struct Discover<D, P> {
    dns: D,
    prober: P,
    options: DiscoverOptions,
    mx: Option<MxInfo>,
}

impl Discover<SystemDns, TcpProbe<SystemDns>> {
    /// Engine backed by the system resolver and real TCP probes.
    pub fn from_system_conf(options: DiscoverOptions) -> Result<Self, DiscoverError> {
        let dns = SystemDns::from_system_conf(options.dns_timeout())?;
        let prober = TcpProbe::new(dns.clone()).parallel(options.parallel_ports);
        Ok(Self::with_parts(dns, prober, options))
    }
}

impl<D: MailDns, P: PortProbe> Discover<D, P> {
    pub fn with_parts(dns: D, prober: P, options: DiscoverOptions) -> Self {
        Self {
            dns,
            prober,
            options,
            mx: None,
        }
    }

    pub fn options(&self) -> &DiscoverOptions {
        &self.options
    }

    pub fn mx_info(&self) -> Option<&MxInfo> {
        self.mx.as_ref()
    }

    pub fn discover_imap(&mut self, email: &str) -> Result<Discovery, DiscoverError> {
        self.discover(Protocol::Imap, email)
    }

    pub fn discover_smtp(&mut self, email: &str) -> Result<Discovery, DiscoverError> {
        self.discover(Protocol::Smtp, email)
    }

    /// Runs the candidate chain for `protocol`. Only a malformed address is
    /// an error; "nothing answered" is a report with `settings == None`.
    pub fn discover(
        &mut self,
        protocol: Protocol,
        email: &str,
    ) -> Result<Discovery, DiscoverError> {
        let normalized = normalize_email(email, self.options.validation_mode);
        if !normalized.valid {
            return Err(DiscoverError::invalid_email(email, normalized.reasons));
        }
        let domain = normalized.ascii_domain;

        let mut run = Run::new(&self.prober, protocol, self.options.connect_timeout());
        let mut call_mx = None;
        let mut settings = None;

        for prefix in protocol.prefixes() {
            let mx_server = dns::top_mx(&self.dns, &domain);
            if let Some(server) = &mx_server {
                let info = MxInfo::new(server.as_str());
                tracing::debug!(domain = %domain, mx = %info.server, root = %info.root, "MX");
                self.mx = Some(info.clone());
                call_mx = Some(info);
            }

            settings = analyse(&mut run, &self.dns, prefix, &domain, mx_server.as_deref());
            if settings.is_some() {
                break;
            }
        }

        match &settings {
            Some(found) => tracing::info!(%protocol, email, server = %found, "discovered"),
            None => tracing::info!(%protocol, email, "no server found"),
        }

        Ok(Discovery {
            protocol,
            email: normalized.original,
            settings,
            mx: call_mx,
            attempts: run.attempts,
        })
    }
}

/// Candidate chain for one prefix.
fn analyse<D, P>(
    run: &mut Run<'_, P>,
    resolver: &D,
    prefix: &str,
    domain: &str,
    mx_server: Option<&str>,
) -> Option<ServerSettings>
where
    D: MailDns,
    P: PortProbe,
{
    if let Some(found) = run.try_host(&format!("{prefix}{domain}"), CandidateSource::Prefix) {
        return Some(found);
    }

    let mx_server = mx_server?;
    if let Some(found) = run.try_host(mx_server, CandidateSource::MxHost) {
        return Some(found);
    }

    if let Some(reverse_root) = reverse_root(resolver, mx_server) {
        let host = format!("{prefix}{reverse_root}");
        if let Some(found) = run.try_host(&host, CandidateSource::ReverseMxRoot) {
            return Some(found);
        }
    }

    let host = format!("{prefix}{}", root_domain(mx_server));
    run.try_host(&host, CandidateSource::MxRoot)
}

/// Root domain of the name the MX host's address reverse-resolves to.
fn reverse_root<D: MailDns>(resolver: &D, mx_server: &str) -> Option<String> {
    let ip = dns::forward_lookup(resolver, mx_server)?;
    let name = dns::normalize_name(&dns::reverse_name(resolver, ip)?);
    tracing::debug!(mx = mx_server, %ip, reverse = %name, "reverse MX host");
    Some(root_domain(&name))
}

/// Per-call probing state.
struct Run<'a, P> {
    prober: &'a P,
    protocol: Protocol,
    ports: Vec<u16>,
    timeout: Duration,
    probed: HashMap<String, Option<u16>>,
    attempts: Vec<Attempt>,
}

impl<'a, P: PortProbe> Run<'a, P> {
    fn new(prober: &'a P, protocol: Protocol, timeout: Duration) -> Self {
        Self {
            prober,
            protocol,
            ports: protocol.ports(),
            timeout,
            probed: HashMap::new(),
            attempts: Vec::new(),
        }
    }

    /// Probes `host` unless it was already probed in this call, in which case
    /// the earlier outcome stands.
    fn try_host(&mut self, host: &str, source: CandidateSource) -> Option<ServerSettings> {
        let port = match self.probed.get(host) {
            Some(port) => *port,
            None => {
                let port = self.prober.probe(host, &self.ports, self.timeout);
                tracing::debug!(host, %source, ?port, "candidate");
                self.probed.insert(host.to_string(), port);
                self.attempts.push(Attempt {
                    host: host.to_string(),
                    source,
                    port,
                });
                port
            }
        }?;

        let settings = self.protocol.settings_for(host, port);
        if settings.is_none() {
            tracing::warn!(
                host,
                port,
                protocol = %self.protocol,
                "probe answered with a port outside the table"
            );
        }
        settings
    }
}
