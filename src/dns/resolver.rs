use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use trust_dns_resolver::{
    Resolver,
    error::{ResolveError, ResolveErrorKind},
    system_conf::read_system_conf,
};

use super::{Error, LookupKind, MxRecord, MxStatus};

/// DNS queries needed by discovery. "No records" is an empty `Ok`, not an
/// error.
pub trait MailDns {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError>;
    fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
    fn reverse_lookup(&self, ip: IpAddr) -> Result<Vec<String>, ResolveError>;
}

/// System resolver configuration with a single attempt per query bounded by
/// `timeout`. Cheap to clone.
#[derive(Clone)]
pub struct SystemDns {
    resolver: Arc<Resolver>,
}

impl SystemDns {
    pub fn from_system_conf(timeout: Duration) -> Result<Self, Error> {
        let (config, mut opts) = read_system_conf().map_err(Error::resolver_init)?;
        opts.timeout = timeout;
        opts.attempts = 1;
        let resolver = Resolver::new(config, opts).map_err(Error::resolver_init)?;
        Ok(Self {
            resolver: Arc::new(resolver),
        })
    }
}

impl std::fmt::Debug for SystemDns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemDns").finish_non_exhaustive()
    }
}

impl MailDns for SystemDns {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        let lookup = match self.resolver.mx_lookup(domain) {
            Ok(lookup) => lookup,
            Err(err) if is_no_records(&err) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        Ok(lookup
            .iter()
            .map(|mx| {
                let exchange = normalize_name(&mx.exchange().to_utf8());
                MxRecord::new(mx.preference(), exchange)
            })
            .collect())
    }

    fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        match self.resolver.lookup_ip(host) {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(err) if is_no_records(&err) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn reverse_lookup(&self, ip: IpAddr) -> Result<Vec<String>, ResolveError> {
        match self.resolver.reverse_lookup(ip) {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|ptr| normalize_name(&ptr.to_string()))
                .collect()),
            Err(err) if is_no_records(&err) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

/// Lookup MX records for `domain` using the system resolver.
///
/// The domain is normalized via IDNA before querying DNS. The resulting
/// [`MxStatus`] contains the sorted list of records (ascending preference).
pub fn check_mx(domain: &str) -> Result<MxStatus, Error> {
    check_mx_with_timeout(domain, Duration::from_millis(3_000))
}

/// [`check_mx`] with an explicit per-query deadline.
pub fn check_mx_with_timeout(domain: &str, timeout: Duration) -> Result<MxStatus, Error> {
    let ascii = normalize_domain(domain)?;
    let dns = SystemDns::from_system_conf(timeout)?;
    resolve_with(&dns, &ascii)
}

pub(crate) fn resolve_with<R>(resolver: &R, ascii_domain: &str) -> Result<MxStatus, Error>
where
    R: MailDns + ?Sized,
{
    let mut records = resolver
        .lookup_mx(ascii_domain)
        .map_err(|err| Error::lookup(LookupKind::Mx, ascii_domain, err))?;

    // RFC 7505 null MX ("."), normalised to an empty exchange.
    records.retain(|r| !r.exchange.is_empty());
    records.sort();
    records.dedup();

    if records.is_empty() {
        Ok(MxStatus::NoRecords)
    } else {
        Ok(MxStatus::Records(records))
    }
}

/// Most preferred MX exchange for `domain`. Lookup failures count as "no MX".
pub(crate) fn top_mx<R>(resolver: &R, ascii_domain: &str) -> Option<String>
where
    R: MailDns + ?Sized,
{
    match resolve_with(resolver, ascii_domain) {
        Ok(status) => status.top().map(str::to_string),
        Err(err) => {
            tracing::debug!(error = %err, "treated as no MX");
            None
        }
    }
}

/// First address of `host`, IPv4 preferred.
pub(crate) fn forward_lookup<R>(resolver: &R, host: &str) -> Option<IpAddr>
where
    R: MailDns + ?Sized,
{
    match resolver.lookup_ip(host) {
        Ok(addrs) => addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied(),
        Err(err) => {
            let err = Error::lookup(LookupKind::Address, host, err);
            tracing::debug!(error = %err, "reverse MX step skipped");
            None
        }
    }
}

/// First non-empty PTR name of `ip`.
pub(crate) fn reverse_name<R>(resolver: &R, ip: IpAddr) -> Option<String>
where
    R: MailDns + ?Sized,
{
    match resolver.reverse_lookup(ip) {
        Ok(names) => names.into_iter().find(|name| !name.is_empty()),
        Err(err) => {
            let err = Error::lookup(LookupKind::Ptr, ip.to_string(), err);
            tracing::debug!(error = %err, "reverse MX step skipped");
            None
        }
    }
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(|err| Error::idna(trimmed, err))
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}
