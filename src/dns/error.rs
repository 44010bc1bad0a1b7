use std::fmt;

use thiserror::Error;
use trust_dns_resolver::error::ResolveError;

/// Record family of a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Mx,
    Address,
    Ptr,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LookupKind::Mx => "MX",
            LookupKind::Address => "A/AAAA",
            LookupKind::Ptr => "PTR",
        })
    }
}

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("domain '{domain}' IDNA conversion failed")]
    IdnaConversion {
        domain: String,
        #[source]
        source: idna::Errors,
    },
    #[error("cannot read system resolver configuration: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
    #[error("{kind} lookup for {name} failed: {source}")]
    Lookup {
        kind: LookupKind,
        name: String,
        #[source]
        source: ResolveError,
    },
}

impl DnsError {
    pub(crate) fn idna(domain: &str, source: idna::Errors) -> Self {
        Self::IdnaConversion {
            domain: domain.to_string(),
            source,
        }
    }

    pub(crate) fn resolver_init(source: std::io::Error) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn lookup(kind: LookupKind, name: impl Into<String>, source: ResolveError) -> Self {
        Self::Lookup {
            kind,
            name: name.into(),
            source,
        }
    }

    /// Record family, for lookup failures.
    pub fn kind(&self) -> Option<LookupKind> {
        match self {
            Self::Lookup { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
