#![forbid(unsafe_code)]
//! maildiscover_lib — IMAP/SMTP server discovery for an email address
//!
//! Guesses conventional hostnames (`imap.`, `smtp.`, `mail.`, ...), falls back
//! on the domain's MX host, and keeps the first candidate accepting a TCP
//! connection on one of the protocol's ports.

pub mod validator;
pub use validator::{
    NormalizedEmail, ValidationMode, ValidationReport, normalize_email, validate_email,
};

pub mod dns;
pub use dns::{
    Error as DnsError, LookupKind, MailDns, MxRecord, MxStatus, SystemDns, check_mx,
    check_mx_with_timeout,
};

pub mod probe;
pub use probe::{PortProbe, TcpProbe};

pub mod discover;
pub use discover::{
    Attempt, CandidateSource, Discover, DiscoverError, DiscoverOptions, Discovery, Encryption,
    MxInfo, Protocol, ServerSettings, discover_imap, discover_imap_with_options, discover_smtp,
    discover_smtp_with_options, root_domain,
};
