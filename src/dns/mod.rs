//! DNS collaborator for discovery: MX, forward and reverse lookups.
//!
//! [`SystemDns`] wraps the system resolver with an explicit per-query
//! timeout. [`check_mx`] is a standalone helper listing the MX records of a
//! domain, sorted by preference.

mod error;
mod resolver;
mod types;

pub use error::{DnsError as Error, LookupKind};
pub use resolver::{MailDns, SystemDns, check_mx, check_mx_with_timeout};
pub use types::{MxRecord, MxStatus};

pub(crate) use resolver::{forward_lookup, normalize_name, reverse_name, top_mx};
