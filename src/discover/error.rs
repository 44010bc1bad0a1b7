use thiserror::Error;

use crate::dns::Error as DnsError;

/// Errors escaping a discovery. Network failures never appear here: they
/// only make a candidate fail.
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("invalid email address '{email}': {}", reasons.join("; "))]
    InvalidEmail { email: String, reasons: Vec<String> },
    #[error(transparent)]
    Dns(#[from] DnsError),
}

impl DiscoverError {
    pub(crate) fn invalid_email(email: &str, reasons: Vec<String>) -> Self {
        Self::InvalidEmail {
            email: email.to_string(),
            reasons,
        }
    }
}
