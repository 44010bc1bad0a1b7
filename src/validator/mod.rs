mod domain;
mod local;
mod types;

pub use types::{NormalizedEmail, ValidationMode, ValidationReport};

use domain::check_domain;
use local::{is_local_relaxed, is_local_strict};

pub fn validate_email(email: &str, mode: ValidationMode) -> ValidationReport {
    let normalized = normalize_email(email, mode);
    ValidationReport {
        ok: normalized.valid,
        reasons: normalized.reasons,
    }
}

/// Valide et renvoie une *sortie normalisée*
/// (local, domaine en minuscules, domaine ASCII).
/// L'adresse est découpée même si elle est invalide.
pub fn normalize_email(email: &str, mode: ValidationMode) -> NormalizedEmail {
    let input = email.trim();
    let mut reasons = Vec::new();

    if input.len() > 254 {
        reasons.push(format!("total length {} > 254", input.len()));
    }

    let (local, domain) = match input.split_once('@') {
        Some((l, d)) if !d.contains('@') => (l, d),
        _ => {
            reasons.push("must contain exactly one '@'".to_string());
            return NormalizedEmail {
                original: email.to_string(),
                local: String::new(),
                domain: String::new(),
                ascii_domain: String::new(),
                mode,
                valid: false,
                reasons,
            };
        }
    };

    if local.is_empty() || local.len() > 64 {
        reasons.push(format!(
            "local part length {} invalid (1..=64)",
            local.len()
        ));
    }

    let ascii_domain = check_domain(domain, &mut reasons).unwrap_or_default();

    let local_ok = match mode {
        ValidationMode::Strict => is_local_strict(local),
        ValidationMode::Relaxed => is_local_relaxed(local),
    };
    if !local_ok {
        reasons.push(match mode {
            ValidationMode::Strict => "invalid local part (strict rules)".into(),
            ValidationMode::Relaxed => "invalid local part (relaxed rules)".into(),
        });
    }

    NormalizedEmail {
        original: email.to_string(),
        local: local.to_string(),
        domain: domain.to_lowercase(),
        ascii_domain,
        mode,
        valid: reasons.is_empty(),
        reasons,
    }
}
