/// Valide le domaine: conversion IDNA + checks de labels.
/// Push des raisons invalidantes dans `reasons`; renvoie la forme ASCII
/// dès que la conversion elle-même a réussi.
pub(crate) fn check_domain(domain: &str, reasons: &mut Vec<String>) -> Option<String> {
    let ascii = match idna::domain_to_ascii(domain) {
        Ok(d) => d,
        Err(_) => {
            reasons.push("domain punycode conversion failed".to_string());
            return None;
        }
    };

    if ascii.is_empty() {
        reasons.push("domain empty after IDNA conversion".to_string());
        return None;
    }

    if ascii.len() > 253 {
        reasons.push(format!("domain length {} > 253", ascii.len()));
    }

    // au moins un point
    if !ascii.contains('.') {
        reasons.push("domain must contain at least one dot".to_string());
    }

    for label in ascii.split('.') {
        check_label(label, reasons);
    }

    Some(ascii)
}

fn check_label(label: &str, reasons: &mut Vec<String>) {
    if label.is_empty() {
        reasons.push("empty domain label".to_string());
        return;
    }
    if label.len() > 63 {
        reasons.push(format!("domain label '{label}' length {} > 63", label.len()));
    }
    if label.starts_with('-') || label.ends_with('-') {
        reasons.push(format!("domain label '{label}' cannot start/end with '-'"));
    }
    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        reasons.push(format!("domain label '{label}' has invalid chars"));
    }
}
