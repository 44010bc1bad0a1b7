/// atext (RFC 5322) minus alphanumerics, plus '.' for dot-atom.
const ATEXT_SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~.";

/// Règles strictes: dot-atom ASCII, '.' non initial/terminal, pas de "..".
pub(crate) fn is_local_strict(s: &str) -> bool {
    if s.starts_with('.') || s.ends_with('.') || s.contains("..") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || ATEXT_SPECIALS.contains(c))
}

/// Règles relaxed: autorise une quoted-string simple,
/// sinon retombe sur `is_local_strict`.
pub(crate) fn is_local_relaxed(s: &str) -> bool {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        !s[1..s.len() - 1].contains(['"', '\r', '\n'])
    } else {
        is_local_strict(s)
    }
}
