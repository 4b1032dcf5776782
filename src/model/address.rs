//! Email address normalization.
//!
//! All graph lookups are keyed by normalized addresses, so every raw
//! header value passes through here exactly once on its way in.
//!
//! # Examples
//! - `"Juan García <Juan@Ejemplo.com>"` → `"juan@ejemplo.com"`
//! - `"  USER@EXAMPLE.COM "` → `"user@example.com"`
//! - `"not an address"` → `""` (callers treat empty as "no address")

/// The parts of a single email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailParts {
    /// The bare normalized address (`user@domain`).
    pub address: String,
    /// The domain half (`domain`).
    pub domain: String,
    /// Display name: explicit from `"Name <addr>"`, otherwise rebuilt
    /// from the local part (`john.doe` → `"John Doe"`).
    pub display_name: String,
}

/// Normalize a raw header value into a bare lowercase address.
///
/// Extracts the address from `"Display Name <addr>"` forms, lowercases,
/// and trims. Returns an empty string for input that does not contain
/// an `@` after extraction — never treat an empty result as a valid key.
pub fn normalize_email(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let candidate = match (trimmed.rfind('<'), trimmed.rfind('>')) {
        (Some(start), Some(end)) if end > start => trimmed[start + 1..end].trim(),
        _ => trimmed,
    };

    if !candidate.contains('@') {
        return String::new();
    }

    candidate.to_lowercase()
}

/// Split a raw address into `(address, domain, display_name)`.
///
/// Returns `None` when no `@` is present after extraction. When the raw
/// value carries no explicit display name, one is reconstructed from the
/// local part by splitting on `.` and `_` and capitalizing each word.
pub fn extract_email_parts(raw: &str) -> Option<EmailParts> {
    let trimmed = raw.trim();
    let address = normalize_email(trimmed);
    if address.is_empty() {
        return None;
    }

    let (local, domain) = address.split_once('@')?;

    let explicit_name = match trimmed.rfind('<') {
        Some(start) => strip_quotes(trimmed[..start].trim()),
        None => String::new(),
    };

    let display_name = if explicit_name.is_empty() {
        display_name_from_local(local)
    } else {
        explicit_name
    };

    Some(EmailParts {
        address: address.clone(),
        domain: domain.to_string(),
        display_name,
    })
}

/// Split a multi-value header field into individual trimmed entries.
///
/// Drops empty segments. Does **not** deduplicate — set semantics are the
/// caller's responsibility where needed (thread participants dedup,
/// message to/cc/bcc lists do not).
pub fn split_address_list(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Rebuild a human-readable name from a local part: `"john.doe"` → `"John Doe"`.
fn display_name_from_local(local: &str) -> String {
    local
        .split(['.', '_'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}
