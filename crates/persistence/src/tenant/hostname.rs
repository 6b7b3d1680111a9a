//! Hostname normalization for domain lookups.

/// Maximum length of a DNS name.
const MAX_HOSTNAME_LEN: usize = 253;

/// Normalizes an inbound `Host` value or a configured domain for comparison.
///
/// Trims whitespace, lowercases, strips a port (including the bracketed
/// IPv6 form `[::1]:8080`) and a trailing root dot. Returns `None` when the
/// result is empty or contains characters that cannot appear in a hostname.
///
/// # Examples
///
/// ```
/// use siteforge_persistence::tenant::normalize_hostname;
///
/// assert_eq!(normalize_hostname("Example.COM:8080").as_deref(), Some("example.com"));
/// assert_eq!(normalize_hostname("[::1]:3000").as_deref(), Some("::1"));
/// assert_eq!(normalize_hostname("  "), None);
/// ```
pub fn normalize_hostname(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_ascii_lowercase();

    let host = if let Some(rest) = trimmed.strip_prefix('[') {
        // [v6]:port or [v6]
        let end = rest.find(']')?;
        let after = &rest[end + 1..];
        if !after.is_empty() && !is_port_suffix(after) {
            return None;
        }
        &rest[..end]
    } else if trimmed.matches(':').count() == 1 {
        let (host, port) = trimmed.split_once(':')?;
        if !is_port_suffix(&format!(":{}", port)) {
            return None;
        }
        host
    } else {
        trimmed.as_str()
    };

    let host = host.strip_suffix('.').unwrap_or(host);

    if host.is_empty() || host.len() > MAX_HOSTNAME_LEN {
        return None;
    }

    let is_ipv6 = host.contains(':');
    let valid = if is_ipv6 {
        host.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
    } else {
        host.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !host.starts_with('.')
            && !host.starts_with('-')
            && !host.contains("..")
    };

    valid.then(|| host.to_string())
}

fn is_port_suffix(s: &str) -> bool {
    s.strip_prefix(':')
        .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
}
