//! URL and input validation
//!
//! All inputs crossing the trust boundary go through this module before any
//! network or parse work happens. Rejections log a `security_event` warning
//! and return [`DocsError::Validation`]; logging never blocks the request.

use crate::error::DocsError;
use tracing::warn;
use url::Url;

/// Domains documentation may be fetched from
pub const ALLOWED_DOMAINS: &[&str] = &["docs.phaser.io", "phaser.io", "www.phaser.io"];

/// Maximum accepted URL length
const MAX_URL_LENGTH: usize = 2048;

/// Maximum sanitized input length
const MAX_INPUT_LENGTH: usize = 2048;

/// Maximum search query length
const MAX_QUERY_LENGTH: usize = 200;

/// Substrings rejected in query strings and fragments
const SUSPICIOUS_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:", "file:"];

/// Percent-encoded markers that could bypass path filters
const ENCODED_MARKERS: &[&str] = &["%00", "%2e%2e", "%2f%2f"];

/// Patterns rejected anywhere in a search query
const SUSPICIOUS_QUERY_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "data:",
    "vbscript:",
    "onload=",
    "onerror=",
    "eval(",
    "document.cookie",
    "window.location",
];

/// Validates URLs against the documentation domain allow-list
///
/// Relative inputs are resolved against the configured base URL before the
/// allow-list and injection checks run. The base URL's own host is treated
/// as allowed alongside the fixed domain list; pointing the base at a
/// different host is an operator decision.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    base_url: Url,
}

impl UrlValidator {
    /// Create a validator resolving relative inputs against `base_url`
    pub fn new(base_url: &str) -> Result<Self, DocsError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| DocsError::Validation(format!("Invalid base URL: {e}")))?;
        match base.scheme() {
            "http" | "https" => {}
            other => {
                return Err(DocsError::Validation(format!(
                    "Base URL must be http or https, got {other}"
                )))
            }
        }
        Ok(Self { base_url: base })
    }

    /// Base URL relative inputs are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Validate and normalize a URL, resolving relative inputs
    pub fn validate(&self, url: &str) -> Result<Url, DocsError> {
        if url.is_empty() {
            return Err(DocsError::Validation("URL cannot be empty".to_string()));
        }

        let resolved = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            // Treat everything else as a path relative to the base URL
            self.base_url
                .join(url)
                .map_err(|e| DocsError::Validation(format!("Invalid URL '{url}': {e}")))?
                .to_string()
        };

        if !self.is_allowed(&resolved) {
            return Err(DocsError::Validation(format!(
                "URL not from allowed domains: {url}"
            )));
        }

        Url::parse(&resolved).map_err(|e| DocsError::Validation(format!("Invalid URL: {e}")))
    }

    /// Check a URL against the allow-list and injection heuristics
    pub fn is_allowed(&self, url: &str) -> bool {
        if url.len() > MAX_URL_LENGTH {
            log_security_event("EXCESSIVE_URL_LENGTH", &format!("URL too long: {} characters", url.len()), url);
            return false;
        }

        if ENCODED_MARKERS.iter().any(|m| url.contains(m)) {
            log_security_event("ENCODED_ATTACK_ATTEMPT", "Encoded traversal marker detected", url);
            return false;
        }

        // Checked on the raw string: Url::parse normalizes `..` segments away
        if url.split('/').any(|segment| segment == "..") {
            log_security_event("PATH_TRAVERSAL_ATTEMPT", "Path traversal attempt detected", url);
            return false;
        }

        let parsed = match Url::parse(url) {
            Ok(p) => p,
            Err(e) => {
                log_security_event("URL_VALIDATION_ERROR", &format!("URL parse error: {e}"), url);
                return false;
            }
        };

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                log_security_event("INVALID_SCHEME", &format!("Invalid URL scheme: {other}"), url);
                return false;
            }
        }

        match parsed.host_str() {
            Some(host)
                if ALLOWED_DOMAINS.contains(&host)
                    || Some(host) == self.base_url.host_str() => {}
            Some(host) => {
                log_security_event("DOMAIN_VIOLATION", &format!("URL not from allowed domains: {host}"), url);
                return false;
            }
            None => {
                log_security_event("DOMAIN_VIOLATION", "URL has no host", url);
                return false;
            }
        }

        if let Some(query) = parsed.query() {
            let query_lower = query.to_lowercase();
            for scheme in SUSPICIOUS_SCHEMES {
                if query_lower.contains(scheme) {
                    log_security_event("SUSPICIOUS_QUERY_PARAM", &format!("Suspicious query parameter: {scheme}"), url);
                    return false;
                }
            }
        }

        if let Some(fragment) = parsed.fragment() {
            let fragment_lower = fragment.to_lowercase();
            // file: is a concern in queries only; fragments check the script schemes
            for scheme in &SUSPICIOUS_SCHEMES[..3] {
                if fragment_lower.contains(scheme) {
                    log_security_event("SUSPICIOUS_FRAGMENT", &format!("Suspicious fragment scheme: {scheme}"), url);
                    return false;
                }
            }
        }

        true
    }
}

/// Strip control characters (keeping tab/newline/CR) and cap the length
pub fn sanitize_input(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut sanitized: String = input
        .chars()
        .filter(|&c| c as u32 >= 32 || c == '\t' || c == '\n' || c == '\r')
        .collect();

    if sanitized.chars().count() > MAX_INPUT_LENGTH {
        warn!(
            original_len = sanitized.chars().count(),
            truncated_len = MAX_INPUT_LENGTH,
            "Input truncated"
        );
        sanitized = sanitized.chars().take(MAX_INPUT_LENGTH).collect();
    }

    sanitized.trim().to_string()
}

/// Validate a search query: sanitize, truncate to 200 chars, reject injections
///
/// Any denylist hit rejects the whole query; offending substrings are never
/// silently stripped.
pub fn validate_search_query(query: &str) -> Result<String, DocsError> {
    if query.is_empty() {
        return Err(DocsError::Validation(
            "Search query cannot be empty".to_string(),
        ));
    }

    let sanitized = sanitize_input(query);
    if sanitized.is_empty() {
        return Err(DocsError::Validation(
            "Search query is empty after sanitization".to_string(),
        ));
    }

    let truncated = if sanitized.chars().count() > MAX_QUERY_LENGTH {
        log_security_event(
            "QUERY_TRUNCATION",
            &format!(
                "Search query truncated from {} to {} characters",
                sanitized.chars().count(),
                MAX_QUERY_LENGTH
            ),
            "",
        );
        sanitized.chars().take(MAX_QUERY_LENGTH).collect()
    } else {
        sanitized
    };

    let query_lower = truncated.to_lowercase();
    for pattern in SUSPICIOUS_QUERY_PATTERNS {
        if query_lower.contains(pattern) {
            log_security_event("SUSPICIOUS_QUERY_PATTERN", &format!("Suspicious pattern detected: {pattern}"), query);
            return Err(DocsError::Validation(format!(
                "Suspicious pattern detected in search query: {pattern}"
            )));
        }
    }

    Ok(truncated)
}

/// Emit a structured security event; fire-and-forget, never fails the caller
fn log_security_event(category: &str, details: &str, url: &str) {
    if url.is_empty() {
        warn!(security_event = category, "{details}");
    } else {
        warn!(security_event = category, url = %url, "{details}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> UrlValidator {
        UrlValidator::new("https://docs.phaser.io").unwrap()
    }

    #[test]
    fn test_allowed_url_roundtrips_unchanged() {
        let v = validator();
        let url = "https://docs.phaser.io/api/Phaser.Game";
        assert_eq!(v.validate(url).unwrap().as_str(), url);
    }

    #[test]
    fn test_rejects_foreign_domains() {
        let v = validator();
        assert!(v.validate("https://evil.com/phaser").is_err());
        assert!(v.validate("https://docs.phaser.io.evil.com/").is_err());
    }

    #[test]
    fn test_rejects_bad_schemes() {
        let v = validator();
        assert!(v.validate("ftp://docs.phaser.io/page").is_err());
        assert!(v.validate("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_resolves_relative_urls() {
        let v = validator();
        assert_eq!(
            v.validate("/getting-started").unwrap().as_str(),
            "https://docs.phaser.io/getting-started"
        );
        assert_eq!(
            v.validate("scenes").unwrap().as_str(),
            "https://docs.phaser.io/scenes"
        );
    }

    #[test]
    fn test_rejects_path_traversal() {
        let v = validator();
        assert!(v.validate("https://docs.phaser.io/../etc/passwd").is_err());
        assert!(v.validate("https://docs.phaser.io/a/%2e%2e/b").is_err());
        assert!(v.validate("https://docs.phaser.io/a%00b").is_err());
    }

    #[test]
    fn test_rejects_suspicious_query_and_fragment() {
        let v = validator();
        assert!(v
            .validate("https://docs.phaser.io/page?next=javascript:alert(1)")
            .is_err());
        assert!(v
            .validate("https://docs.phaser.io/page#data:text/html,x")
            .is_err());
    }

    #[test]
    fn test_rejects_oversized_url() {
        let v = validator();
        let url = format!("https://docs.phaser.io/{}", "a".repeat(2100));
        assert!(v.validate(&url).is_err());
    }

    #[test]
    fn test_base_url_scheme_checked() {
        assert!(UrlValidator::new("ftp://docs.phaser.io").is_err());
        assert!(UrlValidator::new("https://docs.phaser.io").is_ok());
    }

    #[test]
    fn test_base_host_joins_allow_list() {
        let v = UrlValidator::new("http://127.0.0.1:9999").unwrap();
        assert!(v.validate("http://127.0.0.1:9999/page").is_ok());
        assert!(v.validate("https://docs.phaser.io/page").is_ok());
        assert!(v.validate("https://evil.com/page").is_err());
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_input("abc\x00def\x07ghi"), "abcdefghi");
        assert_eq!(sanitize_input("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn test_sanitize_truncates_to_2048() {
        let long = "x".repeat(3000);
        assert_eq!(sanitize_input(&long).chars().count(), 2048);
    }

    #[test]
    fn test_query_truncated_to_200() {
        let long = "q".repeat(250);
        assert_eq!(validate_search_query(&long).unwrap().chars().count(), 200);
    }

    #[test]
    fn test_query_rejects_injection_patterns() {
        assert!(validate_search_query("sprite <script>alert(1)</script>").is_err());
        assert!(validate_search_query("eval(document.cookie)").is_err());
        assert!(validate_search_query("how to use onload= handler").is_err());
        assert!(validate_search_query("sprite animation").is_ok());
    }

    #[test]
    fn test_query_empty_after_sanitization() {
        assert!(validate_search_query("\x00\x01").is_err());
        assert!(validate_search_query("").is_err());
    }
}
