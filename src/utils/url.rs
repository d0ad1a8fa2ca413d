//! URL utilities for source handling
//!
//! Parsing, cache normalization and log-safe rendering of source URLs.

use url::Url;

/// Query parameters whose values never reach the logs
const SENSITIVE_PARAMS: [&str; 7] = [
    "username", "password", "user", "pass", "pwd", "passwd", "token",
];

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Parse a source URL, accepting only absolute `http` and `https` URLs
    ///
    /// # Examples
    ///
    /// ```rust
    /// use png_fingerprint::utils::url::UrlUtils;
    ///
    /// assert!(UrlUtils::parse_source_url("https://example.com/skin.png").is_ok());
    /// assert!(UrlUtils::parse_source_url("ftp://example.com/skin.png").is_err());
    /// assert!(UrlUtils::parse_source_url("/relative/skin.png").is_err());
    /// ```
    pub fn parse_source_url(raw: &str) -> Result<Url, String> {
        let parsed = Url::parse(raw.trim()).map_err(|e| format!("'{raw}': {e}"))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(format!("unsupported scheme '{other}'")),
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(format!("'{raw}': missing host"));
        }

        Ok(parsed)
    }

    /// Drop the query string and fragment, keeping everything else verbatim
    ///
    /// # Examples
    ///
    /// ```rust
    /// use png_fingerprint::utils::url::UrlUtils;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://x/img.png?a=1#frag").unwrap();
    /// assert_eq!(UrlUtils::strip_query_and_fragment(&url), "http://x/img.png");
    /// ```
    pub fn strip_query_and_fragment(url: &Url) -> String {
        let mut stripped = url.clone();
        stripped.set_query(None);
        stripped.set_fragment(None);
        stripped.to_string()
    }

    /// Render a URL with credentials masked, for logging
    pub fn obfuscate_credentials(raw: &str) -> String {
        let Ok(mut parsed) = Url::parse(raw) else {
            return raw.to_string();
        };

        if !parsed.username().is_empty() || parsed.password().is_some() {
            let _ = parsed.set_username("****");
            let _ = parsed.set_password(Some("****"));
        }

        if parsed.query().is_some() {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(key, value)| {
                    let masked = SENSITIVE_PARAMS
                        .iter()
                        .any(|p| key.eq_ignore_ascii_case(p));
                    let value = if masked { "****".to_string() } else { value.into_owned() };
                    (key.into_owned(), value)
                })
                .collect();
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
        }

        parsed.to_string()
    }
}
