use thiserror::Error;

/// Failures while constructing a network adapter.
///
/// Request-time failures use the trait error types instead
/// ([`RouteError`](rakhwala_core::RouteError),
/// [`RemoteError`](rakhwala_core::RemoteError)).
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configured base URL could not be parsed or cannot carry a path.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// HTTP client could not be built (TLS backend initialisation).
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Parse `url` as a base that later path segments are appended to.
pub(crate) fn parse_base(url: &str) -> Result<reqwest::Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl { url: url.to_string(), reason };

    let mut base = reqwest::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("url cannot be a base".to_string()));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_gains_trailing_slash() {
        let base = parse_base("http://127.0.0.1:8080/api").unwrap();
        assert_eq!(base.as_str(), "http://127.0.0.1:8080/api/");

        let base = parse_base("https://example.com").unwrap();
        assert_eq!(base.as_str(), "https://example.com/");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(matches!(parse_base("not a url"), Err(ClientError::InvalidUrl { .. })));
        assert!(matches!(parse_base("mailto:someone@example.com"), Err(ClientError::InvalidUrl { .. })));
    }
}
