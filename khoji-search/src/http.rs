//! HTTP client construction with User-Agent rotation.
//!
//! Page fetches and the keyless search provider use a browser-like client
//! with a rotating desktop User-Agent.

use std::time::Duration;

use rand::seq::SliceRandom;

use crate::config::ExtractionConfig;
use crate::error::SearchError;

/// Desktop browser User-Agent strings, one picked per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
];

/// `Accept` header sent with page fetches.
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Build the client shared by one extraction batch.
///
/// The client carries the per-request timeout, a rotated (or configured)
/// User-Agent and the default `Accept`, `Accept-Language` and `Referer`
/// headers. Certificate validation stays on unless
/// [`ExtractionConfig::accept_invalid_certs`] is set.
///
/// # Errors
///
/// Returns [`SearchError::Fetch`] if the client cannot be constructed.
pub fn build_fetch_client(config: &ExtractionConfig) -> Result<reqwest::Client, SearchError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static(ACCEPT_HTML),
    );
    insert_header(&mut headers, reqwest::header::ACCEPT_LANGUAGE, &config.accept_language)?;
    insert_header(&mut headers, reqwest::header::REFERER, &config.referer)?;

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .default_headers(headers)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Fetch(format!("failed to build HTTP client: {e}")))
}

/// Build a browser-like client for scraping a search engine.
///
/// # Errors
///
/// Returns [`SearchError::Provider`] if the client cannot be constructed.
pub fn build_scrape_client(timeout: Duration) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(timeout)
        .user_agent(random_user_agent())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Provider(format!("failed to build HTTP client: {e}")))
}

fn insert_header(
    headers: &mut reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
    value: &str,
) -> Result<(), SearchError> {
    let value = reqwest::header::HeaderValue::from_str(value)
        .map_err(|e| SearchError::Config(format!("invalid {name} header: {e}")))?;
    headers.insert(name, value);
    Ok(())
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_user_agent_returns_desktop_ua() {
        let ua = random_user_agent();
        assert!(USER_AGENTS.contains(&ua));
        assert!(ua.contains("Mozilla/5.0"));
    }

    #[test]
    fn build_fetch_client_with_defaults() {
        assert!(build_fetch_client(&ExtractionConfig::default()).is_ok());
    }

    #[test]
    fn build_fetch_client_with_custom_ua_and_insecure_tls() {
        let config = ExtractionConfig {
            user_agent: Some("CustomBot/1.0".into()),
            accept_invalid_certs: true,
            ..Default::default()
        };
        assert!(build_fetch_client(&config).is_ok());
    }

    #[test]
    fn invalid_header_value_is_config_error() {
        let config = ExtractionConfig {
            referer: "bad\nvalue".into(),
            ..Default::default()
        };
        let err = build_fetch_client(&config).unwrap_err();
        assert!(err.to_string().contains("config error"));
    }

    #[test]
    fn build_scrape_client_ok() {
        assert!(build_scrape_client(Duration::from_secs(5)).is_ok());
    }
}
