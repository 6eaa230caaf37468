//! Keyless provider backed by DuckDuckGo's HTML-only results page.
//!
//! Used when no Custom Search key is configured. Results carry the same
//! title and snippet defaults as the Google provider so downstream stages
//! never see an empty title.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;
use crate::types::ProviderItem;

/// Production HTML endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

const RESULT_SELECTOR: &str =
    "div.result:not(.result--ad), div.web-result:not(.result--ad)";
const LINK_SELECTOR: &str = "a.result__a";
const SNIPPET_SELECTOR: &str = ".result__snippet";

/// DuckDuckGo HTML scraper.
#[derive(Debug, Clone)]
pub struct DuckDuckGo {
    endpoint: String,
    timeout: Duration,
}

impl DuckDuckGo {
    /// Scraper against [`DEFAULT_ENDPOINT`].
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, timeout)
    }

    /// Scraper against another endpoint, e.g. a local mock.
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

impl SearchProvider for DuckDuckGo {
    async fn query(&self, text: &str, count: usize) -> Result<Vec<ProviderItem>, SearchError> {
        tracing::trace!(query = text, "duckduckgo search");
        let client = http::build_scrape_client(self.timeout)?;
        let response = client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .form(&[("q", text)])
            .send()
            .await
            .map_err(|e| SearchError::Provider(format!("duckduckgo: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Provider(format!("duckduckgo: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Provider(format!("duckduckgo body: {e}")))?;
        let items = parse_results(&body, count)?;
        tracing::debug!(count = items.len(), "duckduckgo results");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "DuckDuckGo"
    }
}

/// Resolve a result link to its target.
///
/// Links are either direct or wrapped as `//duckduckgo.com/l/?uddg=<target>`.
/// Returns `None` for anything that is not an absolute URL.
pub(crate) fn unwrap_redirect(href: &str) -> Option<String> {
    let absolute = match href.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")).ok()?,
        None => Url::parse(href).ok()?,
    };

    let is_redirect = absolute
        .host_str()
        .is_some_and(|host| host.ends_with("duckduckgo.com"))
        && absolute.path().starts_with("/l/");
    if !is_redirect {
        return Some(absolute.into());
    }

    absolute
        .query_pairs()
        .find_map(|(key, value)| (key == "uddg").then(|| value.into_owned()))
}

/// Parse a results page into at most `limit` items, skipping sponsored ones.
pub(crate) fn parse_results(html: &str, limit: usize) -> Result<Vec<ProviderItem>, SearchError> {
    let selector = |css: &str| {
        Selector::parse(css).map_err(|e| SearchError::Parse(format!("selector {css}: {e:?}")))
    };
    let result_sel = selector(RESULT_SELECTOR)?;
    let link_sel = selector(LINK_SELECTOR)?;
    let snippet_sel = selector(SNIPPET_SELECTOR)?;

    let document = Html::parse_document(html);
    let items = document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let url = unwrap_redirect(link.value().attr("href")?)?;
            let title = text_of(link);
            let snippet = result.select(&snippet_sel).next().map(text_of).unwrap_or_default();
            Some(ProviderItem {
                title: if title.is_empty() { "Untitled".into() } else { title },
                url,
                snippet: if snippet.is_empty() {
                    "No preview available".into()
                } else {
                    snippet
                },
            })
        })
        .take(limit)
        .collect();
    Ok(items)
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div class="result results_links web-result result--ad">
  <a class="result__a" href="https://ads.example.com/">Sponsored phones</a>
  <div class="result__snippet">Buy now.</div>
</div>
<div class="result results_links web-result">
  <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.daraz.com.np%2Fsmartphones%2F&amp;rut=abc123">
    Smartphones | Daraz Nepal
  </a>
  <div class="result__snippet">Shop the latest smartphones at the
    best price in Nepal.</div>
</div>
<div class="result results_links web-result">
  <a class="result__a" href="https://www.hamropatro.com/gold">Gold and silver rates</a>
  <div class="result__snippet">Today's gold rate in Nepal.</div>
</div>
<div class="result results_links web-result">
  <a class="result__a" href="/relative/only">Broken link</a>
</div>
<div class="result results_links web-result">
  <a class="result__a" href="https://en.wikipedia.org/wiki/Nepal"></a>
</div>
</body></html>"#;

    #[test]
    fn redirect_wrapper_is_unwrapped() {
        assert_eq!(
            unwrap_redirect("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc").as_deref(),
            Some("https://example.com/page")
        );
    }

    #[test]
    fn direct_links_pass_through() {
        assert_eq!(
            unwrap_redirect("https://example.com/direct").as_deref(),
            Some("https://example.com/direct")
        );
    }

    #[test]
    fn relative_links_rejected() {
        assert_eq!(unwrap_redirect("/relative/only"), None);
        assert_eq!(unwrap_redirect("//duckduckgo.com/l/?rut=abc"), None);
    }

    #[test]
    fn ads_and_unresolvable_links_skipped() {
        let items = parse_results(RESULTS_PAGE, 10).expect("parse");
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://www.daraz.com.np/smartphones/",
                "https://www.hamropatro.com/gold",
                "https://en.wikipedia.org/wiki/Nepal",
            ]
        );
        assert_eq!(items[0].title, "Smartphones | Daraz Nepal");
        assert_eq!(items[0].snippet, "Shop the latest smartphones at the best price in Nepal.");
    }

    #[test]
    fn missing_title_and_snippet_get_defaults() {
        let items = parse_results(RESULTS_PAGE, 10).expect("parse");
        assert_eq!(items[2].title, "Untitled");
        assert_eq!(items[2].snippet, "No preview available");
    }

    #[test]
    fn limit_applies_after_filtering() {
        let items = parse_results(RESULTS_PAGE, 2).expect("parse");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].url, "https://www.hamropatro.com/gold");
        assert!(parse_results("<html></html>", 10).expect("parse").is_empty());
    }

    #[tokio::test]
    async fn posts_query_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("q=phone+price"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let provider = DuckDuckGo::with_endpoint(server.uri(), Duration::from_secs(5));
        let items = provider.query("phone price", 10).await.expect("query");
        assert_eq!(items.len(), 3);
        assert_eq!(provider.name(), "DuckDuckGo");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn query_text_stays_out_of_debug_logs() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let provider = DuckDuckGo::with_endpoint(server.uri(), Duration::from_secs(5));
        provider.query("himalayan saffron wholesale", 10).await.expect("query");

        let output = String::from_utf8(logs.0.lock().expect("lock").clone()).expect("utf8");
        assert!(output.contains("duckduckgo results"), "{output}");
        assert!(!output.contains("himalayan saffron"), "{output}");
    }

    #[tokio::test]
    async fn non_success_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = DuckDuckGo::with_endpoint(server.uri(), Duration::from_secs(5));
        let err = provider.query("q", 10).await.unwrap_err();
        assert!(matches!(err, SearchError::Provider(_)));
    }

    #[tokio::test]
    #[ignore] // hits the live endpoint
    async fn live_search() {
        let provider = DuckDuckGo::new(Duration::from_secs(8));
        let items = provider.query("kathmandu weather", 5).await.expect("live search");
        assert!(!items.is_empty());
    }
}
