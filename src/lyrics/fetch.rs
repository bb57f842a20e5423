use crate::config::{HttpConfig, ScrapeConfig};
use crate::error::ProviderError;
use crate::retry::RetryPolicy;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Source of song page HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_html(&self, page_url: &str) -> Result<String, ProviderError>;
}

/// Fetches song pages directly or through a scraping proxy, retrying
/// the transient failures that are common when scraping.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    proxy_template: Option<String>,
    proxy_key: Option<String>,
    retry: RetryPolicy,
}

impl PageFetcher {
    const BROWSER_USER_AGENT: &'static str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

    pub fn new(
        http: &HttpConfig,
        scrape: &ScrapeConfig,
        proxy_key: Option<String>,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(Self::BROWSER_USER_AGENT)
            .timeout(http.timeout())
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            proxy_template: scrape.proxy_template.clone().filter(|t| !t.is_empty()),
            proxy_key: proxy_key.filter(|k| !k.is_empty()),
            retry,
        })
    }

    /// URL actually requested for `page_url`, after proxy substitution.
    pub fn request_url(&self, page_url: &str) -> String {
        match &self.proxy_template {
            Some(template) => template
                .replace("{url}", &urlencoding::encode(page_url))
                .replace(
                    "{key}",
                    &urlencoding::encode(self.proxy_key.as_deref().unwrap_or_default()),
                ),
            None => page_url.to_string(),
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ProviderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }
        Ok(response.text().await?)
    }
}

/// Anti-bot walls answer 403 and usually let the next attempt through.
fn retryable_scrape(e: &ProviderError) -> bool {
    e.is_transient() || matches!(e, ProviderError::Status(s) if *s == StatusCode::FORBIDDEN)
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_html(&self, page_url: &str) -> Result<String, ProviderError> {
        let url = self.request_url(page_url);
        let url = url.as_str();
        self.retry
            .run(
                move |attempt| {
                    debug!(attempt, page_url, "fetching song page");
                    self.fetch_once(url)
                },
                retryable_scrape,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(template: Option<&str>, key: Option<&str>) -> PageFetcher {
        let scrape = ScrapeConfig {
            proxy_template: template.map(str::to_string),
            ..ScrapeConfig::default()
        };
        PageFetcher::new(
            &HttpConfig::default(),
            &scrape,
            key.map(str::to_string),
            RetryPolicy::none(),
        )
        .unwrap()
    }

    #[test]
    fn test_direct_url() {
        let f = fetcher(None, None);
        assert_eq!(
            f.request_url("https://genius.com/Drake-gods-plan-lyrics"),
            "https://genius.com/Drake-gods-plan-lyrics"
        );
    }

    #[test]
    fn test_proxy_template() {
        let f = fetcher(
            Some("http://api.scraperapi.com?api_key={key}&url={url}&render=false"),
            Some("k&1"),
        );
        assert_eq!(
            f.request_url("https://genius.com/a?b=c"),
            "http://api.scraperapi.com?api_key=k%261&url=https%3A%2F%2Fgenius.com%2Fa%3Fb%3Dc&render=false"
        );
    }

    #[test]
    fn test_empty_template_means_direct() {
        let f = fetcher(Some(""), Some("k"));
        assert_eq!(f.request_url("https://genius.com/x"), "https://genius.com/x");
    }

    #[test]
    fn test_forbidden_is_retryable_for_scraping() {
        assert!(retryable_scrape(&ProviderError::Status(StatusCode::FORBIDDEN)));
        assert!(!retryable_scrape(&ProviderError::Status(StatusCode::NOT_FOUND)));
    }
}
