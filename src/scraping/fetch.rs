use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::Html;

use crate::config::AppConfig;

/// Anything that can hand back the HTML body of a URL.
pub trait PageSource: Send + Sync {
    fn fetch_html(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("unable to build http client")?;
        Ok(Self { client })
    }
}

impl PageSource for HttpFetcher {
    fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request failed for {url}"))?;
        let response = response
            .error_for_status()
            .with_context(|| format!("non-success status for {url}"))?;
        response
            .text()
            .with_context(|| format!("unable to read response body for {url}"))
    }
}

/// Fetch and parse one page. Failures are logged and become `None`.
pub fn fetch_page(source: &dyn PageSource, url: &str) -> Option<Html> {
    fetch_body(source, url).map(|body| Html::parse_document(&body))
}

fn fetch_body(source: &dyn PageSource, url: &str) -> Option<String> {
    match source.fetch_html(url) {
        Ok(body) => Some(body),
        Err(err) => {
            tracing::warn!(url = %url, error = %format!("{err:#}"), "page fetch failed");
            None
        }
    }
}

/// Fetch every URL, `max_concurrent` at a time. The result lines up with
/// `urls`; a failed URL leaves `None` in its slot and never affects the
/// others. Nothing is returned until every fetch has resolved.
pub fn fetch_all(
    source: &dyn PageSource,
    urls: &[String],
    max_concurrent: usize,
) -> Vec<Option<String>> {
    let workers = max_concurrent.clamp(1, urls.len().max(1));
    if workers == 1 {
        return urls.iter().map(|url| fetch_body(source, url)).collect();
    }

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<String>>> = Mutex::new(vec![None; urls.len()]);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(url) = urls.get(index) else {
                    break;
                };
                let body = fetch_body(source, url);
                if let Ok(mut guard) = slots.lock() {
                    guard[index] = body;
                }
            });
        }
    });

    slots
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
