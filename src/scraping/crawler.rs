use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::base;
use super::fetch::{self, PageSource};
use crate::config::AppConfig;

// Exact class attribute, not a class subset: other anchors on the page
// share some of these utility classes.
static CLUB_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[class="flex-1 font-bold text-primary"][href]"#)
        .expect("club link selector")
});

/// Ordered set of club URLs: first-seen order, duplicates dropped.
#[derive(Debug, Default)]
pub struct ClubUrls {
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl ClubUrls {
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.insert(url.clone()) {
            self.urls.push(url);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

/// Club links on one listing page, resolved against `page_url`.
pub fn club_links(document: &Html, page_url: &str) -> Vec<String> {
    document
        .select(&CLUB_LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| base::absolute_url(page_url, href.trim()))
        .collect()
}

/// Walk the whole listing range. A page that cannot be fetched is skipped.
pub fn crawl_directory(source: &dyn PageSource, config: &AppConfig) -> Vec<String> {
    let mut found = ClubUrls::default();

    for page_url in config.listing_urls() {
        let Some(document) = fetch::fetch_page(source, &page_url) else {
            continue;
        };
        let mut added = 0;
        for url in club_links(&document, &page_url) {
            if found.insert(url) {
                added += 1;
            }
        }
        tracing::debug!(url = %page_url, added, "listing page crawled");
    }

    tracing::info!(count = found.len(), "club links found in directory");
    found.into_vec()
}
