use chrono::NaiveDate;
use scraper::Html;
use serde::Serialize;

use crate::config::AppConfig;
use crate::merge::{self, FavouriteIndex};
use crate::models::{Club, Event, Filters};
use crate::query;
use crate::scraping::crawler;
use crate::scraping::extract;
use crate::scraping::fetch::{self, PageSource};
use crate::store::{Store, StoreError};

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshReport {
    pub urls_found: usize,
    pub clubs: usize,
    pub events: usize,
    pub fetch_failures: usize,
    pub extract_failures: usize,
    /// The crawl found no club links, so the previous cache was left as is.
    pub cache_kept: bool,
}

/// In-memory view of the stored clubs, events and filter selection. Built
/// from the store on start and rebuilt by `refresh`.
pub struct Dataset {
    store: Store,
    clubs: Vec<Club>,
    events: Vec<Event>,
    filters: Filters,
}

impl Dataset {
    pub fn load(store: Store) -> Result<Self, StoreError> {
        let clubs = store.load_clubs()?;
        let events = store.load_events()?;
        let filters = store.load_filters(&query::all_categories(&clubs));
        tracing::info!(clubs = clubs.len(), events = events.len(), "dataset loaded");
        Ok(Self {
            store,
            clubs,
            events,
            filters,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn clubs(&self) -> &[Club] {
        &self.clubs
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn club(&self, url: &str) -> Option<&Club> {
        self.clubs.iter().find(|club| club.original_url == url)
    }

    /// Re-crawl the directory and replace both stored collections. Pages
    /// that fail to fetch or extract are dropped; the store is written once
    /// after every page has been handled. A crawl that finds no club links
    /// at all writes nothing.
    pub fn refresh(
        &mut self,
        source: &dyn PageSource,
        config: &AppConfig,
    ) -> Result<RefreshReport, StoreError> {
        // read before anything is overwritten
        let favourites = FavouriteIndex::from_clubs(&self.store.load_clubs()?);

        let urls = crawler::crawl_directory(source, config);
        if urls.is_empty() {
            tracing::warn!(
                clubs = self.clubs.len(),
                "directory listing yielded no clubs, keeping cached data"
            );
            return Ok(RefreshReport {
                cache_kept: true,
                ..RefreshReport::default()
            });
        }
        let bodies = fetch::fetch_all(source, &urls, config.max_concurrent);

        let mut report = RefreshReport {
            urls_found: urls.len(),
            ..RefreshReport::default()
        };
        let mut clubs = Vec::new();
        let mut events = Vec::new();

        for (url, body) in urls.iter().zip(bodies) {
            let Some(body) = body else {
                report.fetch_failures += 1;
                continue;
            };
            let document = Html::parse_document(&body);
            match extract::extract_club(&document) {
                Ok(scraped) => {
                    let club = merge::normalize(scraped, url, &favourites);
                    events.extend(club.events.iter().cloned());
                    clubs.push(club);
                }
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "club page skipped");
                    report.extract_failures += 1;
                }
            }
        }

        self.store.save_dataset(&clubs, &events)?;
        report.clubs = clubs.len();
        report.events = events.len();
        tracing::info!(
            urls = report.urls_found,
            clubs = report.clubs,
            events = report.events,
            fetch_failures = report.fetch_failures,
            extract_failures = report.extract_failures,
            "refresh complete"
        );

        self.filters = self.store.load_filters(&query::all_categories(&clubs));
        self.clubs = clubs;
        self.events = events;
        Ok(report)
    }

    pub fn favourite(&mut self, url: &str) -> Result<bool, StoreError> {
        self.set_favourite(url, true)
    }

    pub fn unfavourite(&mut self, url: &str) -> Result<bool, StoreError> {
        self.set_favourite(url, false)
    }

    /// Persist first; the in-memory club only changes once the stored
    /// record has been updated.
    fn set_favourite(&mut self, url: &str, favourited: bool) -> Result<bool, StoreError> {
        if self.club(url).is_none() {
            return Ok(false);
        }
        if !self.store.set_favourite(url, favourited)? {
            tracing::warn!(url, "club missing from the stored file, flag not changed");
            return Ok(false);
        }
        if let Some(club) = self.clubs.iter_mut().find(|club| club.original_url == url) {
            if favourited {
                club.favourite();
            } else {
                club.unfavourite();
            }
        }
        Ok(true)
    }

    pub fn favourites(&self) -> Vec<&Club> {
        query::filter_is_favourited(&self.clubs, true)
    }

    /// Pick a campus (or none) and reset interests to every known category.
    pub fn select_campus(&mut self, campus: Option<String>) -> Result<(), StoreError> {
        let filters = Filters {
            campus,
            interests: self.categories(),
        };
        self.store.save_filters(&filters)?;
        self.filters = filters;
        Ok(())
    }

    /// Replace the selected interests, keeping the campus.
    pub fn select_interests(&mut self, interests: Vec<String>) -> Result<(), StoreError> {
        let filters = Filters {
            campus: self.filters.campus.clone(),
            interests,
        };
        self.store.save_filters(&filters)?;
        self.filters = filters;
        Ok(())
    }

    pub fn filtered_clubs(&self) -> Vec<&Club> {
        query::apply_filters(&self.clubs, &self.filters)
    }

    pub fn categories(&self) -> Vec<String> {
        query::all_categories(&self.clubs)
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<&Event> {
        query::events_on(&self.events, date)
    }

    pub fn event_dates(&self) -> Vec<NaiveDate> {
        query::event_dates(&self.events)
    }
}
