use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use tempfile::TempDir;

use club_scrape::models::parse_event_date;
use club_scrape::query;
use club_scrape::scraping::PageSource;
use club_scrape::{AppConfig, Club, Dataset, Filters, Store};

struct StaticSite {
    pages: HashMap<String, String>,
}

impl StaticSite {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        }
    }
}

impl PageSource for StaticSite {
    fn fetch_html(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("timed out: {url}"))
    }
}

const LISTING: &str = r#"
<section>
    <a class="flex-1 font-bold text-primary" href="https://sop.utoronto.ca/group/film/">Film</a>
    <a class="flex-1 font-bold text-primary" href="https://sop.utoronto.ca/group/broken/">Broken</a>
    <a class="flex-1 font-bold text-primary" href="https://sop.utoronto.ca/group/film/">Film again</a>
</section>
"#;

const FILM_PAGE: &str = r#"
<h1>Directory</h1>
<h1>
    Film Society
    St George
</h1>
<div class="pr-8">Screenings every Friday.</div>
<a href="/groups/?areas_of_interest=arts" arial-label="Arts">Arts</a>
<a href="mailto:film@example.com">mail</a>
<ul class="mb-4 flex flex-col ga-4">
    <li>
        <div aria-label="05 December, 2024"></div>
        <a href="https://sop.utoronto.ca/event/noir/">Noir Night</a>
        <p>Classic noir double bill.</p>
    </li>
</ul>
"#;

/// Same layout as the film page but no description block.
const BROKEN_PAGE: &str = r#"
<h1>Directory</h1>
<h1>Broken Club
UTM</h1>
<div class="pl-8">Wrong class.</div>
<ul class="mb-4 flex flex-col ga-4">
    <li>
        <div aria-label="06 December, 2024"></div>
        <a href="https://sop.utoronto.ca/event/x/">Lost event</a>
        <p>Never stored.</p>
    </li>
</ul>
"#;

fn config() -> AppConfig {
    AppConfig {
        first_page: 1,
        last_page: 2,
        ..AppConfig::default()
    }
}

fn site(config: &AppConfig, film_page: &str) -> StaticSite {
    StaticSite::new(&[
        (config.listing_url(1).as_str(), LISTING),
        ("https://sop.utoronto.ca/group/film/", film_page),
        ("https://sop.utoronto.ca/group/broken/", BROKEN_PAGE),
    ])
}

fn club(name: &str, campus: &str) -> Club {
    Club {
        name: name.to_string(),
        campus: campus.to_string(),
        description: String::new(),
        contacts: Vec::new(),
        categories: Vec::new(),
        events: Vec::new(),
        original_url: format!("https://sop.utoronto.ca/group/{name}/"),
        is_favourited: false,
    }
}

#[test]
fn first_run_starts_empty_and_creates_files() {
    let dir = TempDir::new().expect("tempdir");
    let dataset = Dataset::load(Store::open(dir.path())).expect("load");

    assert!(dataset.clubs().is_empty());
    assert!(dataset.events().is_empty());
    assert!(dir.path().join("clubs.json").exists());
    assert!(dir.path().join("events.json").exists());
    assert_eq!(dataset.filters(), &Filters::default());
}

#[test]
fn page_without_description_is_dropped_with_its_events() {
    let dir = TempDir::new().expect("tempdir");
    let config = config();
    let mut dataset = Dataset::load(Store::open(dir.path())).expect("load");

    let report = dataset
        .refresh(&site(&config, FILM_PAGE), &config)
        .expect("refresh");

    assert_eq!(report.urls_found, 2);
    assert_eq!(report.extract_failures, 1);
    let names: Vec<&str> = dataset.clubs().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Film Society"]);
    assert_eq!(dataset.clubs()[0].campus, "St George");
    assert!(dataset.events().iter().all(|e| e.club == "Film Society"));
    assert_eq!(dataset.events().len(), 1);
}

#[test]
fn campus_filter_selects_the_single_utsc_club() {
    let clubs = vec![
        club("film", "St George"),
        club("robotics", "UTSC"),
        club("debate", "UTM"),
    ];
    let filters = Filters {
        campus: Some("UTSC".to_string()),
        interests: Vec::new(),
    };
    let selected = query::apply_filters(&clubs, &filters);
    assert_eq!(selected, vec![&clubs[1]]);
}

#[test]
fn event_dates_parse_strictly() {
    let date = parse_event_date("05 December, 2024").expect("date");
    assert_eq!((date.year(), date.month(), date.day()), (2024, 12, 5));
    assert!(parse_event_date("2024-12-05").is_err());
}

#[test]
fn malformed_event_date_drops_the_club_on_refresh() {
    let dir = TempDir::new().expect("tempdir");
    let config = config();
    let mut dataset = Dataset::load(Store::open(dir.path())).expect("load");

    let bad_film = FILM_PAGE.replace("05 December, 2024", "2024-12-05");
    let report = dataset
        .refresh(&site(&config, &bad_film), &config)
        .expect("refresh");

    assert_eq!(report.clubs, 0);
    assert_eq!(report.extract_failures, 2);
    assert!(dataset.clubs().is_empty());
    assert!(dataset.events().is_empty());
}

#[test]
fn favourite_survives_a_refresh_with_changed_content() {
    let dir = TempDir::new().expect("tempdir");
    let config = config();
    let film_url = "https://sop.utoronto.ca/group/film/";

    let mut dataset = Dataset::load(Store::open(dir.path())).expect("load");
    dataset
        .refresh(&site(&config, FILM_PAGE), &config)
        .expect("first refresh");
    assert!(dataset.favourite(film_url).expect("favourite"));

    let renamed = FILM_PAGE.replace("Film Society", "Cinema Society");
    let mut dataset = Dataset::load(Store::open(dir.path())).expect("reload");
    dataset
        .refresh(&site(&config, &renamed), &config)
        .expect("second refresh");

    let film = dataset.club(film_url).expect("film club");
    assert_eq!(film.name, "Cinema Society");
    assert!(film.is_favourited);
    assert_eq!(
        dataset.events_on(NaiveDate::from_ymd_opt(2024, 12, 5).expect("date"))[0].club,
        "Cinema Society"
    );
}

#[test]
fn unreachable_directory_keeps_the_cache() {
    let dir = TempDir::new().expect("tempdir");
    let config = config();
    let film_url = "https://sop.utoronto.ca/group/film/";
    let mut dataset = Dataset::load(Store::open(dir.path())).expect("load");
    dataset
        .refresh(&site(&config, FILM_PAGE), &config)
        .expect("refresh");
    dataset.favourite(film_url).expect("favourite");

    let report = dataset
        .refresh(&StaticSite::new(&[]), &config)
        .expect("offline refresh");
    assert_eq!(report.urls_found, 0);
    assert!(report.cache_kept);
    assert_eq!(dataset.clubs().len(), 1);

    let stored = Store::open(dir.path()).load_clubs().expect("clubs");
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_favourited);
}

fn campus_page(name: &str, campus: &str, category: &str) -> String {
    format!(
        r#"<h1>Directory</h1>
<h1>
    {name}
    {campus}
</h1>
<div class="pr-8">About {name}.</div>
<a href="/groups/?areas_of_interest={category}" arial-label="{category}">{category}</a>"#
    )
}

fn three_campus_site(config: &AppConfig) -> StaticSite {
    let listing = ["arts", "tech", "social"]
        .iter()
        .map(|slug| {
            format!(
                r#"<a class="flex-1 font-bold text-primary" href="https://sop.utoronto.ca/group/{slug}/">{slug}</a>"#
            )
        })
        .collect::<String>();
    let arts = campus_page("Arts Guild", "St George", "Arts");
    let tech = campus_page("Tech Society", "UTSC", "Tech");
    let social = campus_page("Social Circle", "UTM", "Social");
    StaticSite::new(&[
        (config.listing_url(1).as_str(), listing.as_str()),
        ("https://sop.utoronto.ca/group/arts/", arts.as_str()),
        ("https://sop.utoronto.ca/group/tech/", tech.as_str()),
        ("https://sop.utoronto.ca/group/social/", social.as_str()),
    ])
}

#[test]
fn default_and_campus_filters_show_clubs_with_different_categories() {
    let dir = TempDir::new().expect("tempdir");
    let config = config();
    let mut dataset = Dataset::load(Store::open(dir.path())).expect("load");
    dataset
        .refresh(&three_campus_site(&config), &config)
        .expect("refresh");

    let every = vec!["Arts".to_string(), "Social".to_string(), "Tech".to_string()];
    assert_eq!(dataset.filters(), &Filters::all_interests(every.clone()));
    assert_eq!(dataset.filtered_clubs().len(), 3);

    let mut reloaded = Dataset::load(Store::open(dir.path())).expect("reload");
    assert_eq!(reloaded.filters(), &Filters::all_interests(every));
    assert_eq!(reloaded.filtered_clubs().len(), 3);

    reloaded
        .select_campus(Some("UTSC".to_string()))
        .expect("campus");
    let names: Vec<&str> = reloaded
        .filtered_clubs()
        .iter()
        .map(|club| club.name.as_str())
        .collect();
    assert_eq!(names, vec!["Tech Society"]);

    reloaded
        .select_interests(vec!["Arts".to_string()])
        .expect("interests");
    assert!(reloaded.filtered_clubs().is_empty());
}
