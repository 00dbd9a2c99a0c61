pub mod base;
pub mod crawler;
pub mod extract;
pub mod fetch;

pub use crawler::crawl_directory;
pub use extract::{extract_club, ExtractError, ScrapedClub};
pub use fetch::{fetch_all, fetch_page, HttpFetcher, PageSource};
