pub mod config;
pub mod dataset;
pub mod merge;
pub mod models;
pub mod query;
pub mod scraping;
pub mod store;
pub mod utils;

pub use config::{AppConfig, ConfigError, ConfigStore};
pub use dataset::{Dataset, RefreshReport};
pub use models::{Club, Event, Filters};
pub use store::{Store, StoreError};
