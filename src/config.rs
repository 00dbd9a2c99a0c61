use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils;

const DEFAULT_DIRECTORY_URL: &str = "https://sop.utoronto.ca/groups/";
const DEFAULT_USER_AGENT: &str = "ClubScrape/0.1 (+https://github.com/you/club-scrape)";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Paginated listing endpoint; pages are requested as `?pg=N`.
    pub directory_url: String,
    pub first_page: u32,
    /// Inclusive. The directory had 25 pages as of November 2024.
    pub last_page: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Club page fetches in flight at once; 1 keeps the crawl sequential.
    pub max_concurrent: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            first_page: 1,
            last_page: 25,
            timeout_secs: 20,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrent: 1,
        }
    }
}

impl AppConfig {
    pub fn listing_url(&self, page: u32) -> String {
        format!("{}?pg={}", self.directory_url, page)
    }

    pub fn listing_urls(&self) -> Vec<String> {
        (self.first_page..=self.last_page)
            .map(|page| self.listing_url(page))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unable to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("unable to encode config: {0}")]
    Encode(#[from] serde_json::Error),
}

/// `config.json` in the data root, read once per process.
pub struct ConfigStore {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigStore {
    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load(root: &Path) -> Self {
        let path = utils::config_path(root);
        let config = read_config(&path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "using default config");
            AppConfig::default()
        });
        Self { path, config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Apply `transform` and write the result back.
    pub fn update<F>(&mut self, transform: F) -> Result<&AppConfig, ConfigError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut next = self.config.clone();
        transform(&mut next);
        write_config(&self.path, &next)?;
        self.config = next;
        Ok(&self.config)
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    utils::ensure_parent(path);
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
