//! Flat-file persistence for clubs, events and filters.
//!
//! Each collection is one pretty-printed JSON file in the data root and is
//! always rewritten whole. The three files are independent; nothing ties
//! a clubs save to an events save beyond `save_dataset` renaming both
//! only after both have been written.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Club, Event, Filters};
use crate::utils;

pub const CLUBS_FILE: &str = "clubs.json";
pub const EVENTS_FILE: &str = "events.json";
pub const FILTERS_FILE: &str = "filters.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn open_default() -> Self {
        Self::open(utils::data_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clubs_path(&self) -> PathBuf {
        self.root.join(CLUBS_FILE)
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join(EVENTS_FILE)
    }

    pub fn filters_path(&self) -> PathBuf {
        self.root.join(FILTERS_FILE)
    }

    /// Create any missing clubs/events file empty. Returns whether one had
    /// to be created, which means there is nothing cached yet.
    pub fn check_files(&self) -> Result<bool, StoreError> {
        let mut created = false;
        for path in [self.clubs_path(), self.events_path()] {
            if !path.exists() {
                write_json(&path, &Vec::<Value>::new())?;
                created = true;
            }
        }
        Ok(created)
    }

    pub fn load_clubs(&self) -> Result<Vec<Club>, StoreError> {
        load_records(&self.clubs_path())
    }

    pub fn load_events(&self) -> Result<Vec<Event>, StoreError> {
        load_records(&self.events_path())
    }

    /// Stored filter selection. Without a readable file: no campus and every
    /// interest in `known_interests` selected.
    pub fn load_filters(&self, known_interests: &[String]) -> Filters {
        let path = self.filters_path();
        if !path.exists() {
            return Filters::all_interests(known_interests.to_vec());
        }
        match fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|text| serde_json::from_str::<Filters>(&text).map_err(|err| err.to_string()))
        {
            Ok(filters) => filters,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unreadable filters, using defaults");
                Filters::all_interests(known_interests.to_vec())
            }
        }
    }

    pub fn save_clubs(&self, clubs: &[Club]) -> Result<(), StoreError> {
        write_json(&self.clubs_path(), clubs)
    }

    pub fn save_events(&self, events: &[Event]) -> Result<(), StoreError> {
        write_json(&self.events_path(), events)
    }

    pub fn save_filters(&self, filters: &Filters) -> Result<(), StoreError> {
        write_json(&self.filters_path(), filters)
    }

    /// Replace clubs and events together. Both temp files are written before
    /// either target is touched, so a failed serialization or write leaves
    /// the previous pair intact.
    pub fn save_dataset(&self, clubs: &[Club], events: &[Event]) -> Result<(), StoreError> {
        let clubs_path = self.clubs_path();
        let events_path = self.events_path();
        let clubs_tmp = write_temp(&clubs_path, clubs)?;
        let events_tmp = match write_temp(&events_path, events) {
            Ok(tmp) => tmp,
            Err(err) => {
                let _ = fs::remove_file(&clubs_tmp);
                return Err(err);
            }
        };
        fs::rename(&clubs_tmp, &clubs_path).map_err(io_error(&clubs_path))?;
        fs::rename(&events_tmp, &events_path).map_err(io_error(&events_path))?;
        Ok(())
    }

    /// Set the favourite flag of the stored club with this URL. Works on the
    /// raw records so entries this version cannot parse survive the rewrite.
    /// Returns whether a club matched.
    pub fn set_favourite(&self, url: &str, favourited: bool) -> Result<bool, StoreError> {
        let path = self.clubs_path();
        let Some(mut records) = read_raw_records(&path)? else {
            return Ok(false);
        };

        let target = records.iter_mut().find(|record| {
            record.get("original_url").and_then(Value::as_str) == Some(url)
        });
        let Some(Value::Object(record)) = target else {
            return Ok(false);
        };
        if record.get("is_favourited") == Some(&Value::Bool(favourited)) {
            return Ok(true);
        }
        record.insert("is_favourited".to_string(), Value::Bool(favourited));
        write_json(&path, &records)?;
        Ok(true)
    }
}

/// Raw array in `path`. A missing file is created empty; an unreadable or
/// non-array file counts as empty and is left alone (`None`).
fn read_raw_records(path: &Path) -> Result<Option<Vec<Value>>, StoreError> {
    if !path.exists() {
        write_json(path, &Vec::<Value>::new())?;
        return Ok(Some(Vec::new()));
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unreadable store file, treating as empty");
            return Ok(None);
        }
    };
    match serde_json::from_str::<Vec<Value>>(&text) {
        Ok(records) => Ok(Some(records)),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "corrupt store file, treating as empty");
            Ok(None)
        }
    }
}

fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let records = read_raw_records(path)?.unwrap_or_default();
    let total = records.len();
    let mut out = Vec::with_capacity(total);
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value(record) {
            Ok(item) => out.push(item),
            Err(err) => {
                tracing::warn!(path = %path.display(), index, error = %err, "skipping malformed record");
            }
        }
    }
    tracing::debug!(path = %path.display(), loaded = out.len(), total, "store file loaded");
    Ok(out)
}

fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

fn write_temp<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, StoreError> {
    utils::ensure_parent(path);
    let contents = to_pretty(value)?;
    let tmp = utils::temp_path(path);
    fs::write(&tmp, contents).map_err(io_error(&tmp))?;
    Ok(tmp)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = write_temp(path, value)?;
    fs::rename(&tmp, path).map_err(io_error(path))
}
