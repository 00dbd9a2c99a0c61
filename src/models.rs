use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Layout of event dates on the directory site and in `events.json`,
/// e.g. `05 December, 2024`.
pub const DATE_FORMAT: &str = "%d %B, %Y";

pub fn parse_event_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
}

pub fn format_event_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

mod event_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_event_date(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_event_date(&text).map_err(de::Error::custom)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub club: String,
    #[serde(with = "event_date")]
    pub date: NaiveDate,
    pub original_url: String, // may be stale
    pub title: String,
    pub description: String,
}

impl Event {
    pub fn date_label(&self) -> String {
        format_event_date(&self.date)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Club {
    /// Full heading name; can carry the campus or a short form.
    pub name: String,
    pub campus: String,
    pub description: String,
    pub contacts: Vec<String>,
    pub categories: Vec<String>,
    pub events: Vec<Event>,
    /// Identity key across refreshes.
    pub original_url: String,
    pub is_favourited: bool,
}

impl Club {
    pub fn favourite(&mut self) {
        self.is_favourited = true;
    }

    pub fn unfavourite(&mut self) {
        self.is_favourited = false;
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|existing| existing == category)
    }
}

/// Persisted campus/interest selection. `None` and an empty list both
/// mean "no filter".
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub campus: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl Filters {
    pub fn all_interests(interests: Vec<String>) -> Self {
        Self {
            campus: None,
            interests,
        }
    }
}
