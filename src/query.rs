//! Filters over an in-memory club collection. Everything here is pure and
//! takes any iterator of club references, so filters chain:
//! `filter_campus(filter_categories(&clubs, &wanted), "UTM")`.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{Club, Event, Filters};

pub fn filter_campus<'a, I>(clubs: I, campus: &str) -> Vec<&'a Club>
where
    I: IntoIterator<Item = &'a Club>,
{
    clubs
        .into_iter()
        .filter(|club| club.campus == campus)
        .collect()
}

/// Clubs carrying every one of `categories`. An empty list keeps all clubs.
pub fn filter_categories<'a, I, S>(clubs: I, categories: &[S]) -> Vec<&'a Club>
where
    I: IntoIterator<Item = &'a Club>,
    S: AsRef<str>,
{
    clubs
        .into_iter()
        .filter(|club| {
            categories
                .iter()
                .all(|category| club.has_category(category.as_ref()))
        })
        .collect()
}

pub fn filter_is_favourited<'a, I>(clubs: I, favourited: bool) -> Vec<&'a Club>
where
    I: IntoIterator<Item = &'a Club>,
{
    clubs
        .into_iter()
        .filter(|club| club.is_favourited == favourited)
        .collect()
}

/// Clubs whose name or description contains any of `keywords`, ignoring
/// case. Unlike categories this is a union: no keywords, no clubs.
pub fn filter_keywords<'a, I, S>(clubs: I, keywords: &[S]) -> Vec<&'a Club>
where
    I: IntoIterator<Item = &'a Club>,
    S: AsRef<str>,
{
    let lowered: Vec<String> = keywords
        .iter()
        .map(|keyword| keyword.as_ref().to_lowercase())
        .collect();
    clubs
        .into_iter()
        .filter(|club| {
            let name = club.name.to_lowercase();
            let description = club.description.to_lowercase();
            lowered
                .iter()
                .any(|keyword| name.contains(keyword.as_str()) || description.contains(keyword.as_str()))
        })
        .collect()
}

/// Distinct categories across `clubs`, sorted.
pub fn all_categories<'a, I>(clubs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Club>,
{
    clubs
        .into_iter()
        .flat_map(|club| club.categories.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The stored filter selection: campus by equality when set, then every
/// selected interest required. A selection covering every category in
/// `clubs` (the picker's "all ticked" state) places no category constraint.
pub fn apply_filters<'a, I>(clubs: I, filters: &Filters) -> Vec<&'a Club>
where
    I: IntoIterator<Item = &'a Club>,
{
    let clubs: Vec<&Club> = clubs.into_iter().collect();
    let every_interest = all_categories(clubs.iter().copied())
        .iter()
        .all(|category| filters.interests.contains(category));
    let by_campus = match filters.campus.as_deref() {
        Some(campus) => filter_campus(clubs, campus),
        None => clubs,
    };
    if every_interest {
        by_campus
    } else {
        filter_categories(by_campus, &filters.interests)
    }
}

pub fn events_on(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    events.iter().filter(|event| event.date == date).collect()
}

pub fn event_dates(events: &[Event]) -> Vec<NaiveDate> {
    events
        .iter()
        .map(|event| event.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
