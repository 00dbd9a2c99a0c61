//! Club page extraction.
//!
//! Every field is required. A page missing any of them, or carrying an
//! event whose date does not parse, produces no club at all: the club and
//! all its events are dropped together.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use super::base;
use crate::models::{parse_event_date, Event};

const AREAS_OF_INTEREST: &str = "/groups/?areas_of_interest=";
/// The site spells it this way on category links.
const CATEGORY_LABEL_ATTR: &str = "arial-label";
const DATE_LABEL_ATTR: &str = "aria-label";
const MAIL_PREFIX: &str = "mailto:";
const TEL_PREFIX: &str = "tel:";

static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("club heading selector"));
static DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".pr-8").expect("club description selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("club link selector"));
static SOCIALS_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[class="flex gap-4 mb-4"]"#).expect("club socials selector")
});
static EVENT_LIST_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"ul[class="mb-4 flex flex-col ga-4"]"#).expect("event list selector")
});
static EVENT_ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li").expect("event item selector"));
static EVENT_DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div").expect("event date selector"));
static EVENT_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("event link selector"));
static EVENT_TEXT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("event text selector"));

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing element: {0}")]
    MissingElement(&'static str),
    #[error("{element} has no {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("club heading has no text")]
    EmptyHeading,
    #[error("unparseable event date {value:?}: {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },
}

/// Everything read off a club page; identity and favourite state are
/// attached later by the merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedClub {
    pub name: String,
    pub campus: String,
    pub description: String,
    pub contacts: Vec<String>,
    pub categories: Vec<String>,
    pub events: Vec<Event>,
}

pub fn extract_club(document: &Html) -> Result<ScrapedClub, ExtractError> {
    let (name, campus) = name_and_campus(document)?;

    let description = document
        .select(&DESCRIPTION_SELECTOR)
        .next()
        .map(base::stripped_text)
        .ok_or(ExtractError::MissingElement("club description"))?;

    let links: Vec<(ElementRef<'_>, &str)> = document
        .select(&LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href").map(|href| (link, href)))
        .collect();

    let categories = categories(&links)?;
    let contacts = contacts(document, &links);

    let mut events = Vec::new();
    for list in document.select(&EVENT_LIST_SELECTOR) {
        for item in list.select(&EVENT_ITEM_SELECTOR) {
            events.push(extract_event(item, &name)?);
        }
    }

    Ok(ScrapedClub {
        name,
        campus,
        description,
        contacts,
        categories,
        events,
    })
}

/// The second `h1` holds the name on its first line and the campus on its
/// last. A one-line heading yields the same text for both.
fn name_and_campus(document: &Html) -> Result<(String, String), ExtractError> {
    let heading = document
        .select(&HEADING_SELECTOR)
        .nth(1)
        .ok_or(ExtractError::MissingElement("club heading"))?;
    let lines = base::text_lines(heading);
    match (lines.first(), lines.last()) {
        (Some(name), Some(campus)) => Ok((name.clone(), campus.clone())),
        _ => Err(ExtractError::EmptyHeading),
    }
}

fn categories(links: &[(ElementRef<'_>, &str)]) -> Result<Vec<String>, ExtractError> {
    links
        .iter()
        .filter(|(_, href)| href.contains(AREAS_OF_INTEREST))
        .map(|(link, _)| {
            link.value()
                .attr(CATEGORY_LABEL_ATTR)
                .map(str::to_string)
                .ok_or(ExtractError::MissingAttribute {
                    element: "category link",
                    attribute: CATEGORY_LABEL_ATTR,
                })
        })
        .collect()
}

/// Socials first, then mail links, then phone links.
fn contacts(document: &Html, links: &[(ElementRef<'_>, &str)]) -> Vec<String> {
    let mut contacts: Vec<String> = document
        .select(&SOCIALS_SELECTOR)
        .next()
        .map(|socials| {
            socials
                .select(&LINK_SELECTOR)
                .filter_map(|link| link.value().attr("href"))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    for prefix in [MAIL_PREFIX, TEL_PREFIX] {
        contacts.extend(
            links
                .iter()
                .filter(|(_, href)| href.starts_with(prefix))
                .map(|(_, href)| href.to_string()),
        );
    }
    contacts
}

fn extract_event(item: ElementRef<'_>, club: &str) -> Result<Event, ExtractError> {
    let date_label = item
        .select(&EVENT_DATE_SELECTOR)
        .next()
        .ok_or(ExtractError::MissingElement("event date"))?
        .value()
        .attr(DATE_LABEL_ATTR)
        .ok_or(ExtractError::MissingAttribute {
            element: "event date",
            attribute: DATE_LABEL_ATTR,
        })?;
    let date = parse_event_date(date_label).map_err(|source| ExtractError::InvalidDate {
        value: date_label.to_string(),
        source,
    })?;

    let link = item
        .select(&EVENT_LINK_SELECTOR)
        .next()
        .ok_or(ExtractError::MissingElement("event link"))?;
    let original_url = link
        .value()
        .attr("href")
        .ok_or(ExtractError::MissingAttribute {
            element: "event link",
            attribute: "href",
        })?
        .to_string();

    let description = item
        .select(&EVENT_TEXT_SELECTOR)
        .next()
        .map(base::inner_text)
        .ok_or(ExtractError::MissingElement("event description"))?;

    Ok(Event {
        club: club.to_string(),
        date,
        original_url,
        title: base::inner_text(link),
        description,
    })
}
