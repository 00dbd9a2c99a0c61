use std::collections::HashMap;

use crate::models::Club;
use crate::scraping::extract::ScrapedClub;

/// Favourite flags of the previously stored clubs, keyed by source URL.
/// Built before a refresh overwrites the clubs file.
#[derive(Debug, Default, Clone)]
pub struct FavouriteIndex {
    flags: HashMap<String, bool>,
}

impl FavouriteIndex {
    pub fn from_clubs(clubs: &[Club]) -> Self {
        let mut flags = HashMap::with_capacity(clubs.len());
        for club in clubs {
            // first record wins if the stored file somehow repeats a URL
            flags
                .entry(club.original_url.clone())
                .or_insert(club.is_favourited);
        }
        Self { flags }
    }

    pub fn is_favourited(&self, url: &str) -> bool {
        self.flags.get(url).copied().unwrap_or(false)
    }
}

/// Build the stored record for a fresh scrape. Every field comes from the
/// scrape except the favourite flag, which is carried over by URL.
pub fn normalize(scraped: ScrapedClub, url: &str, favourites: &FavouriteIndex) -> Club {
    Club {
        name: scraped.name,
        campus: scraped.campus,
        description: scraped.description,
        contacts: scraped.contacts,
        categories: scraped.categories,
        events: scraped.events,
        original_url: url.to_string(),
        is_favourited: favourites.is_favourited(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(url: &str, favourited: bool) -> Club {
        Club {
            name: "Old name".to_string(),
            campus: "UTM".to_string(),
            description: "Old description".to_string(),
            contacts: vec!["mailto:old@example.com".to_string()],
            categories: vec!["Old".to_string()],
            events: Vec::new(),
            original_url: url.to_string(),
            is_favourited: favourited,
        }
    }

    fn scraped() -> ScrapedClub {
        ScrapedClub {
            name: "New name".to_string(),
            campus: "St George".to_string(),
            description: "New description".to_string(),
            contacts: Vec::new(),
            categories: vec!["Arts".to_string()],
            events: Vec::new(),
        }
    }

    #[test]
    fn carries_favourite_forward_and_overwrites_the_rest() {
        let index = FavouriteIndex::from_clubs(&[stored("https://x/club-a", true)]);
        let club = normalize(scraped(), "https://x/club-a", &index);

        assert!(club.is_favourited);
        assert_eq!(club.name, "New name");
        assert_eq!(club.campus, "St George");
        assert_eq!(club.description, "New description");
        assert!(club.contacts.is_empty());
        assert_eq!(club.categories, vec!["Arts".to_string()]);
        assert_eq!(club.original_url, "https://x/club-a");
    }

    #[test]
    fn unknown_urls_start_unfavourited() {
        let index = FavouriteIndex::from_clubs(&[
            stored("https://x/club-a", true),
            stored("https://x/club-b", false),
        ]);
        assert!(!normalize(scraped(), "https://x/club-b", &index).is_favourited);
        assert!(!normalize(scraped(), "https://x/club-c", &index).is_favourited);
        assert!(!FavouriteIndex::default().is_favourited("https://x/club-a"));
    }
}
