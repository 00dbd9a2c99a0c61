//! Command-line front end for the club directory cache.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use club_scrape::models::parse_event_date;
use club_scrape::query;
use club_scrape::scraping::HttpFetcher;
use club_scrape::{utils, Club, ConfigStore, Dataset, Store};

#[derive(Parser, Debug)]
#[command(name = "club-scrape")]
#[command(about = "Browse, filter and favourite clubs from the university directory")]
#[command(version)]
struct Args {
    /// Folder holding clubs.json, events.json, filters.json and config.json
    #[arg(long, global = true, env = "CLUB_SCRAPE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-crawl the directory and replace the cached clubs and events
    Refresh,
    /// List clubs
    List {
        #[arg(long)]
        campus: Option<String>,
        /// Required category; repeat to require several
        #[arg(long)]
        category: Vec<String>,
        /// Match name or description; repeat to match any of several
        #[arg(long)]
        keyword: Vec<String>,
        #[arg(long)]
        favourites: bool,
        /// Start from the saved filter selection
        #[arg(long)]
        filtered: bool,
    },
    /// List every category
    Categories {
        #[arg(long)]
        filtered: bool,
    },
    Favourite {
        url: String,
    },
    Unfavourite {
        url: String,
    },
    /// List events, optionally for one date ("05 December, 2024")
    Events {
        #[arg(long)]
        date: Option<String>,
    },
    /// Show or change the saved filter selection
    Filters {
        #[arg(long, conflicts_with = "no_campus")]
        campus: Option<String>,
        #[arg(long)]
        no_campus: bool,
        #[arg(long)]
        interest: Vec<String>,
    },
    /// Show or change crawl settings
    Config {
        #[arg(long)]
        last_page: Option<u32>,
        #[arg(long)]
        concurrency: Option<usize>,
        #[arg(long)]
        timeout: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let root = args.data_dir.unwrap_or_else(utils::data_root);
    info!(root = %root.display(), "using data folder");

    let mut config_store = ConfigStore::load(&root);
    if let Command::Config {
        last_page,
        concurrency,
        timeout,
    } = args.command
    {
        let config = config_store
            .update(|config| {
                if let Some(last_page) = last_page {
                    config.last_page = last_page;
                }
                if let Some(concurrency) = concurrency {
                    config.max_concurrent = concurrency.max(1);
                }
                if let Some(timeout) = timeout {
                    config.timeout_secs = timeout;
                }
            })
            .context("unable to save config")?;
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let config = config_store.config();
    let store = Store::open(&root);
    let first_run = store.check_files().context("unable to prepare data folder")?;
    let mut dataset = Dataset::load(store).context("unable to load cached data")?;

    if first_run || matches!(args.command, Command::Refresh) {
        if first_run {
            info!("no cached data yet, refreshing");
        }
        let fetcher = HttpFetcher::new(config)?;
        let report = dataset
            .refresh(&fetcher, config)
            .context("unable to save refreshed data")?;
        if report.cache_kept {
            println!("directory unreachable, keeping {} cached clubs", dataset.clubs().len());
        } else {
            println!(
                "{} clubs and {} events from {} links ({} unreachable, {} unreadable)",
                report.clubs,
                report.events,
                report.urls_found,
                report.fetch_failures,
                report.extract_failures
            );
        }
    }

    match args.command {
        Command::Refresh | Command::Config { .. } => {}
        Command::List {
            campus,
            category,
            keyword,
            favourites,
            filtered,
        } => {
            let mut clubs = if filtered {
                dataset.filtered_clubs()
            } else {
                dataset.clubs().iter().collect()
            };
            if let Some(campus) = campus.as_deref() {
                clubs = query::filter_campus(clubs, campus);
            }
            clubs = query::filter_categories(clubs, &category);
            if !keyword.is_empty() {
                clubs = query::filter_keywords(clubs, &keyword);
            }
            if favourites {
                clubs = query::filter_is_favourited(clubs, true);
            }
            for club in clubs {
                print_club(club);
            }
        }
        Command::Categories { filtered } => {
            let categories = if filtered {
                query::all_categories(dataset.filtered_clubs())
            } else {
                dataset.categories()
            };
            for category in categories {
                println!("{category}");
            }
        }
        Command::Favourite { url } => {
            if !dataset.favourite(&url)? {
                anyhow::bail!("no cached club with url {url}");
            }
        }
        Command::Unfavourite { url } => {
            if !dataset.unfavourite(&url)? {
                anyhow::bail!("no cached club with url {url}");
            }
        }
        Command::Events { date } => {
            let events = match date {
                Some(text) => {
                    let date = parse_event_date(&text)
                        .with_context(|| format!("expected a date like \"05 December, 2024\", got {text:?}"))?;
                    dataset.events_on(date)
                }
                None => dataset.events().iter().collect(),
            };
            for event in events {
                println!(
                    "{}  {}  ({})  {}",
                    event.date_label(),
                    event.title,
                    event.club,
                    event.original_url
                );
            }
        }
        Command::Filters {
            campus,
            no_campus,
            interest,
        } => {
            if campus.is_some() || no_campus {
                dataset.select_campus(campus)?;
            }
            if !interest.is_empty() {
                dataset.select_interests(interest)?;
            }
            println!("{}", serde_json::to_string_pretty(dataset.filters())?);
        }
    }

    Ok(())
}

fn print_club(club: &Club) {
    let marker = if club.is_favourited { "*" } else { " " };
    println!(
        "{marker} {}  [{}]  {}",
        club.name, club.campus, club.original_url
    );
}
