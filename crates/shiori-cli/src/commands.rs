use std::io::Write;
use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use shiori_api::kitsu::KitsuClient;
use shiori_api::{ShowType, SortKey, StatusFilter};
use shiori_core::collections::{CollectionKind, CollectionStore, FileStore};
use shiori_core::config::AppConfig;
use shiori_core::dashboard::{self, Category};
use shiori_core::search::{SearchConfig, SearchFilters, SearchHandle, SearchSnapshot};
use shiori_core::ShioriError;

use crate::views;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the landing lists (popular, top rated, airing, new)
    Dashboard {
        /// Only show one category
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
    },
    /// Search the catalog
    Search(SearchArgs),
    /// Show the detail page of one title
    Show {
        /// Kitsu anime id
        id: u64,
    },
    /// Manage the watchlist
    Watchlist {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: CollectionAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CategoryArg {
    Popular,
    TopRated,
    Airing,
    New,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Popular => Category::MostPopular,
            CategoryArg::TopRated => Category::TopRated,
            CategoryArg::Airing => Category::CurrentlyAiring,
            CategoryArg::New => Category::NewReleases,
        }
    }
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query; omit to browse
    query: Vec<String>,

    /// Airing status: current, finished, tba, unreleased, upcoming
    #[arg(long, value_parser = parse_status)]
    status: Option<StatusFilter>,

    /// Keep only titles tagged with this genre
    #[arg(long)]
    genre: Option<String>,

    /// Season year
    #[arg(long)]
    year: Option<i32>,

    /// Minimum score (0-10)
    #[arg(long)]
    min_score: Option<f64>,

    /// Maximum score (0-10)
    #[arg(long)]
    max_score: Option<f64>,

    /// popular, rated, recent, oldest, title, title-desc
    #[arg(long, value_parser = parse_sort, allow_hyphen_values = true)]
    sort: Option<SortKey>,

    /// TV, movie, OVA, ONA, special, music
    #[arg(long = "type", value_parser = parse_show_type)]
    show_type: Option<ShowType>,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

impl SearchArgs {
    fn filters(&self) -> SearchFilters {
        SearchFilters {
            status: self.status,
            genre: self.genre.clone().filter(|g| !g.trim().is_empty()),
            year: self.year,
            min_score: self.min_score,
            max_score: self.max_score,
            sort: self.sort.unwrap_or_default(),
            show_type: self.show_type,
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CollectionAction {
    /// List saved titles
    List,
    /// Fetch a title and save it
    Add { id: u64 },
    /// Remove a saved title
    Remove { id: u64 },
    /// Remove everything
    Clear,
}

pub async fn run(command: Command, config: &AppConfig) -> Result<(), ShioriError> {
    match command {
        Command::Dashboard { category } => show_dashboard(config, category.map(Category::from)).await,
        Command::Search(args) => search(config, &args).await,
        Command::Show { id } => show(config, id).await,
        Command::Watchlist { action } => collection(config, CollectionKind::Watchlist, action).await,
        Command::Favorites { action } => collection(config, CollectionKind::Favorites, action).await,
    }
}

fn client(config: &AppConfig) -> Result<KitsuClient, ShioriError> {
    Ok(KitsuClient::new(&config.api.base_url)?)
}

fn open_store(config: &AppConfig) -> Result<CollectionStore<FileStore>, ShioriError> {
    let storage = FileStore::open(config.ensure_data_dir()?)?;
    Ok(CollectionStore::load(storage))
}

async fn show_dashboard(config: &AppConfig, only: Option<Category>) -> Result<(), ShioriError> {
    let client = client(config)?;
    let board = dashboard::load(&client, config.api.dashboard_limit).await;

    let categories = match only {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };
    for category in categories {
        println!("{}", views::section(category.label(), board.category(category)));
    }
    Ok(())
}

async fn search(config: &AppConfig, args: &SearchArgs) -> Result<(), ShioriError> {
    let source = Arc::new(client(config)?);
    let handle = SearchHandle::spawn(source, SearchConfig::from(config));

    let revision = handle.snapshot().revision;
    handle.set_filters(args.filters());
    handle.set_query(args.query.join(" "));
    handle.refresh();
    let mut snapshot = handle.settled_after(revision).await;

    for _ in 1..args.pages.max(1) {
        if !snapshot.can_load_more() {
            break;
        }
        handle.load_more();
        snapshot = handle.settled_after(snapshot.revision).await;
    }

    report_search(snapshot, &mut std::io::stdout())
}

/// Print whatever the search holds, then surface its error, if any.
///
/// With `retain_pages_on_error` a failed continuation still has the earlier
/// pages, and those are shown before the error.
fn report_search(snapshot: SearchSnapshot, out: &mut impl Write) -> Result<(), ShioriError> {
    if !snapshot.results.is_empty() || snapshot.error.is_none() {
        write!(out, "{}", views::search_results(&snapshot))?;
    }
    match snapshot.error {
        Some(message) => Err(ShioriError::Search(message)),
        None => Ok(()),
    }
}

async fn show(config: &AppConfig, id: u64) -> Result<(), ShioriError> {
    let client = client(config)?;
    let record = client.get_anime_by_id(id).await?;
    let store = open_store(config)?;
    let saved_in: Vec<CollectionKind> = CollectionKind::ALL
        .iter()
        .copied()
        .filter(|kind| store.contains(*kind, id))
        .collect();
    print!("{}", views::detail(&record, &saved_in));
    Ok(())
}

async fn collection(
    config: &AppConfig,
    kind: CollectionKind,
    action: CollectionAction,
) -> Result<(), ShioriError> {
    let mut store = open_store(config)?;
    match action {
        CollectionAction::List => print!("{}", views::collection(kind, store.entries(kind))),
        CollectionAction::Add { id } => {
            if let Some(existing) = store.get(kind, id) {
                println!("{} is already in your {kind}.", existing.title);
                return Ok(());
            }
            let record = client(config)?.get_anime_by_id(id).await?;
            let title = record.title.clone();
            store.add(kind, record)?;
            println!("Added {title} to your {kind}.");
        }
        CollectionAction::Remove { id } => {
            let title = store.get(kind, id).map(|r| r.title.clone());
            if store.remove(kind, id)? {
                println!("Removed {} from your {kind}.", title.unwrap_or_else(|| id.to_string()));
            } else {
                println!("{id} is not in your {kind}.");
            }
        }
        CollectionAction::Clear => {
            let count = store.len(kind);
            store.clear(kind)?;
            println!("Cleared {count} from your {kind}.");
        }
    }
    Ok(())
}

// ── Argument parsers ─────────────────────────────────────────────

fn parse_status(s: &str) -> Result<StatusFilter, String> {
    StatusFilter::from_kitsu_str(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown status '{s}'"))
}

fn parse_show_type(s: &str) -> Result<ShowType, String> {
    ShowType::from_kitsu_str(s).ok_or_else(|| format!("unknown type '{s}'"))
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    let key = match s.to_ascii_lowercase().as_str() {
        "popular" => Some(SortKey::MostPopular),
        "rated" => Some(SortKey::HighestRated),
        "recent" => Some(SortKey::MostRecent),
        "oldest" => Some(SortKey::OldestFirst),
        "title" => Some(SortKey::TitleAsc),
        "title-desc" => Some(SortKey::TitleDesc),
        _ => SortKey::from_kitsu_str(s),
    };
    key.ok_or_else(|| format!("unknown sort '{s}'"))
}
