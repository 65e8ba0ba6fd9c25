use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

use freshstate::config::Config;
use freshstate::guard::GuardSnapshot;
use freshstate::source::{
    HttpMovieSource, MockEntitySource, MockMutationApi, MockPagedSource, SimulationProfile,
};
use freshstate::store::FileStore;
use freshstate::widgets::{
    LikeButton, MovieSearch, MovieTab, OptimisticList, PagedSearch, TaskRow, TodoBoard, TodoTab,
    UserCard,
};

#[derive(Parser)]
#[command(name = "freshstate", version, about = "Async state pattern demos")]
struct Cli {
    /// Seed for the simulated backends.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Override the simulated failure probability.
    #[arg(long)]
    failure_rate: Option<f64>,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand)]
enum Demo {
    /// Debounced movie search against the live API, with favorites.
    Movies {
        #[arg(default_value = "batman")]
        query: String,
    },
    /// Stale-while-revalidate user card over the simulated user table.
    Users {
        #[arg(default_value = "01")]
        id: String,
    },
    /// Debounced, server-side paged directory search.
    Paged {
        #[arg(default_value = "an")]
        query: String,
    },
    /// Reducer-driven todo list with file persistence.
    Todos,
    /// Optimistic toggles with undo, plus the gated like counter.
    Optimistic,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load().context("loading configuration")?;
    if let Some(rate) = cli.failure_rate {
        config.simulation.failure_rate = rate;
        config.validate().context("validating overrides")?;
    }

    let store = Arc::new(
        FileStore::open(config.storage.resolve_dir()).context("opening storage directory")?,
    );

    match cli.demo {
        Demo::Movies { query } => run_movies(&config, store, &query).await,
        Demo::Users { id } => run_users(&config, store, cli.seed, &id).await,
        Demo::Paged { query } => run_paged(&config, cli.seed, &query).await,
        Demo::Todos => run_todos(store),
        Demo::Optimistic => run_optimistic(&config, cli.seed).await,
    }
}

fn profile(config: &Config, seed: u64) -> SimulationProfile {
    SimulationProfile::new(
        config.simulation.latency_min(),
        config.simulation.latency_max(),
        config.simulation.failure_rate,
        seed,
    )
}

/// Wait for the next settled snapshot (a commit or a surfaced error).
async fn wait_settled<T: Clone>(rx: &mut watch::Receiver<GuardSnapshot<T>>) -> GuardSnapshot<T> {
    loop {
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
        let snapshot = rx.borrow_and_update().clone();
        if !snapshot.phase.is_busy() {
            return snapshot;
        }
    }
}

async fn run_movies(
    config: &Config,
    store: Arc<FileStore>,
    query: &str,
) -> anyhow::Result<()> {
    let source = Arc::new(HttpMovieSource::new(config.search.base_url.clone()));
    let widget = MovieSearch::new(
        source,
        store,
        config.timing.debounce(),
        config.search.min_query_chars,
    )?;
    let mut rx = widget.subscribe_results();

    // Feed the query a keystroke at a time; only the full input survives
    // the debounce window.
    info!(%query, "typing");
    for end in 1..=query.len() {
        if let Some(prefix) = query.get(..end) {
            widget.set_input(prefix);
        }
        sleep(Duration::from_millis(80)).await;
    }

    let results = wait_settled(&mut rx).await;
    match results.data {
        Some(movies) => {
            println!("{} result(s) for '{query}':", movies.len());
            for movie in movies.iter().take(10) {
                println!("  {} ({})  [{}]", movie.title, movie.year, movie.imdb_id);
            }
            if let Some(first) = movies.first() {
                widget.toggle_favorite(first);
                widget.set_tab(MovieTab::Favorites);
                println!(
                    "favorites now: {:?}",
                    widget
                        .visible()
                        .iter()
                        .map(|m| m.title.as_str())
                        .collect::<Vec<_>>()
                );
            }
        }
        None => println!("search failed: {:?}", results.error),
    }
    Ok(())
}

async fn run_users(
    config: &Config,
    store: Arc<FileStore>,
    seed: u64,
    id: &str,
) -> anyhow::Result<()> {
    let source = Arc::new(MockEntitySource::new().with_profile(profile(config, seed)));
    let card = UserCard::new(source, store);

    println!("showing user {id}...");
    card.show(id).await?;
    print_user(&card.snapshot());

    println!("refreshing...");
    if let Some(refresh) = card.refresh() {
        refresh.await?;
    }
    print_user(&card.snapshot());
    Ok(())
}

fn print_user(snapshot: &GuardSnapshot<freshstate::source::UserRecord>) {
    match (&snapshot.data, &snapshot.error) {
        (Some(user), None) => {
            println!("  {} <{}> (updated {})", user.name, user.email, user.updated_at)
        }
        (Some(user), Some(error)) => {
            println!("  {} <{}> — refresh failed: {error}", user.name, user.email)
        }
        (None, Some(error)) => println!("  failed: {error}"),
        (None, None) => println!("  (no data)"),
    }
}

async fn run_paged(config: &Config, seed: u64, query: &str) -> anyhow::Result<()> {
    let source = Arc::new(
        MockPagedSource::with_page_size(config.search.page_size)
            .with_profile(profile(config, seed)),
    );
    let widget = PagedSearch::new(source, config.timing.debounce());
    let mut rx = widget.subscribe();

    widget.set_input(query);
    let first = wait_settled(&mut rx).await;
    print_page(&first);

    widget.next_page();
    let second = wait_settled(&mut rx).await;
    print_page(&second);
    Ok(())
}

fn print_page(snapshot: &GuardSnapshot<freshstate::source::PageResult>) {
    match &snapshot.data {
        Some(page) => {
            println!("page {}/{}", page.page, page.total_pages);
            for entry in &page.items {
                println!("  {}  {}", entry.id, entry.name);
            }
        }
        None => println!("request failed: {:?}", snapshot.error),
    }
}

fn run_todos(store: Arc<FileStore>) -> anyhow::Result<()> {
    let board = TodoBoard::load(store)?;

    if board.todos().is_empty() {
        board.add("Write proposal");
        board.add("Review PRs");
        board.add("Prepare interview");
    }

    if let Some(first) = board.todos().first().map(|t| t.id.clone()) {
        board.toggle(&first);
    }

    for todo in board.visible(TodoTab::All) {
        let mark = if todo.completed { "x" } else { " " };
        println!("[{mark}] {}", todo.title);
    }
    println!(
        "{} active / {} completed",
        board.visible(TodoTab::Active).len(),
        board.visible(TodoTab::Completed).len()
    );
    Ok(())
}

async fn run_optimistic(config: &Config, seed: u64) -> anyhow::Result<()> {
    let api = Arc::new(MockMutationApi::new().with_profile(profile(config, seed)));
    let list = OptimisticList::new(
        TaskRow::default_rows(),
        Arc::clone(&api),
        config.timing.undo_grace(),
    );

    println!("toggling '{}'...", list.row(0).map(|r| r.value.title).unwrap_or_default());
    if let Some(confirm) = list.toggle(0) {
        let _ = confirm.await;
    }
    if let Some(row) = list.row(0) {
        println!(
            "  completed={} status={:?} undo={}",
            row.value.completed, row.status, row.undo_available
        );
    }

    let button = LikeButton::new(12, api);
    println!("liking (twice, rapidly)...");
    let first = button.like();
    let second = button.like();
    println!("  second accepted: {}", second.is_some());
    if let Some(confirm) = first {
        let _ = confirm.await;
    }
    println!("  likes settled at {}", button.likes());
    Ok(())
}
