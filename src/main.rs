//! quark_save CLI - Search Quark share links and save them to your drive.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing_subscriber::EnvFilter;

use quark_save::config::load_credential_file;
use quark_save::{App, Config, Endpoints, SaveOutcome, SearchResult, StateEvent};

/// CLI tool for searching shared Quark links and saving them to your drive.
#[derive(Parser)]
#[command(name = "quark_save")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Quark cookie copied from a logged-in browser session.
    #[arg(long, env = "QUARK_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// File holding the cookie (bare, or as a `cookies = "..."` line).
    #[arg(long, env = "QUARK_COOKIE_FILE", conflicts_with = "cookie")]
    cookie_file: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Maximum number of concurrent network calls.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Send every request to this base URL instead of the real services.
    #[arg(long, env = "QUARK_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the cookie and show the account nickname.
    Verify,

    /// Search for share links.
    Search {
        /// Search keyword.
        keyword: String,
    },

    /// Search, then save results into the drive root.
    Save {
        /// Search keyword.
        keyword: String,

        /// Result numbers to save, as listed by `search` (default: all).
        #[arg(long, short = 'p', value_delimiter = ',')]
        pick: Vec<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config {
        endpoints: cli
            .api_base
            .as_deref()
            .map(Endpoints::with_base)
            .unwrap_or_default(),
        request_timeout: Duration::from_secs(cli.timeout),
        max_in_flight: cli.workers,
        ..Config::default()
    };

    let app = App::new(&config).context("Failed to initialize client")?;
    let mut view = View::new(&app);

    let result = run(&app, &cli, &mut view).await;
    view.flush();
    result
}

async fn run(app: &App, cli: &Cli, view: &mut View) -> Result<()> {
    match &cli.command {
        Commands::Verify => {
            verify(app, cli).await?;
        }

        Commands::Search { keyword } => {
            let outcome = app.search(keyword).await;
            view.flush();
            if let quark_save::SearchOutcome::Failed(reason) = &outcome {
                eprintln!("Search failed: {}", reason);
            }
            print_results(outcome.results());
        }

        Commands::Save { keyword, pick } => {
            verify(app, cli).await?;

            let results = app.search(keyword).await.into_results();
            view.flush();
            let chosen = pick_results(&results, pick)?;
            if chosen.is_empty() {
                println!("Nothing to save.");
                return Ok(());
            }

            println!("Saving {} resource(s)...", chosen.len());
            let saves = join_all(chosen.iter().map(|r| app.save_resource(r)));
            tokio::pin!(saves);

            // Render progress while the saves run.
            let outcomes = loop {
                tokio::select! {
                    outcomes = &mut saves => break outcomes,
                    Some(event) = view.next() => render(&event),
                }
            };
            view.flush();

            let mut saved = 0;
            for outcome in outcomes {
                if matches!(outcome, Ok(SaveOutcome::Succeeded)) {
                    saved += 1;
                }
            }
            println!("Done. {}/{} saved.", saved, chosen.len());
        }
    }

    Ok(())
}

async fn verify(app: &App, cli: &Cli) -> Result<()> {
    let cookie = match (&cli.cookie, &cli.cookie_file) {
        (Some(cookie), _) => cookie.clone(),
        (None, Some(path)) => load_credential_file(path)
            .with_context(|| format!("Failed to import cookie from {:?}", path))?,
        (None, None) => String::new(),
    };

    app.verify_credential(&cookie)
        .await
        .context("Cookie verification failed")?;
    Ok(())
}

/// Select results by 1-based number; an empty selection means all.
fn pick_results(results: &[SearchResult], pick: &[usize]) -> Result<Vec<SearchResult>> {
    if pick.is_empty() {
        return Ok(results.to_vec());
    }

    let mut chosen = Vec::with_capacity(pick.len());
    for &n in pick {
        let result = n
            .checked_sub(1)
            .and_then(|idx| results.get(idx))
            .with_context(|| format!("No result numbered {} ({} found)", n, results.len()))?;
        if !chosen.contains(result) {
            chosen.push(result.clone());
        }
    }
    Ok(chosen)
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }

    println!("{:<4} {:<35} {:<10} {}", "#", "TITLE", "DATE", "URL");
    println!("{}", "-".repeat(100));
    for (idx, result) in results.iter().enumerate() {
        println!(
            "{:<4} {:<35} {:<10} {}",
            idx + 1,
            result.display_title(),
            result.display_date(),
            result.url
        );
    }
}

/// Renders state events on the controlling task, so output follows the
/// order of the intents that caused it.
struct View {
    events: broadcast::Receiver<StateEvent>,
}

impl View {
    fn new(app: &App) -> Self {
        Self {
            events: app.subscribe(),
        }
    }

    /// Wait for the next event. `None` once the channel is closed.
    async fn next(&mut self) -> Option<StateEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Render every event already emitted.
    fn flush(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => render(&event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }
}

fn render(event: &StateEvent) {
    match event {
        StateEvent::SessionChanged {
            nickname: Some(nickname),
        } => println!("Connected: {}", nickname),
        StateEvent::SessionChanged { nickname: None } => println!("Disconnected."),
        StateEvent::ResultsReplaced { count, failed } => {
            if *failed {
                println!("Search failed, no results.");
            } else {
                println!("Found {} result(s).", count);
            }
        }
        StateEvent::SaveStarted { title, .. } => {
            println!("Processing: {}", quark_save::models::truncate_chars(title, 32));
        }
        StateEvent::SaveFinished { url, outcome } => {
            let mark = if outcome.is_success() {
                "OK"
            } else if outcome.is_retryable() {
                "RETRY"
            } else {
                "FAILED"
            };
            println!("[{}] {} ({})", mark, outcome, url);
        }
    }
}
