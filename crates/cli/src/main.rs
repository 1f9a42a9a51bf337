use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lede_api::{CancellationToken, HttpSearch, Navigator, RemoteSearch};
use lede_core::{decode_feed, Document, SearchResult};
use lede_search::title_index;
use lede_store::CorpusStore;
use lede_typeahead::{spawn_controller, Input, Key, TypeaheadConfig, View};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ledectl", version, about = "Lede post typeahead from the terminal")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Order { Recent, Alpha }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prefix-match post titles from a posts JSON file
    Suggest {
        /// Posts file: bare array, `{ posts }` or GraphQL `{ data: { posts: { nodes } } }`
        posts: PathBuf,
        prefix: String,
        #[arg(long = "limit", default_value_t = 10)]
        limit: usize,
        #[arg(long = "order", value_enum, default_value_t = Order::Recent)]
        order: Order,
    },
    /// Replay keystrokes through a typeahead controller and print the final panel
    Type {
        posts: PathBuf,
        /// Text fragments and keys: <Down> <Up> <Home> <End> <PgDn> <PgUp> <Enter> <Esc> <Tab> <Bksp> <Wait>
        #[arg(required = true)]
        tokens: Vec<String>,
        /// Site origin serving /api/search
        #[arg(long = "remote", env = "LEDE_SEARCH_URL")]
        remote: Option<String>,
        /// Pause between tokens
        #[arg(long = "pause-ms", default_value_t = 0)]
        pause_ms: u64,
    },
    /// Query the site's search route directly
    Remote {
        query: String,
        #[arg(long = "url", env = "LEDE_SEARCH_URL")]
        url: String,
        #[arg(long = "first", default_value_t = HttpSearch::DEFAULT_FIRST)]
        first: usize,
    },
}

fn init_tracing() {
    let env = std::env::var("LEDE_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("LEDE_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid LEDE_METRICS_ADDR; expected host:port");
        }
    }
}

/// One replayed input step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Text(String),
    Key(Key),
    Backspace,
    Wait,
}

fn parse_step(token: &str) -> Result<Step> {
    let Some(name) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
        return Ok(Step::Text(token.to_string()));
    };
    match name {
        "Bksp" | "Backspace" => Ok(Step::Backspace),
        "Wait" => Ok(Step::Wait),
        other => match Key::from_str(other) {
            Ok(k) => Ok(Step::Key(k)),
            Err(e) => bail!("{} (in token {})", e, token),
        },
    }
}

fn load_posts(path: &Path) -> Result<Vec<Document>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let feed = decode_feed(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    if feed.skipped > 0 {
        warn!(skipped = feed.skipped, "posts without slug ignored");
    }
    info!(posts = feed.documents.len(), path = %path.display(), "posts loaded");
    Ok(feed.documents)
}

#[derive(Serialize)]
struct Row<'a> {
    title: &'a str,
    href: String,
    date: Option<&'a str>,
}

/// Prints instead of navigating.
struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, href: &str) {
        info!(href, "navigate");
        println!("→ {}", href);
    }

    fn focus_input(&self) {
        println!("→ (focus input)");
    }
}

fn print_results(output: Output, results: &[SearchResult]) -> Result<()> {
    match output {
        Output::Human => {
            if results.is_empty() {
                println!("(no results)");
            }
            for r in results {
                println!("{:<48} {}", r.title, r.href);
            }
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(results)?),
    }
    Ok(())
}

fn print_view(output: Output, view: &View) -> Result<()> {
    match output {
        Output::Human => {
            println!("query: {:?}  open: {}  loading: {}", view.query, view.open, view.loading);
            if let Some(err) = &view.error {
                println!("! {}", err);
            }
            if let Some(hint) = &view.empty_state {
                println!("  {}", hint);
            }
            for (i, r) in view.results.iter().enumerate() {
                let mark = if view.highlight == Some(i) { '>' } else { ' ' };
                println!("{} {:<46} {}", mark, r.title, r.href);
            }
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(view)?),
    }
    Ok(())
}

async fn run_type(output: Output, posts: &Path, tokens: &[String], remote: Option<String>, pause_ms: u64) -> Result<()> {
    let steps = tokens.iter().map(|t| parse_step(t)).collect::<Result<Vec<_>>>()?;
    let cfg = TypeaheadConfig::from_env();
    let settle = cfg.debounce + Duration::from_millis(50);
    let remote: Option<Arc<dyn RemoteSearch>> = match remote {
        Some(url) => Some(Arc::new(HttpSearch::new(&url).context("remote search client")?)),
        None => None,
    };
    let mut store = CorpusStore::new();
    store.publish(load_posts(posts)?);
    let (handle, task) = spawn_controller(cfg, store.reader(), remote, Arc::new(PrintNavigator));
    handle.send(Input::Focus).await?;

    let mut text = String::new();
    for step in steps {
        match step {
            Step::Text(t) => {
                text.push_str(&t);
                handle.type_text(text.clone()).await?;
            }
            Step::Backspace => {
                text.pop();
                handle.type_text(text.clone()).await?;
            }
            Step::Key(k) => handle.key(k).await?,
            Step::Wait => tokio::time::sleep(settle).await,
        }
        if pause_ms > 0 {
            tokio::time::sleep(Duration::from_millis(pause_ms)).await;
        }
    }

    // Let the last keystroke commit, then wait out any request.
    tokio::time::sleep(settle).await;
    let mut views = handle.subscribe();
    let started = Instant::now();
    let idle = async {
        while views.borrow_and_update().loading {
            if views.changed().await.is_err() {
                break;
            }
        }
    };
    tokio::select! {
        _ = signal::ctrl_c() => warn!("interrupted"),
        res = tokio::time::timeout(HttpSearch::TIMEOUT + settle, idle) => {
            if res.is_err() {
                warn!(waited_ms = started.elapsed().as_millis() as u64, "remote search still pending");
            }
        }
    }
    print_view(output, &handle.view())?;
    handle.shutdown().await?;
    task.await.context("controller task")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    match cli.command {
        Commands::Suggest { posts, prefix, limit, order } => {
            info!(prefix = %prefix, limit, ?order, "suggest invoked");
            metrics::counter!("ledectl_commands_total", 1u64, "cmd" => "suggest");
            let started = Instant::now();
            let idx = title_index(load_posts(&posts)?);
            let hits = match order {
                Order::Recent => idx.suggest(&prefix, limit),
                Order::Alpha => idx.prefix_range(&prefix, limit),
            };
            info!(hits = hits.len(), took_ms = %started.elapsed().as_millis(), "suggest done");
            match cli.output {
                Output::Human => {
                    let results: Vec<SearchResult> = hits.into_iter().map(SearchResult::from).collect();
                    print_results(cli.output, &results)?;
                }
                Output::Json => {
                    let rows: Vec<Row> = hits
                        .iter()
                        .map(|d| Row { title: &d.title, href: d.href(), date: d.date.as_deref() })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
            }
        }
        Commands::Type { posts, tokens, remote, pause_ms } => {
            info!(tokens = tokens.len(), remote = ?remote, "type invoked");
            metrics::counter!("ledectl_commands_total", 1u64, "cmd" => "type");
            run_type(cli.output, &posts, &tokens, remote, pause_ms).await?;
        }
        Commands::Remote { query, url, first } => {
            info!(query = %query, url = %url, first, "remote invoked");
            metrics::counter!("ledectl_commands_total", 1u64, "cmd" => "remote");
            let client = HttpSearch::new(&url).context("remote search client")?.with_first(first);
            let results = tokio::select! {
                _ = signal::ctrl_c() => bail!("interrupted"),
                res = client.search(&query, CancellationToken::new()) => res.with_context(|| format!("GET {}", client.endpoint()))?,
            };
            print_results(cli.output, &results)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_to_steps() {
        assert_eq!(parse_step("kaf").unwrap(), Step::Text("kaf".into()));
        assert_eq!(parse_step("<Down>").unwrap(), Step::Key(Key::ArrowDown));
        assert_eq!(parse_step("<PgDn>").unwrap(), Step::Key(Key::PageDown));
        assert_eq!(parse_step("<Esc>").unwrap(), Step::Key(Key::Escape));
        assert_eq!(parse_step("<Bksp>").unwrap(), Step::Backspace);
        assert_eq!(parse_step("<Wait>").unwrap(), Step::Wait);
        assert!(parse_step("<F5>").is_err());
    }

    #[test]
    fn unbracketed_key_names_are_text() {
        assert_eq!(parse_step("Enter").unwrap(), Step::Text("Enter".into()));
        assert_eq!(parse_step("<").unwrap(), Step::Text("<".into()));
    }

    #[test]
    fn cli_parses_type_command() {
        let cli = Cli::try_parse_from(["ledectl", "-o", "json", "type", "posts.json", "kaf", "<Down>", "--pause-ms", "5"]).unwrap();
        assert_eq!(cli.output, Output::Json);
        match cli.command {
            Commands::Type { tokens, pause_ms, .. } => {
                assert_eq!(tokens, vec!["kaf", "<Down>"]);
                assert_eq!(pause_ms, 5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
