//! CLI entry point for `mailgraph`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mailgraph::config::{load_config, Config};
use mailgraph::model::record::EmailRecord;
use mailgraph::search::query::{SearchFilters, SearchQuery};
use mailgraph::EmailEngine;

#[derive(Parser)]
#[command(name = "mailgraph", version, about = "In-memory email graph and search engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// The mailbox owner's email address (overrides config)
    #[arg(short, long, global = true, env = "MAILGRAPH_CENTRAL_USER")]
    central_user: Option<String>,

    /// Cap on the number of records ingested (overrides config)
    #[arg(long, global = true)]
    max_emails: Option<usize>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph from a JSON records file and save a snapshot
    Build {
        /// JSON file holding an array of email records
        records: PathBuf,
        /// Where to write the graph snapshot
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show graph statistics
    Stats {
        records: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Search messages
    Search {
        records: PathBuf,
        /// Free search text
        #[arg(short, long, default_value = "")]
        text: String,
        /// Contact name or email to filter on
        #[arg(long)]
        contact: Option<String>,
        /// Inclusive range start, YYYY-MM-DD
        #[arg(long)]
        from_date: Option<String>,
        /// Inclusive range end, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        to_date: Option<String>,
        /// Topic ids (repeatable)
        #[arg(long = "topic")]
        topics: Vec<String>,
        /// Maximum results (0 = configured default)
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
        /// Full structured query as JSON (overrides the flags above)
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config();
    if cli.max_emails.is_some() {
        config.ingest.max_emails = cli.max_emails;
    }

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level);

    let central_user = cli
        .central_user
        .or_else(|| config.general.central_user.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("no central user: pass --central-user or set it in the config")
        })?;

    match cli.command {
        Commands::Build { records, output } => {
            cmd_build(&records, output.as_deref(), &central_user, &config)
        }
        Commands::Stats { records, json } => cmd_stats(&records, json, &central_user, &config),
        Commands::Search {
            records,
            text,
            contact,
            from_date,
            to_date,
            topics,
            limit,
            query,
            json,
        } => {
            let search_query = match query {
                Some(raw) => serde_json::from_str(&raw)?,
                None => SearchQuery {
                    text,
                    filters: SearchFilters {
                        contact_name: contact,
                        date_from: from_date,
                        date_to: to_date,
                        topic_ids: topics,
                        ..Default::default()
                    },
                    limit,
                    ..Default::default()
                },
            };
            cmd_search(&records, &search_query, json, &central_user, &config)
        }
    }
}

/// Set up tracing on stderr, honoring `RUST_LOG` when set.
fn setup_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read records and build an engine, with a progress spinner.
fn build_engine(path: &Path, central_user: &str, config: &Config) -> anyhow::Result<EmailEngine> {
    if !path.exists() {
        anyhow::bail!("records file not found: {}", path.display());
    }

    let contents = std::fs::read_to_string(path)?;
    let records: Vec<EmailRecord> = serde_json::from_str(&contents)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(format!("Building graph from {} records…", records.len()));

    let start = Instant::now();
    let mut engine = EmailEngine::new(config.clone());
    let stats = engine.build(&records, central_user)?;
    pb.finish_and_clear();

    eprintln!(
        "Ingested {}/{} records in {:.2?} ({} failed)",
        stats.emails_successful,
        stats.emails_processed,
        start.elapsed(),
        stats.emails_failed,
    );
    Ok(engine)
}

fn cmd_build(
    path: &Path,
    output: Option<&Path>,
    central_user: &str,
    config: &Config,
) -> anyhow::Result<()> {
    let engine = build_engine(path, central_user, config)?;
    if let Some(output) = output {
        let snapshot = engine.snapshot();
        std::fs::write(output, serde_json::to_string(&snapshot)?)?;
        eprintln!("Snapshot written to {}", output.display());
    }
    Ok(())
}

fn cmd_stats(path: &Path, json: bool, central_user: &str, config: &Config) -> anyhow::Result<()> {
    let engine = build_engine(path, central_user, config)?;
    let stats = engine.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Messages: {}", stats.messages);
        println!("Users:    {}", stats.users);
        println!("Threads:  {}", stats.threads);
        println!("Edges:    {}", stats.edges);
    }
    Ok(())
}

fn cmd_search(
    path: &Path,
    query: &SearchQuery,
    json: bool,
    central_user: &str,
    config: &Config,
) -> anyhow::Result<()> {
    let engine = build_engine(path, central_user, config)?;
    let results = engine.search(query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, result) in results.iter().enumerate() {
        println!(
            "{:2}. [{:.3}] {} — {} <{}> ({})",
            i + 1,
            result.scores.total,
            result.subject,
            result.sender.name,
            result.sender.email,
            result.date,
        );
        if !result.snippet.is_empty() {
            println!("      {}", result.snippet);
        }
    }
    Ok(())
}
