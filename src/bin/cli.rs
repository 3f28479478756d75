use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use live_odds::analysis::{live_matches, popular_leagues};
use live_odds::data::{load_artifact, load_raw_payload};
use live_odds::export::{export, ExportFormat};
use live_odds::parser::parse_matches;
use live_odds::{fetch_live_matches, AppConfig, LineFeedClient, MatchRecord};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cli", about = "Fetch, parse and export live odds from the line feed")]
struct Cli {
    /// Override the upstream base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch live matches, save them as an artifact and print a summary
    Fetch {
        #[arg(long)]
        sport: Option<u32>,
        #[arg(long)]
        count: Option<u32>,
    },
    /// Parse a saved upstream payload and print a summary
    Parse {
        file: PathBuf,
        #[arg(long)]
        sport: Option<u32>,
    },
    /// Export a saved artifact to CSV or JSON
    Export {
        artifact: PathBuf,
        #[arg(long)]
        format: String,
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("Failed to read configuration")?;
    if let Some(base_url) = cli.base_url {
        config.upstream_base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command {
        Command::Fetch { sport, count } => {
            let sport = sport.unwrap_or(config.default_sport_id);
            let count = count.unwrap_or(config.default_count);
            let client = LineFeedClient::from_config(&config)?;

            println!("Fetching up to {} matches for sport {}...\n", count, sport);
            let (records, summary) = fetch_live_matches(&client, sport, count, &config.data_dir)
                .await
                .context("Failed to fetch live matches")?;

            println!("Saved {} matches to {}\n", summary.matches_fetched, summary.saved_to);
            print_summary(&records);
        }
        Command::Parse { file, sport } => {
            let payload = load_raw_payload(&file)
                .with_context(|| format!("Failed to read payload {}", file.display()))?;
            let records = parse_matches(&payload, sport.unwrap_or(config.default_sport_id))
                .context("Failed to parse payload")?;
            print_summary(&records);
        }
        Command::Export {
            artifact,
            format,
            output,
        } => {
            // Validate the format before touching the output path
            let format: ExportFormat = format.parse()?;
            let records = load_artifact(&artifact)
                .with_context(|| format!("Failed to read artifact {}", artifact.display()))?;
            let bytes = export(&records, format)?;
            std::fs::write(&output, bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Exported {} matches as {} to {}",
                records.len(),
                format,
                output.display()
            );
        }
    }

    Ok(())
}

fn print_summary(records: &[MatchRecord]) {
    println!("Total matches: {}", records.len());
    println!("Live matches: {}", live_matches(records).len());

    println!("\nPOPULAR LEAGUES\n");
    let leagues = popular_leagues(records);
    if leagues.is_empty() {
        println!("No leagues found.");
    }
    for (i, league) in leagues.iter().take(5).enumerate() {
        let name = if league.league.is_empty() {
            "(no league)"
        } else {
            league.league.as_str()
        };
        println!("{}. {}: {} matches", i + 1, name, league.count);
    }

    if let Some(first) = records.first() {
        println!("\nSAMPLE MATCH\n");
        println!("{}", first.name());
        println!("League: {}", first.league);
        match first.start_time {
            Some(start) => println!("Start: {}", start.to_rfc3339()),
            None => println!("Start: unknown"),
        }
        for (label, price) in &first.odds {
            println!("  {}: {:.2}", label, price);
        }
    }
}
