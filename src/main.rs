use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::time::Duration;

use gridnotes::config::{database_url_from_env, Config, RegionSelector};
use gridnotes::keywords::BUILTIN_KEYWORDS;
use gridnotes::logging::configure_logging;
use gridnotes::pipeline;

/// Import power-infrastructure-related OSM notes for an entire region.
#[derive(Parser, Debug)]
#[command(name = "gridnotes", version, about)]
struct Cli {
    /// Country name to download notes for
    #[arg(long)]
    country: Option<String>,

    /// Explicit bounding box (min_lon,min_lat,max_lon,max_lat)
    #[arg(long)]
    bbox: Option<String>,

    /// Maximum size of each tile in degrees
    #[arg(long, default_value_t = 0.5)]
    tile_size: f64,

    /// Maximum number of notes to retrieve per tile
    #[arg(long, default_value_t = 10_000)]
    limit: u32,

    /// Number of days of closed notes to include
    #[arg(long, default_value_t = 7)]
    closed: i32,

    /// Minimum delay in seconds between API requests
    #[arg(long, default_value_t = 1.0)]
    rate_limit: f64,

    /// Maximum number of tiles to process (for bounded test runs)
    #[arg(long)]
    max_tiles: Option<usize>,

    /// File containing additional keywords, one per line
    #[arg(long)]
    keywords_file: Option<PathBuf>,

    /// List the built-in keyword corpus and exit
    #[arg(long)]
    list_keywords: bool,

    /// User agent string for API requests
    #[arg(long, default_value = "gridnotes/0.4 (power infrastructure notes importer)")]
    user_agent: String,

    /// Create database tables if they do not exist
    #[arg(long)]
    create_tables: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_keywords {
        for (keyword, lang) in BUILTIN_KEYWORDS {
            println!("{}  {}", lang, keyword);
        }
        println!("\nTotal: {} keywords", BUILTIN_KEYWORDS.len());
        return Ok(());
    }

    configure_logging(cli.quiet);

    let config = Config {
        region: RegionSelector::from_options(cli.country, cli.bbox)?,
        tile_size: cli.tile_size,
        limit: cli.limit,
        closed_days: cli.closed,
        rate_limit: Duration::from_secs_f64(cli.rate_limit.max(0.0)),
        max_tiles: cli.max_tiles,
        keywords_file: cli.keywords_file,
        user_agent: cli.user_agent,
        database_url: database_url_from_env()?,
        create_tables: cli.create_tables,
        quiet: cli.quiet,
    };

    let summary = pipeline::run(&config).await?;

    // The summary prints even in quiet mode.
    println!("{}", summary);
    Ok(())
}
