//! zotero-bib - Zotero library fetcher and bibliography search
//!
//! ## Usage
//!
//! ```bash
//! zotero-bib fetch --format bibtex --output references.bib
//! zotero-bib search --author smith --year-range 2015-2020
//! zotero-bib local --bib references.bib --title-word measles
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};
use zotero_bib::{
    bibtex,
    config::{self, ConfigSource},
    data,
    local::{self, LocalFilters},
    search::{self, ItemSource, SearchFilters},
    zotero::{self, ZoteroClient, DEFAULT_PAGE_SIZE},
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Zotero library fetcher, BibTeX converter and bibliography search
#[derive(Parser)]
#[command(name = "zotero-bib")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Credential options shared by commands that talk to the Zotero API
#[derive(clap::Args)]
struct CredentialArgs {
    /// Config file with a `zotero: {username, api_key}` section
    #[arg(long)]
    config: Option<PathBuf>,

    /// Zotero user id (overrides the config file together with --api-key)
    #[arg(long, requires = "api_key")]
    user: Option<String>,

    /// Zotero API key
    #[arg(long, requires = "user")]
    api_key: Option<String>,

    /// Items per API request
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    limit: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum FetchFormat {
    /// Titled items as a JSON array
    Json,
    /// JSON items converted to BibTeX
    Bibtex,
    /// Bibliography text as served by the API
    Bib,
}

impl FetchFormat {
    fn extension(self) -> &'static str {
        match self {
            FetchFormat::Json => "json",
            FetchFormat::Bibtex => "bib",
            FetchFormat::Bib => "txt",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the whole Zotero library and save it
    Fetch {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "bibtex")]
        format: FetchFormat,

        /// Output file (default: timestamped file in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert saved JSON items to BibTeX
    Convert {
        /// JSON file written by `fetch --format json`
        input: PathBuf,

        /// Output .bib file
        #[arg(short, long, default_value = "references.bib")]
        output: PathBuf,
    },

    /// Search Zotero items (fetches the library unless --items is given)
    Search {
        #[command(flatten)]
        credentials: CredentialArgs,

        /// Search saved JSON items instead of fetching
        #[arg(long)]
        items: Option<PathBuf>,

        /// Author last name (substring)
        #[arg(long)]
        author: Option<String>,

        /// Publication year
        #[arg(long)]
        year: Option<i32>,

        /// Inclusive year range (e.g., "2015-2020")
        #[arg(long)]
        year_range: Option<String>,

        /// Journal name (substring)
        #[arg(long)]
        journal: Option<String>,

        /// Word that must appear in the title (repeatable)
        #[arg(long = "title-word")]
        title_words: Vec<String>,
    },

    /// Search a local BibTeX file
    Local {
        /// BibTeX database
        #[arg(long, default_value = local::DEFAULT_BIB_PATH)]
        bib: PathBuf,

        /// Author (substring)
        #[arg(long)]
        author: Option<String>,

        /// Year (exact)
        #[arg(long)]
        year: Option<String>,

        /// Journal name (substring)
        #[arg(long)]
        journal: Option<String>,

        /// Word that must appear in the title (repeatable)
        #[arg(long = "title-word")]
        title_words: Vec<String>,
    },

    /// Load a CSV data file and summarize it
    Csv {
        /// CSV file with a header row
        path: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fetch {
            credentials,
            format,
            output,
        } => run_fetch(credentials, format, output).await,
        Commands::Convert { input, output } => run_convert(&input, &output),
        Commands::Search {
            credentials,
            items,
            author,
            year,
            year_range,
            journal,
            title_words,
        } => {
            let year_range = year_range
                .as_deref()
                .map(parse_year_range)
                .transpose()
                .context("Invalid --year-range format")?;
            let filters = SearchFilters {
                author,
                year,
                year_range,
                journal,
                title_words,
            };
            run_search(credentials, items, filters).await
        }
        Commands::Local {
            bib,
            author,
            year,
            journal,
            title_words,
        } => {
            let filters = LocalFilters {
                author,
                year,
                journal,
                title_words,
            };
            run_local(&bib, &filters)
        }
        Commands::Csv { path } => run_csv(&path),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn config_source(args: &CredentialArgs) -> Result<ConfigSource> {
    if let (Some(user), Some(api_key)) = (&args.user, &args.api_key) {
        return Ok(ConfigSource::Inline(HashMap::from([
            ("username".to_string(), user.clone()),
            ("api_key".to_string(), api_key.clone()),
        ])));
    }

    let path = match &args.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    Ok(ConfigSource::File(path))
}

async fn run_fetch(args: CredentialArgs, format: FetchFormat, output: Option<PathBuf>) -> Result<()> {
    let source = config_source(&args)?;
    let credentials = config::load_credentials(&source).context("Failed to load Zotero credentials")?;
    let client = ZoteroClient::new(credentials, args.limit)?;

    let output = output.unwrap_or_else(|| {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!("zotero_{}.{}", timestamp, format.extension()))
    });

    match format {
        FetchFormat::Json => {
            let items = client.save_records_json(&output).await?;
            println!("Saved {} items to {}", items.len(), output.display());
        }
        FetchFormat::Bibtex => {
            let entries = client.save_bibtex(&output).await?;
            println!("Saved {} BibTeX entries to {}", entries, output.display());
        }
        FetchFormat::Bib => {
            client.save_bibliography_text(&output).await?;
            println!("Saved bibliography to {}", output.display());
        }
    }
    Ok(())
}

fn run_convert(input: &Path, output: &Path) -> Result<()> {
    let items = zotero::load_items_from_file(input)
        .with_context(|| format!("Failed to read items from {}", input.display()))?;
    let entries = bibtex::items_to_entries(&items);
    std::fs::write(output, bibtex::render_entries(&entries)).context("Failed to write BibTeX")?;
    println!("Converted {} of {} items to {}", entries.len(), items.len(), output.display());
    Ok(())
}

async fn run_search(args: CredentialArgs, items: Option<PathBuf>, filters: SearchFilters) -> Result<()> {
    let source = match items {
        Some(path) => ItemSource::Items(
            zotero::load_items_from_file(&path)
                .with_context(|| format!("Failed to read items from {}", path.display()))?,
        ),
        None => ItemSource::Library {
            config: config_source(&args)?,
            page_size: args.limit,
            base_url: None,
        },
    };

    let hits = search::search_bibliography(source, &filters).await?;
    info!(matches = hits.len(), "Search finished");
    Ok(())
}

fn run_local(bib: &Path, filters: &LocalFilters) -> Result<()> {
    let bibliography = local::load_bibliography(bib)
        .with_context(|| format!("Failed to load {}", bib.display()))?;
    let entries = local::filter_entries(&bibliography, filters);

    if entries.is_empty() {
        println!("No matching entries found.");
    }
    for entry in &entries {
        println!("{}: {}", entry.key, local::field_text(entry, "title"));
    }
    Ok(())
}

fn run_csv(path: &Path) -> Result<()> {
    let table = data::load_csv(path)?;
    println!("Columns: {}", table.headers.join(", "));
    println!("Rows: {}", table.rows.len());
    Ok(())
}

/// Parse a year range string (e.g., "2015-2020")
fn parse_year_range(range: &str) -> Result<(i32, i32)> {
    let (from, to) = range
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("Expected FROM-TO"))?;
    let from: i32 = from.trim().parse().context("Invalid start year")?;
    let to: i32 = to.trim().parse().context("Invalid end year")?;
    if from > to {
        anyhow::bail!("Start year {} is after end year {}", from, to);
    }
    Ok((from, to))
}
