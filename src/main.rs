//! companysearch CLI - serve, load and query the company registry

use clap::{Parser, Subcommand};
use companysearch::config::{self, CompanySearchConfig};
use companysearch::server::routes::{PageRequest, MIN_QUERY_CHARS};
use companysearch::server::{self, AppState};
use companysearch::ui::{self, Icons};
use companysearch::{loader, CompanyStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "companysearch")]
#[command(version)]
#[command(about = "Company registry search API - name and CIN lookup over SQLite")]
#[command(long_about = r#"
companysearch serves a read-only JSON API over a SQLite registry of companies:
  • Substring search by company name, paginated
  • Lookup by Corporate Identification Number (CIN)
  • Aggregate active/inactive statistics

Example usage:
  companysearch load --file companies.json
  OGD_API_KEY=... companysearch load --max-records 10000
  companysearch serve --port 8787
  companysearch search --query "Tata"
  companysearch show --cin L28920MH1945PLC004520
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Bulk load companies from an open-data JSON dump or the data.gov.in API
    Load {
        /// JSON file: {"records": [...]} or a bare array of records.
        /// Without it, records are fetched from the data.gov.in resource.
        #[arg(short, long, conflicts_with = "resource_id")]
        file: Option<PathBuf>,

        /// data.gov.in resource to fetch (defaults to the company master data)
        #[arg(long)]
        resource_id: Option<String>,

        /// data.gov.in API key
        #[arg(long, env = "OGD_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Stop after fetching this many records
        #[arg(long)]
        max_records: Option<usize>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Records per transaction
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Search companies by name
    Search {
        /// Substring of the company name
        #[arg(short, long)]
        query: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u64,

        /// Results per page (max 50)
        #[arg(long, default_value = "20")]
        per_page: u32,
    },

    /// Show a single company by CIN
    Show {
        /// Corporate Identification Number
        #[arg(long)]
        cin: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show registry statistics
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let cfg = config::load_config(Some(&config_path))?.unwrap_or_default();

    match cli.command {
        Commands::Serve { database, host, port } => {
            let database = cfg.database_path(database);
            let addr = cfg.bind_addr(host, port)?;
            let store = open_store(&database)?;

            ui::header("companysearch API");
            ui::status(Icons::DATABASE, "Database", &database.display().to_string());
            ui::status(Icons::REMOTE, "Listening", &format!("http://{}", addr));

            let state = Arc::new(AppState::new(Arc::new(store), cfg.tier.clone()));
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::start_server(addr, state))?;
        }

        Commands::Load {
            file,
            resource_id,
            api_key,
            max_records,
            database,
            batch_size,
        } => {
            let database = cfg.database_path(database);
            let store = open_store(&database)?;
            let started = Instant::now();

            ui::header("Loading companies");
            ui::status(Icons::DATABASE, "Database", &database.display().to_string());

            let summary = match file {
                Some(file) => {
                    ui::status(Icons::DUMP, "Source", &file.display().to_string());
                    load_dump(&store, &file, cfg.batch_size(batch_size))?
                }
                None => {
                    let Some(api_key) = api_key else {
                        ui::error("Fetching from data.gov.in needs --api-key or OGD_API_KEY");
                        anyhow::bail!("missing API key");
                    };
                    let resource_id = resource_id.unwrap_or_else(|| cfg.ogd.resource_id.clone());
                    let options = cfg.sync_options(batch_size, max_records);
                    ui::status(Icons::REMOTE, "Source", &format!("{}/{}", cfg.ogd.api_base, resource_id));
                    ui::info("Existing companies", &store.count_companies()?.to_string());

                    let mut client = loader::OgdClient::new(&cfg.ogd.api_base, &resource_id, api_key)?;
                    let progress = ui::LoadProgress::open_ended();
                    let summary = loader::sync_from_source(&store, &mut client, &options, |_, outcome| {
                        progress.batch_done(outcome.written, outcome.skipped);
                    })?;
                    if summary.records == 0 {
                        ui::warn("No records received. Check the API key and resource id.");
                    }
                    progress.finish_with_summary(started.elapsed(), summary.written, summary.skipped);
                    summary
                }
            };
            tracing::info!(records = summary.records, batches = summary.batches, "load finished");

            print_stats(&store)?;
        }

        Commands::Search { query, database, page, per_page } => {
            let query = query.trim().to_string();
            if query.chars().count() < MIN_QUERY_CHARS {
                ui::error(&format!("Search query must be at least {} characters", MIN_QUERY_CHARS));
                anyhow::bail!("query too short");
            }

            let store = open_store(&cfg.database_path(database))?;
            let window = PageRequest::from_params(Some(page.to_string().as_str()), Some(per_page.to_string().as_str()));
            let companies = store.search_by_name(&query, window.per_page, window.offset())?;
            let total = store.count_by_name(&query)?;

            println!("{} Searching for: '{}'", Icons::SEARCH, query);
            if companies.is_empty() {
                ui::warn("No companies found.");
            } else {
                println!("{}", ui::companies_table(&companies));
                ui::info(
                    "Results",
                    &format!(
                        "{} total, page {} of {}",
                        total,
                        window.page,
                        window.total_pages(total)
                    ),
                );
            }
        }

        Commands::Show { cin, database } => {
            let store = open_store(&cfg.database_path(database))?;
            match store.find_by_cin(cin.trim())? {
                Some(company) => ui::company_detail(&company),
                None => {
                    ui::error(&format!("Company with CIN {} not found", cin));
                    anyhow::bail!("not found");
                }
            }
        }

        Commands::Stats { database } => {
            let database = cfg.database_path(database);
            let store = open_store(&database)?;
            println!("{} companysearch Statistics ({})", Icons::STATS, database.display());
            print_stats(&store)?;

            let drift = store.projection_drift()?;
            if drift == 0 {
                ui::success("Search index in sync");
            } else {
                ui::warn(&format!("Search index out of sync: {} rows differ", drift));
            }
        }

        Commands::Init { force } => {
            let default = CompanySearchConfig {
                database: Some(config::default_database_path().display().to_string()),
                host: Some(config::DEFAULT_HOST.to_string()),
                port: Some(config::DEFAULT_PORT),
                batch_size: Some(config::DEFAULT_BATCH_SIZE),
                tier: Default::default(),
                ogd: Default::default(),
            };
            config::write_config(&config_path, &default, force)?;
            ui::success(&format!("Wrote {}", config_path.display()));
        }
    }

    Ok(())
}

/// Parse a local dump and write it in batches behind a progress bar
fn load_dump(store: &CompanyStore, file: &Path, batch_size: usize) -> anyhow::Result<loader::LoadSummary> {
    let started = Instant::now();
    let spinner = ui::Spinner::new("Parsing records...");
    let contents = std::fs::read_to_string(file)?;
    let (companies, missing_cin) = loader::parse_records(&contents)?;
    spinner.finish_with_message(&format!("Parsed {} records", companies.len() + missing_cin));

    if missing_cin > 0 {
        ui::warn(&format!("Skipping {} records without a CIN", missing_cin));
    }
    if companies.is_empty() {
        ui::warn("No records with a CIN found in the input.");
        return Ok(loader::LoadSummary {
            records: missing_cin,
            skipped: missing_cin,
            ..Default::default()
        });
    }

    let progress = ui::LoadProgress::new(companies.len().div_ceil(batch_size));
    let mut summary = loader::load_companies(store, &companies, batch_size, |_, outcome| {
        progress.batch_done(outcome.written, outcome.skipped);
    })?;
    summary.records += missing_cin;
    summary.skipped += missing_cin;
    progress.finish_with_summary(started.elapsed(), summary.written, summary.skipped);
    Ok(summary)
}

fn open_store(database: &Path) -> anyhow::Result<CompanyStore> {
    config::ensure_db_dir(database)?;
    tracing::debug!("Opening database {}", database.display());
    Ok(CompanyStore::open(database)?)
}

fn print_stats(store: &CompanyStore) -> anyhow::Result<()> {
    let started = Instant::now();
    let stats = store.aggregate_stats()?;
    let total = stats.total.to_string();
    let active = stats.active.to_string();
    let inactive = stats.inactive().to_string();
    let last_update = stats.last_update.clone().unwrap_or_else(|| "never".to_string());

    println!(
        "{}",
        ui::stats_table(&[
            ("Total companies", total.as_str()),
            ("Active", active.as_str()),
            ("Inactive", inactive.as_str()),
            ("Last update", last_update.as_str()),
        ])
    );
    ui::timing(&format!("{:.1?}", started.elapsed()));
    Ok(())
}
