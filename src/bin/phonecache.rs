//! phonecache command-line harness.
//!
//! Opens the store once, runs one command against it and releases it on exit.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use phonecache::contacts::{load_contacts, sample_contacts};
use phonecache::{
    open_store, CacheConfig, CacheError, ContactDetails, LoggingConfig, PhoneNumberDeriver,
    RecordStore, ResolveError, Resolver,
};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "phonecache", version, about = "Offline phone-number lookup with a local cache")]
struct Cli {
    /// Config file path (TOML). A missing file means defaults.
    #[arg(short, long, default_value = "phonecache.toml")]
    config: PathBuf,

    /// Override the data directory.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log filter override, e.g. `debug` or `phonecache=trace`.
    #[arg(long)]
    log_level: Option<String>,

    /// Log format override: pretty, compact or json.
    #[arg(long)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the store if needed and verify it.
    Init,

    /// Resolve phone numbers and print their details.
    Resolve {
        /// Numbers to resolve, used verbatim as cache keys.
        #[arg(required = true)]
        phones: Vec<String>,
    },

    /// List contacts, optionally resolving each one.
    Contacts {
        /// JSON file with `[{"name": ..., "phone": ...}]` entries.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Resolve every listed contact.
        #[arg(long)]
        resolve: bool,
    },

    /// Print the raw stored record for a number.
    Inspect {
        /// Number to look up, verbatim.
        phone: String,
    },

    /// Rewrite the store file keeping only the latest record per key.
    Compact,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "phonecache failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<CacheConfig, CacheError> {
    let mut config = CacheConfig::load_or_default(&cli.config)?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = Some(level.clone());
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = Some(format.clone());
    }

    Ok(config.validate()?)
}

fn run(command: Command, config: &CacheConfig) -> Result<ExitCode, CacheError> {
    // Fatal at startup: without its store the cache cannot operate.
    let store = Arc::new(open_store(&config.data_dir, Some(config.storage.clone()))?);
    info!(path = %store.store_path().display(), "store ready");

    let resolver = Resolver::new(store.clone(), Arc::new(PhoneNumberDeriver::new()));

    let code = match command {
        Command::Init => {
            resolver.ensure_schema()?;
            println!(
                "store ready at {} ({} records)",
                store.store_path().display(),
                store.count()?
            );
            ExitCode::SUCCESS
        }
        Command::Resolve { phones } => {
            let mut failed = false;
            for (i, phone) in phones.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                failed |= !print_resolution(&resolver, phone);
            }
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Contacts { file, resolve } => {
            let contacts = match file {
                Some(path) => load_contacts(&path).unwrap_or_else(|e| {
                    warn!(error = %e, "failed to load contacts; using sample list");
                    sample_contacts()
                }),
                None => sample_contacts(),
            };

            let mut failed = false;
            for contact in &contacts {
                println!("{}  {}", contact.name, contact.phone);
                if resolve {
                    failed |= !print_resolution(&resolver, &contact.phone);
                    println!();
                }
            }
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Inspect { phone } => match store.get(&phone)? {
            Some(record) => {
                let json = serde_json::to_string_pretty(&record)
                    .map_err(|e| CacheError::internal(format!("failed to render record: {e}")))?;
                println!("{json}");
                ExitCode::SUCCESS
            }
            None => {
                println!("{phone}: not cached");
                ExitCode::SUCCESS
            }
        },
        Command::Compact => {
            let result = store.compact()?;
            println!(
                "compacted {} records: {} -> {} bytes",
                result.records, result.size_before, result.size_after
            );
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

/// Prints the details for `phone`; returns false when nothing could be shown.
fn print_resolution(resolver: &Resolver, phone: &str) -> bool {
    match resolver.resolve(phone) {
        Ok(details) => {
            print_details(&details);
            true
        }
        Err(ResolveError::Persist {
            details, source, ..
        }) => {
            print_details(&details);
            warn!(phone, error = %source, "result shown but not cached");
            true
        }
        Err(e) => {
            println!("{phone}: lookup failed: {e}");
            false
        }
    }
}

fn print_details(details: &ContactDetails) {
    for line in details.lines() {
        println!("  {line}");
    }
}

fn init_tracing(config: &LoggingConfig) {
    let level = config.level.as_deref().unwrap_or("warn");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.format.as_deref().unwrap_or("pretty") {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
        "compact" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
    }
}
