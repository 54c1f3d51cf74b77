mod logging;

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing::{info, warn};
use wikicodename_cache::{FileCache, KeyValueCache, StorageError};
use wikicodename_core::{Config, ConfigError, ConfigProvider, MAIN_PROFILE};
use wikicodename_generate::{
    DEFAULT_MAX_ATTEMPT_COUNT, GenerationError, Generator, GeneratorOptions,
};
use wikicodename_wiki::{DEFAULT_TIMEOUT, HttpTransport, TransportError, WikiFetcher};

use logging::init_logging;

const APP_DIRECTORY_NAME: &str = "wikicodename";
const CONFIG_VERSION_KEY: &str = "config_version";

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to generate the initial configuration")]
    InitialConfig(#[source] ConfigError),
    #[error(
        "invalid configuration; run with --generate-config to generate a valid configuration or fix it manually"
    )]
    Config(#[source] ConfigError),
    #[error("cache error")]
    Cache(#[source] StorageError),
    #[error("could not set up the HTTP client")]
    Transport(#[source] TransportError),
    #[error(transparent)]
    Generation(GenerationError),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::InitialConfig(_) => 1,
            CliError::Config(_) => 2,
            CliError::Cache(_) => 3,
            CliError::Transport(_) | CliError::Generation(_) => 4,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "wikicodename",
    version,
    about = "Generate code names using lists and tables from Wikipedia articles"
)]
struct Cli {
    /// Configuration directory (platform config dir when omitted).
    #[arg(long, value_name = "DIR")]
    config_path: Option<PathBuf>,
    /// Cache directory (platform cache dir when omitted).
    #[arg(long, value_name = "DIR")]
    cache_path: Option<PathBuf>,
    /// Profile to generate.
    #[arg(short, long, default_value = MAIN_PROFILE)]
    profile: String,
    /// Length of the generated list of code names.
    #[arg(short, long, default_value_t = 10)]
    count: usize,
    /// Maximum number of attempts to generate a valid code name.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPT_COUNT)]
    attempt_count: usize,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Sort the generated list of code names.
    #[arg(short, long)]
    sort: bool,
    /// List every code name of the profile (must be backed by a list).
    #[arg(long)]
    list_all: bool,
    /// List all available profiles.
    #[arg(long)]
    list_profiles: bool,
    /// Write the default configuration, replacing existing profile files.
    #[arg(long)]
    generate_config: bool,
    /// Clear the cache.
    #[arg(long)]
    clear_cache: bool,
    /// Only log errors (useful in scripts).
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.quiet) {
        eprintln!("could not initialize logging: {err}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = match cli.config_path {
        Some(path) => path,
        None => {
            let path = default_dir(dirs::config_dir());
            if !path.is_dir() {
                Config::generate(&path).map_err(CliError::InitialConfig)?;
                info!(path = %path.display(), "initial configuration generated");
            }
            path
        }
    };

    if cli.generate_config {
        Config::generate(&config_path).map_err(CliError::Config)?;
        info!(path = %config_path.display(), "the configuration has been generated");
        return Ok(());
    }

    let config = Config::load(&config_path).map_err(CliError::Config)?;
    if cli.list_profiles {
        let mut names = config.profile_names();
        names.sort();
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    let cache = FileCache::new(
        cli.cache_path
            .unwrap_or_else(|| default_dir(dirs::cache_dir())),
    );
    cache.setup().map_err(CliError::Cache)?;
    if cli.clear_cache {
        cache.clear().map_err(CliError::Cache)?;
        info!(path = %cache.base_path().display(), "the cache has been cleared");
        return Ok(());
    }
    check_config_version(&cache, &config.version())?;

    let config: Arc<dyn ConfigProvider> = Arc::new(config);
    let cache: Arc<dyn KeyValueCache> = Arc::new(cache);
    let transport = HttpTransport::new(DEFAULT_TIMEOUT).map_err(CliError::Transport)?;
    let fetcher = WikiFetcher::new(
        Arc::clone(&cache),
        Arc::new(transport),
        config.wikipedia_url(),
    );
    let mut generator = Generator::new(
        config,
        cache,
        fetcher,
        GeneratorOptions {
            max_attempt_count: cli.attempt_count,
            seed: cli.seed,
        },
    );

    let mut names = if cli.list_all {
        generator.generate_all(&cli.profile).await
    } else {
        generator.generate(&cli.profile, cli.count).await
    }
    .map_err(CliError::Generation)?;
    if cli.sort {
        names.sort();
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Warns when the configuration changed since the cache was last used, then
/// records the current version.
fn check_config_version(cache: &FileCache, version: &str) -> Result<(), CliError> {
    let previous = cache.read(CONFIG_VERSION_KEY).map_err(CliError::Cache)?;
    if previous.is_some_and(|previous| !previous.is_empty() && previous != version) {
        warn!("the configuration has changed; run with --clear-cache to clear the cache");
    }
    cache
        .write(CONFIG_VERSION_KEY, version)
        .map_err(CliError::Cache)
}

fn default_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIRECTORY_NAME)
}

fn report(err: &CliError) {
    eprintln!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}
