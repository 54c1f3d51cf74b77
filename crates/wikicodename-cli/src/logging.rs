use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "WIKICODENAME_LOG";

const DEFAULT_DIRECTIVE: &str = "info";
const QUIET_DIRECTIVE: &str = "error";

/// Installs the stderr subscriber. `quiet` overrides the environment.
pub fn init_logging(quiet: bool) -> Result<(), String> {
    let filter = if quiet {
        EnvFilter::new(QUIET_DIRECTIVE)
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| err.to_string())
}
