/// tracing setup.
///
/// The terminal is in raw mode while the game runs, so log lines go to a
/// file instead of stderr. Filter comes from `RUST_LOG` (default `info`),
/// the file path from `GEMRUNNER_LOG` (default `gemrunner.log`).

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const LOG_PATH_ENV: &str = "GEMRUNNER_LOG";
const DEFAULT_LOG_FILE: &str = "gemrunner.log";

pub fn log_path() -> PathBuf {
    std::env::var_os(LOG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Install the global subscriber. Returns false when the log file could
/// not be created; the game then runs without logging.
pub fn init() -> bool {
    let path = log_path();
    let file = match File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            return false;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
