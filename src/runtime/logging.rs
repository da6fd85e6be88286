//! Log output setup.
//!
//! The terminal belongs to the UI, so everything goes to a file.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Environment variable that overrides `logging.level`.
const LOG_ENV: &str = "HEARTH_LOG";

/// Install the global subscriber. Returns the log file in use, if any.
///
/// Failures are reported on stderr and otherwise ignored.
pub fn init(settings: &Settings) -> Option<PathBuf> {
    let path = settings.log_path()?;
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("hearth: cannot create {}: {e}", parent.display());
            return None;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("hearth: cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.as_str()));

    let installed = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(filter)
        .try_init();

    match installed {
        Ok(()) => Some(path),
        Err(e) => {
            eprintln!("hearth: logging disabled: {e}");
            None
        }
    }
}
