//! Diagnostic logging.
//!
//! Output goes to a file so it never lands on the terminal the chat UI is
//! drawing on. Verbosity comes from `ABZ_LOG` (an `EnvFilter` directive).

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::io::project_dirs;

pub const LOG_ENV: &str = "ABZ_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";
const LOG_FILE_NAME: &str = "abz.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn log_file_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    if let Some(dirs) = project_dirs() {
        candidates.push(dirs.data_local_dir().join(LOG_FILE_NAME));
    }
    candidates
}

/// First candidate that can be opened for appending, plus a warning for each
/// one that could not.
fn open_log_file(candidates: Vec<PathBuf>) -> (Option<(PathBuf, File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                warnings.push(format!(
                    "Failed to create log dir {}: {e}",
                    parent.display()
                ));
                continue;
            }
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => warnings.push(format!(
                "Failed to open log file {}: {e}",
                candidate.display()
            )),
        }
    }

    (None, warnings)
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init_tracing(explicit: Option<&Path>) {
    let filter = env_filter();
    let (log_file, init_warnings) = open_log_file(log_file_candidates(explicit));

    if let Some((path, file)) = log_file {
        let installed = tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(filter)
            .try_init()
            .is_ok();
        if installed {
            tracing::info!(path = %path.display(), "logging initialized");
            for warning in init_warnings {
                tracing::warn!("{warning}");
            }
        }
        return;
    }

    // No writable file: drop events rather than write over the UI.
    let _ = tracing_subscriber::registry().with(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_is_tried_first() {
        let explicit = PathBuf::from("/tmp/custom.log");
        let candidates = log_file_candidates(Some(&explicit));
        assert_eq!(candidates.first(), Some(&explicit));
    }

    #[test]
    fn opens_first_writable_candidate_and_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("abz.log");

        let (opened, warnings) = open_log_file(vec![path.clone()]);
        let (opened_path, _file) = opened.expect("log file opened");
        assert_eq!(opened_path, path);
        assert!(warnings.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn unopenable_candidate_is_skipped_with_warning() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened as a log file.
        let blocked = dir.path().to_path_buf();
        let fallback = dir.path().join("fallback.log");

        let (opened, warnings) = open_log_file(vec![blocked, fallback.clone()]);
        assert_eq!(opened.map(|(p, _)| p), Some(fallback));
        assert_eq!(warnings.len(), 1);
    }
}
