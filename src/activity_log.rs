//! Plain-text log of user-visible actions (sent transactions, pairings, exports).

use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const ACTIVITY_LOG_FILE: &str = "activity_log.txt";

/// Directory where app data is stored (same as settings)
pub fn app_data_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(config_dir) => config_dir.join("hedera-tracker"),
        None => PathBuf::from("."),
    }
}

fn log_path() -> PathBuf {
    app_data_dir().join(ACTIVITY_LOG_FILE)
}

pub fn log_file_path() -> String {
    log_path().display().to_string()
}

/// Append an entry to the activity log in the app data directory.
pub fn append_log(activity: &str, network: &str, details: impl AsRef<str>) -> Result<()> {
    append_log_to(&log_path(), activity, network, details.as_ref())
}

pub fn append_log_to(path: &Path, activity: &str, network: &str, details: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "[{}] network={} activity={}",
        Utc::now().to_rfc3339(),
        network,
        activity
    )?;

    if details.trim().is_empty() {
        writeln!(file, "  (no additional details)")?;
    } else {
        for line in details.lines().filter(|l| !l.trim().is_empty()) {
            writeln!(file, "  {}", line)?;
        }
    }
    writeln!(file)?;
    Ok(())
}

pub fn read_log() -> Result<String> {
    read_log_from(&log_path())
}

pub fn read_log_from(path: &Path) -> Result<String> {
    if path.exists() {
        Ok(fs::read_to_string(path)?)
    } else {
        Ok(String::new())
    }
}
