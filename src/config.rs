//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Environment-driven configuration (§6), loaded once at startup the way the teacher's own
// `Config::from_env` does it: `dotenv` for local `.env` support, `env::var` with explicit
// failure on a missing required key.
//--------------------------------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

use dotenv::dotenv;

const SNAPSHOT_INTERVAL_SEC: &str = "SNAPSHOT_INTERVAL_SEC";
const SNAPSHOT_DIR: &str = "SNAPSHOT_DIR";
const JOURNAL_URI: &str = "JOURNAL_URI";
const BIND_ADDR: &str = "BIND_ADDR";

#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds between periodic snapshots. Zero or negative disables the background task.
    pub snapshot_interval_sec: i64,
    pub snapshot_dir: PathBuf,
    /// Opaque locator for the durable record store. `file://<path>` selects `FileJournal`;
    /// unset selects `NullJournal`; any other scheme is rejected at load time.
    pub journal_uri: Option<String>,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Config {
        dotenv().ok();

        let snapshot_interval_sec = env::var(SNAPSHOT_INTERVAL_SEC)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        let snapshot_dir = env::var(SNAPSHOT_DIR)
            .unwrap_or_else(|_| "./snapshots".to_string())
            .into();
        let journal_uri = env::var(JOURNAL_URI).ok();
        let bind_addr =
            env::var(BIND_ADDR).unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        Config {
            snapshot_interval_sec,
            snapshot_dir,
            journal_uri,
            bind_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_unset() {
        for key in [SNAPSHOT_INTERVAL_SEC, SNAPSHOT_DIR, JOURNAL_URI, BIND_ADDR] {
            unsafe { env::remove_var(key) };
        }
        let config = Config::from_env();
        assert_eq!(config.snapshot_interval_sec, 60);
        assert_eq!(config.snapshot_dir, PathBuf::from("./snapshots"));
        assert!(config.journal_uri.is_none());
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }
}
