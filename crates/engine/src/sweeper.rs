//! Background temp-file sweep
//!
//! Uploads pass through a local temp directory on their way to object
//! storage. Files are removed eagerly after upload; this loop catches the
//! ones left behind by failed requests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info};

/// Configuration for the sweep loop
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between sweeps
    pub interval: Duration,
    /// Files older than this are removed
    pub max_age: Duration,
    /// Directory to sweep
    pub dir: PathBuf,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            max_age: Duration::from_secs(60 * 60),
            dir: PathBuf::from("tmp/uploads"),
        }
    }
}

/// Background service sweeping the upload temp directory
pub struct TempFileSweeper {
    config: SweeperConfig,
}

impl TempFileSweeper {
    pub fn new(config: SweeperConfig) -> Self {
        Self { config }
    }

    /// Start the sweep loop
    pub async fn run(self) {
        info!(
            "Starting temp-file sweeper on {:?} (interval: {:?})",
            self.config.dir, self.config.interval
        );

        let mut ticker = interval(self.config.interval);

        // Skip the first immediate tick - let the server start up first
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sweep_once(&self.config.dir, self.config.max_age).await {
                Ok(0) => {}
                Ok(removed) => info!("Swept {} stale temp files", removed),
                Err(e) => error!("Temp-file sweep failed: {}", e),
            }
        }
    }
}

/// Remove files in `dir` older than `max_age`. A missing directory is not
/// an error; deletions race with request handlers, so individual remove
/// failures are ignored.
pub async fn sweep_once(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|m| m.elapsed().ok())
            .unwrap_or_default();
        if age >= max_age {
            debug!("Removing stale temp file {:?}", entry.path());
            if tokio::fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert_eq!(sweep_once(&gone, Duration::from_secs(0)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn zero_max_age_removes_fresh_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"y").unwrap();

        let removed = sweep_once(dir.path(), Duration::from_secs(0)).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn young_files_survive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fresh.jpg"), b"x").unwrap();

        let removed = sweep_once(dir.path(), Duration::from_secs(3600)).await.unwrap();
        assert_eq!(removed, 0);
        assert!(dir.path().join("fresh.jpg").exists());
    }

    #[tokio::test]
    async fn subdirectories_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("keep")).unwrap();

        let removed = sweep_once(dir.path(), Duration::from_secs(0)).await.unwrap();
        assert_eq!(removed, 0);
        assert!(dir.path().join("keep").exists());
    }
}
