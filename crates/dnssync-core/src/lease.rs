// # Run Lease
//
// File-based mutual exclusion between overlapping runs for the same record
// name.
//
// ## Protocol
//
// - Acquire: create `<dir>/dnssync-<record>.lock` exclusively (`create_new`)
// - Held: the file exists and is younger than the staleness threshold
// - Stale: the file is older than the threshold; it is replaced with a warning
// - Release: remove the file (explicitly, or on drop)
//
// ## File Format
//
// ```json
// {
//   "pid": 4242,
//   "acquired_at": "2025-01-09T12:00:00Z"
// }
// ```
//
// A lease file that cannot be parsed (e.g. a writer that has not finished)
// is aged by its modification time instead.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::LeaseConfig;

/// Serializable lease body
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct LeaseFileFormat {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// A held run lease
///
/// The lease file is removed when the lease is released or dropped.
///
/// # Example
///
/// ```rust,no_run
/// use dnssync_core::config::LeaseConfig;
/// use dnssync_core::lease::RunLease;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = LeaseConfig::new("/run/dnssync");
///     let lease = RunLease::acquire(&config, "cdn.example.com").await?;
///
///     // ... run the sync ...
///
///     lease.release().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct RunLease {
    path: PathBuf,
    released: bool,
}

impl RunLease {
    /// Acquire the lease for `record_name`
    ///
    /// Creates the lease directory if needed. Fails with [`Error::Lease`] when
    /// a live lease is held by another run.
    pub async fn acquire(config: &LeaseConfig, record_name: &str) -> Result<Self, Error> {
        if !config.dir.exists() {
            fs::create_dir_all(&config.dir).await.map_err(|e| {
                Error::lease(format!(
                    "Failed to create lease directory {}: {}",
                    config.dir.display(),
                    e
                ))
            })?;
        }

        let path = Self::lease_path(&config.dir, record_name);
        let stale_after = Duration::from_secs(config.stale_after_secs);

        match Self::try_create(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let age = Self::lease_age(&path).await?;
                if age < stale_after {
                    return Err(Error::lease(format!(
                        "Lease {} is held by another run (age {}s, stale after {}s)",
                        path.display(),
                        age.as_secs(),
                        stale_after.as_secs()
                    )));
                }

                tracing::warn!(
                    "Replacing stale lease {} (age {}s)",
                    path.display(),
                    age.as_secs()
                );
                fs::remove_file(&path).await.map_err(|e| {
                    Error::lease(format!(
                        "Failed to remove stale lease {}: {}",
                        path.display(),
                        e
                    ))
                })?;

                // Another run may win the race between remove and create.
                Self::try_create(&path).await.map_err(|e| {
                    Error::lease(format!("Failed to acquire lease {}: {}", path.display(), e))
                })?;
            }
            Err(e) => {
                return Err(Error::lease(format!(
                    "Failed to create lease {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        tracing::debug!("Acquired lease {}", path.display());
        Ok(Self {
            path,
            released: false,
        })
    }

    /// Path of the lease file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lease, removing the lease file
    pub async fn release(mut self) -> Result<(), Error> {
        self.released = true;
        fs::remove_file(&self.path).await.map_err(|e| {
            Error::lease(format!(
                "Failed to remove lease {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Released lease {}", self.path.display());
        Ok(())
    }

    /// Create the lease file exclusively and write its body
    async fn try_create(path: &Path) -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;

        let body = LeaseFileFormat {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        let json = serde_json::to_vec(&body)?;

        file.write_all(&json).await?;
        file.flush().await?;
        Ok(())
    }

    /// Age of an existing lease
    async fn lease_age(path: &Path) -> Result<Duration, Error> {
        let content = fs::read(path).await.map_err(|e| {
            Error::lease(format!("Failed to read lease {}: {}", path.display(), e))
        })?;

        match serde_json::from_slice::<LeaseFileFormat>(&content) {
            Ok(lease) => {
                let age = Utc::now().signed_duration_since(lease.acquired_at);
                tracing::debug!(
                    "Existing lease {} held by pid {} since {}",
                    path.display(),
                    lease.pid,
                    lease.acquired_at
                );
                Ok(age.to_std().unwrap_or(Duration::ZERO))
            }
            Err(e) => {
                tracing::warn!(
                    "Lease {} is unreadable ({}). Using its modification time.",
                    path.display(),
                    e
                );
                let modified = fs::metadata(path).await?.modified()?;
                Ok(SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or(Duration::ZERO))
            }
        }
    }

    /// Lease file path for a record name
    fn lease_path(dir: &Path, record_name: &str) -> PathBuf {
        let safe: String = record_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        dir.join(format!("dnssync-{}.lock", safe))
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove lease {} on drop: {}", self.path.display(), e);
            }
        }
    }
}
