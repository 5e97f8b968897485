// # dnssync
//
// Resolves a list of hostnames over DNS-over-HTTPS and republishes every
// address found as A/AAAA records under one managed name.
//
// This binary is a thin integration layer: it reads configuration from
// environment variables, builds the resolver and record store, and hands them
// to `dnssync_core::SyncEngine`. All sync logic lives in dnssync-core.
//
// ## Configuration
//
// ### Required
// - `DNSSYNC_API_TOKEN`: Cloudflare API token (Zone:DNS:Edit)
// - `DNSSYNC_ZONE_ID`: Zone holding the managed records
// - `DNSSYNC_HOSTNAMES`: Comma-separated hostnames to resolve
//
// ### Optional
// - `DNSSYNC_SUBDOMAIN`: Record label (default: cdn)
// - `DNSSYNC_ZONE_NAME`: Zone apex, joined with a bare label
// - `DNSSYNC_DOH_URL`: DoH JSON endpoint
// - `DNSSYNC_API_BASE`: Cloudflare API base URL
// - `DNSSYNC_MODE`: live or dry-run (default: live)
// - `DNSSYNC_INTERVAL_SECS`: Re-run interval; unset runs once and exits
// - `DNSSYNC_LOCK_DIR`: Directory for the run lease; unset disables it
// - `DNSSYNC_LOCK_STALE_SECS`: Lease staleness threshold (default: 600)
// - `DNSSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export DNSSYNC_API_TOKEN=...
// export DNSSYNC_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export DNSSYNC_ZONE_NAME=example.com
// export DNSSYNC_HOSTNAMES=cdn1.provider.net,cdn2.provider.net
//
// dnssync
// ```

use anyhow::{Context, Result};
use dnssync_core::config::{DEFAULT_DOH_URL, DEFAULT_SUBDOMAIN};
use dnssync_core::traits::{RecordStoreFactory, ResolverFactory};
use dnssync_core::{
    LeaseConfig, ProviderConfig, ResolverConfig, RunLease, SyncConfig, SyncEngine, SyncSummary,
};
use dnssync_provider_cloudflare::CloudflareFactory;
use dnssync_resolver_doh::DohFactory;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Run completed with every operation confirmed (or clean shutdown)
/// - 1: Configuration, startup or lease error
/// - 2: Runtime error (unexpected)
/// - 3: Run completed but a record listing, delete or create failed
///
/// Failed hostname lookups are reported in the summary and do not change
/// the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncExitCode {
    Clean = 0,
    ConfigError = 1,
    RuntimeError = 2,
    PartialFailure = 3,
}

impl From<SyncExitCode> for ExitCode {
    fn from(code: SyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&SyncSummary> for SyncExitCode {
    fn from(summary: &SyncSummary) -> Self {
        if summary.is_clean() {
            SyncExitCode::Clean
        } else {
            SyncExitCode::PartialFailure
        }
    }
}

/// Application configuration
///
/// Not `Debug`: it holds the API token.
struct Config {
    api_token: String,
    zone_id: String,
    subdomain: String,
    zone_name: Option<String>,
    hostnames: Vec<String>,
    doh_url: String,
    api_base: Option<String>,
    mode: String,
    interval_secs: Option<u64>,
    lock_dir: Option<PathBuf>,
    lock_stale_secs: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let parse_secs = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{} must be a number of seconds. Got: {}", key, s))
                })
                .transpose()
        };

        Ok(Self {
            api_token: lookup("DNSSYNC_API_TOKEN").unwrap_or_default(),
            zone_id: lookup("DNSSYNC_ZONE_ID").unwrap_or_default(),
            subdomain: lookup("DNSSYNC_SUBDOMAIN")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUBDOMAIN.to_string()),
            zone_name: lookup("DNSSYNC_ZONE_NAME").filter(|s| !s.trim().is_empty()),
            hostnames: lookup("DNSSYNC_HOSTNAMES")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            doh_url: lookup("DNSSYNC_DOH_URL").unwrap_or_else(|| DEFAULT_DOH_URL.to_string()),
            api_base: lookup("DNSSYNC_API_BASE").filter(|s| !s.trim().is_empty()),
            mode: lookup("DNSSYNC_MODE").unwrap_or_else(|| "live".to_string()),
            interval_secs: parse_secs("DNSSYNC_INTERVAL_SECS")?,
            lock_dir: lookup("DNSSYNC_LOCK_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            lock_stale_secs: parse_secs("DNSSYNC_LOCK_STALE_SECS")?.unwrap_or(600),
            log_level: lookup("DNSSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Field formats (domain names, URLs) are checked again by
    /// `SyncConfig::validate`; this covers what only the binary knows about.
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            anyhow::bail!(
                "DNSSYNC_API_TOKEN is required. \
                Set it via: export DNSSYNC_API_TOKEN=your_token"
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DNSSYNC_API_TOKEN appears to be a placeholder. \
                Use an actual API token from Cloudflare."
            );
        }

        if self.zone_id.is_empty() {
            anyhow::bail!(
                "DNSSYNC_ZONE_ID is required. \
                Set it via: export DNSSYNC_ZONE_ID=your_zone_id"
            );
        }

        if self.hostnames.is_empty() {
            anyhow::bail!(
                "DNSSYNC_HOSTNAMES must contain at least one hostname. \
                Set it via: export DNSSYNC_HOSTNAMES=cdn1.example.net,cdn2.example.net"
            );
        }

        match self.mode.as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "DNSSYNC_MODE '{}' is not supported. Supported modes: live, dry-run",
                self.mode
            ),
        }

        if let Some(interval) = self.interval_secs
            && !(60..=86400).contains(&interval)
        {
            anyhow::bail!(
                "DNSSYNC_INTERVAL_SECS must be between 60 and 86400 seconds. Got: {}",
                interval
            );
        }

        if self.lock_stale_secs == 0 {
            anyhow::bail!("DNSSYNC_LOCK_STALE_SECS must be greater than 0");
        }

        for (key, url) in [
            ("DNSSYNC_DOH_URL", Some(&self.doh_url)),
            ("DNSSYNC_API_BASE", self.api_base.as_ref()),
        ] {
            if let Some(url) = url
                && url.starts_with("http://")
            {
                eprintln!(
                    "WARNING: {} uses HTTP (not HTTPS). This is less secure. Consider using HTTPS.",
                    key
                );
            }
        }

        self.level()?;
        Ok(())
    }

    /// Parse the log level
    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNSSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Build the core sync configuration
    fn sync_config(&self) -> SyncConfig {
        let provider = ProviderConfig::Cloudflare {
            api_token: self.api_token.clone(),
            zone_id: self.zone_id.clone(),
            api_base: self.api_base.clone(),
            dry_run: self.mode == "dry-run",
        };

        let resolver = ResolverConfig::Doh {
            url: self.doh_url.clone(),
            timeout_secs: 10,
        };

        let mut config = SyncConfig::new(self.hostnames.clone(), provider)
            .with_subdomain(self.subdomain.clone())
            .with_resolver(resolver);

        if let Some(ref zone_name) = self.zone_name {
            config = config.with_zone_name(zone_name.clone());
        }
        if let Some(ref dir) = self.lock_dir {
            config = config.with_lease(
                LeaseConfig::new(dir.clone()).with_stale_after_secs(self.lock_stale_secs),
            );
        }

        config
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return SyncExitCode::ConfigError.into();
    }

    let sync_config = config.sync_config();
    if let Err(e) = sync_config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SyncExitCode::ConfigError.into();
    }

    info!("Starting dnssync");
    info!(
        "Configuration loaded: {} hostname(s) -> {} [mode: {}]",
        sync_config.hostnames.len(),
        sync_config.record_name(),
        config.mode
    );

    let engine = match build_engine(&sync_config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Startup error: {:#}", e);
            return SyncExitCode::ConfigError.into();
        }
    };

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match config.interval_secs {
            None => run_once(&engine, &sync_config).await,
            Some(secs) => run_scheduled(&engine, &sync_config, Duration::from_secs(secs)).await,
        }
    });

    result.into()
}

/// Build the resolver, the record store and the engine
fn build_engine(config: &SyncConfig) -> Result<SyncEngine> {
    let resolver = DohFactory
        .create(&config.resolver)
        .context("Failed to create resolver")?;
    let store = CloudflareFactory
        .create(&config.provider)
        .context("Failed to create record store")?;

    Ok(SyncEngine::new(resolver, store, config)?)
}

/// Run one sync under the lease, when one is configured
async fn run_once(engine: &SyncEngine, config: &SyncConfig) -> SyncExitCode {
    let lease = match config.lease {
        Some(ref lease_config) => {
            match RunLease::acquire(lease_config, engine.record_name()).await {
                Ok(lease) => Some(lease),
                Err(e) => {
                    error!("Could not acquire run lease: {}", e);
                    return SyncExitCode::ConfigError;
                }
            }
        }
        None => None,
    };

    let summary = engine.run_once().await;

    if let Some(lease) = lease
        && let Err(e) = lease.release().await
    {
        warn!("Failed to release run lease: {}", e);
    }

    let code = SyncExitCode::from(&summary);
    if code == SyncExitCode::PartialFailure {
        warn!("Sync completed with failures: {}", summary);
    }
    code
}

/// Re-run the sync every `period` until a shutdown signal arrives
///
/// A run that cannot get the lease or ends with failures is logged and the
/// schedule continues.
async fn run_scheduled(engine: &SyncEngine, config: &SyncConfig, period: Duration) -> SyncExitCode {
    info!("Running every {}s", period.as_secs());

    let mut ticks = IntervalStream::new(tokio::time::interval(period));
    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                return match signal {
                    Ok(name) => {
                        info!("Received shutdown signal: {}", name);
                        SyncExitCode::Clean
                    }
                    Err(e) => {
                        error!("Shutdown error: {}", e);
                        SyncExitCode::RuntimeError
                    }
                };
            }
            tick = ticks.next() => {
                if tick.is_none() {
                    return SyncExitCode::RuntimeError;
                }
                let code = run_once(engine, config).await;
                if code != SyncExitCode::Clean {
                    warn!("Scheduled run ended with exit code {}", code as u8);
                }
            }
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
