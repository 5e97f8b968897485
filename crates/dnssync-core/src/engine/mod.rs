//! Sync engine
//!
//! The SyncEngine is responsible for:
//! - Resolving the configured hostnames via a Resolver
//! - Replacing the managed records via a RecordStore
//! - Reporting the outcome of both stages as a SyncSummary
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ResolvedAddresses   ┌──────────────┐
//! │  Resolver   │ ────────────────────▶ │ RecordStore  │
//! │ (A, AAAA)   │                       │ list/del/add │
//! └─────────────┘                       └──────────────┘
//!         ▲                                     ▲
//!         └────────────── SyncEngine ───────────┘
//!                             │
//!                             ▼
//!                        SyncSummary
//! ```
//!
//! ## Run Flow
//!
//! 1. For each hostname, look up A then AAAA; keep matching answers in sets
//! 2. For each family, list and delete the existing records
//! 3. Create one record per resolved address
//! 4. Return the summary
//!
//! Every call is awaited before the next one is issued.

pub mod publish;
pub mod resolve;

use tracing::info;

use crate::config::SyncConfig;
use crate::error::Result;
use crate::summary::SyncSummary;
use crate::traits::{RecordStore, Resolver};

pub use publish::{publish_addresses, publish_family};
pub use resolve::{Resolution, ResolvedAddresses, resolve_hostnames};

/// Core sync engine
///
/// Holds no state between runs: every call to [`SyncEngine::run_once`]
/// resolves and publishes from scratch.
pub struct SyncEngine {
    /// Resolver for the hostname lookups
    resolver: Box<dyn Resolver>,

    /// Record store for the managed records
    store: Box<dyn RecordStore>,

    /// Hostnames to resolve, in order
    hostnames: Vec<String>,

    /// Name of the managed records
    record_name: String,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("resolver", &self.resolver.resolver_name())
            .field("store", &self.store.provider_name())
            .field("hostnames", &self.hostnames)
            .field("record_name", &self.record_name)
            .finish()
    }
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// The configuration is validated here, before any network call.
    pub fn new(
        resolver: Box<dyn Resolver>,
        store: Box<dyn RecordStore>,
        config: &SyncConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver,
            store,
            hostnames: config.hostnames.clone(),
            record_name: config.record_name(),
        })
    }

    /// Name of the managed records
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Run one full sync: resolve, then publish
    ///
    /// Per-call failures are recovered and reported in the summary; the
    /// publish stage runs even when nothing resolved.
    pub async fn run_once(&self) -> SyncSummary {
        info!(
            "Starting sync of {} hostname(s) into {} [resolver: {}, provider: {}]",
            self.hostnames.len(),
            self.record_name,
            self.resolver.resolver_name(),
            self.store.provider_name()
        );

        let resolution = resolve_hostnames(self.resolver.as_ref(), &self.hostnames).await;

        let (v4, v6) =
            publish_addresses(self.store.as_ref(), &self.record_name, &resolution.addresses).await;

        let summary = SyncSummary {
            hostnames: self.hostnames.len(),
            lookup_failures: resolution.failures,
            v4,
            v6,
        };

        info!("Sync finished: {}", summary);
        summary
    }
}
