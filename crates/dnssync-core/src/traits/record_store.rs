// # Record Store Trait
//
// Defines the interface for listing, deleting and creating the managed
// address records through a provider API.
//
// ## Implementations
//
// - Cloudflare: `dnssync-provider-cloudflare` crate

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::resolver::AddressFamily;
use crate::config::AUTOMATIC_TTL;

/// An existing record under the managed name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRecord {
    /// Provider record ID
    pub id: String,
    /// Record type (`A` or `AAAA`)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record name
    #[serde(default)]
    pub name: String,
    /// Record content (the address)
    #[serde(default)]
    pub content: String,
}

/// A record creation request
///
/// Serializes to the body the record-management API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    /// Record type (`A` or `AAAA`)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record name
    pub name: String,
    /// Address
    pub content: String,
    /// Time-to-live; [`AUTOMATIC_TTL`] lets the provider choose
    pub ttl: u32,
    /// Whether the provider proxies traffic instead of answering the raw address
    pub proxied: bool,
}

impl NewRecord {
    /// Create an unproxied record with automatic TTL
    pub fn new(family: AddressFamily, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            record_type: family.record_type().to_string(),
            name: name.into(),
            content: content.into(),
            ttl: AUTOMATIC_TTL,
            proxied: false,
        }
    }
}

/// Outcome of a single mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeResult {
    /// The provider confirmed the change
    Applied {
        /// ID of the deleted or created record
        record_id: String,
    },
    /// Dry-run mode: the request was logged, not sent
    Simulated,
}

/// Trait for record-management implementations
///
/// Each method issues one API call. Implementations do not retry and do not
/// decide what to delete or create; the publish stage owns that.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List the records named `name` of the given family
    async fn list_records(
        &self,
        name: &str,
        family: AddressFamily,
    ) -> Result<Vec<ManagedRecord>, crate::Error>;

    /// Delete one record by ID
    async fn delete_record(&self, record_id: &str) -> Result<ChangeResult, crate::Error>;

    /// Create one record
    async fn create_record(&self, record: &NewRecord) -> Result<ChangeResult, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing record stores from configuration
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}
