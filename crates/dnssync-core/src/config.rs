//! Configuration types for the sync job
//!
//! The binary maps environment variables into [`SyncConfig`]; library users can
//! build one directly or deserialize it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Record label used when none is configured
pub const DEFAULT_SUBDOMAIN: &str = "cdn";

/// Public DNS-over-HTTPS endpoint answering `application/dns-json`
pub const DEFAULT_DOH_URL: &str = "https://cloudflare-dns.com/dns-query";

/// Cloudflare API v4 base URL
pub const DEFAULT_CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// TTL value the record-management API interprets as "automatic"
pub const AUTOMATIC_TTL: u32 = 1;

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Hostnames whose addresses are republished, in lookup order
    pub hostnames: Vec<String>,

    /// Record label under the zone (e.g. "cdn")
    #[serde(default = "default_subdomain")]
    pub subdomain: String,

    /// Zone apex, used to expand a bare label into a full record name
    #[serde(default)]
    pub zone_name: Option<String>,

    /// DNS-over-HTTPS resolver configuration
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Record-management provider configuration
    pub provider: ProviderConfig,

    /// Optional run lease; `None` disables mutual exclusion
    #[serde(default)]
    pub lease: Option<LeaseConfig>,
}

impl SyncConfig {
    /// Create a configuration with the default subdomain and resolver
    pub fn new(hostnames: Vec<String>, provider: ProviderConfig) -> Self {
        Self {
            hostnames,
            subdomain: default_subdomain(),
            zone_name: None,
            resolver: ResolverConfig::default(),
            provider,
            lease: None,
        }
    }

    /// Set the record label
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = subdomain.into();
        self
    }

    /// Set the zone apex
    pub fn with_zone_name(mut self, zone_name: impl Into<String>) -> Self {
        self.zone_name = Some(zone_name.into());
        self
    }

    /// Set the resolver configuration
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Enable the run lease
    pub fn with_lease(mut self, lease: LeaseConfig) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Name of the managed records as sent to the record-management API
    ///
    /// A bare label is joined with the zone apex when one is configured; a
    /// label that already contains a dot is used verbatim. `@` names the apex.
    pub fn record_name(&self) -> String {
        if self.subdomain.contains('.') {
            return self.subdomain.clone();
        }

        match self.zone_name.as_deref() {
            Some(zone) if self.subdomain == "@" => zone.to_string(),
            Some(zone) => format!("{}.{}", self.subdomain, zone),
            None => self.subdomain.clone(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.hostnames.is_empty() {
            return Err(crate::Error::config("No hostnames configured"));
        }

        for hostname in &self.hostnames {
            validate_domain_name(hostname)?;
        }

        if self.subdomain.is_empty() {
            return Err(crate::Error::config("Subdomain cannot be empty"));
        }
        if self.subdomain != "@" {
            validate_domain_name(&self.subdomain)?;
        }
        if let Some(ref zone) = self.zone_name {
            validate_domain_name(zone)?;
        }

        self.resolver.validate()?;
        self.provider.validate()?;

        if let Some(ref lease) = self.lease {
            lease.validate()?;
        }

        Ok(())
    }
}

fn default_subdomain() -> String {
    DEFAULT_SUBDOMAIN.to_string()
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolverConfig {
    /// DNS-over-HTTPS JSON endpoint
    Doh {
        /// Endpoint URL (queried with `?name=...&type=...`)
        url: String,
        /// Per-request timeout in seconds
        #[serde(default = "default_doh_timeout_secs")]
        timeout_secs: u64,
    },
}

impl ResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ResolverConfig::Doh { url, timeout_secs } => {
                validate_http_url("DoH resolver URL", url)?;
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("DoH resolver timeout must be > 0"));
                }
                Ok(())
            }
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig::Doh {
            url: DEFAULT_DOH_URL.to_string(),
            timeout_secs: default_doh_timeout_secs(),
        }
    }
}

fn default_doh_timeout_secs() -> u64 {
    10
}

/// Record-management provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare API v4
    Cloudflare {
        /// API token with Zone:DNS:Edit permission
        api_token: String,
        /// Zone identifier
        zone_id: String,
        /// API base URL override
        #[serde(default)]
        api_base: Option<String>,
        /// Perform list calls only; log the mutations instead of sending them
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Create a live Cloudflare provider configuration
    pub fn cloudflare(api_token: impl Into<String>, zone_id: impl Into<String>) -> Self {
        ProviderConfig::Cloudflare {
            api_token: api_token.into(),
            zone_id: zone_id.into(),
            api_base: None,
            dry_run: false,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                api_base,
                ..
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                if zone_id.is_empty() {
                    return Err(crate::Error::config("Cloudflare zone ID cannot be empty"));
                }
                if let Some(base) = api_base {
                    validate_http_url("Cloudflare API base", base)?;
                }
                Ok(())
            }
        }
    }

    /// Whether mutations are only logged
    pub fn is_dry_run(&self) -> bool {
        match self {
            ProviderConfig::Cloudflare { dry_run, .. } => *dry_run,
        }
    }
}

// The API token must never reach a log line, so Debug is written by hand.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Cloudflare {
                zone_id,
                api_base,
                dry_run,
                ..
            } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .field("zone_id", zone_id)
                .field("api_base", api_base)
                .field("dry_run", dry_run)
                .finish(),
        }
    }
}

/// Run lease configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseConfig {
    /// Directory holding lease files
    pub dir: PathBuf,

    /// Age after which an existing lease is considered abandoned (in seconds)
    #[serde(default = "default_lease_stale_secs")]
    pub stale_after_secs: u64,
}

impl LeaseConfig {
    /// Create a lease configuration with the default staleness threshold
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stale_after_secs: default_lease_stale_secs(),
        }
    }

    /// Set the staleness threshold
    pub fn with_stale_after_secs(mut self, secs: u64) -> Self {
        self.stale_after_secs = secs;
        self
    }

    /// Validate the lease configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.dir.as_os_str().is_empty() {
            return Err(crate::Error::config("Lease directory cannot be empty"));
        }
        if self.stale_after_secs == 0 {
            return Err(crate::Error::config("Lease staleness threshold must be > 0"));
        }
        Ok(())
    }
}

fn default_lease_stale_secs() -> u64 {
    600
}

/// Validate that a string is a syntactically valid domain name
///
/// Basic RFC 1035 checks: total length, label length, characters, hyphen
/// placement. A single trailing dot is accepted.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}
