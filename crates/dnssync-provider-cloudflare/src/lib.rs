// # Cloudflare Record Store
//
// This crate provides a `RecordStore` for the Cloudflare API v4 DNS records
// resource of a single zone.
//
// ## Behaviour
//
// - One HTTP request per call (list follows pagination, one request per page)
// - No retry, no backoff, no rate limiting: errors propagate to the caller
// - HTTP timeout configured (30 seconds)
// - Specific error mapping for HTTP status codes (401/403, 404, 429, 5xx)
// - `success: false` envelopes are errors carrying the API's messages
// - Dry-run mode: list requests are sent, DELETE/POST are only logged
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails if the token or zone ID is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`

use async_trait::async_trait;
use dnssync_core::config::{DEFAULT_CLOUDFLARE_API_BASE, ProviderConfig};
use dnssync_core::traits::{
    AddressFamily, ChangeResult, ManagedRecord, NewRecord, RecordStore, RecordStoreFactory,
};
use dnssync_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per list page
const LIST_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched by one list call
const MAX_LIST_PAGES: u32 = 50;

/// Cloudflare API v4 response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Pagination block of list responses
#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct RecordId {
    id: String,
}

/// Cloudflare DNS record store
///
/// Stateless and single-shot: every trait call maps to one API request (or
/// one per page when listing).
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the store will:
/// - Perform all GET requests (record listing)
/// - Log the intended DELETE and POST requests
/// - **NOT** modify DNS records
pub struct CloudflareRecordStore {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone ID
    zone_id: String,

    /// API base URL
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip DELETE/POST
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRecordStore")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareRecordStore {
    /// Create a new Cloudflare record store
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permission
    /// - `zone_id`: Zone holding the managed records
    /// - `dry_run`: If true, perform GET requests but skip DELETE/POST
    pub fn new(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        let zone_id = zone_id.into();

        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }
        if zone_id.is_empty() {
            return Err(Error::config("Cloudflare zone ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider("cloudflare", format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            api_base: DEFAULT_CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a record store in live mode
    pub fn new_live(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        Self::new(api_token, zone_id, false)
    }

    /// Create a record store in dry-run mode
    pub fn new_dry_run(api_token: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        Self::new(api_token, zone_id, true)
    }

    /// Point the store at a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether mutations are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// `{base}/zones/{zone_id}/dns_records`
    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, self.zone_id)
    }

    /// Send an authenticated request and unwrap the response envelope
    ///
    /// Returns the envelope so list calls can read the pagination block.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<ApiResponse<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, action));
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            return Err(Error::provider(
                "cloudflare",
                format!("{} rejected: {}", action, api_messages(&envelope.errors)),
            ));
        }

        Ok(envelope)
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: reqwest::StatusCode, error_text: &str, action: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", action, error_text)),
        429 => Error::rate_limited(format!(
            "{}: Cloudflare rate limit exceeded. Status: {}",
            action, status
        )),
        500..=599 => Error::provider(
            "cloudflare",
            format!("Cloudflare server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            "cloudflare",
            format!("{} failed: {} - {}", action, status, error_text),
        ),
    }
}

fn api_messages(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl RecordStore for CloudflareRecordStore {
    /// List the records named `name` of one family
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=cdn.example.com&type=A&page=1&per_page=100
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self, name: &str, family: AddressFamily) -> Result<Vec<ManagedRecord>> {
        tracing::debug!("Listing {} records: {}", family, name);

        let url = self.records_url();
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self.client.get(&url).query(&[
                ("name", name.to_string()),
                ("type", family.record_type().to_string()),
                ("page", page.to_string()),
                ("per_page", LIST_PAGE_SIZE.to_string()),
            ]);

            let envelope: ApiResponse<Vec<ManagedRecord>> =
                self.send(request, "Record listing").await?;
            records.extend(envelope.result.unwrap_or_default());

            // The page counter is ours; the server's echo of it is not trusted.
            match envelope.result_info {
                Some(info) if page < info.total_pages => {
                    if page >= MAX_LIST_PAGES {
                        return Err(Error::provider(
                            "cloudflare",
                            format!(
                                "Record listing for {} exceeds {} pages ({} reported)",
                                name, MAX_LIST_PAGES, info.total_pages
                            ),
                        ));
                    }
                    page += 1;
                }
                _ => break,
            }
        }

        tracing::debug!("Found {} {} record(s) for {}", records.len(), family, name);
        Ok(records)
    }

    /// Delete one record
    ///
    /// ```http
    /// DELETE /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn delete_record(&self, record_id: &str) -> Result<ChangeResult> {
        let url = format!("{}/{}", self.records_url(), record_id);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
            return Ok(ChangeResult::Simulated);
        }

        let envelope: ApiResponse<RecordId> =
            self.send(self.client.delete(&url), "Record deletion").await?;

        let record_id = envelope
            .result
            .map(|r| r.id)
            .unwrap_or_else(|| record_id.to_string());
        Ok(ChangeResult::Applied { record_id })
    }

    /// Create one record
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {
    ///   "type": "A",
    ///   "name": "cdn.example.com",
    ///   "content": "1.2.3.4",
    ///   "ttl": 1,
    ///   "proxied": false
    /// }
    /// ```
    async fn create_record(&self, record: &NewRecord) -> Result<ChangeResult> {
        let url = self.records_url();

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                serde_json::to_string(record)?
            );
            return Ok(ChangeResult::Simulated);
        }

        let envelope: ApiResponse<ManagedRecord> = self
            .send(self.client.post(&url).json(record), "Record creation")
            .await?;

        let created = envelope.result.ok_or_else(|| {
            Error::provider("cloudflare", "Invalid response format: missing result")
        })?;
        Ok(ChangeResult::Applied {
            record_id: created.id,
        })
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Factory for creating Cloudflare record stores
pub struct CloudflareFactory;

impl RecordStoreFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn RecordStore>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                api_base,
                dry_run,
            } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }

                if *dry_run {
                    tracing::warn!(
                        "Cloudflare record store running in DRY-RUN mode - no changes will be made"
                    );
                }

                let mut store = CloudflareRecordStore::new(api_token.clone(), zone_id.clone(), *dry_run)?;
                if let Some(base) = api_base {
                    store = store.with_api_base(base.clone());
                }

                Ok(Box::new(store))
            }
        }
    }
}
