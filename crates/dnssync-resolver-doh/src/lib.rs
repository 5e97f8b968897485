// # DNS-over-HTTPS Resolver
//
// This crate provides a `Resolver` backed by a DNS-over-HTTPS endpoint that
// speaks the JSON format (`Accept: application/dns-json`), such as
// `https://cloudflare-dns.com/dns-query`.
//
// ## Request
//
// ```http
// GET /dns-query?name=cdn1.example.com&type=AAAA
// Accept: application/dns-json
// ```
//
// ## Response
//
// ```json
// {
//   "Status": 0,
//   "Answer": [
//     { "name": "cdn1.example.com.", "type": 5, "TTL": 300, "data": "edge.example.net." },
//     { "name": "edge.example.net.", "type": 28, "TTL": 60, "data": "2001:db8::1" }
//   ]
// }
// ```
//
// The whole answer section is returned; the core resolve stage keeps only the
// entries matching the queried family. One request per call, no retry.

use dnssync_core::config::ResolverConfig;
use dnssync_core::traits::{AddressFamily, Answer, Resolver, ResolverFactory};
use dnssync_core::{Error, Result};

use serde::Deserialize;
use std::time::Duration;

/// Media type of the JSON DNS format
const DNS_JSON: &str = "application/dns-json";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON DNS response body
///
/// Only the fields the resolver reads are modelled.
#[derive(Debug, Deserialize)]
struct DohResponse {
    /// DNS response code (0 = NOERROR, 3 = NXDOMAIN)
    #[serde(rename = "Status", default)]
    status: u16,

    /// Answer section; absent when there are no records
    #[serde(rename = "Answer", default)]
    answer: Option<Vec<Answer>>,
}

/// DNS-over-HTTPS resolver
#[derive(Debug)]
pub struct DohResolver {
    /// Endpoint URL
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl DohResolver {
    /// Create a resolver with the default timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a resolver with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::resolver(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl Resolver for DohResolver {
    async fn query(&self, hostname: &str, family: AddressFamily) -> Result<Vec<Answer>> {
        tracing::debug!("DoH query: {} {} via {}", hostname, family, self.url);

        let response = self
            .client
            .get(&self.url)
            .query(&[("name", hostname), ("type", family.record_type())])
            .header(reqwest::header::ACCEPT, DNS_JSON)
            .send()
            .await
            .map_err(|e| Error::resolver(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::resolver(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body: DohResponse = response
            .json()
            .await
            .map_err(|e| Error::resolver(format!("Failed to parse response: {}", e)))?;

        let answers = body.answer.unwrap_or_default();
        tracing::debug!(
            "DoH answer for {} {}: status {}, {} entr(y/ies)",
            hostname,
            family,
            body.status,
            answers.len()
        );

        Ok(answers)
    }

    fn resolver_name(&self) -> &'static str {
        "doh"
    }
}

/// Factory for creating DoH resolvers
pub struct DohFactory;

impl ResolverFactory for DohFactory {
    fn create(&self, config: &ResolverConfig) -> Result<Box<dyn Resolver>> {
        match config {
            ResolverConfig::Doh { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(Error::config("DoH resolver URL is required"));
                }

                Ok(Box::new(DohResolver::with_timeout(
                    url.clone(),
                    Duration::from_secs(*timeout_secs),
                )?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn resolver_for(mock_server: &MockServer) -> DohResolver {
        DohResolver::new(format!("{}/dns-query", mock_server.uri())).unwrap()
    }

    #[test]
    fn test_factory_creation() {
        let factory = DohFactory;
        let resolver = factory.create(&ResolverConfig::default());

        assert!(resolver.is_ok());
        assert_eq!(resolver.unwrap().resolver_name(), "doh");
    }

    #[test]
    fn test_factory_empty_url() {
        let factory = DohFactory;
        let config = ResolverConfig::Doh {
            url: String::new(),
            timeout_secs: 10,
        };

        assert!(factory.create(&config).is_err());
    }

    #[tokio::test]
    async fn test_query_sends_name_type_and_accept() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dns-query"))
            .and(query_param("name", "cdn1.example.com"))
            .and(query_param("type", "AAAA"))
            .and(header("Accept", "application/dns-json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Status": 0,
                "Answer": [
                    {"name": "cdn1.example.com.", "type": 5, "TTL": 300, "data": "edge.example.net."},
                    {"name": "edge.example.net.", "type": 28, "TTL": 60, "data": "2001:db8::1"}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server).await;
        let answers = resolver
            .query("cdn1.example.com", AddressFamily::V6)
            .await
            .unwrap();

        // The raw section is returned, CNAME hop included
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].record_type, 5);
        assert_eq!(answers[1].record_type, 28);
        assert_eq!(answers[1].data, "2001:db8::1");
    }

    #[tokio::test]
    async fn test_missing_answer_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dns-query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Status": 3,
                "Question": [{"name": "nope.example.", "type": 1}]
            })))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server).await;
        let answers = resolver.query("nope.example", AddressFamily::V4).await.unwrap();

        assert!(answers.is_empty());
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dns-query"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server).await;
        let result = resolver.query("cdn1.example.com", AddressFamily::V4).await;

        assert!(matches!(result, Err(Error::Resolver(ref msg)) if msg.contains("502")));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dns-query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server).await;
        let result = resolver.query("cdn1.example.com", AddressFamily::V4).await;

        assert!(matches!(result, Err(Error::Resolver(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let resolver = DohResolver::with_timeout(
            "http://127.0.0.1:9/dns-query",
            Duration::from_secs(2),
        )
        .unwrap();

        let result = resolver.query("cdn1.example.com", AddressFamily::V4).await;
        assert!(result.is_err());
    }
}
