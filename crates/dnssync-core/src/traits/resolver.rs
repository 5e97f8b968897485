// # Resolver Trait
//
// Defines the interface for looking up the current addresses of a hostname.
//
// ## Implementations
//
// - DNS-over-HTTPS JSON: `dnssync-resolver-doh` crate
//
// ## Usage
//
// ```rust,ignore
// use dnssync_core::{AddressFamily, Resolver};
//
// let answers = resolver.query("cdn1.example.com", AddressFamily::V4).await?;
// for answer in answers {
//     println!("{} {}", answer.record_type, answer.data);
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address family of a lookup and of the records it feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddressFamily {
    /// IPv4, published as `A` records
    V4,
    /// IPv6, published as `AAAA` records
    V6,
}

impl AddressFamily {
    /// Both families, in processing order
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    /// DNS record type name (`A` or `AAAA`)
    pub fn record_type(self) -> &'static str {
        match self {
            AddressFamily::V4 => "A",
            AddressFamily::V6 => "AAAA",
        }
    }

    /// Numeric DNS type code carried in resolver answers (1 or 28)
    pub fn type_code(self) -> u16 {
        match self {
            AddressFamily::V4 => 1,
            AddressFamily::V6 => 28,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.record_type())
    }
}

/// One entry of a resolver answer section
///
/// Field names follow the DNS JSON format (`name`, `type`, `TTL`, `data`).
/// The answer section may contain other record types than the one queried,
/// such as the CNAME hops that lead to the address records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Owner name of the record
    #[serde(default)]
    pub name: String,
    /// Numeric record type code
    #[serde(rename = "type")]
    pub record_type: u16,
    /// Time-to-live in seconds
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Record data (an address for A/AAAA answers)
    pub data: String,
}

impl Answer {
    /// Create an answer entry
    pub fn new(name: impl Into<String>, record_type: u16, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl: None,
            data: data.into(),
        }
    }

    /// Whether this entry carries an address of the given family
    pub fn is_family(&self, family: AddressFamily) -> bool {
        self.record_type == family.type_code()
    }
}

/// Trait for resolver implementations
///
/// A resolver performs exactly one lookup per call and returns the raw answer
/// section. It does not filter by type, deduplicate, or retry; the resolve
/// stage owns those rules so every implementation is held to them.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Look up `hostname` for one address family
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Answer>)`: The answer section; empty when the name has no
    ///   records of that type (including NXDOMAIN)
    /// - `Err(Error)`: Transport failure, non-success status, or malformed body
    async fn query(
        &self,
        hostname: &str,
        family: AddressFamily,
    ) -> Result<Vec<Answer>, crate::Error>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}

/// Helper trait for constructing resolvers from configuration
pub trait ResolverFactory: Send + Sync {
    /// Create a Resolver instance from configuration
    fn create(
        &self,
        config: &crate::config::ResolverConfig,
    ) -> Result<Box<dyn Resolver>, crate::Error>;
}
