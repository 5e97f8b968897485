//! Resolve stage: hostnames → deduplicated address sets

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::summary::LookupFailure;
use crate::traits::{AddressFamily, Resolver};

/// Addresses collected in one run, one set per family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAddresses {
    /// IPv4 addresses
    pub ipv4: BTreeSet<String>,
    /// IPv6 addresses
    pub ipv6: BTreeSet<String>,
}

impl ResolvedAddresses {
    /// Addresses of one family
    pub fn for_family(&self, family: AddressFamily) -> &BTreeSet<String> {
        match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        }
    }

    /// Insert an address; returns `false` if it was already present
    pub fn insert(&mut self, family: AddressFamily, address: impl Into<String>) -> bool {
        match family {
            AddressFamily::V4 => self.ipv4.insert(address.into()),
            AddressFamily::V6 => self.ipv6.insert(address.into()),
        }
    }

    /// Total number of addresses across both families
    pub fn len(&self) -> usize {
        self.ipv4.len() + self.ipv6.len()
    }

    /// No address in either family
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }
}

/// Result of the resolve stage
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Collected addresses
    pub addresses: ResolvedAddresses,
    /// Lookups that failed
    pub failures: Vec<LookupFailure>,
}

/// Resolve every hostname for both families, sequentially
///
/// Only answer entries whose type code matches the queried family are kept.
/// A failed lookup is logged and recorded; it never stops the loop, and an A
/// failure does not skip the AAAA lookup of the same hostname.
pub async fn resolve_hostnames(resolver: &dyn Resolver, hostnames: &[String]) -> Resolution {
    let mut resolution = Resolution::default();

    for hostname in hostnames {
        for family in AddressFamily::ALL {
            match resolver.query(hostname, family).await {
                Ok(answers) => {
                    let mut added = 0;
                    for answer in answers.into_iter().filter(|a| a.is_family(family)) {
                        if resolution.addresses.insert(family, answer.data) {
                            added += 1;
                        }
                    }
                    debug!("Resolved {} {}: {} new address(es)", hostname, family, added);
                }
                Err(e) => {
                    warn!(
                        "Failed to resolve {} {} via {}: {}",
                        hostname,
                        family,
                        resolver.resolver_name(),
                        e
                    );
                    resolution.failures.push(LookupFailure {
                        hostname: hostname.clone(),
                        family,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        "Resolved {} hostname(s): {} IPv4, {} IPv6 ({} failed lookup(s))",
        hostnames.len(),
        resolution.addresses.ipv4.len(),
        resolution.addresses.ipv6.len(),
        resolution.failures.len()
    );

    resolution
}
