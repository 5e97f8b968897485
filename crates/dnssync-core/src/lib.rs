// # dnssync-core
//
// Core library for republishing the current addresses of a list of hostnames
// as DNS records under a managed name.
//
// ## Architecture Overview
//
// - **Resolver**: Trait for looking up A/AAAA answers of a hostname
// - **RecordStore**: Trait for listing, deleting and creating managed records
// - **SyncEngine**: Runs the resolve stage, then the publish stage
// - **SyncSummary**: Attempted vs. confirmed counts for every mutation
// - **RunLease**: Optional file lease keeping runs for one name exclusive
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Orchestration is separate from the HTTP clients
// 2. **Sequential**: Every call is awaited before the next one is issued
// 3. **Replace, don't diff**: Existing records are deleted, then recreated
// 4. **Observable**: Every mutating call returns a result that is counted

pub mod config;
pub mod engine;
pub mod error;
pub mod lease;
pub mod summary;
pub mod traits;

// Re-export core types for convenience
pub use config::{LeaseConfig, ProviderConfig, ResolverConfig, SyncConfig};
pub use engine::{ResolvedAddresses, SyncEngine};
pub use error::{Error, Result};
pub use lease::RunLease;
pub use summary::{FamilySummary, LookupFailure, OperationCounts, SyncSummary};
pub use traits::{AddressFamily, Answer, RecordStore, Resolver};
