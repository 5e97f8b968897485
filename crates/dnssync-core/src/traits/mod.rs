//! Core traits for the sync job
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Resolver`]: Look up the addresses of a hostname
//! - [`RecordStore`]: List, delete and create managed DNS records

pub mod record_store;
pub mod resolver;

pub use record_store::{ChangeResult, ManagedRecord, NewRecord, RecordStore, RecordStoreFactory};
pub use resolver::{AddressFamily, Answer, Resolver, ResolverFactory};
