//! Test doubles and common utilities for sync contract tests
//!
//! The doubles record every call so tests can assert on the exact sequence
//! of lookups and mutations.

#![allow(dead_code)]

use dnssync_core::error::{Error, Result};
use dnssync_core::traits::{
    AddressFamily, Answer, ChangeResult, ManagedRecord, NewRecord, RecordStore, Resolver,
};
use dnssync_core::{ProviderConfig, SyncConfig};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A resolver answering from a scripted table
///
/// Unscripted lookups return an empty answer section.
pub struct ScriptedResolver {
    answers: HashMap<(String, AddressFamily), std::result::Result<Vec<Answer>, String>>,
    queries: Arc<Mutex<Vec<(String, AddressFamily)>>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script address answers for a lookup
    pub fn with_addresses(mut self, hostname: &str, family: AddressFamily, data: &[&str]) -> Self {
        let answers = data
            .iter()
            .map(|d| Answer::new(hostname, family.type_code(), *d))
            .collect();
        self.answers.insert((hostname.to_string(), family), Ok(answers));
        self
    }

    /// Script a raw answer section for a lookup
    pub fn with_answers(mut self, hostname: &str, family: AddressFamily, answers: Vec<Answer>) -> Self {
        self.answers.insert((hostname.to_string(), family), Ok(answers));
        self
    }

    /// Script a failure for a lookup
    pub fn with_failure(mut self, hostname: &str, family: AddressFamily, error: &str) -> Self {
        self.answers
            .insert((hostname.to_string(), family), Err(error.to_string()));
        self
    }

    /// Script a failure for both families of a hostname
    pub fn with_host_failure(self, hostname: &str, error: &str) -> Self {
        self.with_failure(hostname, AddressFamily::V4, error)
            .with_failure(hostname, AddressFamily::V6, error)
    }

    /// Shared handle on the query log
    pub fn queries(&self) -> Arc<Mutex<Vec<(String, AddressFamily)>>> {
        Arc::clone(&self.queries)
    }
}

#[async_trait::async_trait]
impl Resolver for ScriptedResolver {
    async fn query(&self, hostname: &str, family: AddressFamily) -> Result<Vec<Answer>> {
        self.queries
            .lock()
            .unwrap()
            .push((hostname.to_string(), family));

        match self.answers.get(&(hostname.to_string(), family)) {
            Some(Ok(answers)) => Ok(answers.clone()),
            Some(Err(e)) => Err(Error::resolver(e.clone())),
            None => Ok(Vec::new()),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// Calls observed by [`InMemoryZone`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneCall {
    List { name: String, record_type: String },
    Delete { id: String },
    Create(NewRecord),
}

/// Shared state of an [`InMemoryZone`]
#[derive(Default)]
pub struct ZoneState {
    pub records: Vec<ManagedRecord>,
    pub calls: Vec<ZoneCall>,
    pub failing_lists: HashSet<String>,
    pub failing_deletes: HashSet<String>,
    pub failing_creates: HashSet<String>,
}

/// A record store backed by an in-memory zone
///
/// Mutations change the zone, so tests can assert on the final live state.
pub struct InMemoryZone {
    state: Arc<Mutex<ZoneState>>,
    next_id: Arc<AtomicUsize>,
    dry_run: bool,
}

impl InMemoryZone {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ZoneState::default())),
            next_id: Arc::new(AtomicUsize::new(1000)),
            dry_run: false,
        }
    }

    /// Create a zone that logs instead of mutating
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::new()
        }
    }

    /// Seed an existing record
    pub fn with_record(self, id: &str, name: &str, family: AddressFamily, content: &str) -> Self {
        self.state.lock().unwrap().records.push(ManagedRecord {
            id: id.to_string(),
            record_type: family.record_type().to_string(),
            name: name.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Make the list call for a family fail
    pub fn failing_list(self, family: AddressFamily) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_lists
            .insert(family.record_type().to_string());
        self
    }

    /// Make the delete call for a record ID fail
    pub fn failing_delete(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(id.to_string());
        self
    }

    /// Make the create call for an address fail
    pub fn failing_create(self, content: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_creates
            .insert(content.to_string());
        self
    }

    /// Create a zone that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
            next_id: Arc::clone(&other.next_id),
            dry_run: other.dry_run,
        }
    }

    /// All calls, in order
    pub fn calls(&self) -> Vec<ZoneCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Delete calls, in order
    pub fn deleted_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ZoneCall::Delete { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Create calls of a family, in order
    pub fn created(&self, family: AddressFamily) -> Vec<NewRecord> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ZoneCall::Create(r) if r.record_type == family.record_type() => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Live record contents of a family under `name`, sorted
    pub fn live_contents(&self, name: &str, family: AddressFamily) -> Vec<String> {
        let mut contents: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.name == name && r.record_type == family.record_type())
            .map(|r| r.content.clone())
            .collect();
        contents.sort();
        contents
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryZone {
    async fn list_records(&self, name: &str, family: AddressFamily) -> Result<Vec<ManagedRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ZoneCall::List {
            name: name.to_string(),
            record_type: family.record_type().to_string(),
        });

        if state.failing_lists.contains(family.record_type()) {
            return Err(Error::provider("memory", "list failed"));
        }

        Ok(state
            .records
            .iter()
            .filter(|r| r.name == name && r.record_type == family.record_type())
            .cloned()
            .collect())
    }

    async fn delete_record(&self, record_id: &str) -> Result<ChangeResult> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ZoneCall::Delete {
            id: record_id.to_string(),
        });

        if state.failing_deletes.contains(record_id) {
            return Err(Error::provider("memory", "delete failed"));
        }
        if self.dry_run {
            return Ok(ChangeResult::Simulated);
        }

        let before = state.records.len();
        state.records.retain(|r| r.id != record_id);
        if state.records.len() == before {
            return Err(Error::not_found(format!("record {}", record_id)));
        }

        Ok(ChangeResult::Applied {
            record_id: record_id.to_string(),
        })
    }

    async fn create_record(&self, record: &NewRecord) -> Result<ChangeResult> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ZoneCall::Create(record.clone()));

        if state.failing_creates.contains(&record.content) {
            return Err(Error::provider("memory", "create failed"));
        }
        if self.dry_run {
            return Ok(ChangeResult::Simulated);
        }

        let id = format!("r{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        state.records.push(ManagedRecord {
            id: id.clone(),
            record_type: record.record_type.clone(),
            name: record.name.clone(),
            content: record.content.clone(),
        });

        Ok(ChangeResult::Applied { record_id: id })
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config(hostnames: &[&str]) -> SyncConfig {
    SyncConfig::new(
        hostnames.iter().map(|h| h.to_string()).collect(),
        ProviderConfig::cloudflare("test-token", "test-zone"),
    )
}
