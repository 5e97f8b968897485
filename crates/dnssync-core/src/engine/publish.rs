//! Publish stage: replace the managed records with the resolved addresses
//!
//! Per family: list the existing records, delete every one of them, then
//! create one record per resolved address. Nothing is diffed; a shrinking set
//! therefore never leaves stale records behind.

use std::collections::BTreeSet;

use tracing::{debug, error, info, warn};

use super::resolve::ResolvedAddresses;
use crate::summary::FamilySummary;
use crate::traits::{AddressFamily, ChangeResult, NewRecord, RecordStore};

/// Publish both families, A first, then AAAA
pub async fn publish_addresses(
    store: &dyn RecordStore,
    record_name: &str,
    addresses: &ResolvedAddresses,
) -> (FamilySummary, FamilySummary) {
    let v4 = publish_family(
        store,
        record_name,
        AddressFamily::V4,
        addresses.for_family(AddressFamily::V4),
    )
    .await;
    let v6 = publish_family(
        store,
        record_name,
        AddressFamily::V6,
        addresses.for_family(AddressFamily::V6),
    )
    .await;
    (v4, v6)
}

/// Replace the records of one family
///
/// A failed list call is treated as "no existing records". Failed deletes and
/// creates are logged and counted; none of them stops the remaining calls.
pub async fn publish_family(
    store: &dyn RecordStore,
    record_name: &str,
    family: AddressFamily,
    addresses: &BTreeSet<String>,
) -> FamilySummary {
    let mut summary = FamilySummary {
        resolved: addresses.len(),
        ..Default::default()
    };

    let existing = match store.list_records(record_name, family).await {
        Ok(records) => records,
        Err(e) => {
            warn!(
                "Failed to list {} records for {} via {}: {}. Treating as none.",
                family,
                record_name,
                store.provider_name(),
                e
            );
            summary.listing_failed = true;
            Vec::new()
        }
    };
    summary.existing = existing.len();
    debug!("Found {} existing {} record(s) for {}", existing.len(), family, record_name);

    for record in &existing {
        let outcome = store.delete_record(&record.id).await;
        match &outcome {
            Ok(ChangeResult::Applied { .. }) => {
                info!("Deleted old {} record {} ({})", family, record.id, record.content);
            }
            Ok(ChangeResult::Simulated) => {
                info!("[DRY-RUN] Would delete old {} record {} ({})", family, record.id, record.content);
            }
            Err(e) => {
                error!("Failed to delete {} record {}: {}", family, record.id, e);
            }
        }
        summary.deletions.record(&outcome);
    }

    for address in addresses {
        let new_record = NewRecord::new(family, record_name, address.as_str());
        let outcome = store.create_record(&new_record).await;
        match &outcome {
            Ok(ChangeResult::Applied { record_id }) => {
                info!("Added {} record {} -> {} (id: {})", family, record_name, address, record_id);
            }
            Ok(ChangeResult::Simulated) => {
                info!("[DRY-RUN] Would add {} record {} -> {}", family, record_name, address);
            }
            Err(e) => {
                error!("Failed to add {} record {} -> {}: {}", family, record_name, address, e);
            }
        }
        summary.creations.record(&outcome);
    }

    summary
}
