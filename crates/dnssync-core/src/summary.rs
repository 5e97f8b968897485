//! Per-run report
//!
//! Every mutating call feeds an [`OperationCounts`], so the outcome of a run
//! can be checked without parsing log output.

use std::fmt;

use crate::traits::{AddressFamily, ChangeResult};

/// A lookup that failed for one hostname and family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    /// Hostname that was looked up
    pub hostname: String,
    /// Family of the failed lookup
    pub family: AddressFamily,
    /// Error message
    pub error: String,
}

/// Attempted vs. confirmed counts for one kind of mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    /// Calls issued
    pub attempted: usize,
    /// Calls the provider confirmed
    pub confirmed: usize,
    /// Calls only logged (dry-run)
    pub simulated: usize,
}

impl OperationCounts {
    /// Record the outcome of one call
    pub fn record<E>(&mut self, outcome: &Result<ChangeResult, E>) {
        self.attempted += 1;
        match outcome {
            Ok(ChangeResult::Applied { .. }) => self.confirmed += 1,
            Ok(ChangeResult::Simulated) => self.simulated += 1,
            Err(_) => {}
        }
    }

    /// Calls that returned an error
    pub fn failed(&self) -> usize {
        self.attempted - self.confirmed - self.simulated
    }
}

/// Publish outcome for one address family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilySummary {
    /// Addresses resolved for this family
    pub resolved: usize,
    /// Records found by the list call
    pub existing: usize,
    /// The list call failed; no deletions were attempted
    pub listing_failed: bool,
    /// Delete calls
    pub deletions: OperationCounts,
    /// Create calls
    pub creations: OperationCounts,
}

impl FamilySummary {
    /// Listing succeeded and every mutation was confirmed or simulated
    pub fn is_clean(&self) -> bool {
        !self.listing_failed && self.deletions.failed() == 0 && self.creations.failed() == 0
    }
}

/// Outcome of one resolve + publish run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Hostnames processed
    pub hostnames: usize,
    /// Lookups that failed (tolerated, reported)
    pub lookup_failures: Vec<LookupFailure>,
    /// IPv4 / A record outcome
    pub v4: FamilySummary,
    /// IPv6 / AAAA record outcome
    pub v6: FamilySummary,
}

impl SyncSummary {
    /// Summary for one family
    pub fn family(&self, family: AddressFamily) -> &FamilySummary {
        match family {
            AddressFamily::V4 => &self.v4,
            AddressFamily::V6 => &self.v6,
        }
    }

    /// Both families published without a failed list, delete, or create
    ///
    /// Lookup failures do not make a run unclean; see [`Self::lookup_failures`].
    pub fn is_clean(&self) -> bool {
        self.v4.is_clean() && self.v6.is_clean()
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hostname(s), {} failed lookup(s)",
            self.hostnames,
            self.lookup_failures.len()
        )?;

        for family in AddressFamily::ALL {
            let s = self.family(family);
            write!(
                f,
                "; {}: {} resolved, deleted {}/{}, created {}/{}",
                family,
                s.resolved,
                s.deletions.confirmed,
                s.deletions.attempted,
                s.creations.confirmed,
                s.creations.attempted
            )?;
            if s.deletions.simulated + s.creations.simulated > 0 {
                write!(
                    f,
                    " ({} simulated)",
                    s.deletions.simulated + s.creations.simulated
                )?;
            }
            if s.listing_failed {
                f.write_str(" (listing failed)")?;
            }
        }

        Ok(())
    }
}
