//! Quota-aware placement of ranked applicants into capacity-limited destinations.
//!
//! A run is a fixed pipeline: destinations are discovered from preferences and given
//! seat counts, idle reserved-channel quotas are folded into the default channel, a
//! score-ordered main pass respects per-channel ceilings, a vacancy-fill pass uses any
//! seat left over, and a final pass applies the privileged-override rule.

pub mod capacity;
pub mod channel;
pub mod domain;
pub mod engine;
pub mod ledger;
pub mod privilege;
pub mod quota;
pub mod report;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use capacity::{discover_destinations, CapacityPlan, CapacityPlanner};
pub use channel::normalize_channel;
pub use domain::{
    coerce_score, AllocationError, AllocationOutcome, AllocationRequest, AllocationSettings,
    Applicant, ApplicantId, ApplicantSubmission, CapacityConfig, Channel, OverrideAdmission,
    MAX_PREFERENCES,
};
pub use engine::{AllocationEngine, DEFAULT_FALLBACK_CAPACITY};
pub use ledger::{DestinationLedger, SlotLedger, MINIMUM_SCORE_SENTINEL};
pub use privilege::{OverrideResolver, DEFAULT_OVERRIDE_MARGIN};
pub use quota::{ChannelDemand, QuotaTable, QuotaTransfer, Rebalanced};
pub use report::{AllocationSummary, ChannelUsageEntry, DestinationSummary};
pub use router::{allocation_router, RosterAllocationRequest, RosterScanRequest};
pub use service::{AllocationService, AllocationServiceError};
