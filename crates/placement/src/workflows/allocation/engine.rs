use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::capacity::{discover_destinations, CapacityPlan, CapacityPlanner};
use super::domain::{
    AllocationError, AllocationOutcome, AllocationSettings, Applicant, ApplicantId,
    ApplicantSubmission, CapacityConfig, Channel,
};
use super::ledger::SlotLedger;
use super::privilege::OverrideResolver;
use super::quota::{ChannelDemand, QuotaTable};
use super::report::summarize;

pub const DEFAULT_FALLBACK_CAPACITY: u32 = 100;

/// Current destination of every applicant in a run; `None` means unassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssignmentBook {
    entries: BTreeMap<ApplicantId, Option<String>>,
}

impl AssignmentBook {
    pub(crate) fn new(applicants: &[Applicant]) -> Self {
        let entries = applicants
            .iter()
            .map(|applicant| (applicant.id.clone(), None))
            .collect();
        Self { entries }
    }

    pub(crate) fn destination(&self, id: &ApplicantId) -> Option<&str> {
        self.entries.get(id).and_then(|entry| entry.as_deref())
    }

    pub(crate) fn is_assigned(&self, id: &ApplicantId) -> bool {
        self.destination(id).is_some()
    }

    pub(crate) fn assign(&mut self, id: &ApplicantId, destination: &str) {
        self.entries
            .insert(id.clone(), Some(destination.to_string()));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn assigned_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_some()).count()
    }

    pub(crate) fn into_entries(self) -> BTreeMap<ApplicantId, Option<String>> {
        self.entries
    }
}

/// Runs the full placement pipeline: capacity planning, quota rebalancing, the
/// quota-respecting main pass, the vacancy-fill pass and the privileged override.
///
/// The engine only holds validated configuration. Every call to [`Self::allocate`]
/// builds its own ledger, so one engine can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    quotas: QuotaTable,
    planner: CapacityPlanner,
    resolver: OverrideResolver,
}

impl AllocationEngine {
    pub fn new(quotas: QuotaTable, capacity: &CapacityConfig) -> Result<Self, AllocationError> {
        quotas.validate()?;
        let plan = CapacityPlan::from_config(capacity)?;

        Ok(Self {
            quotas,
            planner: CapacityPlanner::new(plan, DEFAULT_FALLBACK_CAPACITY),
            resolver: OverrideResolver::default(),
        })
    }

    pub fn with_settings(
        settings: &AllocationSettings,
        capacity: &CapacityConfig,
    ) -> Result<Self, AllocationError> {
        let plan = CapacityPlan::from_config(capacity)?;
        settings.quotas.validate()?;

        Ok(Self {
            quotas: settings.quotas.clone(),
            planner: CapacityPlanner::new(plan, settings.fallback_capacity),
            resolver: OverrideResolver::new(settings.override_margin)?,
        })
    }

    /// Normalizes raw submissions and allocates them.
    pub fn run(
        &self,
        submissions: Vec<ApplicantSubmission>,
    ) -> Result<AllocationOutcome, AllocationError> {
        let applicants: Vec<Applicant> = submissions
            .into_iter()
            .map(Applicant::from_submission)
            .collect();
        self.allocate(&applicants)
    }

    pub fn allocate(&self, applicants: &[Applicant]) -> Result<AllocationOutcome, AllocationError> {
        ensure_unique_ids(applicants)?;

        let destinations = discover_destinations(applicants);
        let capacities = self.planner.plan(&destinations, applicants.len());

        let demand = ChannelDemand::from_applicants(applicants);
        let rebalanced = self.quotas.rebalance(&demand);
        for transfer in &rebalanced.transfers {
            info!(
                channel = ?transfer.channel,
                fraction = transfer.fraction,
                "no applicants in channel; quota moved to default channel"
            );
        }

        let ledger = SlotLedger::new(rebalanced.table, &capacities);
        let queue = priority_order(applicants);
        let book = AssignmentBook::new(applicants);

        let (ledger, book) = main_pass(ledger, &queue, book);
        debug!(assigned = book.assigned_count(), "main pass complete");

        let (ledger, book) = vacancy_fill_pass(ledger, &queue, book);
        debug!(assigned = book.assigned_count(), "vacancy-fill pass complete");

        let (book, overrides) = self.resolver.resolve(&ledger, &queue, book);

        let usage = headcount(applicants, &book, &capacities);
        let summary = summarize(&capacities, &usage, &ledger, &book, overrides.len());

        info!(
            applicants = applicants.len(),
            destinations = capacities.len(),
            assigned = summary.assigned,
            overrides = overrides.len(),
            "allocation run complete"
        );

        Ok(AllocationOutcome {
            assignments: book.into_entries(),
            usage,
            capacities,
            quotas: ledger.quotas().clone(),
            overrides,
            summary,
        })
    }
}

fn ensure_unique_ids(applicants: &[Applicant]) -> Result<(), AllocationError> {
    let mut seen = BTreeSet::new();
    for applicant in applicants {
        if applicant.id.0.is_empty() {
            return Err(AllocationError::EmptyApplicantId);
        }
        if !seen.insert(&applicant.id) {
            return Err(AllocationError::DuplicateApplicant(applicant.id.clone()));
        }
    }
    Ok(())
}

/// Applicants by score, highest first. The sort is stable so equal scores keep
/// their input order.
pub(crate) fn priority_order(applicants: &[Applicant]) -> Vec<&Applicant> {
    let mut queue: Vec<&Applicant> = applicants.iter().collect();
    queue.sort_by(|left, right| right.score.total_cmp(&left.score));
    queue
}

/// Seats each applicant at the first preference whose channel ceiling has room.
pub(crate) fn main_pass(
    mut ledger: SlotLedger,
    queue: &[&Applicant],
    mut book: AssignmentBook,
) -> (SlotLedger, AssignmentBook) {
    for &applicant in queue {
        let chosen = applicant
            .ranked_preferences()
            .find(|destination| ledger.has_channel_slot(destination, applicant.channel));

        if let Some(destination) = chosen {
            ledger.occupy(destination, applicant.channel, applicant.score);
            book.assign(&applicant.id, destination);
        }
    }

    (ledger, book)
}

/// Seats still-unassigned applicants wherever total usage is under capacity,
/// ignoring channel ceilings. Seats are still booked under the applicant's channel.
pub(crate) fn vacancy_fill_pass(
    mut ledger: SlotLedger,
    queue: &[&Applicant],
    mut book: AssignmentBook,
) -> (SlotLedger, AssignmentBook) {
    for &applicant in queue {
        if book.is_assigned(&applicant.id) {
            continue;
        }

        let chosen = applicant
            .ranked_preferences()
            .find(|destination| ledger.has_vacancy(destination));

        if let Some(destination) = chosen {
            ledger.occupy(destination, applicant.channel, applicant.score);
            book.assign(&applicant.id, destination);
        }
    }

    (ledger, book)
}

/// Final seats per destination and channel, counted from the assignments. Overrides
/// can push these above capacity.
fn headcount(
    applicants: &[Applicant],
    book: &AssignmentBook,
    capacities: &BTreeMap<String, u32>,
) -> BTreeMap<String, BTreeMap<Channel, u32>> {
    let mut usage: BTreeMap<String, BTreeMap<Channel, u32>> = capacities
        .keys()
        .map(|destination| {
            let channels = Channel::ordered()
                .into_iter()
                .map(|channel| (channel, 0))
                .collect();
            (destination.clone(), channels)
        })
        .collect();

    for applicant in applicants {
        if let Some(destination) = book.destination(&applicant.id) {
            if let Some(channels) = usage.get_mut(destination) {
                *channels.entry(applicant.channel).or_insert(0) += 1;
            }
        }
    }

    usage
}
