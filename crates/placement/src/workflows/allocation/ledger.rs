use std::collections::BTreeMap;

use super::domain::Channel;
use super::quota::QuotaTable;

/// Starting value of every destination's minimum default-channel score.
pub const MINIMUM_SCORE_SENTINEL: f64 = 100.0;

/// Seat bookkeeping for one destination.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationLedger {
    capacity: u32,
    usage: BTreeMap<Channel, u32>,
    minimum_default_score: f64,
}

impl DestinationLedger {
    fn new(capacity: u32) -> Self {
        let usage = Channel::ordered()
            .into_iter()
            .map(|channel| (channel, 0))
            .collect();
        Self {
            capacity,
            usage,
            minimum_default_score: MINIMUM_SCORE_SENTINEL,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn usage(&self, channel: Channel) -> u32 {
        self.usage.get(&channel).copied().unwrap_or(0)
    }

    pub fn total_usage(&self) -> u32 {
        self.usage.values().sum()
    }

    /// Lowest score admitted through the default channel, or
    /// [`MINIMUM_SCORE_SENTINEL`] until a default-channel admission goes lower.
    pub fn minimum_default_score(&self) -> f64 {
        self.minimum_default_score
    }
}

/// Per-destination, per-channel seat usage for a single run.
///
/// Usage counters only grow and the tracked minimum score only falls. A ledger is
/// built fresh for every run and never shared between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotLedger {
    quotas: QuotaTable,
    destinations: BTreeMap<String, DestinationLedger>,
}

impl SlotLedger {
    pub fn new(quotas: QuotaTable, capacities: &BTreeMap<String, u32>) -> Self {
        let destinations = capacities
            .iter()
            .map(|(name, capacity)| (name.clone(), DestinationLedger::new(*capacity)))
            .collect();
        Self {
            quotas,
            destinations,
        }
    }

    pub fn quotas(&self) -> &QuotaTable {
        &self.quotas
    }

    pub fn destination(&self, name: &str) -> Option<&DestinationLedger> {
        self.destinations.get(name)
    }

    pub fn destinations(&self) -> impl Iterator<Item = (&str, &DestinationLedger)> + '_ {
        self.destinations
            .iter()
            .map(|(name, ledger)| (name.as_str(), ledger))
    }

    /// Seat ceiling of `channel` at `destination`. Reserved channels get the floor of
    /// their share; the default channel gets whatever capacity is left, so the
    /// ceilings of a destination always add up to its capacity.
    pub fn ceiling(&self, destination: &str, channel: Channel) -> u32 {
        let Some(ledger) = self.destinations.get(destination) else {
            return 0;
        };

        if channel.is_default() {
            let reserved: u32 = Channel::reserved()
                .into_iter()
                .map(|other| self.reserved_ceiling(ledger.capacity, other))
                .sum();
            ledger.capacity.saturating_sub(reserved)
        } else {
            self.reserved_ceiling(ledger.capacity, channel)
        }
    }

    fn reserved_ceiling(&self, capacity: u32, channel: Channel) -> u32 {
        (f64::from(capacity) * self.quotas.fraction(channel)).floor() as u32
    }

    /// Whether `channel` still has a seat under its ceiling at `destination`.
    pub fn has_channel_slot(&self, destination: &str, channel: Channel) -> bool {
        self.destinations
            .get(destination)
            .map(|ledger| ledger.usage(channel) < self.ceiling(destination, channel))
            .unwrap_or(false)
    }

    /// Whether `destination` has any seat left, ignoring channel ceilings.
    pub fn has_vacancy(&self, destination: &str) -> bool {
        self.destinations
            .get(destination)
            .map(|ledger| ledger.total_usage() < ledger.capacity)
            .unwrap_or(false)
    }

    /// Records a seat under `channel`; default-channel admissions also lower the
    /// destination's minimum admitted score.
    pub fn occupy(&mut self, destination: &str, channel: Channel, score: f64) {
        let Some(ledger) = self.destinations.get_mut(destination) else {
            return;
        };

        *ledger.usage.entry(channel).or_insert(0) += 1;

        if channel.is_default() {
            ledger.minimum_default_score = ledger.minimum_default_score.min(score);
        }
    }

    /// `None` only for destinations outside the capacity plan.
    pub fn minimum_default_score(&self, destination: &str) -> Option<f64> {
        self.destinations
            .get(destination)
            .map(DestinationLedger::minimum_default_score)
    }
}
