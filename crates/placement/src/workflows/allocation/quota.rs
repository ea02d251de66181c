use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::channel::normalize_channel;
use super::domain::{AllocationError, Applicant, Channel};

/// Tolerance used when checking that reserved fractions fit inside a destination.
const FRACTION_EPSILON: f64 = 1e-9;

/// Share of each destination's capacity reserved per channel.
///
/// The default channel's entry is informational: its ceiling is always the capacity
/// left over once every reserved channel's floored share has been taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuotaTable {
    fractions: BTreeMap<Channel, f64>,
}

impl QuotaTable {
    /// Central 60%, martyrs' families 10%, parallel 30%.
    pub fn standard() -> Self {
        let fractions = BTreeMap::from([
            (Channel::Central, 0.60),
            (Channel::Martyrs, 0.10),
            (Channel::Parallel, 0.30),
        ]);
        Self { fractions }
    }

    /// Builds a table from free-text channel labels. Values above 1.0 are read as
    /// percentages.
    pub fn from_labels<I, S>(entries: I) -> Result<Self, AllocationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut fractions = BTreeMap::new();

        for (label, value) in entries {
            let label = label.as_ref();
            let fraction = if value > 1.0 { value / 100.0 } else { value };
            if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
                return Err(AllocationError::InvalidQuotaFraction {
                    label: label.to_string(),
                    value,
                });
            }

            let channel = normalize_channel(label);
            if fractions.insert(channel, fraction).is_some() {
                return Err(AllocationError::DuplicateQuotaChannel(channel));
            }
        }

        let table = Self { fractions };
        table.validate()?;
        Ok(table)
    }

    pub fn fraction(&self, channel: Channel) -> f64 {
        self.fractions.get(&channel).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        self.fractions
            .iter()
            .map(|(channel, fraction)| (*channel, *fraction))
    }

    pub fn validate(&self) -> Result<(), AllocationError> {
        let reserved: f64 = Channel::reserved()
            .into_iter()
            .map(|channel| self.fraction(channel))
            .sum();

        if reserved > 1.0 + FRACTION_EPSILON {
            return Err(AllocationError::ReservedQuotaOverflow(reserved));
        }
        Ok(())
    }

    /// Moves the share of every reserved channel with no applicants in the pool onto
    /// the default channel. An empty pool leaves the table untouched.
    pub fn rebalance(&self, demand: &ChannelDemand) -> Rebalanced {
        let mut table = self.clone();
        let mut transfers = Vec::new();

        if demand.total() == 0 {
            return Rebalanced { table, transfers };
        }

        for channel in Channel::reserved() {
            let fraction = table.fraction(channel);
            if demand.count(channel) == 0 && fraction > 0.0 {
                table.fractions.insert(channel, 0.0);
                *table.fractions.entry(Channel::DEFAULT).or_insert(0.0) += fraction;
                debug!(?channel, fraction, "released unused channel quota to default channel");
                transfers.push(QuotaTransfer { channel, fraction });
            }
        }

        Rebalanced { table, transfers }
    }
}

impl Default for QuotaTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Share moved from an idle reserved channel onto the default channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuotaTransfer {
    pub channel: Channel,
    pub fraction: f64,
}

/// Quota table after rebalancing plus the transfers that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rebalanced {
    pub table: QuotaTable,
    pub transfers: Vec<QuotaTransfer>,
}

/// Applicant headcount per normalized channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDemand {
    counts: BTreeMap<Channel, usize>,
    total: usize,
}

impl ChannelDemand {
    pub fn from_applicants(applicants: &[Applicant]) -> Self {
        let mut counts = BTreeMap::new();
        for applicant in applicants {
            *counts.entry(applicant.channel).or_insert(0) += 1;
        }
        Self {
            counts,
            total: applicants.len(),
        }
    }

    pub fn count(&self, channel: Channel) -> usize {
        self.counts.get(&channel).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
