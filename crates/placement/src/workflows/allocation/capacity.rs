use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use super::domain::{AllocationError, Applicant, CapacityConfig};

/// Validated capacity configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityPlan {
    /// Split `total` seats evenly; `None` means one seat per applicant.
    Equal { total: Option<u32> },
    Manual { capacities: BTreeMap<String, u32> },
    Fallback,
}

impl CapacityPlan {
    /// Validates caller-supplied capacities; negative or oversized seat counts are rejected.
    pub fn from_config(config: &CapacityConfig) -> Result<Self, AllocationError> {
        match config {
            CapacityConfig::Equal { total: None } => Ok(Self::Equal { total: None }),
            CapacityConfig::Equal { total: Some(total) } => {
                if *total < 0 {
                    return Err(AllocationError::NegativeTotalCapacity(*total));
                }
                Ok(Self::Equal {
                    total: Some(seat_count(*total)?),
                })
            }
            CapacityConfig::Manual { capacities: None } => Ok(Self::Fallback),
            CapacityConfig::Manual {
                capacities: Some(capacities),
            } => {
                let mut validated = BTreeMap::new();
                for (destination, value) in capacities {
                    if *value < 0 {
                        return Err(AllocationError::NegativeDestinationCapacity {
                            destination: destination.clone(),
                            value: *value,
                        });
                    }
                    validated.insert(destination.trim().to_string(), seat_count(*value)?);
                }
                Ok(Self::Manual {
                    capacities: validated,
                })
            }
            CapacityConfig::Unspecified => Ok(Self::Fallback),
        }
    }
}

fn seat_count(value: i64) -> Result<u32, AllocationError> {
    u32::try_from(value).map_err(|_| AllocationError::CapacityOutOfRange(value))
}

/// Destinations named anywhere in the pool's preferences, deduplicated and sorted
/// lexicographically. Only these destinations exist for a run.
pub fn discover_destinations(applicants: &[Applicant]) -> Vec<String> {
    applicants
        .iter()
        .flat_map(|applicant| applicant.ranked_preferences())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Computes the total seat count of every destination.
#[derive(Debug, Clone)]
pub struct CapacityPlanner {
    plan: CapacityPlan,
    fallback_capacity: u32,
}

impl CapacityPlanner {
    pub fn new(plan: CapacityPlan, fallback_capacity: u32) -> Self {
        Self {
            plan,
            fallback_capacity,
        }
    }

    /// `destinations` must already be in lexicographic order; in equal-split mode the
    /// first `total % n` of them receive one extra seat each.
    pub fn plan(&self, destinations: &[String], applicant_count: usize) -> BTreeMap<String, u32> {
        if destinations.is_empty() {
            return BTreeMap::new();
        }

        match &self.plan {
            CapacityPlan::Equal { total } => {
                let total = total.unwrap_or_else(|| {
                    u32::try_from(applicant_count).unwrap_or(u32::MAX)
                });
                split_evenly(destinations, total)
            }
            CapacityPlan::Manual { capacities } => destinations
                .iter()
                .map(|destination| {
                    let seats = capacities.get(destination).copied().unwrap_or(0);
                    (destination.clone(), seats)
                })
                .collect(),
            CapacityPlan::Fallback => {
                warn!(
                    seats = self.fallback_capacity,
                    destinations = destinations.len(),
                    "capacity mode unspecified; applying fallback capacity"
                );
                destinations
                    .iter()
                    .map(|destination| (destination.clone(), self.fallback_capacity))
                    .collect()
            }
        }
    }
}

fn split_evenly(destinations: &[String], total: u32) -> BTreeMap<String, u32> {
    // Non-empty by the caller's guard.
    let count = u32::try_from(destinations.len()).unwrap_or(u32::MAX);
    let base = total / count;
    let remainder = total % count;

    destinations
        .iter()
        .enumerate()
        .map(|(index, destination)| {
            let extra = u32::from((index as u32) < remainder);
            (destination.clone(), base + extra)
        })
        .collect()
}
