use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::Channel;
use super::engine::AssignmentBook;
use super::ledger::SlotLedger;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub total_applicants: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub overridden: usize,
    pub destinations: Vec<DestinationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationSummary {
    pub destination: String,
    pub capacity: u32,
    pub seats_used: u32,
    pub vacancies: u32,
    /// Seats above capacity, only ever non-zero after privileged overrides.
    pub overflow: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_default_score: Option<f64>,
    pub channels: Vec<ChannelUsageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelUsageEntry {
    pub channel: Channel,
    pub channel_label: &'static str,
    pub ceiling: u32,
    pub seats_used: u32,
}

impl AllocationSummary {
    pub fn fully_utilized(&self) -> impl Iterator<Item = &DestinationSummary> + '_ {
        self.destinations
            .iter()
            .filter(|destination| destination.vacancies == 0)
    }
}

pub(crate) fn summarize(
    capacities: &BTreeMap<String, u32>,
    usage: &BTreeMap<String, BTreeMap<Channel, u32>>,
    ledger: &SlotLedger,
    book: &AssignmentBook,
    overridden: usize,
) -> AllocationSummary {
    let destinations = capacities
        .iter()
        .map(|(destination, capacity)| {
            let per_channel = usage.get(destination);
            let channels: Vec<ChannelUsageEntry> = Channel::ordered()
                .into_iter()
                .map(|channel| ChannelUsageEntry {
                    channel,
                    channel_label: channel.label(),
                    ceiling: ledger.ceiling(destination, channel),
                    seats_used: per_channel
                        .and_then(|channels| channels.get(&channel))
                        .copied()
                        .unwrap_or(0),
                })
                .collect();
            let seats_used = channels.iter().map(|entry| entry.seats_used).sum();

            DestinationSummary {
                destination: destination.clone(),
                capacity: *capacity,
                seats_used,
                vacancies: capacity.saturating_sub(seats_used),
                overflow: seats_used.saturating_sub(*capacity),
                minimum_default_score: ledger.minimum_default_score(destination),
                channels,
            }
        })
        .collect();

    let total_applicants = book.len();
    let assigned = book.assigned_count();

    AllocationSummary {
        total_applicants,
        assigned,
        unassigned: total_applicants - assigned,
        overridden,
        destinations,
    }
}
