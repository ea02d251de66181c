use std::collections::BTreeMap;
use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use super::channel::normalize_channel;
use super::engine::DEFAULT_FALLBACK_CAPACITY;
use super::privilege::DEFAULT_OVERRIDE_MARGIN;
use super::quota::QuotaTable;
use super::report::AllocationSummary;

/// Number of ranked preferences an applicant may list.
pub const MAX_PREFERENCES: usize = 3;

/// Identifier wrapper for applicants; unique and stable for a run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of admission channels. `Central` is the default channel and absorbs
/// any rounding remainder when per-channel ceilings are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Central,
    Martyrs,
    Parallel,
}

impl Channel {
    pub const DEFAULT: Channel = Channel::Central;

    pub const fn ordered() -> [Self; 3] {
        [Self::Central, Self::Martyrs, Self::Parallel]
    }

    /// Every channel other than the default, in a fixed order.
    pub const fn reserved() -> [Self; 2] {
        [Self::Martyrs, Self::Parallel]
    }

    pub const fn is_default(self) -> bool {
        matches!(self, Self::Central)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Central => "Central",
            Self::Martyrs => "Martyrs' Families",
            Self::Parallel => "Parallel",
        }
    }
}

/// Applicant record as supplied by callers, before channel normalization and
/// score coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSubmission {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: f64,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub preferences: Vec<Option<String>>,
    #[serde(default)]
    pub privileged: bool,
}

/// Normalized applicant consumed by the allocation passes. Never mutated by a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Applicant {
    pub id: ApplicantId,
    pub score: f64,
    pub channel: Channel,
    pub preferences: Vec<Option<String>>,
    pub privileged: bool,
}

impl Applicant {
    pub fn from_submission(submission: ApplicantSubmission) -> Self {
        let ApplicantSubmission {
            id,
            score,
            channel,
            preferences,
            privileged,
        } = submission;

        let preferences = preferences
            .into_iter()
            .take(MAX_PREFERENCES)
            .map(|choice| {
                choice
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
            })
            .collect();

        Self {
            id: ApplicantId(id.trim().to_string()),
            score: sanitize_score(score),
            channel: normalize_channel(channel.as_deref().unwrap_or_default()),
            preferences,
            privileged,
        }
    }

    /// Preferences in rank order with empty entries skipped.
    pub fn ranked_preferences(&self) -> impl Iterator<Item = &str> + '_ {
        self.preferences.iter().filter_map(|choice| choice.as_deref())
    }
}

/// Capacity configuration as it arrives from callers. Values are validated into a
/// [`super::capacity::CapacityPlan`] before any run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CapacityConfig {
    #[serde(alias = "EQUAL")]
    Equal {
        #[serde(default)]
        total: Option<i64>,
    },
    /// A missing `capacities` map plans like [`CapacityConfig::Unspecified`].
    #[serde(alias = "MANUAL")]
    Manual {
        #[serde(default)]
        capacities: Option<BTreeMap<String, i64>>,
    },
    #[serde(other)]
    Unspecified,
}

/// Run-wide defaults applied when a request leaves them out.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSettings {
    pub quotas: QuotaTable,
    pub fallback_capacity: u32,
    pub override_margin: f64,
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            quotas: QuotaTable::standard(),
            fallback_capacity: DEFAULT_FALLBACK_CAPACITY,
            override_margin: DEFAULT_OVERRIDE_MARGIN,
        }
    }
}

/// Full allocation request accepted by the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub applicants: Vec<ApplicantSubmission>,
    #[serde(default)]
    pub quotas: Option<BTreeMap<String, f64>>,
    pub capacity: CapacityConfig,
}

/// Admission granted by the privileged-override rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideAdmission {
    pub applicant: ApplicantId,
    pub previous: Option<String>,
    pub destination: String,
    pub minimum_score: f64,
}

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationOutcome {
    pub assignments: BTreeMap<ApplicantId, Option<String>>,
    pub usage: BTreeMap<String, BTreeMap<Channel, u32>>,
    pub capacities: BTreeMap<String, u32>,
    pub quotas: QuotaTable,
    pub overrides: Vec<OverrideAdmission>,
    pub summary: AllocationSummary,
}

impl AllocationOutcome {
    pub fn destination_of(&self, id: &str) -> Option<&str> {
        self.assignments
            .get(&ApplicantId(id.to_string()))
            .and_then(|destination| destination.as_deref())
    }

    pub fn seats_used(&self, destination: &str) -> u32 {
        self.usage
            .get(destination)
            .map(|channels| channels.values().sum())
            .unwrap_or(0)
    }
}

/// Coerces raw score text; anything unparsable counts as zero.
pub fn coerce_score(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(sanitize_score).unwrap_or(0.0)
}

fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() {
        // Folds -0.0 into 0.0 so signed zeros tie.
        score + 0.0
    } else {
        0.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreInput {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<ScoreInput>::deserialize(deserializer)?;
    Ok(match raw {
        Some(ScoreInput::Number(value)) => sanitize_score(value),
        Some(ScoreInput::Text(text)) => coerce_score(&text),
        Some(ScoreInput::Other(_)) | None => 0.0,
    })
}

/// Input validation failures; raised before any ledger state exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("total capacity must not be negative (got {0})")]
    NegativeTotalCapacity(i64),
    #[error("capacity for destination '{destination}' must not be negative (got {value})")]
    NegativeDestinationCapacity { destination: String, value: i64 },
    #[error("capacity {0} exceeds the supported seat range")]
    CapacityOutOfRange(i64),
    #[error("quota for channel '{label}' must be a finite fraction between 0 and 1 (got {value})")]
    InvalidQuotaFraction { label: String, value: f64 },
    #[error("quota table lists channel {0:?} more than once")]
    DuplicateQuotaChannel(Channel),
    #[error("reserved channel quotas sum to {0:.3}, leaving no room for the default channel")]
    ReservedQuotaOverflow(f64),
    #[error("override margin must be a finite, non-negative number (got {0})")]
    InvalidOverrideMargin(f64),
    #[error("applicant id '{0}' appears more than once")]
    DuplicateApplicant(ApplicantId),
    #[error("applicant id must not be empty")]
    EmptyApplicantId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_scores_are_folded_to_zero() {
        assert_eq!(coerce_score("-0").to_bits(), 0.0_f64.to_bits());
        assert_eq!(coerce_score("  -0.0 ").to_bits(), 0.0_f64.to_bits());
        assert_eq!(coerce_score("-12.5"), -12.5);
        assert_eq!(coerce_score("inf"), 0.0);
    }
}
