use tracing::debug;

use super::domain::{AllocationError, Applicant, OverrideAdmission};
use super::engine::AssignmentBook;
use super::ledger::SlotLedger;

pub const DEFAULT_OVERRIDE_MARGIN: f64 = 5.0;

/// Final pass re-admitting privileged applicants whose score sits within `margin`
/// of a destination's lowest default-channel admission.
///
/// The first ranked preference meeting the threshold replaces whatever the applicant
/// currently holds, even a higher-ranked destination, and no capacity check applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrideResolver {
    margin: f64,
}

impl OverrideResolver {
    pub fn new(margin: f64) -> Result<Self, AllocationError> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(AllocationError::InvalidOverrideMargin(margin));
        }
        Ok(Self { margin })
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// First planned preference whose default-channel minimum is within reach, paired
    /// with that minimum. Destinations without a default-channel admission still carry
    /// the sentinel minimum.
    pub fn eligible_destination<'a>(
        &self,
        applicant: &'a Applicant,
        ledger: &SlotLedger,
    ) -> Option<(&'a str, f64)> {
        if !applicant.privileged {
            return None;
        }

        applicant.ranked_preferences().find_map(|destination| {
            ledger
                .minimum_default_score(destination)
                .filter(|minimum| applicant.score >= minimum - self.margin)
                .map(|minimum| (destination, minimum))
        })
    }

    pub(crate) fn resolve(
        &self,
        ledger: &SlotLedger,
        queue: &[&Applicant],
        mut book: AssignmentBook,
    ) -> (AssignmentBook, Vec<OverrideAdmission>) {
        let mut admissions = Vec::new();

        for &applicant in queue {
            let Some((destination, minimum_score)) = self.eligible_destination(applicant, ledger)
            else {
                continue;
            };

            let previous = book.destination(&applicant.id).map(str::to_string);
            if previous.as_deref() == Some(destination) {
                continue;
            }

            debug!(
                applicant = %applicant.id,
                ?previous,
                destination,
                minimum_score,
                "privileged override applied"
            );
            book.assign(&applicant.id, destination);
            admissions.push(OverrideAdmission {
                applicant: applicant.id.clone(),
                previous,
                destination: destination.to_string(),
                minimum_score,
            });
        }

        (book, admissions)
    }
}

impl Default for OverrideResolver {
    fn default() -> Self {
        Self {
            margin: DEFAULT_OVERRIDE_MARGIN,
        }
    }
}
