use std::collections::BTreeMap;
use std::io::Read;

use super::domain::{
    AllocationError, AllocationOutcome, AllocationRequest, AllocationSettings, CapacityConfig,
};
use super::engine::AllocationEngine;
use super::quota::QuotaTable;
use crate::workflows::roster::{RosterImportError, RosterImporter, RosterScan};

/// Entry point for callers outside the crate. Holds only immutable defaults; each
/// request gets a freshly configured engine and its own ledger.
#[derive(Debug, Clone, Default)]
pub struct AllocationService {
    settings: AllocationSettings,
}

impl AllocationService {
    pub fn new(settings: AllocationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AllocationSettings {
        &self.settings
    }

    /// Builds an engine for one run, preferring request quotas over the defaults.
    pub fn engine(
        &self,
        quotas: Option<&BTreeMap<String, f64>>,
        capacity: &CapacityConfig,
    ) -> Result<AllocationEngine, AllocationError> {
        let mut settings = self.settings.clone();
        if let Some(quotas) = quotas {
            settings.quotas = QuotaTable::from_labels(quotas.iter().map(|(k, v)| (k, *v)))?;
        }
        AllocationEngine::with_settings(&settings, capacity)
    }

    pub fn allocate(
        &self,
        request: AllocationRequest,
    ) -> Result<AllocationOutcome, AllocationServiceError> {
        let AllocationRequest {
            applicants,
            quotas,
            capacity,
        } = request;

        let engine = self.engine(quotas.as_ref(), &capacity)?;
        Ok(engine.run(applicants)?)
    }

    /// Imports a CSV roster and allocates it in one step.
    pub fn allocate_roster<R: Read>(
        &self,
        roster: R,
        quotas: Option<&BTreeMap<String, f64>>,
        capacity: &CapacityConfig,
    ) -> Result<AllocationOutcome, AllocationServiceError> {
        let engine = self.engine(quotas, capacity)?;
        let applicants = RosterImporter::from_reader(roster)?;
        Ok(engine.run(applicants)?)
    }

    pub fn scan<R: Read>(&self, roster: R) -> Result<RosterScan, AllocationServiceError> {
        Ok(RosterImporter::scan_reader(roster)?)
    }
}

/// Error raised by the allocation service.
#[derive(Debug, thiserror::Error)]
pub enum AllocationServiceError {
    #[error(transparent)]
    Validation(#[from] AllocationError),
    #[error(transparent)]
    Roster(#[from] RosterImportError),
}
