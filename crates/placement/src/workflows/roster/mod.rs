mod mapping;
mod normalizer;
mod parser;

use crate::workflows::allocation::{discover_destinations, Applicant, ApplicantSubmission};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingIdentifier { line: u64 },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read applicant roster: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid applicant roster CSV: {}", err),
            RosterImportError::MissingIdentifier { line } => {
                write!(f, "roster row on line {} has no applicant id", line)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::MissingIdentifier { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Overview of a roster before any allocation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterScan {
    pub applicant_count: usize,
    pub destinations: Vec<String>,
}

impl RosterScan {
    pub fn from_submissions(submissions: &[ApplicantSubmission]) -> Self {
        let applicants: Vec<Applicant> = submissions
            .iter()
            .cloned()
            .map(Applicant::from_submission)
            .collect();

        Self {
            applicant_count: applicants.len(),
            destinations: discover_destinations(&applicants),
        }
    }
}

/// Reads applicant rosters exported from the admissions spreadsheet as CSV. Headers
/// may be English or Arabic.
pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<ApplicantSubmission>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ApplicantSubmission>, RosterImportError> {
        parser::parse_submissions(reader)
    }

    pub fn scan_reader<R: Read>(reader: R) -> Result<RosterScan, RosterImportError> {
        let submissions = Self::from_reader(reader)?;
        Ok(RosterScan::from_submissions(&submissions))
    }
}
