use super::mapping::field_for_normalized;
use super::normalizer::normalize_header;
use super::RosterImportError;
use crate::workflows::allocation::{coerce_score, ApplicantSubmission};
use csv::StringRecord;
use serde::{Deserialize, Deserializer};
use std::io::Read;

const FACULTY_CHILD_MARKERS: &[&str] = &["أبناء الأساتذة", "faculty child"];

pub(crate) fn parse_submissions<R: Read>(
    reader: R,
) -> Result<Vec<ApplicantSubmission>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = canonical_headers(csv_reader.headers()?);
    let mut submissions = Vec::new();

    for (index, result) in csv_reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(index as u64 + 2);
        let row: RosterRow = record.deserialize(Some(&headers))?;
        submissions.push(row.into_submission(line)?);
    }

    Ok(submissions)
}

fn canonical_headers(raw: &StringRecord) -> StringRecord {
    raw.iter()
        .map(|header| {
            let normalized = normalize_header(header);
            field_for_normalized(&normalized)
                .map(str::to_string)
                .unwrap_or(normalized)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    score: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    channel: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    choice_1: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    choice_2: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    choice_3: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    notes: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    privileged: Option<String>,
}

impl RosterRow {
    fn into_submission(self, line: u64) -> Result<ApplicantSubmission, RosterImportError> {
        let privileged = self.is_privileged();
        let RosterRow {
            id,
            score,
            channel,
            choice_1,
            choice_2,
            choice_3,
            ..
        } = self;

        let id = id.ok_or(RosterImportError::MissingIdentifier { line })?;

        Ok(ApplicantSubmission {
            id,
            score: score.as_deref().map(coerce_score).unwrap_or(0.0),
            channel,
            preferences: vec![choice_1, choice_2, choice_3],
            privileged,
        })
    }

    fn is_privileged(&self) -> bool {
        let flagged = self
            .privileged
            .as_deref()
            .map(is_truthy)
            .unwrap_or(false);

        let noted = self.notes.as_deref().is_some_and(|notes| {
            let notes = notes.to_lowercase();
            FACULTY_CHILD_MARKERS
                .iter()
                .any(|marker| notes.contains(marker))
        });

        flagged || noted
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "نعم"
    )
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
pub(crate) fn is_truthy_for_tests(value: &str) -> bool {
    is_truthy(value)
}
