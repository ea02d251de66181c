use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::allocation::domain::{Applicant, ApplicantSubmission, CapacityConfig};
use crate::workflows::allocation::engine::AllocationEngine;
use crate::workflows::allocation::quota::QuotaTable;
use crate::workflows::allocation::{allocation_router, AllocationService};

pub(super) fn submission(id: &str, score: f64, channel: &str, preferences: &[&str]) -> ApplicantSubmission {
    ApplicantSubmission {
        id: id.to_string(),
        score,
        channel: Some(channel.to_string()),
        preferences: preferences
            .iter()
            .map(|name| Some(name.to_string()))
            .collect(),
        privileged: false,
    }
}

pub(super) fn applicant(id: &str, score: f64, channel: &str, preferences: &[&str]) -> Applicant {
    Applicant::from_submission(submission(id, score, channel, preferences))
}

pub(super) fn privileged(id: &str, score: f64, channel: &str, preferences: &[&str]) -> Applicant {
    let mut submission = submission(id, score, channel, preferences);
    submission.privileged = true;
    Applicant::from_submission(submission)
}

pub(super) fn manual(capacities: &[(&str, i64)]) -> CapacityConfig {
    CapacityConfig::Manual {
        capacities: Some(
            capacities
                .iter()
                .map(|(name, seats)| (name.to_string(), *seats))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

pub(super) fn equal(total: i64) -> CapacityConfig {
    CapacityConfig::Equal { total: Some(total) }
}

pub(super) fn engine(capacity: CapacityConfig) -> AllocationEngine {
    AllocationEngine::new(QuotaTable::standard(), &capacity).expect("valid configuration")
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn router() -> axum::Router {
    allocation_router(Arc::new(AllocationService::default()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
