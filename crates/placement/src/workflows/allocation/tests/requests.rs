use serde_json::json;

use crate::workflows::allocation::domain::{
    AllocationRequest, Applicant, ApplicantSubmission, CapacityConfig, Channel,
};
use crate::workflows::allocation::router::RosterAllocationRequest;

#[test]
fn capacity_modes_accept_upper_case_tags() {
    let config: CapacityConfig =
        serde_json::from_value(json!({ "mode": "EQUAL", "total": 12 })).expect("equal mode");
    assert_eq!(config, CapacityConfig::Equal { total: Some(12) });

    let config: CapacityConfig = serde_json::from_value(json!({
        "mode": "MANUAL",
        "capacities": { "Medicine": 4 }
    }))
    .expect("manual mode");
    assert!(matches!(
        config,
        CapacityConfig::Manual { capacities: Some(ref capacities) } if capacities["Medicine"] == 4
    ));
}

#[test]
fn unknown_capacity_mode_falls_back() {
    let config: CapacityConfig =
        serde_json::from_value(json!({ "mode": "weird" })).expect("unknown mode");
    assert_eq!(config, CapacityConfig::Unspecified);

    let config: CapacityConfig =
        serde_json::from_value(json!({ "mode": "equal" })).expect("equal without total");
    assert_eq!(config, CapacityConfig::Equal { total: None });

    let config: CapacityConfig =
        serde_json::from_value(json!({ "mode": "manual" })).expect("manual without map");
    assert_eq!(config, CapacityConfig::Manual { capacities: None });
}

#[test]
fn submissions_coerce_loose_scores() {
    let submission: ApplicantSubmission = serde_json::from_value(json!({
        "id": "7",
        "score": " 88.5 ",
        "channel": "الموازي",
        "preferences": ["طب", null, "صيدلة"]
    }))
    .expect("submission parses");
    assert_eq!(submission.score, 88.5);

    let applicant = Applicant::from_submission(submission);
    assert_eq!(applicant.channel, Channel::Parallel);
    assert_eq!(applicant.ranked_preferences().collect::<Vec<_>>(), ["طب", "صيدلة"]);
    assert!(!applicant.privileged);

    for raw in [json!("n/a"), json!(null), json!(true), json!([1])] {
        let submission: ApplicantSubmission =
            serde_json::from_value(json!({ "id": "x", "score": raw })).expect("submission parses");
        assert_eq!(submission.score, 0.0);
    }

    let submission: ApplicantSubmission =
        serde_json::from_value(json!({ "id": "x" })).expect("score optional");
    assert_eq!(submission.score, 0.0);
    assert!(submission.preferences.is_empty());
}

#[test]
fn missing_channel_defaults_to_central() {
    let submission: ApplicantSubmission =
        serde_json::from_value(json!({ "id": "x", "score": 70 })).expect("submission parses");

    assert_eq!(Applicant::from_submission(submission).channel, Channel::Central);
}

#[test]
fn request_quotas_are_optional() {
    let request: AllocationRequest = serde_json::from_value(json!({
        "applicants": [],
        "capacity": { "mode": "manual", "capacities": {} }
    }))
    .expect("request parses");
    assert!(request.quotas.is_none());

    let request: RosterAllocationRequest = serde_json::from_value(json!({
        "roster_csv": "id,score\n",
        "quotas": { "مركزي": 50, "الموازي": 50 },
        "capacity": { "mode": "equal", "total": 4 }
    }))
    .expect("roster request parses");
    assert_eq!(request.quotas.map(|quotas| quotas.len()), Some(2));
}
