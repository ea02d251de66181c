use std::collections::BTreeMap;

use super::common::*;
use crate::workflows::allocation::domain::{AllocationError, AllocationSettings, Channel};
use crate::workflows::allocation::engine::AllocationEngine;
use crate::workflows::allocation::ledger::{SlotLedger, MINIMUM_SCORE_SENTINEL};
use crate::workflows::allocation::privilege::OverrideResolver;
use crate::workflows::allocation::quota::QuotaTable;

fn ledger_with_minimum(destination: &str, minimum: f64) -> SlotLedger {
    let capacities = BTreeMap::from([(destination.to_string(), 5)]);
    let mut ledger = SlotLedger::new(QuotaTable::standard(), &capacities);
    ledger.occupy(destination, Channel::Central, minimum);
    ledger
}

#[test]
fn privileged_applicant_within_margin_is_admitted_over_capacity() {
    let pool = vec![
        applicant("a", 90.0, "central", &["Med"]),
        applicant("b", 72.0, "central", &["Med"]),
        privileged("p", 70.0, "central", &["Med"]),
    ];

    let outcome = engine(manual(&[("Med", 2)]))
        .allocate(&pool)
        .expect("allocation succeeds");

    assert_eq!(outcome.destination_of("p"), Some("Med"));
    assert_eq!(outcome.seats_used("Med"), 3);
    assert_eq!(outcome.overrides.len(), 1);
    let admission = &outcome.overrides[0];
    assert_eq!(admission.applicant.0, "p");
    assert_eq!(admission.previous, None);
    assert_eq!(admission.destination, "Med");
    assert_eq!(admission.minimum_score, 72.0);

    let med = &outcome.summary.destinations[0];
    assert_eq!(med.overflow, 1);
    assert_eq!(med.vacancies, 0);
    assert_eq!(outcome.summary.overridden, 1);
    assert_eq!(outcome.summary.assigned, 3);
}

#[test]
fn override_can_replace_a_higher_ranked_seat() {
    let pool = vec![
        applicant("c1", 90.0, "central", &["X"]),
        applicant("c2", 62.0, "central", &["Y"]),
        privileged("q", 60.0, "parallel", &["X", "Y"]),
    ];

    let outcome = engine(manual(&[("X", 3), ("Y", 3)]))
        .allocate(&pool)
        .expect("allocation succeeds");

    assert_eq!(outcome.destination_of("q"), Some("Y"));
    assert_eq!(outcome.overrides[0].previous.as_deref(), Some("X"));
    assert_eq!(outcome.overrides[0].minimum_score, 62.0);
    assert_eq!(outcome.seats_used("X"), 1);
    assert_eq!(outcome.seats_used("Y"), 2);
}

#[test]
fn unprivileged_applicants_keep_their_seat() {
    let pool = vec![
        applicant("c1", 90.0, "central", &["X"]),
        applicant("c2", 62.0, "central", &["Y"]),
        applicant("q", 60.0, "parallel", &["X", "Y"]),
    ];

    let outcome = engine(manual(&[("X", 3), ("Y", 3)]))
        .allocate(&pool)
        .expect("allocation succeeds");

    assert_eq!(outcome.destination_of("q"), Some("X"));
    assert!(outcome.overrides.is_empty());
}

#[test]
fn override_to_the_current_seat_is_not_recorded() {
    let pool = vec![
        applicant("a", 90.0, "central", &["Med"]),
        privileged("p", 80.0, "central", &["Med"]),
    ];

    let outcome = engine(manual(&[("Med", 3)]))
        .allocate(&pool)
        .expect("allocation succeeds");

    assert_eq!(outcome.destination_of("p"), Some("Med"));
    assert!(outcome.overrides.is_empty());
    assert_eq!(outcome.seats_used("Med"), 2);
}

#[test]
fn margin_boundary_is_inclusive() {
    let ledger = ledger_with_minimum("A", 72.0);
    let resolver = OverrideResolver::default();

    let inside = privileged("p", 67.0, "central", &["A"]);
    assert_eq!(
        resolver.eligible_destination(&inside, &ledger),
        Some(("A", 72.0))
    );

    let outside = privileged("q", 66.99, "central", &["A"]);
    assert_eq!(resolver.eligible_destination(&outside, &ledger), None);

    let unprivileged = applicant("r", 80.0, "central", &["A"]);
    assert_eq!(resolver.eligible_destination(&unprivileged, &ledger), None);
}

#[test]
fn destinations_without_default_admissions_use_the_sentinel_minimum() {
    let capacities = BTreeMap::from([("A".to_string(), 5)]);
    let mut ledger = SlotLedger::new(QuotaTable::standard(), &capacities);
    ledger.occupy("A", Channel::Parallel, 40.0);
    let resolver = OverrideResolver::default();

    let within = privileged("p", 95.0, "central", &["A"]);
    assert_eq!(
        resolver.eligible_destination(&within, &ledger),
        Some(("A", MINIMUM_SCORE_SENTINEL))
    );

    let below = privileged("q", 94.9, "central", &["A"]);
    assert_eq!(resolver.eligible_destination(&below, &ledger), None);

    let unplanned = privileged("r", 99.0, "central", &["Z"]);
    assert_eq!(resolver.eligible_destination(&unplanned, &ledger), None);
}

#[test]
fn privileged_applicant_reaches_destination_seated_only_through_reserved_channels() {
    let pool = vec![
        applicant("p", 99.0, "الموازي", &["X"]),
        privileged("f", 95.5, "الموازي", &["X"]),
    ];

    let outcome = engine(manual(&[("X", 1)]))
        .allocate(&pool)
        .expect("allocation succeeds");

    assert_eq!(outcome.destination_of("p"), Some("X"));
    assert_eq!(outcome.destination_of("f"), Some("X"));
    assert_eq!(outcome.overrides.len(), 1);
    assert_eq!(outcome.overrides[0].minimum_score, MINIMUM_SCORE_SENTINEL);
    assert_eq!(outcome.summary.destinations[0].overflow, 1);
}

#[test]
fn first_eligible_preference_wins() {
    let capacities = BTreeMap::from([("A".to_string(), 5), ("B".to_string(), 5)]);
    let mut ledger = SlotLedger::new(QuotaTable::standard(), &capacities);
    ledger.occupy("A", Channel::Central, 95.0);
    ledger.occupy("B", Channel::Central, 70.0);

    let candidate = privileged("p", 68.0, "central", &["A", "B"]);
    assert_eq!(
        OverrideResolver::default().eligible_destination(&candidate, &ledger),
        Some(("B", 70.0))
    );
}

#[test]
fn zero_margin_requires_matching_the_minimum() {
    let ledger = ledger_with_minimum("A", 72.0);
    let resolver = OverrideResolver::new(0.0).expect("valid margin");

    let below = privileged("p", 71.9, "central", &["A"]);
    let equal_score = privileged("q", 72.0, "central", &["A"]);
    assert_eq!(resolver.eligible_destination(&below, &ledger), None);
    assert_eq!(
        resolver.eligible_destination(&equal_score, &ledger),
        Some(("A", 72.0))
    );
}

#[test]
fn engine_uses_the_configured_margin() {
    let settings = AllocationSettings {
        override_margin: 0.0,
        ..AllocationSettings::default()
    };
    let engine = AllocationEngine::with_settings(&settings, &manual(&[("Med", 2)]))
        .expect("valid configuration");
    let pool = vec![
        applicant("a", 90.0, "central", &["Med"]),
        applicant("b", 72.0, "central", &["Med"]),
        privileged("p", 70.0, "central", &["Med"]),
    ];

    let outcome = engine.allocate(&pool).expect("allocation succeeds");

    assert_eq!(outcome.destination_of("p"), None);
    assert!(outcome.overrides.is_empty());
}

#[test]
fn invalid_margins_are_rejected() {
    assert_eq!(
        OverrideResolver::new(-1.0),
        Err(AllocationError::InvalidOverrideMargin(-1.0))
    );
    assert!(OverrideResolver::new(f64::NAN).is_err());
    assert_eq!(OverrideResolver::new(2.5).map(|r| r.margin()), Ok(2.5));
}
