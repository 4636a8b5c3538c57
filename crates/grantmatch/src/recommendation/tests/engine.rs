use std::collections::HashMap;

use chrono::Duration;

use super::common::*;
use crate::recommendation::domain::{GrantId, UserPreferences};
use crate::recommendation::engine::RecommendError;
use crate::recommendation::scoring::DEGRADED_EMBEDDING_SCORE;

#[test]
fn missing_preferences_fail_the_request() {
    let engine = engine(
        StaticPreferenceStore::default(),
        vec![grant("a")],
        FixedSimilarity::default(),
    );

    let err = engine.rank(&request()).expect_err("no preference record");
    assert!(matches!(err, RecommendError::PreferencesNotFound(_)));
}

#[test]
fn malformed_requests_are_rejected_before_scoring() {
    let engine = engine(
        StaticPreferenceStore::with_user(blank_preferences()),
        vec![grant("a")],
        FixedSimilarity::default(),
    );

    let mut zero_limit = request();
    zero_limit.limit = 0;
    assert!(matches!(
        engine.rank(&zero_limit),
        Err(RecommendError::InvalidRequest(_))
    ));

    let mut oversized = request();
    oversized.limit = 1_000;
    assert!(matches!(
        engine.rank(&oversized),
        Err(RecommendError::InvalidRequest(_))
    ));

    let mut bad_score = request();
    bad_score.min_score = 1.5;
    assert!(matches!(
        engine.rank(&bad_score),
        Err(RecommendError::InvalidRequest(_))
    ));

    let mut blank_user = request();
    blank_user.user_id = crate::recommendation::domain::UserId("  ".to_string());
    assert!(matches!(
        engine.rank(&blank_user),
        Err(RecommendError::InvalidRequest(_))
    ));
}

#[test]
fn empty_candidate_set_is_not_an_error() {
    let engine = engine(
        StaticPreferenceStore::with_user(blank_preferences()),
        Vec::new(),
        FixedSimilarity::default(),
    );

    let page = engine.rank(&request()).expect("empty page");
    assert!(page.grants.is_empty());
    assert_eq!(page.total, 0);
}

#[test]
fn overdue_grants_never_surface_even_without_the_prefilter() {
    let mut overdue = grant("overdue");
    overdue.application_deadline = Some(today() - Duration::days(1));
    // Make everything else about it perfect.
    overdue.posted_date = Some(today());

    let engine = engine(
        StaticPreferenceStore::with_user(blank_preferences()),
        vec![overdue, grant("live")],
        FixedSimilarity::default(),
    );

    let mut req = request();
    req.exclude_overdue = false;

    let page = engine.rank(&req).expect("page");
    assert_eq!(page.total, 1);
    assert_eq!(page.grants[0].grant.id, GrantId("live".to_string()));
}

#[test]
fn interacted_grants_are_subtracted_from_candidates() {
    let mut store = StaticPreferenceStore::with_user(blank_preferences());
    store.interactions.push(saved_interaction("seen"));

    let engine = engine(
        store,
        vec![grant("seen"), grant("new")],
        FixedSimilarity::default(),
    );

    let page = engine.rank(&request()).expect("page");
    assert_eq!(page.total, 1);
    assert_eq!(page.grants[0].grant.id, GrantId("new".to_string()));
}

#[test]
fn results_sort_descending_with_grant_id_tiebreak() {
    let mut far = grant("far");
    far.application_deadline = Some(today() + Duration::days(300));
    let twin_a = grant("twin-a");
    let twin_b = grant("twin-b");

    let engine = engine(
        StaticPreferenceStore::with_user(deadline_window_preferences()),
        vec![far, twin_b, twin_a],
        FixedSimilarity::default(),
    );

    let mut req = request();
    req.min_score = 0.0;
    let page = engine.rank(&req).expect("page");

    let ids: Vec<&str> = page
        .grants
        .iter()
        .map(|scored| scored.grant.id.0.as_str())
        .collect();
    assert_eq!(ids, vec!["twin-a", "twin-b", "far"]);
    assert!(
        page.grants[0].recommendation_score >= page.grants[2].recommendation_score,
        "sort order broken"
    );
}

#[test]
fn pagination_happens_after_filtering_and_is_stable() {
    let grants: Vec<_> = (0..25)
        .map(|index| {
            let mut grant = grant(&format!("grant-{index:02}"));
            // Spread deadlines so scores differ.
            grant.application_deadline = Some(today() + Duration::days(20 + 5 * index));
            grant
        })
        .collect();

    let engine = engine(
        StaticPreferenceStore::with_user(deadline_window_preferences()),
        grants,
        FixedSimilarity::default(),
    );

    let mut first = request();
    first.limit = 10;
    let mut second = request();
    second.limit = 10;
    second.offset = 10;
    let mut combined = request();
    combined.limit = 20;

    let page_one = engine.rank(&first).expect("page one");
    let page_two = engine.rank(&second).expect("page two");
    let both = engine.rank(&combined).expect("combined");

    assert_eq!(page_one.total, page_two.total);
    assert_eq!(page_one.total, both.total);

    let ids = |page: &crate::recommendation::domain::RecommendationPage| {
        page.grants
            .iter()
            .map(|scored| scored.grant.id.clone())
            .collect::<Vec<_>>()
    };
    let mut concatenated = ids(&page_one);
    concatenated.extend(ids(&page_two));
    assert_eq!(concatenated, ids(&both));

    for id in ids(&page_one) {
        assert!(!ids(&page_two).contains(&id), "pages overlap on {}", id.0);
    }
}

#[test]
fn min_score_threshold_drops_weak_matches() {
    let strong = grant("strong");
    let mut weak = grant("weak");
    weak.agency = "Unrelated Bureau".to_string();
    weak.grant_type = Some("infrastructure".to_string());
    weak.activity_categories = vec!["construction".to_string()];
    weak.application_deadline = Some(today() + Duration::days(3));
    weak.posted_date = Some(today() - Duration::days(200));

    let preferences = UserPreferences {
        preferred_agencies: vec!["National Science Foundation".to_string()],
        preferred_grant_types: vec!["research".to_string()],
        ..UserPreferences::default()
    };

    let engine = engine(
        StaticPreferenceStore::with_user(preferences),
        vec![strong, weak],
        FixedSimilarity::default(),
    );

    let page = engine.rank(&request()).expect("page");
    assert_eq!(page.total, 1);
    assert_eq!(page.grants[0].grant.id, GrantId("strong".to_string()));
}

#[test]
fn similarity_failure_degrades_instead_of_failing() {
    let engine = engine(
        StaticPreferenceStore::with_user(described_preferences()),
        vec![grant("a")],
        FailingSimilarity,
    );

    let page = engine.rank(&request()).expect("degraded page");
    assert_eq!(page.total, 1);
    assert_eq!(page.grants[0].scores.embedding, DEGRADED_EMBEDDING_SCORE);
}

#[test]
fn similarity_values_flow_into_the_embedding_score() {
    let mut values = HashMap::new();
    values.insert(GrantId("close".to_string()), 0.9);
    values.insert(GrantId("far".to_string()), 0.2);

    let engine = engine(
        StaticPreferenceStore::with_user(described_preferences()),
        vec![grant("close"), grant("far")],
        FixedSimilarity { values },
    );

    let mut req = request();
    req.min_score = 0.0;
    let page = engine.rank(&req).expect("page");

    assert_eq!(page.grants[0].grant.id, GrantId("close".to_string()));
    assert!((page.grants[0].scores.embedding - 0.99).abs() < 1e-9);
    assert!((page.grants[1].scores.embedding - 0.2).abs() < 1e-9);
    assert!(page.grants[0].recommendation_score > page.grants[1].recommendation_score);
}

#[test]
fn unset_criterion_values_cannot_move_the_ranking() {
    // No deadline preference: two grants differing only in (non-overdue)
    // deadline must score identically, since the criterion's weight is zero
    // and only the overdue veto may react to the date.
    let mut soon = grant("soon");
    soon.application_deadline = Some(today() + Duration::days(20));
    let mut late = grant("late");
    late.application_deadline = Some(today() + Duration::days(200));

    let engine = engine(
        StaticPreferenceStore::with_user(blank_preferences()),
        vec![soon, late],
        FixedSimilarity::default(),
    );

    let mut req = request();
    req.min_score = 0.0;
    let page = engine.rank(&req).expect("page");
    assert_eq!(page.total, 2);
    assert!(
        (page.grants[0].recommendation_score - page.grants[1].recommendation_score).abs() < 1e-12
    );
}

#[test]
fn saved_history_feeds_the_interaction_signal() {
    let mut store = StaticPreferenceStore::with_user(blank_preferences());
    store.interactions.push(saved_interaction("kin"));

    let mut kin = grant("kin");
    kin.application_deadline = Some(today() - Duration::days(10));

    let alike = grant("alike");
    let mut stranger = grant("stranger");
    stranger.agency = "Bureau of Reclamation".to_string();
    stranger.grant_type = Some("infrastructure".to_string());

    let engine = engine(store, vec![kin, alike, stranger], FixedSimilarity::default());

    let mut req = request();
    req.min_score = 0.0;
    req.exclude_overdue = false;
    let page = engine.rank(&req).expect("page");

    let find = |id: &str| {
        page.grants
            .iter()
            .find(|scored| scored.grant.id.0 == id)
            .expect("scored grant present")
    };
    assert!((find("alike").scores.interaction - 1.0).abs() < 1e-9);
    assert!((find("stranger").scores.interaction - 0.0).abs() < 1e-9);
}
