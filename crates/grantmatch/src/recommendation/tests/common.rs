use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use crate::config::EngineConfig;
use crate::recommendation::domain::{
    Grant, GrantId, Interaction, InteractionAction, UserId, UserPreferences,
};
use crate::recommendation::engine::{RankRequest, RecommendationEngine};
use crate::recommendation::providers::{
    CandidateQuery, CatalogError, GrantCatalog, PreferenceStore, PreferenceStoreError,
    SimilarityError, SimilarityProvider,
};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date")
}

pub(super) fn user() -> UserId {
    UserId("researcher-1".to_string())
}

/// Catalog grant with unremarkable defaults; tests overwrite what they probe.
pub(super) fn grant(id: &str) -> Grant {
    Grant {
        id: GrantId(id.to_string()),
        title: format!("Opportunity {id}"),
        agency: "National Science Foundation".to_string(),
        grant_type: Some("research".to_string()),
        activity_categories: vec!["engineering".to_string()],
        cost_sharing_required: false,
        clinical_trial_allowed: None,
        funding_floor: Some(50_000),
        funding_ceiling: Some(250_000),
        application_deadline: Some(today() + Duration::days(45)),
        posted_date: Some(today() - Duration::days(3)),
        summary: Some("Support for early-stage research projects.".to_string()),
        description: None,
        eligibility_criteria: None,
        data_source: "grants.gov".to_string(),
    }
}

/// Preferences with nothing specified; the all-neutral baseline.
pub(super) fn blank_preferences() -> UserPreferences {
    UserPreferences::default()
}

/// Only the deadline-range criterion is active, so scores track deadlines.
pub(super) fn deadline_window_preferences() -> UserPreferences {
    UserPreferences {
        deadline_from: Some(today()),
        deadline_to: Some(today() + Duration::days(90)),
        ..UserPreferences::default()
    }
}

pub(super) fn described_preferences() -> UserPreferences {
    UserPreferences {
        project_description: Some("Machine learning for materials discovery".to_string()),
        project_embedding: Some(vec![0.1, 0.2, 0.3]),
        ..UserPreferences::default()
    }
}

pub(super) fn saved_interaction(grant_id: &str) -> Interaction {
    Interaction {
        user_id: user(),
        grant_id: GrantId(grant_id.to_string()),
        action: InteractionAction::Saved,
        occurred_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).single().expect("valid"),
    }
}

#[derive(Default)]
pub(super) struct StaticPreferenceStore {
    pub(super) preferences: HashMap<UserId, UserPreferences>,
    pub(super) interactions: Vec<Interaction>,
}

impl StaticPreferenceStore {
    pub(super) fn with_user(preferences: UserPreferences) -> Self {
        let mut store = Self::default();
        store.preferences.insert(user(), preferences);
        store
    }
}

impl PreferenceStore for StaticPreferenceStore {
    fn load_preferences(&self, user: &UserId) -> Result<UserPreferences, PreferenceStoreError> {
        self.preferences
            .get(user)
            .cloned()
            .ok_or(PreferenceStoreError::NotFound)
    }

    fn load_interactions(&self, user: &UserId) -> Result<Vec<Interaction>, PreferenceStoreError> {
        Ok(self
            .interactions
            .iter()
            .filter(|interaction| &interaction.user_id == user)
            .cloned()
            .collect())
    }
}

pub(super) struct StaticCatalog {
    pub(super) grants: Vec<Grant>,
}

impl GrantCatalog for StaticCatalog {
    fn fetch_candidates(
        &self,
        _user: &UserId,
        query: &CandidateQuery,
    ) -> Result<Vec<Grant>, CatalogError> {
        Ok(self
            .grants
            .iter()
            .filter(|grant| query.admits(grant))
            .cloned()
            .collect())
    }

    fn fetch_by_ids(&self, ids: &[GrantId]) -> Result<Vec<Grant>, CatalogError> {
        Ok(self
            .grants
            .iter()
            .filter(|grant| ids.contains(&grant.id))
            .cloned()
            .collect())
    }
}

/// Similarity provider returning a fixed per-grant map.
#[derive(Default)]
pub(super) struct FixedSimilarity {
    pub(super) values: HashMap<GrantId, f64>,
}

impl SimilarityProvider for FixedSimilarity {
    fn similarity(
        &self,
        _embedding: &[f32],
        ids: &[GrantId],
    ) -> Result<HashMap<GrantId, f64>, SimilarityError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.values.get(id).map(|value| (id.clone(), *value)))
            .collect())
    }
}

/// Similarity provider that is always down, for degraded-mode coverage.
pub(super) struct FailingSimilarity;

impl SimilarityProvider for FailingSimilarity {
    fn similarity(
        &self,
        _embedding: &[f32],
        _ids: &[GrantId],
    ) -> Result<HashMap<GrantId, f64>, SimilarityError> {
        Err(SimilarityError::Unavailable("backend offline".to_string()))
    }
}

pub(super) fn engine<S: SimilarityProvider + 'static>(
    store: StaticPreferenceStore,
    grants: Vec<Grant>,
    similarity: S,
) -> RecommendationEngine<StaticPreferenceStore, StaticCatalog, S> {
    RecommendationEngine::new(
        Arc::new(store),
        Arc::new(StaticCatalog { grants }),
        Arc::new(similarity),
        EngineConfig::default(),
    )
}

pub(super) fn request() -> RankRequest {
    let mut request = RankRequest::new(user(), &EngineConfig::default());
    request.today = Some(today());
    request
}
