use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use super::domain::{
    ClinicalTrialPreference, CostSharingPreference, Grant, GrantId, Interaction, UserId,
    UserPreferences,
};

/// Hard eligibility gates handed to the candidate supplier.
///
/// These are binary filters, never weighted criteria: a grant failing any of
/// them is ineligible and must not reach the scorer at all. Built once per
/// request from the loaded preferences so suppliers stay free of preference
/// lookups of their own.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub today: NaiveDate,
    /// Drop grants whose deadline is strictly before `today`. Grants without
    /// a deadline always pass this gate.
    pub exclude_overdue: bool,
    /// Grants the user has ever interacted with; never re-recommended.
    pub exclude: HashSet<GrantId>,
    pub cost_sharing: CostSharingPreference,
    pub clinical_trial: ClinicalTrialPreference,
    /// Empty list admits every ingestion source.
    pub allowed_sources: Vec<String>,
}

impl CandidateQuery {
    pub fn from_preferences(
        preferences: &UserPreferences,
        interactions: &[Interaction],
        exclude_overdue: bool,
        today: NaiveDate,
    ) -> Self {
        Self {
            today,
            exclude_overdue,
            exclude: interactions
                .iter()
                .map(|interaction| interaction.grant_id.clone())
                .collect(),
            cost_sharing: preferences.cost_sharing,
            clinical_trial: preferences.clinical_trial,
            allowed_sources: preferences.allowed_sources.clone(),
        }
    }

    /// Whether `grant` clears every hard gate. In-memory suppliers delegate
    /// here so all implementations agree on the eligibility semantics.
    pub fn admits(&self, grant: &Grant) -> bool {
        if self.exclude.contains(&grant.id) {
            return false;
        }

        if self.exclude_overdue {
            if let Some(deadline) = grant.application_deadline {
                if deadline < self.today {
                    return false;
                }
            }
        }

        match self.cost_sharing {
            CostSharingPreference::Required if !grant.cost_sharing_required => return false,
            CostSharingPreference::NotRequired if grant.cost_sharing_required => return false,
            _ => {}
        }

        match self.clinical_trial {
            ClinicalTrialPreference::Allowed if grant.clinical_trial_allowed == Some(false) => {
                return false
            }
            ClinicalTrialPreference::NotAllowed if grant.clinical_trial_allowed == Some(true) => {
                return false
            }
            _ => {}
        }

        if !self.allowed_sources.is_empty()
            && !self
                .allowed_sources
                .iter()
                .any(|source| source == &grant.data_source)
        {
            return false;
        }

        true
    }
}

/// Access to per-user preference and interaction records.
pub trait PreferenceStore: Send + Sync {
    fn load_preferences(&self, user: &UserId) -> Result<UserPreferences, PreferenceStoreError>;
    fn load_interactions(&self, user: &UserId) -> Result<Vec<Interaction>, PreferenceStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PreferenceStoreError {
    #[error("no preference record for user")]
    NotFound,
    #[error("preference store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the grant catalog populated by the ingestion pipeline.
pub trait GrantCatalog: Send + Sync {
    /// Candidates surviving the hard eligibility gates in `query`.
    fn fetch_candidates(
        &self,
        user: &UserId,
        query: &CandidateQuery,
    ) -> Result<Vec<Grant>, CatalogError>;

    /// Resolve grants by id; unknown ids are skipped, not errors. Used to
    /// recover the grants behind the user's saved/applied interactions.
    fn fetch_by_ids(&self, ids: &[GrantId]) -> Result<Vec<Grant>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("grant catalog unavailable: {0}")]
    Unavailable(String),
}

/// Batch cosine-similarity lookup against precomputed grant embeddings.
///
/// The engine tolerates failure here: a ranking request proceeds in degraded
/// mode rather than surfacing the error.
pub trait SimilarityProvider: Send + Sync {
    fn similarity(
        &self,
        embedding: &[f32],
        ids: &[GrantId],
    ) -> Result<HashMap<GrantId, f64>, SimilarityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SimilarityError {
    #[error("similarity backend unavailable: {0}")]
    Unavailable(String),
}
