use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::config::EngineConfig;

use super::domain::{GrantId, RecommendationPage, ScoredGrant, UserId};
use super::explain;
use super::providers::{
    CandidateQuery, CatalogError, GrantCatalog, PreferenceStore, PreferenceStoreError,
    SimilarityProvider,
};
use super::scoring;
use super::weights::{CriterionWeights, PreferenceMask};

/// Parameters for one ranking request.
#[derive(Debug, Clone)]
pub struct RankRequest {
    pub user_id: UserId,
    pub limit: usize,
    pub offset: usize,
    /// Drop grants with a deadline strictly in the past (default true).
    pub exclude_overdue: bool,
    /// Aggregate-score floor below which grants are not surfaced.
    pub min_score: f64,
    /// Reference date override for deterministic demos and tests; defaults
    /// to the local date at execution time.
    pub today: Option<NaiveDate>,
}

impl RankRequest {
    pub fn new(user_id: UserId, config: &EngineConfig) -> Self {
        Self {
            user_id,
            limit: config.default_page_size,
            offset: 0,
            exclude_overdue: true,
            min_score: config.default_min_score,
            today: None,
        }
    }
}

/// Error raised by the ranking facade.
///
/// A similarity-provider failure is deliberately absent: it degrades the
/// embedding criterion instead of failing the request.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("preferences not found for user '{0}'")]
    PreferencesNotFound(String),
    #[error("invalid ranking request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Preferences(PreferenceStoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Stateless ranking facade composing the preference store, grant catalog,
/// and similarity provider. Holds no per-request state, so one instance can
/// serve any number of concurrent requests.
pub struct RecommendationEngine<P, C, S> {
    preferences: Arc<P>,
    catalog: Arc<C>,
    similarity: Arc<S>,
    config: EngineConfig,
}

struct RankedCandidate {
    grant: super::domain::Grant,
    scores: super::domain::SubScores,
    recommendation_score: f64,
    days_until_deadline: Option<i64>,
}

impl<P, C, S> RecommendationEngine<P, C, S>
where
    P: PreferenceStore + 'static,
    C: GrantCatalog + 'static,
    S: SimilarityProvider + 'static,
{
    pub fn new(
        preferences: Arc<P>,
        catalog: Arc<C>,
        similarity: Arc<S>,
        config: EngineConfig,
    ) -> Self {
        Self {
            preferences,
            catalog,
            similarity,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produce one page of ranked recommendations for a user.
    ///
    /// Guarantees: results are sorted by descending recommendation score with
    /// an ascending grant-id tiebreak; every surfaced grant clears the score
    /// floor and the overdue veto; `total` counts all qualifying grants
    /// before pagination.
    pub fn rank(&self, request: &RankRequest) -> Result<RecommendationPage, RecommendError> {
        self.validate(request)?;

        let preferences = match self.preferences.load_preferences(&request.user_id) {
            Ok(preferences) => preferences,
            Err(PreferenceStoreError::NotFound) => {
                return Err(RecommendError::PreferencesNotFound(
                    request.user_id.0.clone(),
                ))
            }
            Err(err) => return Err(RecommendError::Preferences(err)),
        };
        let interactions = self
            .preferences
            .load_interactions(&request.user_id)
            .map_err(RecommendError::Preferences)?;

        let today = request.today.unwrap_or_else(|| Local::now().date_naive());
        let query = CandidateQuery::from_preferences(
            &preferences,
            &interactions,
            request.exclude_overdue,
            today,
        );
        let candidates = self.catalog.fetch_candidates(&request.user_id, &query)?;
        if candidates.is_empty() {
            debug!(user = %request.user_id.0, "no eligible candidates");
            return Ok(RecommendationPage::empty());
        }

        let mask = PreferenceMask::from_preferences(&preferences);
        let weights = CriterionWeights::for_mask(&mask);

        let candidate_ids: Vec<GrantId> = candidates.iter().map(|grant| grant.id.clone()).collect();
        let similarities = self.load_similarities(&preferences, &candidate_ids);

        let positive_ids: Vec<GrantId> = interactions
            .iter()
            .filter(|interaction| interaction.action.is_positive())
            .map(|interaction| interaction.grant_id.clone())
            .collect();
        let prior = if positive_ids.is_empty() {
            Vec::new()
        } else {
            self.catalog.fetch_by_ids(&positive_ids)?
        };

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter_map(|grant| {
                let similarity = similarities
                    .as_ref()
                    .and_then(|map| map.get(&grant.id).copied());
                let scores = scoring::score_grant(&grant, &preferences, similarity, &prior, today);
                let recommendation_score = scoring::aggregate(&scores, &weights);

                // Overdue veto is independent of the candidate pre-filter.
                if recommendation_score < request.min_score || scores.deadline <= 0.0 {
                    return None;
                }

                Some(RankedCandidate {
                    days_until_deadline: grant.days_until_deadline(today),
                    grant,
                    scores,
                    recommendation_score,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.recommendation_score
                .total_cmp(&a.recommendation_score)
                .then_with(|| a.grant.id.cmp(&b.grant.id))
        });

        let total = ranked.len();
        debug!(
            user = %request.user_id.0,
            total,
            offset = request.offset,
            limit = request.limit,
            "ranked candidate set"
        );

        // Reasons are generated for the surfaced page only.
        let grants = ranked
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .map(|candidate| {
                let match_reasons = explain::match_reasons(
                    &candidate.scores,
                    candidate.recommendation_score,
                    &candidate.grant,
                    candidate.days_until_deadline,
                    &mask,
                );
                ScoredGrant {
                    grant: candidate.grant,
                    scores: candidate.scores,
                    recommendation_score: candidate.recommendation_score,
                    match_reasons,
                }
            })
            .collect();

        Ok(RecommendationPage { grants, total })
    }

    fn validate(&self, request: &RankRequest) -> Result<(), RecommendError> {
        if request.user_id.0.trim().is_empty() {
            return Err(RecommendError::InvalidRequest(
                "user id must not be empty".to_string(),
            ));
        }
        if request.limit == 0 {
            return Err(RecommendError::InvalidRequest(
                "limit must be at least 1".to_string(),
            ));
        }
        if request.limit > self.config.max_page_size {
            return Err(RecommendError::InvalidRequest(format!(
                "limit {} exceeds maximum page size {}",
                request.limit, self.config.max_page_size
            )));
        }
        if !(0.0..=1.0).contains(&request.min_score) {
            return Err(RecommendError::InvalidRequest(
                "min_score must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Batch similarity lookup, degrading to `None` when the user has no
    /// embedding or the provider fails. Absence flows through to the
    /// embedding sub-score's degraded default instead of failing the request.
    fn load_similarities(
        &self,
        preferences: &super::domain::UserPreferences,
        candidate_ids: &[GrantId],
    ) -> Option<HashMap<GrantId, f64>> {
        let embedding = preferences.embedding()?;
        match self.similarity.similarity(embedding, candidate_ids) {
            Ok(map) => Some(map),
            Err(err) => {
                warn!(error = %err, "similarity provider unavailable, ranking in degraded mode");
                None
            }
        }
    }
}
