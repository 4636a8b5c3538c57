//! Multi-criteria grant ranking.
//!
//! The engine composes three provider boundaries (preference store, grant
//! catalog, similarity lookup) with a fixed scoring model: a dynamic-weight
//! calculator that redistributes mass away from criteria the user never
//! specified, eight independent per-criterion scorers, a threshold/veto
//! ranker, and a match-reason generator for surfaced grants.

pub mod domain;
mod engine;
mod explain;
pub mod providers;
mod router;
mod scoring;
mod weights;

#[cfg(test)]
mod tests;

pub use domain::{
    ClinicalTrialPreference, CostSharingPreference, Grant, GrantId, Interaction,
    InteractionAction, RecommendationPage, ScoredGrant, SubScores, UserId, UserPreferences,
};
pub use engine::{RankRequest, RecommendError, RecommendationEngine};
pub use providers::{
    CandidateQuery, CatalogError, GrantCatalog, PreferenceStore, PreferenceStoreError,
    SimilarityError, SimilarityProvider,
};
pub use router::recommendation_router;
pub use scoring::DEGRADED_EMBEDDING_SCORE;
pub use weights::{CriterionWeights, PreferenceMask, BASE_WEIGHTS};
