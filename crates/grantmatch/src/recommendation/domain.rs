use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantId(pub String);

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Immutable catalog record for a funding opportunity.
///
/// Produced by the ingestion pipeline and read-only to the engine. Nullable
/// fields mean "unspecified by the publisher", never "zero".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: GrantId,
    pub title: String,
    /// Funding organization name, matched exactly against agency preferences.
    pub agency: String,
    pub grant_type: Option<String>,
    pub activity_categories: Vec<String>,
    pub cost_sharing_required: bool,
    /// `None` means the opportunity places no constraint on clinical trials.
    pub clinical_trial_allowed: Option<bool>,
    pub funding_floor: Option<u64>,
    pub funding_ceiling: Option<u64>,
    pub application_deadline: Option<NaiveDate>,
    pub posted_date: Option<NaiveDate>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub eligibility_criteria: Option<String>,
    pub data_source: String,
}

impl Grant {
    /// Days from `today` until the application deadline, negative when overdue.
    pub fn days_until_deadline(&self, today: NaiveDate) -> Option<i64> {
        self.application_deadline
            .map(|deadline| (deadline - today).num_days())
    }

    /// Days since the opportunity was posted, `None` when the catalog lacks a date.
    pub fn days_since_posted(&self, today: NaiveDate) -> Option<i64> {
        self.posted_date.map(|posted| (today - posted).num_days())
    }
}

/// Hard constraint on cost-sharing terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSharingPreference {
    Required,
    NotRequired,
    #[default]
    Any,
}

/// Hard constraint on clinical-trial terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalTrialPreference {
    Allowed,
    NotAllowed,
    #[default]
    Any,
}

/// One-per-user preference record.
///
/// Presence or absence of each optional field is itself meaningful: the
/// dynamic weight calculator zeroes the weight of any criterion the user
/// never stated an opinion on, so none of these may be silently defaulted
/// to a non-neutral value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    pub funding_min: Option<u64>,
    pub funding_max: Option<u64>,
    pub deadline_from: Option<NaiveDate>,
    pub deadline_to: Option<NaiveDate>,
    /// Empty list means "don't care".
    pub preferred_agencies: Vec<String>,
    pub preferred_grant_types: Vec<String>,
    pub preferred_categories: Vec<String>,
    pub keywords: Vec<String>,
    pub project_period_min_years: Option<u8>,
    pub project_period_max_years: Option<u8>,
    #[serde(default)]
    pub cost_sharing: CostSharingPreference,
    #[serde(default)]
    pub clinical_trial: ClinicalTrialPreference,
    /// Allow-listed ingestion sources; empty means all sources qualify.
    pub allowed_sources: Vec<String>,
    pub project_description: Option<String>,
    /// Precomputed embedding of the project description.
    pub project_embedding: Option<Vec<f32>>,
}

impl UserPreferences {
    /// Whether the user stated a project focus at all. Governs the embedding
    /// criterion's weight; the embedding vector itself may still be missing,
    /// in which case scoring falls back to the degraded default.
    pub fn has_project_description(&self) -> bool {
        self.project_description
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    /// Embedding vector usable for a similarity lookup, if one exists.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.project_embedding
            .as_deref()
            .filter(|vector| !vector.is_empty())
    }
}

/// Action a user took on a grant. At most one per (user, grant) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    Saved,
    Applied,
    Ignored,
}

impl InteractionAction {
    /// Saved and applied grants feed the collaborative-filtering signal;
    /// ignored grants only contribute to the already-seen exclusion.
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Saved | Self::Applied)
    }
}

/// Record of a user action on a grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub grant_id: GrantId,
    pub action: InteractionAction,
    pub occurred_at: DateTime<Utc>,
}

/// The eight independent criterion scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub embedding: f64,
    pub funding: f64,
    pub deadline: f64,
    pub agency: f64,
    pub category: f64,
    pub project_period: f64,
    pub freshness: f64,
    pub interaction: f64,
}

/// A candidate grant with its score vector and match reasons.
///
/// Ephemeral: built per ranking request and discarded after the response.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredGrant {
    pub grant: Grant,
    pub scores: SubScores,
    pub recommendation_score: f64,
    pub match_reasons: Vec<String>,
}

/// One page of ranked results plus the pre-pagination qualifying count.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationPage {
    pub grants: Vec<ScoredGrant>,
    /// Count of all grants clearing the score threshold and overdue veto,
    /// before offset/limit, so callers can compute further pages.
    pub total: usize,
}

impl RecommendationPage {
    pub fn empty() -> Self {
        Self {
            grants: Vec::new(),
            total: 0,
        }
    }
}
