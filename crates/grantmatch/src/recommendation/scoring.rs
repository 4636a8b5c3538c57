//! The eight per-criterion scoring functions.
//!
//! Every function here is pure and total: it has a defined [0, 1] output for
//! any (grant, preferences) combination, including all-fields-null grants.
//! Missing data maps to deliberate defaults rather than errors, so nothing in
//! the pipeline can fail once candidates are loaded.

use chrono::NaiveDate;

use super::domain::{Grant, SubScores, UserPreferences};
use super::weights::CriterionWeights;

/// Score assigned when no similarity value is available, either because the
/// provider failed or the user has no project description. Below neutral on
/// purpose: confidence is reduced, but the grant is not excluded.
pub const DEGRADED_EMBEDDING_SCORE: f64 = 0.4;

/// Score for grants carrying no funding information at all: ambiguous, not
/// disqualifying.
const UNKNOWN_FUNDING_SCORE: f64 = 0.4;

/// Grants without a deadline are risky to plan around; penalized, not vetoed.
const NO_DEADLINE_SCORE: f64 = 0.2;

/// Compute all eight sub-scores for one candidate.
///
/// `similarity` is the provider's cosine value for this grant when one was
/// obtained; `prior` holds the grants behind the user's saved/applied
/// interactions.
pub fn score_grant(
    grant: &Grant,
    preferences: &UserPreferences,
    similarity: Option<f64>,
    prior: &[Grant],
    today: NaiveDate,
) -> SubScores {
    SubScores {
        embedding: embedding_score(similarity),
        funding: funding_score(grant, preferences),
        deadline: deadline_score(grant.days_until_deadline(today)),
        agency: agency_score(grant, preferences),
        category: category_score(grant, preferences),
        project_period: project_period_score(),
        freshness: freshness_score(grant.days_since_posted(today)),
        interaction: interaction_score(grant, prior),
    }
}

/// Weighted aggregate of the sub-score vector, clamped to [0, 1].
pub fn aggregate(scores: &SubScores, weights: &CriterionWeights) -> f64 {
    let total = scores.embedding * weights.embedding
        + scores.funding * weights.funding
        + scores.deadline * weights.deadline
        + scores.agency * weights.agency
        + scores.category * weights.category
        + scores.project_period * weights.project_period
        + scores.freshness * weights.freshness
        + scores.interaction * weights.interaction;
    total.clamp(0.0, 1.0)
}

/// Clamp the cosine similarity into [0, 1] and boost strong matches: values
/// above 0.8 are scaled by 1.1 (capped at 1.0) to separate them from the
/// merely-similar band.
pub fn embedding_score(similarity: Option<f64>) -> f64 {
    let Some(similarity) = similarity else {
        return DEGRADED_EMBEDDING_SCORE;
    };

    let clamped = similarity.clamp(0.0, 1.0);
    if clamped > 0.8 {
        (clamped * 1.1).min(1.0)
    } else {
        clamped
    }
}

/// Compare the grant's funding range against the preferred window.
///
/// Absent bounds widen to 0 / +inf on both sides. Full containment of the
/// grant in the window scores 1.0; a grant entirely below or above the window
/// scores proportionally to how close it comes; partial overlap scores the
/// covered fraction of the preferred window plus a small bonus for grants
/// whose own range is wide enough to flex. A window with no upper bound has
/// no coverage fraction to speak of: any grant reaching past the minimum can
/// satisfy it and scores full credit.
pub fn funding_score(grant: &Grant, preferences: &UserPreferences) -> f64 {
    if preferences.funding_min.is_none() && preferences.funding_max.is_none() {
        return 1.0;
    }
    if grant.funding_floor.is_none() && grant.funding_ceiling.is_none() {
        return UNKNOWN_FUNDING_SCORE;
    }

    let grant_min = grant.funding_floor.map_or(0.0, |value| value as f64);
    let grant_max = grant
        .funding_ceiling
        .map_or(f64::INFINITY, |value| value as f64);
    let pref_min = preferences.funding_min.map_or(0.0, |value| value as f64);
    let pref_max = preferences
        .funding_max
        .map_or(f64::INFINITY, |value| value as f64);

    if grant_min >= pref_min && grant_max <= pref_max {
        return 1.0;
    }
    if grant_max < pref_min {
        // pref_min > 0 here since grant_max >= 0
        return (0.7 * grant_max / pref_min).clamp(0.0, 1.0);
    }
    if grant_min > pref_max {
        // pref_max finite and grant_min > 0 here
        return (0.5 * pref_max / grant_min).clamp(0.0, 1.0);
    }

    let preferred_span = pref_max - pref_min;
    if !preferred_span.is_finite() {
        // Open-ended window: the grant straddles the minimum, so it can
        // award an amount the user would accept.
        return 1.0;
    }

    let overlap = grant_max.min(pref_max) - grant_min.max(pref_min);
    let (covered, bonus) = if preferred_span > 0.0 {
        let grant_span = grant_max - grant_min;
        (
            overlap / preferred_span,
            (0.1 * grant_span / preferred_span).min(0.1),
        )
    } else {
        (0.0, 0.0)
    };

    (covered + bonus).clamp(0.0, 1.0)
}

/// Piecewise preparation-time curve over days until the deadline.
///
/// Overdue is a hard 0 (the ranker vetoes it outright); no deadline at all is
/// a flat penalty. Otherwise the curve rises through the too-tight band,
/// peaks at 60 days, and decays as uncertainty grows.
pub fn deadline_score(days_until: Option<i64>) -> f64 {
    let Some(days) = days_until else {
        return NO_DEADLINE_SCORE;
    };
    if days < 0 {
        return 0.0;
    }

    let d = days as f64;
    match days {
        0..=13 => 0.3 * d / 14.0,
        14..=29 => 0.3 + 0.4 * (d - 14.0) / 16.0,
        30..=59 => 0.7 + 0.3 * (d - 30.0) / 30.0,
        60..=90 => 1.0 - 0.1 * (d - 60.0) / 30.0,
        91..=180 => 0.9 - 0.3 * (d - 90.0) / 90.0,
        _ => {
            let months_out = d / 30.0;
            (0.6 - 0.05 * (months_out - 6.0)).max(0.3)
        }
    }
}

/// Binary organization match: no partial credit for near-miss agency names.
pub fn agency_score(grant: &Grant, preferences: &UserPreferences) -> f64 {
    if preferences.preferred_agencies.is_empty() {
        return 1.0;
    }
    if preferences
        .preferred_agencies
        .iter()
        .any(|agency| agency == &grant.agency)
    {
        1.0
    } else {
        0.0
    }
}

/// Average match ratio across up to three independent checks: grant-type
/// membership, activity-category overlap, and keyword presence in the
/// combined free text. Checks the user never configured do not participate;
/// with none configured the score is a neutral 0.5 (distinct from the 1.0
/// "don't care" of the binary criteria, since category could still
/// differentiate).
pub fn category_score(grant: &Grant, preferences: &UserPreferences) -> f64 {
    let mut checks: Vec<f64> = Vec::with_capacity(3);

    if !preferences.preferred_grant_types.is_empty() {
        let matched = grant.grant_type.as_deref().is_some_and(|grant_type| {
            preferences
                .preferred_grant_types
                .iter()
                .any(|preferred| preferred.eq_ignore_ascii_case(grant_type))
        });
        checks.push(if matched { 1.0 } else { 0.0 });
    }

    if !preferences.preferred_categories.is_empty() {
        let matched = grant.activity_categories.iter().any(|category| {
            preferences
                .preferred_categories
                .iter()
                .any(|preferred| preferred.eq_ignore_ascii_case(category))
        });
        checks.push(if matched { 1.0 } else { 0.0 });
    }

    if !preferences.keywords.is_empty() {
        let haystack = combined_text(grant);
        let matched = preferences
            .keywords
            .iter()
            .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
            .count();
        checks.push(matched as f64 / preferences.keywords.len() as f64);
    }

    if checks.is_empty() {
        0.5
    } else {
        checks.iter().sum::<f64>() / checks.len() as f64
    }
}

/// The catalog does not carry project-period data today; the criterion is a
/// deliberate no-op kept for forward compatibility. Do not infer real logic.
pub fn project_period_score() -> f64 {
    1.0
}

/// Recency of the posting: full credit inside a week, linear decay to 30
/// days, a low plateau to 90, nothing after that. Undated postings score 0.
pub fn freshness_score(days_since_posted: Option<i64>) -> f64 {
    let Some(days) = days_since_posted else {
        return 0.0;
    };

    if days <= 7 {
        1.0
    } else if days < 30 {
        1.0 - (days as f64 - 7.0) / 23.0
    } else if days <= 90 {
        0.3
    } else {
        0.0
    }
}

/// Weak collaborative-filtering signal: how much the candidate resembles the
/// grants this user previously saved or applied to, on agency and grant
/// type. No history yields a neutral 0.5.
pub fn interaction_score(grant: &Grant, prior: &[Grant]) -> f64 {
    if prior.is_empty() {
        return 0.5;
    }

    let total: f64 = prior
        .iter()
        .map(|previous| {
            let agency = if previous.agency == grant.agency {
                0.5
            } else {
                0.0
            };
            let grant_type = match (&previous.grant_type, &grant.grant_type) {
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => 0.5,
                _ => 0.0,
            };
            agency + grant_type
        })
        .sum();

    (total / prior.len() as f64).min(1.0)
}

fn combined_text(grant: &Grant) -> String {
    let mut haystack = grant.title.to_lowercase();
    for field in [grant.summary.as_deref(), grant.description.as_deref()] {
        if let Some(text) = field {
            haystack.push(' ');
            haystack.push_str(&text.to_lowercase());
        }
    }
    haystack
}
