//! Match-reason generation for surfaced grants.
//!
//! A pure function of the sub-score vector and the preference mask: each
//! criterion contributes a short human-readable reason when its score clears
//! a threshold, falling back to one aggregate-tier summary when nothing
//! qualifies. Only grants that survive ranking ever reach this module.

use super::domain::{Grant, SubScores};
use super::weights::PreferenceMask;

/// Derive the ordered reason list for one surfaced grant.
///
/// Criteria the user never configured score a neutral 1.0, so their reasons
/// are gated on the mask as well as the threshold: a "preferred funder"
/// reason must never appear for a user without agency preferences.
/// `days_until_deadline` comes from the ranking pass so the deadline reason
/// can report an exact count instead of recomputing dates here.
pub fn match_reasons(
    scores: &SubScores,
    aggregate: f64,
    grant: &Grant,
    days_until_deadline: Option<i64>,
    mask: &PreferenceMask,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if scores.embedding > 0.9 {
        reasons.push("Exceptionally close match to your project description".to_string());
    } else if scores.embedding > 0.8 {
        reasons.push("Highly relevant to your project description".to_string());
    } else if scores.embedding > 0.7 {
        reasons.push("Strongly related to your research area".to_string());
    } else if scores.embedding > 0.6 {
        reasons.push("Related to your research area".to_string());
    }

    if scores.deadline >= 0.9 {
        if let Some(days) = days_until_deadline {
            reasons.push(format!(
                "Deadline in {days} days, inside the ideal preparation window"
            ));
        }
    }

    if mask.funding {
        if scores.funding >= 0.95 {
            reasons.push("Funding range fits your budget exactly".to_string());
        } else if scores.funding >= 0.8 {
            reasons.push("Funding range fits your budget well".to_string());
        } else if scores.funding >= 0.6 {
            reasons.push("Funding range overlaps your budget".to_string());
        }
    }

    if scores.category >= 0.8 {
        reasons.push("Matches your preferred grant categories".to_string());
    } else if scores.category >= 0.6 {
        reasons.push("Partially matches your preferred categories".to_string());
    }

    if mask.agency && scores.agency == 1.0 {
        reasons.push(format!(
            "Offered by {}, one of your preferred funders",
            grant.agency
        ));
    }

    if scores.freshness == 1.0 {
        reasons.push("Recently posted opportunity".to_string());
    }

    if reasons.is_empty() {
        reasons.push(summary_reason(aggregate));
    }

    if grant
        .eligibility_criteria
        .as_deref()
        .is_some_and(|text| !text.trim().is_empty())
    {
        reasons.push("Review the eligibility criteria before applying".to_string());
    }

    reasons
}

fn summary_reason(aggregate: f64) -> String {
    if aggregate >= 0.7 {
        "Good overall fit with your preferences".to_string()
    } else if aggregate >= 0.5 {
        "Moderate fit with your preferences".to_string()
    } else {
        "Meets your minimum matching criteria".to_string()
    }
}
