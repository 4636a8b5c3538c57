use super::domain::UserPreferences;

/// Base criterion weights, applied before redistribution. Sum to 1.0.
pub const BASE_WEIGHTS: CriterionWeights = CriterionWeights {
    embedding: 0.35,
    deadline: 0.25,
    funding: 0.20,
    category: 0.10,
    agency: 0.05,
    freshness: 0.03,
    project_period: 0.01,
    interaction: 0.01,
};

/// Which optional scoring criteria the user actually expressed an opinion on.
///
/// Computed once per request and threaded through the scorer, so "is it set"
/// checks live in exactly one place. Category, freshness, and interaction
/// need no user input and have no mask bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceMask {
    pub embedding: bool,
    pub funding: bool,
    pub deadline: bool,
    pub agency: bool,
    pub project_period: bool,
}

impl PreferenceMask {
    pub fn from_preferences(preferences: &UserPreferences) -> Self {
        Self {
            embedding: preferences.has_project_description(),
            funding: preferences.funding_min.is_some() || preferences.funding_max.is_some(),
            deadline: preferences.deadline_from.is_some() || preferences.deadline_to.is_some(),
            agency: !preferences.preferred_agencies.is_empty(),
            project_period: preferences.project_period_min_years.is_some()
                || preferences.project_period_max_years.is_some(),
        }
    }
}

/// Per-criterion weight vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriterionWeights {
    pub embedding: f64,
    pub funding: f64,
    pub deadline: f64,
    pub agency: f64,
    pub category: f64,
    pub project_period: f64,
    pub freshness: f64,
    pub interaction: f64,
}

impl CriterionWeights {
    /// Redistribute the base weights against the preference mask.
    ///
    /// Every criterion the user never specified drops to exactly 0, so its
    /// underlying field value cannot move the ranking. The removed mass `U`
    /// is re-injected proportionally over the remaining `1 - U`, scaling the
    /// surviving weights (including the three always-on minor criteria) by
    /// `1 / (1 - U)` so the vector still sums to 1.0.
    pub fn for_mask(mask: &PreferenceMask) -> Self {
        let base = BASE_WEIGHTS;

        let mut unused = 0.0;
        if !mask.embedding {
            unused += base.embedding;
        }
        if !mask.funding {
            unused += base.funding;
        }
        if !mask.deadline {
            unused += base.deadline;
        }
        if !mask.agency {
            unused += base.agency;
        }
        if !mask.project_period {
            unused += base.project_period;
        }

        let factor = 1.0 / (1.0 - unused);
        let keep = |used: bool, weight: f64| if used { weight * factor } else { 0.0 };

        Self {
            embedding: keep(mask.embedding, base.embedding),
            funding: keep(mask.funding, base.funding),
            deadline: keep(mask.deadline, base.deadline),
            agency: keep(mask.agency, base.agency),
            project_period: keep(mask.project_period, base.project_period),
            category: base.category * factor,
            freshness: base.freshness * factor,
            interaction: base.interaction * factor,
        }
    }

    pub fn sum(&self) -> f64 {
        self.embedding
            + self.funding
            + self.deadline
            + self.agency
            + self.category
            + self.project_period
            + self.freshness
            + self.interaction
    }
}
