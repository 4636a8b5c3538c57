use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;

use grantmatch::recommendation::{
    CandidateQuery, CatalogError, ClinicalTrialPreference, CostSharingPreference, Grant,
    GrantCatalog, GrantId, Interaction, InteractionAction, PreferenceStore, PreferenceStoreError,
    SimilarityError, SimilarityProvider, UserId, UserPreferences,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Preference and interaction records held in process memory.
#[derive(Default)]
pub(crate) struct InMemoryPreferenceStore {
    preferences: Mutex<HashMap<UserId, UserPreferences>>,
    interactions: Mutex<Vec<Interaction>>,
}

impl InMemoryPreferenceStore {
    pub(crate) fn upsert(&self, user: UserId, preferences: UserPreferences) {
        let mut guard = self.preferences.lock().expect("preference mutex poisoned");
        guard.insert(user, preferences);
    }

    pub(crate) fn record_interaction(&self, interaction: Interaction) {
        let mut guard = self.interactions.lock().expect("interaction mutex poisoned");
        guard.retain(|existing| {
            existing.user_id != interaction.user_id || existing.grant_id != interaction.grant_id
        });
        guard.push(interaction);
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn load_preferences(&self, user: &UserId) -> Result<UserPreferences, PreferenceStoreError> {
        let guard = self.preferences.lock().expect("preference mutex poisoned");
        guard.get(user).cloned().ok_or(PreferenceStoreError::NotFound)
    }

    fn load_interactions(&self, user: &UserId) -> Result<Vec<Interaction>, PreferenceStoreError> {
        let guard = self.interactions.lock().expect("interaction mutex poisoned");
        Ok(guard
            .iter()
            .filter(|interaction| &interaction.user_id == user)
            .cloned()
            .collect())
    }
}

/// Grant catalog held in process memory. The hard eligibility gates live in
/// [`CandidateQuery::admits`], shared with every other catalog implementation.
#[derive(Default)]
pub(crate) struct InMemoryGrantCatalog {
    grants: Mutex<Vec<Grant>>,
}

impl InMemoryGrantCatalog {
    pub(crate) fn insert(&self, grant: Grant) {
        let mut guard = self.grants.lock().expect("catalog mutex poisoned");
        guard.retain(|existing| existing.id != grant.id);
        guard.push(grant);
    }
}

impl GrantCatalog for InMemoryGrantCatalog {
    fn fetch_candidates(
        &self,
        _user: &UserId,
        query: &CandidateQuery,
    ) -> Result<Vec<Grant>, CatalogError> {
        let guard = self.grants.lock().expect("catalog mutex poisoned");
        Ok(guard
            .iter()
            .filter(|grant| query.admits(grant))
            .cloned()
            .collect())
    }

    fn fetch_by_ids(&self, ids: &[GrantId]) -> Result<Vec<Grant>, CatalogError> {
        let guard = self.grants.lock().expect("catalog mutex poisoned");
        Ok(guard
            .iter()
            .filter(|grant| ids.contains(&grant.id))
            .cloned()
            .collect())
    }
}

/// Cosine-similarity index over precomputed grant embeddings.
#[derive(Default)]
pub(crate) struct InMemoryEmbeddingIndex {
    vectors: Mutex<HashMap<GrantId, Vec<f32>>>,
}

impl InMemoryEmbeddingIndex {
    pub(crate) fn insert(&self, id: GrantId, vector: Vec<f32>) {
        let mut guard = self.vectors.lock().expect("embedding mutex poisoned");
        guard.insert(id, vector);
    }
}

impl SimilarityProvider for InMemoryEmbeddingIndex {
    fn similarity(
        &self,
        embedding: &[f32],
        ids: &[GrantId],
    ) -> Result<HashMap<GrantId, f64>, SimilarityError> {
        let guard = self.vectors.lock().expect("embedding mutex poisoned");
        Ok(ids
            .iter()
            .filter_map(|id| {
                guard
                    .get(id)
                    .map(|vector| (id.clone(), cosine(embedding, vector)))
            })
            .collect())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

pub(crate) const DEMO_USER: &str = "demo-researcher";

/// Seed the stores with a small reviewable catalog and one researcher
/// profile so the HTTP surface and the demo command work out of the box.
pub(crate) fn seed_sample_data(
    store: &InMemoryPreferenceStore,
    catalog: &InMemoryGrantCatalog,
    index: &InMemoryEmbeddingIndex,
    today: NaiveDate,
) {
    let user = UserId(DEMO_USER.to_string());

    store.upsert(
        user.clone(),
        UserPreferences {
            funding_min: Some(75_000),
            funding_max: Some(300_000),
            deadline_from: Some(today),
            deadline_to: Some(today + Duration::days(120)),
            preferred_agencies: vec!["National Science Foundation".to_string()],
            preferred_grant_types: vec!["research".to_string()],
            preferred_categories: vec!["artificial intelligence".to_string()],
            keywords: vec!["robotics".to_string(), "autonomy".to_string()],
            cost_sharing: CostSharingPreference::NotRequired,
            clinical_trial: ClinicalTrialPreference::Any,
            project_description: Some(
                "Autonomous robotic systems for precision agriculture".to_string(),
            ),
            project_embedding: Some(vec![0.8, 0.1, 0.5, 0.2]),
            ..UserPreferences::default()
        },
    );

    let grants = [
        (
            "nsf-robotics-24",
            "Foundational Research in Robotics",
            "National Science Foundation",
            Some("research"),
            vec!["artificial intelligence", "robotics"],
            (Some(100_000), Some(500_000)),
            55,
            4,
            vec![0.82, 0.12, 0.47, 0.18],
        ),
        (
            "usda-agtech-24",
            "Agricultural Technology Innovation",
            "Department of Agriculture",
            Some("research"),
            vec!["agriculture", "engineering"],
            (Some(50_000), Some(200_000)),
            80,
            12,
            vec![0.55, 0.30, 0.60, 0.25],
        ),
        (
            "doe-storage-24",
            "Grid-Scale Energy Storage",
            "Department of Energy",
            Some("infrastructure"),
            vec!["energy"],
            (Some(500_000), Some(2_000_000)),
            150,
            40,
            vec![0.05, 0.90, 0.10, 0.70],
        ),
        (
            "nih-trials-24",
            "Clinical Decision Support Tools",
            "National Institutes of Health",
            Some("research"),
            vec!["health informatics"],
            (Some(80_000), Some(250_000)),
            40,
            2,
            vec![0.30, 0.25, 0.40, 0.55],
        ),
        (
            "nsf-expired-24",
            "Cyber-Physical Systems (closed)",
            "National Science Foundation",
            Some("research"),
            vec!["robotics"],
            (Some(90_000), Some(400_000)),
            -10,
            120,
            vec![0.80, 0.15, 0.50, 0.20],
        ),
    ];

    for (id, title, agency, grant_type, categories, (floor, ceiling), deadline_in, posted_ago, vector) in
        grants
    {
        let grant_id = GrantId(id.to_string());
        catalog.insert(Grant {
            id: grant_id.clone(),
            title: title.to_string(),
            agency: agency.to_string(),
            grant_type: grant_type.map(str::to_string),
            activity_categories: categories.into_iter().map(str::to_string).collect(),
            cost_sharing_required: false,
            clinical_trial_allowed: None,
            funding_floor: floor,
            funding_ceiling: ceiling,
            application_deadline: Some(today + Duration::days(deadline_in)),
            posted_date: Some(today - Duration::days(posted_ago)),
            summary: Some(format!("{title}: open funding opportunity.")),
            description: None,
            eligibility_criteria: Some("See the program solicitation for eligibility.".to_string()),
            data_source: "grants.gov".to_string(),
        });
        index.insert(grant_id, vector);
    }

    // A previously saved grant: excluded from results, feeds the
    // collaborative-filtering signal.
    store.record_interaction(Interaction {
        user_id: user,
        grant_id: GrantId("nsf-robotics-23".to_string()),
        action: InteractionAction::Saved,
        occurred_at: Utc
            .with_ymd_and_hms(2026, 5, 10, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now),
    });
    catalog.insert(Grant {
        id: GrantId("nsf-robotics-23".to_string()),
        title: "Foundational Research in Robotics (prior year)".to_string(),
        agency: "National Science Foundation".to_string(),
        grant_type: Some("research".to_string()),
        activity_categories: vec!["robotics".to_string()],
        cost_sharing_required: false,
        clinical_trial_allowed: None,
        funding_floor: Some(100_000),
        funding_ceiling: Some(500_000),
        application_deadline: Some(today - Duration::days(300)),
        posted_date: Some(today - Duration::days(400)),
        summary: None,
        description: None,
        eligibility_criteria: None,
        data_source: "grants.gov".to_string(),
    });
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
