use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Args;

use crate::infra::{
    parse_date, seed_sample_data, InMemoryEmbeddingIndex, InMemoryGrantCatalog,
    InMemoryPreferenceStore, DEMO_USER,
};
use grantmatch::config::EngineConfig;
use grantmatch::error::AppError;
use grantmatch::recommendation::{RankRequest, RecommendationEngine, UserId};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for deadlines and freshness (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Number of recommendations to print.
    #[arg(long, default_value_t = 10)]
    pub(crate) limit: usize,
    /// Minimum aggregate score a grant needs to surface.
    #[arg(long, default_value_t = 0.3)]
    pub(crate) min_score: f64,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        limit,
        min_score,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let store = Arc::new(InMemoryPreferenceStore::default());
    let catalog = Arc::new(InMemoryGrantCatalog::default());
    let index = Arc::new(InMemoryEmbeddingIndex::default());
    seed_sample_data(&store, &catalog, &index, today);

    let config = EngineConfig::default();
    let engine = RecommendationEngine::new(store, catalog, index, config.clone());

    let mut request = RankRequest::new(UserId(DEMO_USER.to_string()), &config);
    request.limit = limit.clamp(1, config.max_page_size);
    request.min_score = min_score.clamp(0.0, 1.0);
    request.today = Some(today);

    let page = engine.rank(&request)?;

    println!("Grant recommendations for {DEMO_USER} (as of {today})");
    println!(
        "{} of {} qualifying grants shown\n",
        page.grants.len(),
        page.total
    );

    for (rank, scored) in page.grants.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} - {}",
            rank + 1,
            scored.recommendation_score,
            scored.grant.title,
            scored.grant.agency
        );
        println!(
            "   embedding {:.2} | funding {:.2} | deadline {:.2} | agency {:.2} | category {:.2} | freshness {:.2} | interaction {:.2}",
            scored.scores.embedding,
            scored.scores.funding,
            scored.scores.deadline,
            scored.scores.agency,
            scored.scores.category,
            scored.scores.freshness,
            scored.scores.interaction,
        );
        for reason in &scored.match_reasons {
            println!("   - {reason}");
        }
    }

    if page.grants.is_empty() {
        println!("No grants cleared the {:.2} score floor.", request.min_score);
    }

    Ok(())
}
