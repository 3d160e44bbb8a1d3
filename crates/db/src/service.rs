use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use launchdesk_core::domain::candidate::{Candidate, CandidateUpdate, SkuId};
use launchdesk_core::domain::result::ScoredCandidate;
use launchdesk_core::errors::{ApplicationError, DomainError};
use launchdesk_core::scoring::{DeterministicScoringEngine, ScoringEngine};

use crate::repositories::candidate::{
    delete_candidate, fetch_all_candidates, fetch_candidate, insert_candidate, replace_result,
    update_candidate,
};
use crate::repositories::config::load_snapshot_with;
use crate::repositories::{CandidateRepository, RepositoryError, SqlCandidateRepository};
use crate::DbPool;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum CandidateServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("SKU `{0}` already exists")]
    Duplicate(SkuId),
    #[error("SKU `{0}` not found")]
    NotFound(SkuId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CandidateServiceError> for ApplicationError {
    fn from(error: CandidateServiceError) -> Self {
        match error {
            CandidateServiceError::Invalid(error) => ApplicationError::Domain(error),
            CandidateServiceError::Duplicate(sku_id) => ApplicationError::Domain(
                DomainError::InvariantViolation(format!("SKU `{sku_id}` already exists")),
            ),
            CandidateServiceError::NotFound(sku_id) => {
                ApplicationError::NotFound(format!("SKU `{sku_id}`"))
            }
            CandidateServiceError::Repository(error) => error.into(),
        }
    }
}

/// Candidate administration. Every write recomputes the affected result in
/// the same transaction as the candidate row.
pub struct CandidateService {
    pool: DbPool,
    candidates: SqlCandidateRepository,
    engine: Arc<dyn ScoringEngine>,
}

impl CandidateService {
    pub fn new(pool: DbPool) -> Self {
        Self {
            candidates: SqlCandidateRepository::new(pool.clone()),
            pool,
            engine: Arc::new(DeterministicScoringEngine),
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn ScoringEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub async fn list(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<ScoredCandidate>, CandidateServiceError> {
        Ok(self.candidates.list(skip, limit).await?)
    }

    pub async fn get(&self, sku_id: &SkuId) -> Result<ScoredCandidate, CandidateServiceError> {
        self.candidates
            .find_by_id(sku_id)
            .await?
            .ok_or_else(|| CandidateServiceError::NotFound(sku_id.clone()))
    }

    pub async fn create(
        &self,
        candidate: Candidate,
    ) -> Result<ScoredCandidate, CandidateServiceError> {
        candidate.validate()?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        if fetch_candidate(&mut tx, &candidate.sku_id).await?.is_some() {
            return Err(CandidateServiceError::Duplicate(candidate.sku_id));
        }

        insert_candidate(&mut tx, &candidate, &now).await?;
        let snapshot = load_snapshot_with(&mut tx).await?;
        let result = self.engine.evaluate(&candidate, &snapshot);
        replace_result(&mut tx, &result, &now).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            event_name = "candidate.created",
            sku_id = %candidate.sku_id,
            evaluated = result.is_evaluated(),
            "candidate created"
        );
        Ok(ScoredCandidate { candidate, cache: Some(result) })
    }

    pub async fn update(
        &self,
        sku_id: &SkuId,
        update: CandidateUpdate,
    ) -> Result<ScoredCandidate, CandidateServiceError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let mut candidate = fetch_candidate(&mut tx, sku_id)
            .await?
            .ok_or_else(|| CandidateServiceError::NotFound(sku_id.clone()))?;

        update.apply(&mut candidate);
        candidate.validate()?;

        update_candidate(&mut tx, &candidate, &now).await?;
        let snapshot = load_snapshot_with(&mut tx).await?;
        let result = self.engine.evaluate(&candidate, &snapshot);
        replace_result(&mut tx, &result, &now).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            event_name = "candidate.updated",
            sku_id = %candidate.sku_id,
            evaluated = result.is_evaluated(),
            "candidate updated and rescored"
        );
        Ok(ScoredCandidate { candidate, cache: Some(result) })
    }

    pub async fn delete(&self, sku_id: &SkuId) -> Result<(), CandidateServiceError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        if !delete_candidate(&mut conn, sku_id).await? {
            return Err(CandidateServiceError::NotFound(sku_id.clone()));
        }

        info!(event_name = "candidate.deleted", sku_id = %sku_id, "candidate deleted");
        Ok(())
    }

    /// Recomputes every cached result against the current configuration.
    /// Returns the number of candidates rescored.
    pub async fn rescore_all(&self) -> Result<usize, CandidateServiceError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let candidates = fetch_all_candidates(&mut tx).await?;
        let snapshot = load_snapshot_with(&mut tx).await?;
        for result in self.engine.evaluate_all(&candidates, &snapshot) {
            replace_result(&mut tx, &result, &now).await?;
        }
        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            event_name = "candidate.rescored",
            candidates = candidates.len(),
            "cached results recomputed"
        );
        Ok(candidates.len())
    }
}

#[cfg(test)]
mod tests {
    use launchdesk_core::domain::candidate::{Candidate, CandidateUpdate, SkuId};
    use launchdesk_core::domain::result::Recommendation;
    use launchdesk_core::domain::settings::GlobalSetting;

    use super::{CandidateService, CandidateServiceError, DEFAULT_PAGE_LIMIT};
    use crate::repositories::{ConfigRepository, SqlConfigRepository};
    use crate::seeder::DefaultConfigSeeder;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DefaultConfigSeeder::seed(&pool).await.expect("seed");
        pool
    }

    fn approx(value: Option<f64>, expected: f64) -> bool {
        value.map(|value| (value - expected).abs() < 1e-9).unwrap_or(false)
    }

    fn strong_candidate(id: &str) -> Candidate {
        let mut candidate = Candidate::new(id, "Barrier Cream", "Skincare");
        candidate.target_market = Some("Nepal".to_string());
        candidate.primary_channel = Some("E-Com".to_string());
        candidate.regulatory_eligible = Some(true);
        candidate.supply_ready = Some(true);
        candidate.ip_risk_high = Some(false);
        candidate.local_list_price = Some(20.0);
        candidate.landed_cost = Some(5.0);
        candidate.market_fit.consumer_trend = Some(5);
        candidate.market_fit.point_of_diff = Some(5);
        candidate.market_fit.channel_suitability = Some(5);
        candidate.market_fit.strategic_role = Some(5);
        candidate.market_fit.marketing_leverage = Some(5);
        candidate.risk.regulatory_delay = Some(1);
        candidate.risk.retail_listing = Some(1);
        candidate.risk.competitive = Some(1);
        candidate.risk.supply_chain = Some(1);
        candidate.risk.price_war = Some(1);
        candidate
    }

    #[tokio::test]
    async fn create_stores_candidate_with_result() {
        let service = CandidateService::new(setup().await);

        let created = service.create(strong_candidate("SKU-1")).await.expect("create");
        let cache = created.cache.expect("result computed");
        assert!(approx(cache.gm_pct, 0.56));
        assert_eq!(cache.pass_gm_floor, Some(true));

        let fetched = service.get(&SkuId("SKU-1".to_string())).await.expect("get");
        assert_eq!(fetched.cache, Some(cache));
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_blank_ids() {
        let service = CandidateService::new(setup().await);
        service.create(strong_candidate("SKU-1")).await.expect("create");

        let duplicate = service.create(strong_candidate("SKU-1")).await;
        assert!(matches!(duplicate, Err(CandidateServiceError::Duplicate(_))));

        let blank = service.create(Candidate::new("  ", "Nameless", "Misc")).await;
        assert!(matches!(blank, Err(CandidateServiceError::Invalid(_))));
    }

    #[tokio::test]
    async fn update_recomputes_the_whole_result() {
        let service = CandidateService::new(setup().await);
        service.create(strong_candidate("SKU-1")).await.expect("create");

        let vetoed = service
            .update(
                &SkuId("SKU-1".to_string()),
                CandidateUpdate { ip_risk_high: Some(Some(true)), ..CandidateUpdate::default() },
            )
            .await
            .expect("update");
        let cache = vetoed.cache.expect("result");
        assert_eq!(cache.final_recommendation, Some(Recommendation::DoNotLaunch));
        assert_eq!(cache.select_for_wave_1, Some(false));

        let untargeted = service
            .update(
                &SkuId("SKU-1".to_string()),
                CandidateUpdate { target_market: Some(None), ..CandidateUpdate::default() },
            )
            .await
            .expect("update");
        let cache = untargeted.cache.expect("result");
        assert!(!cache.is_evaluated());
        assert_eq!(cache.gm_pct, None);

        let missing = service
            .update(&SkuId("SKU-404".to_string()), CandidateUpdate::default())
            .await;
        assert!(matches!(missing, Err(CandidateServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_candidate_and_reports_missing() {
        let service = CandidateService::new(setup().await);
        service.create(strong_candidate("SKU-1")).await.expect("create");

        service.delete(&SkuId("SKU-1".to_string())).await.expect("delete");
        assert!(service.list(0, DEFAULT_PAGE_LIMIT).await.expect("list").is_empty());

        let again = service.delete(&SkuId("SKU-1".to_string())).await;
        assert!(matches!(again, Err(CandidateServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn rescore_all_applies_configuration_edits() {
        let pool = setup().await;
        let service = CandidateService::new(pool.clone());
        service.create(strong_candidate("SKU-1")).await.expect("create");
        service.create(strong_candidate("SKU-2")).await.expect("create");

        SqlConfigRepository::new(pool)
            .upsert_settings(&[GlobalSetting {
                setting_key: "gm_floor_pct".to_string(),
                setting_value: 0.9,
            }])
            .await
            .expect("raise floor");

        assert_eq!(service.rescore_all().await.expect("rescore"), 2);
        for scored in service.list(0, DEFAULT_PAGE_LIMIT).await.expect("list") {
            let cache = scored.cache.expect("result");
            assert_eq!(cache.pass_gm_floor, Some(false));
            assert_eq!(cache.final_recommendation, Some(Recommendation::PhaseLater));
        }
    }
}
