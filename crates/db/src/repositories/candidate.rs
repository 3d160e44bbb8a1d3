use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;

use launchdesk_core::domain::candidate::{
    Candidate, MarketFitScores, RiskScores, SkuId, SynergyScores,
};
use launchdesk_core::domain::result::{CalculationResult, Recommendation, ScoredCandidate};

use super::{column, CandidateRepository, RepositoryError};
use crate::DbPool;

const CANDIDATE_COLUMNS: &str = "sku_id, sku_name, brand, category, target_market, primary_channel,
    ramp_month, regulatory_eligible, regulatory_prohibition, ip_risk_high, supply_ready,
    moq, lead_time_days, shelf_life_months, local_list_price, landed_cost,
    score_consumer_trend, score_point_of_diff, score_channel_suitability, score_strategic_role,
    score_marketing_leverage, score_price_ladder, score_usage_occasion, score_channel_diff,
    score_story_cohesion, score_operational_synergy, score_regulatory_delay,
    score_retail_listing, score_competitive, score_supply_chain, score_price_war,
    pass_portfolio_balance, suggested_launch_wave";

const RESULT_VALUE_COLUMNS: &str = "gm_dollar_per_unit, gm_pct, monthly_revenue,
    monthly_gm_dollar, weighted_score_layer_b, synergy_score_layer_c, risk_score_layer_d,
    risk_factor, channel_weighted_score, pass_regulatory, pass_supply_ready, pass_gm_floor,
    final_recommendation, select_for_wave_1, adj_units_base, adj_units_best, adj_units_worst,
    monthly_gm_base, monthly_gm_best, monthly_gm_worst, rank_base, rank_best, rank_worst";

pub struct SqlCandidateRepository {
    pool: DbPool,
}

impl SqlCandidateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_candidate(row: &SqliteRow) -> Result<Candidate, RepositoryError> {
    Ok(Candidate {
        sku_id: SkuId(column(row, "sku_id")?),
        sku_name: column(row, "sku_name")?,
        brand: column(row, "brand")?,
        category: column(row, "category")?,
        target_market: column(row, "target_market")?,
        primary_channel: column(row, "primary_channel")?,
        ramp_month: column(row, "ramp_month")?,
        regulatory_eligible: column(row, "regulatory_eligible")?,
        regulatory_prohibition: column(row, "regulatory_prohibition")?,
        ip_risk_high: column(row, "ip_risk_high")?,
        supply_ready: column(row, "supply_ready")?,
        moq: column(row, "moq")?,
        lead_time_days: column(row, "lead_time_days")?,
        shelf_life_months: column(row, "shelf_life_months")?,
        local_list_price: column(row, "local_list_price")?,
        landed_cost: column(row, "landed_cost")?,
        market_fit: MarketFitScores {
            consumer_trend: column(row, "score_consumer_trend")?,
            point_of_diff: column(row, "score_point_of_diff")?,
            channel_suitability: column(row, "score_channel_suitability")?,
            strategic_role: column(row, "score_strategic_role")?,
            marketing_leverage: column(row, "score_marketing_leverage")?,
        },
        synergy: SynergyScores {
            price_ladder: column(row, "score_price_ladder")?,
            usage_occasion: column(row, "score_usage_occasion")?,
            channel_diff: column(row, "score_channel_diff")?,
            story_cohesion: column(row, "score_story_cohesion")?,
            operational_synergy: column(row, "score_operational_synergy")?,
        },
        risk: RiskScores {
            regulatory_delay: column(row, "score_regulatory_delay")?,
            retail_listing: column(row, "score_retail_listing")?,
            competitive: column(row, "score_competitive")?,
            supply_chain: column(row, "score_supply_chain")?,
            price_war: column(row, "score_price_war")?,
        },
        pass_portfolio_balance: column(row, "pass_portfolio_balance")?,
        suggested_launch_wave: column(row, "suggested_launch_wave")?,
    })
}

fn row_to_result(row: &SqliteRow) -> Result<CalculationResult, RepositoryError> {
    let recommendation: Option<String> = column(row, "final_recommendation")?;
    let final_recommendation = match recommendation {
        Some(value) => Some(Recommendation::parse(&value).ok_or_else(|| {
            RepositoryError::Decode(format!("unknown recommendation `{value}`"))
        })?),
        None => None,
    };

    Ok(CalculationResult {
        sku_id: SkuId(column(row, "sku_id")?),
        gm_dollar_per_unit: column(row, "gm_dollar_per_unit")?,
        gm_pct: column(row, "gm_pct")?,
        monthly_revenue: column(row, "monthly_revenue")?,
        monthly_gm_dollar: column(row, "monthly_gm_dollar")?,
        weighted_score_layer_b: column(row, "weighted_score_layer_b")?,
        synergy_score_layer_c: column(row, "synergy_score_layer_c")?,
        risk_score_layer_d: column(row, "risk_score_layer_d")?,
        risk_factor: column(row, "risk_factor")?,
        channel_weighted_score: column(row, "channel_weighted_score")?,
        pass_regulatory: column(row, "pass_regulatory")?,
        pass_supply_ready: column(row, "pass_supply_ready")?,
        pass_gm_floor: column(row, "pass_gm_floor")?,
        final_recommendation,
        select_for_wave_1: column(row, "select_for_wave_1")?,
        adj_units_base: column(row, "adj_units_base")?,
        adj_units_best: column(row, "adj_units_best")?,
        adj_units_worst: column(row, "adj_units_worst")?,
        monthly_gm_base: column(row, "monthly_gm_base")?,
        monthly_gm_best: column(row, "monthly_gm_best")?,
        monthly_gm_worst: column(row, "monthly_gm_worst")?,
        rank_base: column(row, "rank_base")?,
        rank_best: column(row, "rank_best")?,
        rank_worst: column(row, "rank_worst")?,
    })
}

/// Decodes one row of [`scored_select`]. The cache is absent when the join
/// found no result row.
fn row_to_scored(row: &SqliteRow) -> Result<ScoredCandidate, RepositoryError> {
    let candidate = row_to_candidate(row)?;
    let cached_sku_id: Option<String> = column(row, "cached_sku_id")?;
    let cache = match cached_sku_id {
        Some(_) => Some(row_to_result(row)?),
        None => None,
    };
    Ok(ScoredCandidate { candidate, cache })
}

/// Candidates joined with their cached results, read in a single statement.
fn scored_select(filter: &str) -> String {
    format!(
        "SELECT r.{CANDIDATE_COLUMNS}, c.sku_id AS cached_sku_id, {RESULT_VALUE_COLUMNS}
         FROM sku_records r
         LEFT JOIN sku_calculation_cache c ON c.sku_id = r.sku_id
         {filter}"
    )
}

/// Inserts a new candidate. Fails on a duplicate `sku_id`.
pub async fn insert_candidate(
    conn: &mut SqliteConnection,
    candidate: &Candidate,
    now: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(&format!(
        "INSERT INTO sku_records ({CANDIDATE_COLUMNS}, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                 ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(candidate.sku_id.as_str())
    .bind(&candidate.sku_name)
    .bind(&candidate.brand)
    .bind(&candidate.category)
    .bind(&candidate.target_market)
    .bind(&candidate.primary_channel)
    .bind(candidate.ramp_month)
    .bind(candidate.regulatory_eligible)
    .bind(candidate.regulatory_prohibition)
    .bind(candidate.ip_risk_high)
    .bind(candidate.supply_ready)
    .bind(candidate.moq)
    .bind(candidate.lead_time_days)
    .bind(candidate.shelf_life_months)
    .bind(candidate.local_list_price)
    .bind(candidate.landed_cost)
    .bind(candidate.market_fit.consumer_trend)
    .bind(candidate.market_fit.point_of_diff)
    .bind(candidate.market_fit.channel_suitability)
    .bind(candidate.market_fit.strategic_role)
    .bind(candidate.market_fit.marketing_leverage)
    .bind(candidate.synergy.price_ladder)
    .bind(candidate.synergy.usage_occasion)
    .bind(candidate.synergy.channel_diff)
    .bind(candidate.synergy.story_cohesion)
    .bind(candidate.synergy.operational_synergy)
    .bind(candidate.risk.regulatory_delay)
    .bind(candidate.risk.retail_listing)
    .bind(candidate.risk.competitive)
    .bind(candidate.risk.supply_chain)
    .bind(candidate.risk.price_war)
    .bind(candidate.pass_portfolio_balance)
    .bind(&candidate.suggested_launch_wave)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Overwrites every column of an existing candidate. Returns false when no
/// row matched.
pub async fn update_candidate(
    conn: &mut SqliteConnection,
    candidate: &Candidate,
    now: &str,
) -> Result<bool, RepositoryError> {
    let outcome = sqlx::query(
        "UPDATE sku_records SET
            sku_name = ?, brand = ?, category = ?, target_market = ?, primary_channel = ?,
            ramp_month = ?, regulatory_eligible = ?, regulatory_prohibition = ?,
            ip_risk_high = ?, supply_ready = ?, moq = ?, lead_time_days = ?,
            shelf_life_months = ?, local_list_price = ?, landed_cost = ?,
            score_consumer_trend = ?, score_point_of_diff = ?, score_channel_suitability = ?,
            score_strategic_role = ?, score_marketing_leverage = ?, score_price_ladder = ?,
            score_usage_occasion = ?, score_channel_diff = ?, score_story_cohesion = ?,
            score_operational_synergy = ?, score_regulatory_delay = ?,
            score_retail_listing = ?, score_competitive = ?, score_supply_chain = ?,
            score_price_war = ?, pass_portfolio_balance = ?, suggested_launch_wave = ?,
            updated_at = ?
         WHERE sku_id = ?",
    )
    .bind(&candidate.sku_name)
    .bind(&candidate.brand)
    .bind(&candidate.category)
    .bind(&candidate.target_market)
    .bind(&candidate.primary_channel)
    .bind(candidate.ramp_month)
    .bind(candidate.regulatory_eligible)
    .bind(candidate.regulatory_prohibition)
    .bind(candidate.ip_risk_high)
    .bind(candidate.supply_ready)
    .bind(candidate.moq)
    .bind(candidate.lead_time_days)
    .bind(candidate.shelf_life_months)
    .bind(candidate.local_list_price)
    .bind(candidate.landed_cost)
    .bind(candidate.market_fit.consumer_trend)
    .bind(candidate.market_fit.point_of_diff)
    .bind(candidate.market_fit.channel_suitability)
    .bind(candidate.market_fit.strategic_role)
    .bind(candidate.market_fit.marketing_leverage)
    .bind(candidate.synergy.price_ladder)
    .bind(candidate.synergy.usage_occasion)
    .bind(candidate.synergy.channel_diff)
    .bind(candidate.synergy.story_cohesion)
    .bind(candidate.synergy.operational_synergy)
    .bind(candidate.risk.regulatory_delay)
    .bind(candidate.risk.retail_listing)
    .bind(candidate.risk.competitive)
    .bind(candidate.risk.supply_chain)
    .bind(candidate.risk.price_war)
    .bind(candidate.pass_portfolio_balance)
    .bind(&candidate.suggested_launch_wave)
    .bind(now)
    .bind(candidate.sku_id.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(outcome.rows_affected() > 0)
}

/// Writes the whole result row, replacing any previous one for the SKU.
pub async fn replace_result(
    conn: &mut SqliteConnection,
    result: &CalculationResult,
    now: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(&format!(
        "INSERT OR REPLACE INTO sku_calculation_cache (sku_id, {RESULT_VALUE_COLUMNS}, calculated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(result.sku_id.as_str())
    .bind(result.gm_dollar_per_unit)
    .bind(result.gm_pct)
    .bind(result.monthly_revenue)
    .bind(result.monthly_gm_dollar)
    .bind(result.weighted_score_layer_b)
    .bind(result.synergy_score_layer_c)
    .bind(result.risk_score_layer_d)
    .bind(result.risk_factor)
    .bind(result.channel_weighted_score)
    .bind(result.pass_regulatory)
    .bind(result.pass_supply_ready)
    .bind(result.pass_gm_floor)
    .bind(result.final_recommendation.map(|recommendation| recommendation.as_str()))
    .bind(result.select_for_wave_1)
    .bind(result.adj_units_base)
    .bind(result.adj_units_best)
    .bind(result.adj_units_worst)
    .bind(result.monthly_gm_base)
    .bind(result.monthly_gm_best)
    .bind(result.monthly_gm_worst)
    .bind(result.rank_base)
    .bind(result.rank_best)
    .bind(result.rank_worst)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn fetch_candidate(
    conn: &mut SqliteConnection,
    sku_id: &SkuId,
) -> Result<Option<Candidate>, RepositoryError> {
    let row = sqlx::query(&format!("SELECT {CANDIDATE_COLUMNS} FROM sku_records WHERE sku_id = ?"))
        .bind(sku_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_candidate).transpose()
}

pub async fn fetch_all_candidates(
    conn: &mut SqliteConnection,
) -> Result<Vec<Candidate>, RepositoryError> {
    let rows = sqlx::query(&format!("SELECT {CANDIDATE_COLUMNS} FROM sku_records ORDER BY rowid"))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(row_to_candidate).collect()
}

/// Returns false when no candidate had the id. The result row goes with it
/// through the foreign key cascade.
pub async fn delete_candidate(
    conn: &mut SqliteConnection,
    sku_id: &SkuId,
) -> Result<bool, RepositoryError> {
    let outcome = sqlx::query("DELETE FROM sku_records WHERE sku_id = ?")
        .bind(sku_id.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(outcome.rows_affected() > 0)
}

/// Removes every candidate and cached result. Returns the number of
/// candidates removed.
pub async fn delete_all(conn: &mut SqliteConnection) -> Result<u64, RepositoryError> {
    sqlx::query("DELETE FROM sku_calculation_cache").execute(&mut *conn).await?;
    let outcome = sqlx::query("DELETE FROM sku_records").execute(&mut *conn).await?;
    Ok(outcome.rows_affected())
}

#[async_trait::async_trait]
impl CandidateRepository for SqlCandidateRepository {
    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<ScoredCandidate>, RepositoryError> {
        let rows = sqlx::query(&scored_select("ORDER BY r.rowid LIMIT ? OFFSET ?"))
            .bind(i64::from(limit))
            .bind(i64::from(skip))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_scored).collect()
    }

    async fn find_by_id(&self, sku_id: &SkuId) -> Result<Option<ScoredCandidate>, RepositoryError> {
        let row = sqlx::query(&scored_select("WHERE r.sku_id = ?"))
            .bind(sku_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_scored).transpose()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sku_records").fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}
