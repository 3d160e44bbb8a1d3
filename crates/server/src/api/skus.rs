use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use launchdesk_core::domain::candidate::{Candidate, CandidateUpdate, SkuId};
use launchdesk_core::domain::result::ScoredCandidate;
use launchdesk_db::DEFAULT_PAGE_LIMIT;
use serde::{Deserialize, Serialize};

use super::{Ack, ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Serialize)]
pub struct RescoreResponse {
    pub rescored: usize,
}

pub async fn list(
    State(state): State<ApiState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<ScoredCandidate>>, ApiError> {
    let candidates =
        state.candidates.list(page.skip, page.limit).await.map_err(ApiError::from_app)?;
    Ok(Json(candidates))
}

pub async fn get(
    State(state): State<ApiState>,
    Path(sku_id): Path<String>,
) -> Result<Json<ScoredCandidate>, ApiError> {
    let candidate = state.candidates.get(&SkuId(sku_id)).await.map_err(ApiError::from_app)?;
    Ok(Json(candidate))
}

pub async fn create(
    State(state): State<ApiState>,
    Json(candidate): Json<Candidate>,
) -> Result<(StatusCode, Json<ScoredCandidate>), ApiError> {
    let created = state.candidates.create(candidate).await.map_err(ApiError::from_app)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<ApiState>,
    Path(sku_id): Path<String>,
    Json(update): Json<CandidateUpdate>,
) -> Result<Json<ScoredCandidate>, ApiError> {
    let updated =
        state.candidates.update(&SkuId(sku_id), update).await.map_err(ApiError::from_app)?;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<ApiState>,
    Path(sku_id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    state.candidates.delete(&SkuId(sku_id)).await.map_err(ApiError::from_app)?;
    Ok(Ack::success())
}

pub async fn rescore(State(state): State<ApiState>) -> Result<Json<RescoreResponse>, ApiError> {
    let rescored = state.candidates.rescore_all().await.map_err(ApiError::from_app)?;
    Ok(Json(RescoreResponse { rescored }))
}
