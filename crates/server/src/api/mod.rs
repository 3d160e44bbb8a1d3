//! JSON API over the launch candidate store.
//!
//! - `POST /api/upload/headers`: column labels of an uploaded workbook
//! - `POST /api/upload`: replace candidates from a workbook
//! - `GET /api/skus`, `POST /api/skus`: list / create candidates
//! - `GET|PUT|DELETE /api/skus/{sku_id}`: one candidate
//! - `POST /api/skus/rescore`: recompute every cached result
//! - `GET|PUT /api/settings`: global settings as `key → value`
//! - `GET /api/channels`, `PUT /api/channels/{name}`
//! - `GET /api/channels/cts`, `PUT /api/channels/cts/{market}/{channel}`
//! - `GET /api/markets`, `POST /api/markets`

mod config;
mod skus;
mod upload;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use launchdesk_core::errors::{ApplicationError, InterfaceError};
use launchdesk_db::{
    CandidateService, DbPool, IngestionPipeline, SqlConfigRepository, SqlMarketRepository,
};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pipeline: Arc<IngestionPipeline>,
    candidates: Arc<CandidateService>,
    config: Arc<SqlConfigRepository>,
    markets: Arc<SqlMarketRepository>,
}

impl ApiState {
    pub fn new(db_pool: DbPool, seed_on_ingest: bool) -> Self {
        Self {
            pipeline: Arc::new(
                IngestionPipeline::new(db_pool.clone()).with_seed_on_ingest(seed_on_ingest),
            ),
            candidates: Arc::new(CandidateService::new(db_pool.clone())),
            config: Arc::new(SqlConfigRepository::new(db_pool.clone())),
            markets: Arc::new(SqlMarketRepository::new(db_pool)),
        }
    }
}

pub fn router(state: ApiState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/upload/headers", post(upload::headers))
        .route("/api/upload", post(upload::ingest))
        .route("/api/skus", get(skus::list).post(skus::create))
        .route("/api/skus/rescore", post(skus::rescore))
        .route("/api/skus/{sku_id}", get(skus::get).put(skus::update).delete(skus::delete))
        .route("/api/settings", get(config::list_settings).put(config::upsert_settings))
        .route("/api/channels", get(config::list_channels))
        .route("/api/channels/cts", get(config::list_cts))
        .route("/api/channels/cts/{market}/{channel}", put(config::update_cts))
        .route("/api/channels/{name}", put(config::update_channel))
        .route("/api/markets", get(config::list_markets).post(config::create_market))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
}

impl Ack {
    pub fn success() -> Json<Self> {
        Json(Self { message: "Success" })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    correlation_id: &'a str,
}

/// Handler failure, rendered as `{error, correlation_id}`.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    pub fn from_app(error: impl Into<ApplicationError>) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        let interface = error.into().into_interface(correlation_id);
        match &interface {
            InterfaceError::ServiceUnavailable { message, correlation_id }
            | InterfaceError::Internal { message, correlation_id } => error!(
                event_name = "api.request.failed",
                correlation_id = %correlation_id,
                error = %message,
                "request failed"
            ),
            InterfaceError::BadRequest { message, correlation_id }
            | InterfaceError::NotFound { message, correlation_id } => warn!(
                event_name = "api.request.rejected",
                correlation_id = %correlation_id,
                error = %message,
                "request rejected"
            ),
        }
        Self(interface)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(InterfaceError::BadRequest {
            message: message.into(),
            correlation_id: Uuid::new_v4().to_string(),
        })
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Storage and internal details stay in the log.
        let error = match self.0 {
            InterfaceError::BadRequest { .. } | InterfaceError::NotFound { .. } => self.0.message(),
            InterfaceError::ServiceUnavailable { .. } | InterfaceError::Internal { .. } => {
                self.0.user_message()
            }
        };
        let body = ErrorBody { error, correlation_id: self.0.correlation_id() };
        (self.status(), Json(body)).into_response()
    }
}


#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use launchdesk_core::errors::ApplicationError;

    use super::test_support::body_json;
    use super::ApiError;

    #[tokio::test]
    async fn persistence_detail_is_not_leaked() {
        let response =
            ApiError::from_app(ApplicationError::Persistence("disk I/O error".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "The service is temporarily unavailable. Please retry shortly."
        );
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn not_found_keeps_its_message() {
        let response =
            ApiError::from_app(ApplicationError::NotFound("SKU `X`".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "SKU `X`");
    }
}
