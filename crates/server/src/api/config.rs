use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use launchdesk_core::domain::channel::{ChannelConfig, ChannelConfigUpdate, MarketChannelCts};
use launchdesk_core::domain::market::Market;
use launchdesk_core::domain::settings::GlobalSetting;
use launchdesk_core::errors::{ApplicationError, DomainError};
use launchdesk_db::{ConfigRepository, MarketRepository};
use serde::Deserialize;

use super::{Ack, ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub struct CtsTotalUpdate {
    pub total_cts_pct: f64,
}

pub async fn list_settings(
    State(state): State<ApiState>,
) -> Result<Json<BTreeMap<String, f64>>, ApiError> {
    let settings = state.config.list_settings().await.map_err(ApiError::from_app)?;
    Ok(Json(
        settings.into_iter().map(|setting| (setting.setting_key, setting.setting_value)).collect(),
    ))
}

pub async fn upsert_settings(
    State(state): State<ApiState>,
    Json(settings): Json<BTreeMap<String, f64>>,
) -> Result<Json<Ack>, ApiError> {
    let settings = settings
        .into_iter()
        .map(|(setting_key, setting_value)| GlobalSetting { setting_key, setting_value })
        .collect::<Vec<_>>();
    state.config.upsert_settings(&settings).await.map_err(ApiError::from_app)?;
    Ok(Ack::success())
}

pub async fn list_channels(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ChannelConfig>>, ApiError> {
    Ok(Json(state.config.list_channels().await.map_err(ApiError::from_app)?))
}

pub async fn update_channel(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(update): Json<ChannelConfigUpdate>,
) -> Result<Json<ChannelConfig>, ApiError> {
    let channel = state.config.update_channel(&name, update).await.map_err(ApiError::from_app)?;
    Ok(Json(channel))
}

pub async fn list_cts(
    State(state): State<ApiState>,
) -> Result<Json<Vec<MarketChannelCts>>, ApiError> {
    Ok(Json(state.config.list_cts().await.map_err(ApiError::from_app)?))
}

pub async fn update_cts(
    State(state): State<ApiState>,
    Path((market, channel)): Path<(String, String)>,
    Json(update): Json<CtsTotalUpdate>,
) -> Result<Json<MarketChannelCts>, ApiError> {
    let cts = state
        .config
        .update_cts_total(&market, &channel, update.total_cts_pct)
        .await
        .map_err(ApiError::from_app)?;
    Ok(Json(cts))
}

pub async fn list_markets(State(state): State<ApiState>) -> Result<Json<Vec<Market>>, ApiError> {
    Ok(Json(state.markets.list().await.map_err(ApiError::from_app)?))
}

pub async fn create_market(
    State(state): State<ApiState>,
    Json(market): Json<Market>,
) -> Result<(StatusCode, Json<Market>), ApiError> {
    let market = Market { market_name: market.market_name.trim().to_string() };
    if market.market_name.is_empty() {
        return Err(ApiError::from_app(ApplicationError::Domain(
            DomainError::InvariantViolation("market_name must not be blank".to_string()),
        )));
    }

    let created = state.markets.create(&market).await.map_err(ApiError::from_app)?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(market)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{app, body_json, empty_request, json_request, send};

    #[tokio::test]
    async fn settings_round_trip_as_a_flat_map() {
        let (app, _) = app().await;

        let initial = body_json(send(&app, empty_request("GET", "/api/settings")).await).await;
        assert_eq!(initial["gm_floor_pct"], 0.35);
        assert_eq!(initial.as_object().map(|map| map.len()), Some(24));

        let saved = send(
            &app,
            json_request("PUT", "/api/settings", json!({ "gm_floor_pct": 0.3, "fx_buffer": 0.05 })),
        )
        .await;
        assert_eq!(saved.status(), StatusCode::OK);
        assert_eq!(body_json(saved).await["message"], "Success");

        let updated = body_json(send(&app, empty_request("GET", "/api/settings")).await).await;
        assert_eq!(updated["gm_floor_pct"], 0.3);
        assert_eq!(updated["fx_buffer"], 0.05);
    }

    #[tokio::test]
    async fn channel_update_and_unknown_channel() {
        let (app, _) = app().await;

        let updated = send(
            &app,
            json_request("PUT", "/api/channels/GT", json!({ "base_units_per_month": 300 })),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);
        let body = body_json(updated).await;
        assert_eq!(body["base_units_per_month"], 300);
        assert_eq!(body["channel_weight"], 0.2);

        let clinic = send(
            &app,
            json_request("PUT", "/api/channels/Rx%2FClinic", json!({ "channel_weight": 0.1 })),
        )
        .await;
        assert_eq!(clinic.status(), StatusCode::OK);

        let missing =
            send(&app, json_request("PUT", "/api/channels/Vending", json!({ "channel_weight": 1 })))
                .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cts_total_update_and_listing() {
        let (app, _) = app().await;

        let listed = body_json(send(&app, empty_request("GET", "/api/channels/cts")).await).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(12));

        let updated = send(
            &app,
            json_request("PUT", "/api/channels/cts/UAE/MT", json!({ "total_cts_pct": 0.2 })),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);
        let body = body_json(updated).await;
        assert_eq!(body["total_cts_pct"], 0.2);
        assert_eq!(body["trade_terms_pct"], 0.1);

        let missing = send(
            &app,
            json_request("PUT", "/api/channels/cts/Atlantis/MT", json!({ "total_cts_pct": 0.2 })),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn markets_list_and_create() {
        let (app, _) = app().await;

        let seeded = body_json(send(&app, empty_request("GET", "/api/markets")).await).await;
        assert_eq!(seeded.as_array().map(Vec::len), Some(3));

        let created =
            send(&app, json_request("POST", "/api/markets", json!({ "market_name": "UAE" }))).await;
        assert_eq!(created.status(), StatusCode::CREATED);

        let again =
            send(&app, json_request("POST", "/api/markets", json!({ "market_name": "UAE" }))).await;
        assert_eq!(again.status(), StatusCode::OK);

        let blank =
            send(&app, json_request("POST", "/api/markets", json!({ "market_name": " " }))).await;
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    }
}
