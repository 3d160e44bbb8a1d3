use crate::domain::candidate::Candidate;
use crate::domain::result::{CalculationResult, Recommendation};

use super::snapshot::ConfigSnapshot;

/// Demand ramp multiplier. Constant until a ramp curve keyed on
/// `Candidate::ramp_month` is defined.
pub const RAMP_FACTOR: f64 = 1.0;

/// Maps a Layer D risk score onto a demand multiplier: 1 at score 1, 0 at score 5.
pub fn risk_factor(risk_score: f64) -> f64 {
    1.0 - (risk_score - 1.0).max(0.0) / 4.0
}

/// Gross margin per unit after landed cost and cost to serve.
pub fn gross_margin_per_unit(list_price: f64, landed_cost: f64, cts_pct: f64) -> f64 {
    list_price - (landed_cost + cts_pct * list_price)
}

pub fn gross_margin_pct(gm_per_unit: f64, list_price: f64) -> f64 {
    if list_price > 0.0 {
        gm_per_unit / list_price
    } else {
        0.0
    }
}

/// Scores one candidate against a configuration snapshot.
///
/// Never fails: a candidate without market or channel yields an unevaluated
/// result, and missing configuration falls back to defaults.
pub fn evaluate_candidate(candidate: &Candidate, config: &ConfigSnapshot) -> CalculationResult {
    let Some((market, channel)) = candidate.targeting() else {
        return CalculationResult::unevaluated(candidate.sku_id.clone());
    };
    let settings = config.settings();

    let list_price = candidate.local_list_price.unwrap_or(0.0);
    let landed_cost = candidate.landed_cost.unwrap_or(0.0);
    let cts_pct = config.cts_pct(market, channel);

    let gm_per_unit = gross_margin_per_unit(list_price, landed_cost, cts_pct);
    let gm_pct = gross_margin_pct(gm_per_unit, list_price);

    let layer_b = settings.market_fit_weights.apply(candidate.market_fit.values());
    let channel_weighted_score = layer_b * config.channel_weight(channel);
    let layer_c = settings.synergy_weights.apply(candidate.synergy.values());
    let layer_d = settings.risk_weights.apply(candidate.risk.values());
    let risk_factor = risk_factor(layer_d);

    let pass_regulatory = candidate.regulatory_eligible == Some(true);
    let pass_supply_ready = candidate.supply_ready == Some(true);
    let pass_gm_floor = gm_pct >= settings.gm_floor_pct;

    let adj_units = config.base_units_per_month(channel) as f64
        * RAMP_FACTOR
        * risk_factor
        * settings.listing_breadth_index;
    let monthly_revenue = adj_units * list_price;
    let monthly_gm = adj_units * gm_per_unit;

    let vetoed =
        candidate.ip_risk_high == Some(true) || candidate.regulatory_prohibition == Some(true);
    let launch_ready = pass_regulatory
        && pass_supply_ready
        && pass_gm_floor
        && channel_weighted_score >= settings.launch_now_min_score
        && layer_d <= settings.launch_now_max_risk;

    let recommendation = if vetoed {
        Recommendation::DoNotLaunch
    } else if launch_ready {
        Recommendation::LaunchNow
    } else {
        Recommendation::PhaseLater
    };

    CalculationResult {
        sku_id: candidate.sku_id.clone(),
        gm_dollar_per_unit: Some(gm_per_unit),
        gm_pct: Some(gm_pct),
        monthly_revenue: Some(monthly_revenue),
        monthly_gm_dollar: Some(monthly_gm),
        weighted_score_layer_b: Some(layer_b),
        synergy_score_layer_c: Some(layer_c),
        risk_score_layer_d: Some(layer_d),
        risk_factor: Some(risk_factor),
        channel_weighted_score: Some(channel_weighted_score),
        pass_regulatory: Some(pass_regulatory),
        pass_supply_ready: Some(pass_supply_ready),
        pass_gm_floor: Some(pass_gm_floor),
        final_recommendation: Some(recommendation),
        select_for_wave_1: Some(recommendation == Recommendation::LaunchNow),
        adj_units_base: Some(adj_units),
        monthly_gm_base: Some(monthly_gm),
        ..CalculationResult::default()
    }
}
