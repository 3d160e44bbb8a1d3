use serde::{Deserialize, Serialize};

use crate::domain::candidate::{Candidate, SkuId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Launch Now")]
    LaunchNow,
    #[serde(rename = "Phase Later")]
    PhaseLater,
    #[serde(rename = "Do Not Launch")]
    DoNotLaunch,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LaunchNow => "Launch Now",
            Self::PhaseLater => "Phase Later",
            Self::DoNotLaunch => "Do Not Launch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Launch Now" => Some(Self::LaunchNow),
            "Phase Later" => Some(Self::PhaseLater),
            "Do Not Launch" => Some(Self::DoNotLaunch),
            _ => None,
        }
    }
}

/// Cached scoring output for one candidate.
///
/// Every field except `sku_id` is `None` when the candidate lacks a market or
/// channel and therefore could not be evaluated. The best/worst scenario and
/// rank fields are reserved and always `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub sku_id: SkuId,

    pub gm_dollar_per_unit: Option<f64>,
    pub gm_pct: Option<f64>,
    pub monthly_revenue: Option<f64>,
    pub monthly_gm_dollar: Option<f64>,

    pub weighted_score_layer_b: Option<f64>,
    pub synergy_score_layer_c: Option<f64>,
    pub risk_score_layer_d: Option<f64>,
    pub risk_factor: Option<f64>,
    pub channel_weighted_score: Option<f64>,

    pub pass_regulatory: Option<bool>,
    pub pass_supply_ready: Option<bool>,
    pub pass_gm_floor: Option<bool>,

    pub final_recommendation: Option<Recommendation>,
    pub select_for_wave_1: Option<bool>,

    pub adj_units_base: Option<f64>,
    pub adj_units_best: Option<f64>,
    pub adj_units_worst: Option<f64>,

    pub monthly_gm_base: Option<f64>,
    pub monthly_gm_best: Option<f64>,
    pub monthly_gm_worst: Option<f64>,

    pub rank_base: Option<i64>,
    pub rank_best: Option<i64>,
    pub rank_worst: Option<i64>,
}

impl CalculationResult {
    pub fn unevaluated(sku_id: SkuId) -> Self {
        Self { sku_id, ..Self::default() }
    }

    pub fn is_evaluated(&self) -> bool {
        self.final_recommendation.is_some()
    }
}

/// A candidate together with its cached result, as returned to API callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub cache: Option<CalculationResult>,
}
