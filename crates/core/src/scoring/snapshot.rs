use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::defaults::{
    DEFAULT_BASE_UNITS_PER_MONTH, DEFAULT_CHANNEL_WEIGHT, DEFAULT_GM_FLOOR_PCT,
    DEFAULT_LAUNCH_NOW_MAX_RISK, DEFAULT_LAUNCH_NOW_MIN_SCORE, DEFAULT_LAYER_WEIGHT,
    DEFAULT_LISTING_BREADTH_INDEX, GM_FLOOR_PCT, LAUNCH_NOW_MAX_RISK, LAUNCH_NOW_MIN_SCORE,
    LISTING_BREADTH_INDEX, MARKET_FIT_WEIGHT_KEYS, RISK_WEIGHT_KEYS, SYNERGY_WEIGHT_KEYS,
};
use crate::domain::channel::{ChannelConfig, MarketChannelCts};
use crate::domain::settings::GlobalSetting;

/// Five independent weights for one scoring layer.
///
/// Weights are applied as given. They are not required to sum to 1 and are
/// never renormalized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights(pub [f64; 5]);

impl LayerWeights {
    pub fn uniform(weight: f64) -> Self {
        Self([weight; 5])
    }

    fn from_settings(settings: &HashMap<String, f64>, keys: &[&str; 5]) -> Self {
        let mut weights = [DEFAULT_LAYER_WEIGHT; 5];
        for (slot, key) in weights.iter_mut().zip(keys.iter()) {
            *slot = setting_or(settings, key, DEFAULT_LAYER_WEIGHT);
        }
        Self(weights)
    }

    /// Weighted sum of five sub-scores, with absent scores counted as 0.
    pub fn apply(&self, scores: [Option<i64>; 5]) -> f64 {
        self.0
            .iter()
            .zip(scores.iter())
            .map(|(weight, score)| score.unwrap_or(0) as f64 * weight)
            .sum()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Typed view of the global settings the engine consumes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub market_fit_weights: LayerWeights,
    pub synergy_weights: LayerWeights,
    pub risk_weights: LayerWeights,
    pub gm_floor_pct: f64,
    pub listing_breadth_index: f64,
    pub launch_now_min_score: f64,
    pub launch_now_max_risk: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

impl ScoringSettings {
    /// Reads each known key, falling back to its declared default. Unknown
    /// keys are ignored.
    pub fn from_map(settings: &HashMap<String, f64>) -> Self {
        Self {
            market_fit_weights: LayerWeights::from_settings(settings, &MARKET_FIT_WEIGHT_KEYS),
            synergy_weights: LayerWeights::from_settings(settings, &SYNERGY_WEIGHT_KEYS),
            risk_weights: LayerWeights::from_settings(settings, &RISK_WEIGHT_KEYS),
            gm_floor_pct: setting_or(settings, GM_FLOOR_PCT, DEFAULT_GM_FLOOR_PCT),
            listing_breadth_index: setting_or(
                settings,
                LISTING_BREADTH_INDEX,
                DEFAULT_LISTING_BREADTH_INDEX,
            ),
            launch_now_min_score: setting_or(
                settings,
                LAUNCH_NOW_MIN_SCORE,
                DEFAULT_LAUNCH_NOW_MIN_SCORE,
            ),
            launch_now_max_risk: setting_or(
                settings,
                LAUNCH_NOW_MAX_RISK,
                DEFAULT_LAUNCH_NOW_MAX_RISK,
            ),
        }
    }

    /// Layers whose weights do not sum to 1. Scores in those layers drift from
    /// the 1-5 scale, which shifts every threshold comparison.
    pub fn unnormalized_layers(&self) -> Vec<&'static str> {
        [
            ("layer_b", self.market_fit_weights),
            ("layer_c", self.synergy_weights),
            ("layer_d", self.risk_weights),
        ]
        .into_iter()
        .filter(|(_, weights)| (weights.total() - 1.0).abs() > 1e-9)
        .map(|(layer, _)| layer)
        .collect()
    }
}

fn setting_or(settings: &HashMap<String, f64>, key: &str, default: f64) -> f64 {
    settings.get(key).copied().unwrap_or(default)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelTerms {
    pub base_units_per_month: i64,
    pub channel_weight: f64,
}

impl From<&ChannelConfig> for ChannelTerms {
    fn from(value: &ChannelConfig) -> Self {
        Self {
            base_units_per_month: value.base_units_per_month,
            channel_weight: value.channel_weight,
        }
    }
}

/// Immutable configuration visible to one scoring pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    settings: ScoringSettings,
    channels: HashMap<String, ChannelTerms>,
    cts: HashMap<String, HashMap<String, f64>>,
}

impl ConfigSnapshot {
    pub fn new(
        settings: ScoringSettings,
        channels: HashMap<String, ChannelTerms>,
        cts: HashMap<String, HashMap<String, f64>>,
    ) -> Self {
        Self { settings, channels, cts }
    }

    /// Builds a snapshot from configuration-store rows.
    pub fn from_records(
        settings: &[GlobalSetting],
        channels: &[ChannelConfig],
        cts_rows: &[MarketChannelCts],
    ) -> Self {
        let settings = settings
            .iter()
            .map(|setting| (setting.setting_key.clone(), setting.setting_value))
            .collect::<HashMap<_, _>>();

        let channels = channels
            .iter()
            .map(|channel| (channel.channel_name.clone(), ChannelTerms::from(channel)))
            .collect();

        let mut cts: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for row in cts_rows {
            cts.entry(row.market_name.clone())
                .or_default()
                .insert(row.channel_name.clone(), row.total_cts_pct);
        }

        Self::new(ScoringSettings::from_map(&settings), channels, cts)
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    /// Total cost to serve for the pair, or 0 when not configured.
    pub fn cts_pct(&self, market: &str, channel: &str) -> f64 {
        self.cts.get(market).and_then(|channels| channels.get(channel)).copied().unwrap_or(0.0)
    }

    pub fn channel_weight(&self, channel: &str) -> f64 {
        self.channels
            .get(channel)
            .map(|terms| terms.channel_weight)
            .unwrap_or(DEFAULT_CHANNEL_WEIGHT)
    }

    pub fn base_units_per_month(&self, channel: &str) -> i64 {
        self.channels
            .get(channel)
            .map(|terms| terms.base_units_per_month)
            .unwrap_or(DEFAULT_BASE_UNITS_PER_MONTH)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
