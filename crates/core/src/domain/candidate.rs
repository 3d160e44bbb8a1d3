use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkuId(pub String);

impl SkuId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SkuId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Layer B inputs: market and channel fit, each on a 1-5 scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketFitScores {
    #[serde(rename = "score_consumer_trend")]
    pub consumer_trend: Option<i64>,
    #[serde(rename = "score_point_of_diff")]
    pub point_of_diff: Option<i64>,
    #[serde(rename = "score_channel_suitability")]
    pub channel_suitability: Option<i64>,
    #[serde(rename = "score_strategic_role")]
    pub strategic_role: Option<i64>,
    #[serde(rename = "score_marketing_leverage")]
    pub marketing_leverage: Option<i64>,
}

impl MarketFitScores {
    pub fn values(&self) -> [Option<i64>; 5] {
        [
            self.consumer_trend,
            self.point_of_diff,
            self.channel_suitability,
            self.strategic_role,
            self.marketing_leverage,
        ]
    }
}

/// Layer C inputs: strategic synergy with the existing portfolio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynergyScores {
    #[serde(rename = "score_price_ladder")]
    pub price_ladder: Option<i64>,
    #[serde(rename = "score_usage_occasion")]
    pub usage_occasion: Option<i64>,
    #[serde(rename = "score_channel_diff")]
    pub channel_diff: Option<i64>,
    #[serde(rename = "score_story_cohesion")]
    pub story_cohesion: Option<i64>,
    #[serde(rename = "score_operational_synergy")]
    pub operational_synergy: Option<i64>,
}

impl SynergyScores {
    pub fn values(&self) -> [Option<i64>; 5] {
        [
            self.price_ladder,
            self.usage_occasion,
            self.channel_diff,
            self.story_cohesion,
            self.operational_synergy,
        ]
    }
}

/// Layer D inputs: risk heatmap, where a higher score means riskier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskScores {
    #[serde(rename = "score_regulatory_delay")]
    pub regulatory_delay: Option<i64>,
    #[serde(rename = "score_retail_listing")]
    pub retail_listing: Option<i64>,
    #[serde(rename = "score_competitive")]
    pub competitive: Option<i64>,
    #[serde(rename = "score_supply_chain")]
    pub supply_chain: Option<i64>,
    #[serde(rename = "score_price_war")]
    pub price_war: Option<i64>,
}

impl RiskScores {
    pub fn values(&self) -> [Option<i64>; 5] {
        [
            self.regulatory_delay,
            self.retail_listing,
            self.competitive,
            self.supply_chain,
            self.price_war,
        ]
    }
}

/// A SKU under evaluation for launch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub sku_id: SkuId,
    pub sku_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub target_market: Option<String>,
    #[serde(default)]
    pub primary_channel: Option<String>,
    #[serde(default)]
    pub ramp_month: Option<i64>,
    #[serde(default)]
    pub regulatory_eligible: Option<bool>,
    #[serde(default)]
    pub regulatory_prohibition: Option<bool>,
    #[serde(default)]
    pub ip_risk_high: Option<bool>,
    #[serde(default)]
    pub supply_ready: Option<bool>,
    #[serde(default)]
    pub moq: Option<i64>,
    #[serde(default)]
    pub lead_time_days: Option<i64>,
    #[serde(default)]
    pub shelf_life_months: Option<i64>,
    #[serde(default)]
    pub local_list_price: Option<f64>,
    #[serde(default)]
    pub landed_cost: Option<f64>,
    #[serde(flatten)]
    pub market_fit: MarketFitScores,
    #[serde(flatten)]
    pub synergy: SynergyScores,
    #[serde(flatten)]
    pub risk: RiskScores,
    #[serde(default)]
    pub pass_portfolio_balance: Option<bool>,
    #[serde(default)]
    pub suggested_launch_wave: Option<String>,
}

impl Candidate {
    pub fn new(
        sku_id: impl Into<String>,
        sku_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            sku_id: SkuId(sku_id.into()),
            sku_name: sku_name.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Rejects records that ingestion would have skipped.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.sku_id.0.trim().is_empty() {
            return Err(DomainError::InvariantViolation("sku_id must not be blank".to_string()));
        }
        if self.sku_name.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "sku_name must not be blank for `{}`",
                self.sku_id
            )));
        }
        Ok(())
    }

    /// Market and channel are both required before the engine can evaluate.
    pub fn targeting(&self) -> Option<(&str, &str)> {
        let market = self.target_market.as_deref().filter(|value| !value.is_empty())?;
        let channel = self.primary_channel.as_deref().filter(|value| !value.is_empty())?;
        Some((market, channel))
    }
}

/// Partial update for a persisted candidate.
///
/// Each field is applied explicitly in [`CandidateUpdate::apply`]. For nullable
/// columns the outer `Option` means "field supplied" and the inner `Option`
/// carries the new value, so an explicit JSON `null` clears the column while an
/// omitted key leaves it untouched.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CandidateUpdate {
    pub sku_name: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "supplied")]
    pub brand: Option<Option<String>>,
    #[serde(deserialize_with = "supplied")]
    pub target_market: Option<Option<String>>,
    #[serde(deserialize_with = "supplied")]
    pub primary_channel: Option<Option<String>>,
    #[serde(deserialize_with = "supplied")]
    pub ramp_month: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub regulatory_eligible: Option<Option<bool>>,
    #[serde(deserialize_with = "supplied")]
    pub regulatory_prohibition: Option<Option<bool>>,
    #[serde(deserialize_with = "supplied")]
    pub ip_risk_high: Option<Option<bool>>,
    #[serde(deserialize_with = "supplied")]
    pub supply_ready: Option<Option<bool>>,
    #[serde(deserialize_with = "supplied")]
    pub moq: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub lead_time_days: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub shelf_life_months: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub local_list_price: Option<Option<f64>>,
    #[serde(deserialize_with = "supplied")]
    pub landed_cost: Option<Option<f64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_consumer_trend: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_point_of_diff: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_channel_suitability: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_strategic_role: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_marketing_leverage: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_price_ladder: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_usage_occasion: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_channel_diff: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_story_cohesion: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_operational_synergy: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_regulatory_delay: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_retail_listing: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_competitive: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_supply_chain: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub score_price_war: Option<Option<i64>>,
    #[serde(deserialize_with = "supplied")]
    pub pass_portfolio_balance: Option<Option<bool>>,
    #[serde(deserialize_with = "supplied")]
    pub suggested_launch_wave: Option<Option<String>>,
}

fn supplied<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn assign<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl CandidateUpdate {
    pub fn apply(self, candidate: &mut Candidate) {
        assign(&mut candidate.sku_name, self.sku_name);
        assign(&mut candidate.category, self.category);
        assign(&mut candidate.brand, self.brand);
        assign(&mut candidate.target_market, self.target_market);
        assign(&mut candidate.primary_channel, self.primary_channel);
        assign(&mut candidate.ramp_month, self.ramp_month);
        assign(&mut candidate.regulatory_eligible, self.regulatory_eligible);
        assign(&mut candidate.regulatory_prohibition, self.regulatory_prohibition);
        assign(&mut candidate.ip_risk_high, self.ip_risk_high);
        assign(&mut candidate.supply_ready, self.supply_ready);
        assign(&mut candidate.moq, self.moq);
        assign(&mut candidate.lead_time_days, self.lead_time_days);
        assign(&mut candidate.shelf_life_months, self.shelf_life_months);
        assign(&mut candidate.local_list_price, self.local_list_price);
        assign(&mut candidate.landed_cost, self.landed_cost);

        assign(&mut candidate.market_fit.consumer_trend, self.score_consumer_trend);
        assign(&mut candidate.market_fit.point_of_diff, self.score_point_of_diff);
        assign(&mut candidate.market_fit.channel_suitability, self.score_channel_suitability);
        assign(&mut candidate.market_fit.strategic_role, self.score_strategic_role);
        assign(&mut candidate.market_fit.marketing_leverage, self.score_marketing_leverage);

        assign(&mut candidate.synergy.price_ladder, self.score_price_ladder);
        assign(&mut candidate.synergy.usage_occasion, self.score_usage_occasion);
        assign(&mut candidate.synergy.channel_diff, self.score_channel_diff);
        assign(&mut candidate.synergy.story_cohesion, self.score_story_cohesion);
        assign(&mut candidate.synergy.operational_synergy, self.score_operational_synergy);

        assign(&mut candidate.risk.regulatory_delay, self.score_regulatory_delay);
        assign(&mut candidate.risk.retail_listing, self.score_retail_listing);
        assign(&mut candidate.risk.competitive, self.score_competitive);
        assign(&mut candidate.risk.supply_chain, self.score_supply_chain);
        assign(&mut candidate.risk.price_war, self.score_price_war);

        assign(&mut candidate.pass_portfolio_balance, self.pass_portfolio_balance);
        assign(&mut candidate.suggested_launch_wave, self.suggested_launch_wave);
    }
}
