use serde::{Deserialize, Serialize};

/// Volume and weighting terms for one sales channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel_name: String,
    pub base_units_per_month: i64,
    pub channel_weight: f64,
    // Not read by scoring yet.
    pub retail_adoption_fraction: f64,
    pub marketing_budget_multiplier: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChannelConfigUpdate {
    pub base_units_per_month: Option<i64>,
    pub channel_weight: Option<f64>,
    pub retail_adoption_fraction: Option<f64>,
    pub marketing_budget_multiplier: Option<f64>,
}

impl ChannelConfigUpdate {
    pub fn apply(self, channel: &mut ChannelConfig) {
        if let Some(base_units_per_month) = self.base_units_per_month {
            channel.base_units_per_month = base_units_per_month;
        }
        if let Some(channel_weight) = self.channel_weight {
            channel.channel_weight = channel_weight;
        }
        if let Some(retail_adoption_fraction) = self.retail_adoption_fraction {
            channel.retail_adoption_fraction = retail_adoption_fraction;
        }
        if let Some(marketing_budget_multiplier) = self.marketing_budget_multiplier {
            channel.marketing_budget_multiplier = marketing_budget_multiplier;
        }
    }
}

/// Individual cost-to-serve components, as fractions of list price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CtsComponents {
    pub commission_pct: f64,
    pub fulfillment_pct: f64,
    pub payment_cod_pct: f64,
    pub returns_allowance_pct: f64,
    pub listing_fees_pct: f64,
    pub trade_terms_pct: f64,
    pub rebates_pct: f64,
    pub promo_accrual_pct: f64,
}

/// Cost to serve for one market/channel pair. Scoring only reads `total_cts_pct`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketChannelCts {
    pub market_name: String,
    pub channel_name: String,
    #[serde(flatten)]
    pub components: CtsComponents,
    pub total_cts_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::{ChannelConfig, ChannelConfigUpdate};

    #[test]
    fn update_only_touches_supplied_fields() {
        let mut channel = ChannelConfig {
            channel_name: "GT".to_string(),
            base_units_per_month: 250,
            channel_weight: 0.2,
            retail_adoption_fraction: 0.55,
            marketing_budget_multiplier: 0.95,
        };

        ChannelConfigUpdate { channel_weight: Some(0.25), ..ChannelConfigUpdate::default() }
            .apply(&mut channel);

        assert_eq!(channel.channel_weight, 0.25);
        assert_eq!(channel.base_units_per_month, 250);
        assert_eq!(channel.marketing_budget_multiplier, 0.95);
    }
}
