//! Reference configuration installed into a fresh deployment.
//!
//! The seeder inserts these rows only where no row with the same key exists,
//! so operator edits always survive.

use crate::domain::channel::{ChannelConfig, CtsComponents, MarketChannelCts};
use crate::domain::market::Market;
use crate::domain::settings::GlobalSetting;
use crate::scoring::defaults::{
    DEFAULT_GM_FLOOR_PCT, DEFAULT_LAUNCH_NOW_MAX_RISK, DEFAULT_LAUNCH_NOW_MIN_SCORE,
    DEFAULT_LAYER_WEIGHT, DEFAULT_LISTING_BREADTH_INDEX, GM_FLOOR_PCT, LAUNCH_NOW_MAX_RISK,
    LAUNCH_NOW_MIN_SCORE, LISTING_BREADTH_INDEX, MARKET_FIT_WEIGHT_KEYS, RISK_WEIGHT_KEYS,
    SYNERGY_WEIGHT_KEYS,
};

// Stored for planning screens; the engine does not read them.
pub const PHASE_LATER_MIN_SCORE: &str = "phase_later_min_score";
pub const PHASE_LATER_MAX_RISK: &str = "phase_later_max_risk";
pub const PRICE_MULTIPLIER: &str = "price_multiplier";
pub const IMPORT_FREIGHT_PCT: &str = "import_freight_pct";
pub const DUTIES_TAXES_PCT: &str = "duties_taxes_pct";

pub const ECOM_CHANNEL: &str = "E-Com";
pub const MODERN_TRADE_CHANNEL: &str = "MT";
pub const GENERAL_TRADE_CHANNEL: &str = "GT";
pub const CLINIC_CHANNEL: &str = "Rx/Clinic";

/// Markets with a seeded cost-to-serve matrix.
pub const CTS_MARKETS: [&str; 3] = ["Nepal", "India", "UAE"];

/// Markets offered for selection when the markets table is empty.
pub const STARTER_MARKETS: [&str; 3] = ["Nepal", "Sri Lanka", "Malaysia"];

pub fn default_settings() -> Vec<GlobalSetting> {
    let weights = MARKET_FIT_WEIGHT_KEYS
        .iter()
        .chain(SYNERGY_WEIGHT_KEYS.iter())
        .chain(RISK_WEIGHT_KEYS.iter())
        .map(|key| (*key, DEFAULT_LAYER_WEIGHT));

    let thresholds = [
        (LAUNCH_NOW_MIN_SCORE, DEFAULT_LAUNCH_NOW_MIN_SCORE),
        (LAUNCH_NOW_MAX_RISK, DEFAULT_LAUNCH_NOW_MAX_RISK),
        (PHASE_LATER_MIN_SCORE, 3.0),
        (PHASE_LATER_MAX_RISK, 3.5),
        (PRICE_MULTIPLIER, 1.0),
        (IMPORT_FREIGHT_PCT, 0.1),
        (DUTIES_TAXES_PCT, 0.15),
        (LISTING_BREADTH_INDEX, DEFAULT_LISTING_BREADTH_INDEX),
        (GM_FLOOR_PCT, DEFAULT_GM_FLOOR_PCT),
    ];

    weights
        .chain(thresholds)
        .map(|(key, value)| GlobalSetting { setting_key: key.to_string(), setting_value: value })
        .collect()
}

pub fn default_channels() -> Vec<ChannelConfig> {
    [
        (ECOM_CHANNEL, 500, 0.35, 0.85, 1.1),
        (MODERN_TRADE_CHANNEL, 350, 0.3, 0.7, 1.0),
        (GENERAL_TRADE_CHANNEL, 250, 0.2, 0.55, 0.95),
        (CLINIC_CHANNEL, 500, 0.15, 0.6, 1.05),
    ]
    .into_iter()
    .map(|(name, units, weight, adoption, marketing)| ChannelConfig {
        channel_name: name.to_string(),
        base_units_per_month: units,
        channel_weight: weight,
        retail_adoption_fraction: adoption,
        marketing_budget_multiplier: marketing,
    })
    .collect()
}

/// Component split of the reference workbook for one channel.
pub fn default_cts_components(channel: &str) -> CtsComponents {
    let ecom = channel == ECOM_CHANNEL;
    let modern_trade = channel == MODERN_TRADE_CHANNEL;

    CtsComponents {
        commission_pct: if ecom { 0.12 } else { 0.0 },
        fulfillment_pct: if ecom { 0.03 } else { 0.02 },
        payment_cod_pct: if ecom { 0.02 } else { 0.0 },
        returns_allowance_pct: if ecom { 0.02 } else { 0.01 },
        listing_fees_pct: if modern_trade { 0.02 } else { 0.0 },
        trade_terms_pct: if modern_trade {
            0.1
        } else if ecom {
            0.0
        } else {
            0.08
        },
        rebates_pct: if modern_trade || channel == GENERAL_TRADE_CHANNEL { 0.02 } else { 0.0 },
        promo_accrual_pct: if modern_trade { 0.03 } else { 0.02 },
    }
}

/// Every seeded market crossed with every seeded channel. The total is the
/// workbook's rounded figure, not the sum of the components.
pub fn default_cts() -> Vec<MarketChannelCts> {
    let channels = default_channels();
    CTS_MARKETS
        .iter()
        .flat_map(|market| {
            channels.iter().map(move |channel| MarketChannelCts {
                market_name: market.to_string(),
                channel_name: channel.channel_name.clone(),
                components: default_cts_components(&channel.channel_name),
                total_cts_pct: if channel.channel_name == ECOM_CHANNEL { 0.19 } else { 0.17 },
            })
        })
        .collect()
}

pub fn starter_markets() -> Vec<Market> {
    STARTER_MARKETS.iter().map(|name| Market { market_name: name.to_string() }).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{default_channels, default_cts, default_cts_components, default_settings};
    use crate::scoring::{ConfigSnapshot, ScoringSettings};

    #[test]
    fn settings_cover_every_engine_key_once() {
        let settings = default_settings();
        let keys = settings.iter().map(|setting| setting.setting_key.as_str()).collect::<HashSet<_>>();

        assert_eq!(settings.len(), 24);
        assert_eq!(keys.len(), 24);

        let snapshot = ConfigSnapshot::from_records(&settings, &[], &[]);
        assert_eq!(*snapshot.settings(), ScoringSettings::default());
    }

    #[test]
    fn cts_matrix_covers_markets_by_channels() {
        let cts = default_cts();
        assert_eq!(cts.len(), 12);

        let snapshot = ConfigSnapshot::from_records(&[], &default_channels(), &cts);
        assert_eq!(snapshot.cts_pct("Nepal", "E-Com"), 0.19);
        assert_eq!(snapshot.cts_pct("UAE", "Rx/Clinic"), 0.17);
        assert_eq!(snapshot.channel_weight("MT"), 0.3);
        assert_eq!(snapshot.base_units_per_month("GT"), 250);
    }

    #[test]
    fn component_split_follows_channel_rules() {
        let ecom = default_cts_components("E-Com");
        assert_eq!(ecom.commission_pct, 0.12);
        assert_eq!(ecom.trade_terms_pct, 0.0);
        assert_eq!(ecom.rebates_pct, 0.0);

        let modern_trade = default_cts_components("MT");
        assert_eq!(modern_trade.listing_fees_pct, 0.02);
        assert_eq!(modern_trade.trade_terms_pct, 0.1);
        assert_eq!(modern_trade.promo_accrual_pct, 0.03);

        let clinic = default_cts_components("Rx/Clinic");
        assert_eq!(clinic.trade_terms_pct, 0.08);
        assert_eq!(clinic.rebates_pct, 0.0);
        assert_eq!(default_cts_components("GT").rebates_pct, 0.02);
    }
}
