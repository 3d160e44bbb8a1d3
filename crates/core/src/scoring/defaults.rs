//! Setting keys read by the scoring engine and their fallback values.
//!
//! A key missing from the settings table always falls back to the value
//! declared here; it is never an error.

pub const CONSUMER_TREND_WEIGHT: &str = "consumer_trend_weight";
pub const POINT_OF_DIFF_WEIGHT: &str = "point_of_diff_weight";
pub const CHANNEL_SUITABILITY_WEIGHT: &str = "channel_suitability_weight";
pub const STRATEGIC_ROLE_WEIGHT: &str = "strategic_role_weight";
pub const MARKETING_LEVERAGE_WEIGHT: &str = "marketing_leverage_weight";

pub const PRICE_LADDER_WEIGHT: &str = "price_ladder_weight";
pub const USAGE_OCCASION_WEIGHT: &str = "usage_occasion_weight";
pub const CHANNEL_DIFF_WEIGHT: &str = "channel_diff_weight";
pub const STORY_COHESION_WEIGHT: &str = "story_cohesion_weight";
pub const OPERATIONAL_SYNERGY_WEIGHT: &str = "operational_synergy_weight";

pub const REGULATORY_DELAY_WEIGHT: &str = "regulatory_delay_weight";
pub const RETAIL_LISTING_WEIGHT: &str = "retail_listing_weight";
pub const COMPETITIVE_WEIGHT: &str = "competitive_weight";
pub const SUPPLY_CHAIN_WEIGHT: &str = "supply_chain_weight";
pub const PRICE_WAR_WEIGHT: &str = "price_war_weight";

pub const GM_FLOOR_PCT: &str = "gm_floor_pct";
pub const LISTING_BREADTH_INDEX: &str = "listing_breadth_index";
pub const LAUNCH_NOW_MIN_SCORE: &str = "launch_now_min_score";
pub const LAUNCH_NOW_MAX_RISK: &str = "launch_now_max_risk";

pub const DEFAULT_LAYER_WEIGHT: f64 = 0.2;
pub const DEFAULT_GM_FLOOR_PCT: f64 = 0.35;
pub const DEFAULT_LISTING_BREADTH_INDEX: f64 = 0.2;
pub const DEFAULT_LAUNCH_NOW_MIN_SCORE: f64 = 4.0;
pub const DEFAULT_LAUNCH_NOW_MAX_RISK: f64 = 2.5;

/// Channel weight used when the candidate's channel has no configuration.
pub const DEFAULT_CHANNEL_WEIGHT: f64 = 1.0;
/// Base volume used when the candidate's channel has no configuration.
pub const DEFAULT_BASE_UNITS_PER_MONTH: i64 = 0;

pub const MARKET_FIT_WEIGHT_KEYS: [&str; 5] = [
    CONSUMER_TREND_WEIGHT,
    POINT_OF_DIFF_WEIGHT,
    CHANNEL_SUITABILITY_WEIGHT,
    STRATEGIC_ROLE_WEIGHT,
    MARKETING_LEVERAGE_WEIGHT,
];

pub const SYNERGY_WEIGHT_KEYS: [&str; 5] = [
    PRICE_LADDER_WEIGHT,
    USAGE_OCCASION_WEIGHT,
    CHANNEL_DIFF_WEIGHT,
    STORY_COHESION_WEIGHT,
    OPERATIONAL_SYNERGY_WEIGHT,
];

pub const RISK_WEIGHT_KEYS: [&str; 5] = [
    REGULATORY_DELAY_WEIGHT,
    RETAIL_LISTING_WEIGHT,
    COMPETITIVE_WEIGHT,
    SUPPLY_CHAIN_WEIGHT,
    PRICE_WAR_WEIGHT,
];
