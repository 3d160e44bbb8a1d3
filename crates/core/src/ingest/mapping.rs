use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::IngestError;

/// Candidate fields addressable from a spreadsheet column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    SkuId,
    SkuName,
    Brand,
    Category,
    TargetMarket,
    PrimaryChannel,
    RampMonth,
    RegulatoryEligible,
    RegulatoryProhibition,
    IpRiskHigh,
    SupplyReady,
    Moq,
    LeadTimeDays,
    ShelfLifeMonths,
    LocalListPrice,
    LandedCost,
    ConsumerTrend,
    PointOfDiff,
    ChannelSuitability,
    StrategicRole,
    MarketingLeverage,
    PriceLadder,
    UsageOccasion,
    ChannelDiff,
    StoryCohesion,
    OperationalSynergy,
    RegulatoryDelay,
    RetailListing,
    Competitive,
    SupplyChain,
    PriceWar,
    PortfolioBalance,
    SuggestedLaunchWave,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 33] = [
        Self::SkuId,
        Self::SkuName,
        Self::Brand,
        Self::Category,
        Self::TargetMarket,
        Self::PrimaryChannel,
        Self::RampMonth,
        Self::RegulatoryEligible,
        Self::RegulatoryProhibition,
        Self::IpRiskHigh,
        Self::SupplyReady,
        Self::Moq,
        Self::LeadTimeDays,
        Self::ShelfLifeMonths,
        Self::LocalListPrice,
        Self::LandedCost,
        Self::ConsumerTrend,
        Self::PointOfDiff,
        Self::ChannelSuitability,
        Self::StrategicRole,
        Self::MarketingLeverage,
        Self::PriceLadder,
        Self::UsageOccasion,
        Self::ChannelDiff,
        Self::StoryCohesion,
        Self::OperationalSynergy,
        Self::RegulatoryDelay,
        Self::RetailListing,
        Self::Competitive,
        Self::SupplyChain,
        Self::PriceWar,
        Self::PortfolioBalance,
        Self::SuggestedLaunchWave,
    ];

    /// Column label used when the caller supplies no override.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SkuId => "SKU ID",
            Self::SkuName => "SKU Name",
            Self::Brand => "Brand",
            Self::Category => "Category",
            Self::TargetMarket => "Target Market",
            Self::PrimaryChannel => "Primary Channel",
            Self::RampMonth => "Ramp Month (1-4+)",
            Self::RegulatoryEligible => "Regulatory Eligible",
            Self::RegulatoryProhibition => "Regulatory Prohibition",
            Self::IpRiskHigh => "IP Risk High",
            Self::SupplyReady => "Supply Ready",
            Self::Moq => "MOQ",
            Self::LeadTimeDays => "Lead Time (days)",
            Self::ShelfLifeMonths => "Shelf Life (months)",
            Self::LocalListPrice => "Local List Price (calc)",
            Self::LandedCost => "Landed Cost (calc)",
            Self::ConsumerTrend => "Consumer Trend",
            Self::PointOfDiff => "Point of Diff",
            Self::ChannelSuitability => "Channel Suitability",
            Self::StrategicRole => "Strategic Role",
            Self::MarketingLeverage => "Marketing Leverage",
            Self::PriceLadder => "Price Ladder",
            Self::UsageOccasion => "Usage Occasion",
            Self::ChannelDiff => "Channel Diff",
            Self::StoryCohesion => "Story Cohesion",
            Self::OperationalSynergy => "Operational Synergy",
            Self::RegulatoryDelay => "Regulatory Delay",
            Self::RetailListing => "Retail Listing",
            Self::Competitive => "Competitive",
            Self::SupplyChain => "Supply Chain",
            Self::PriceWar => "Price War",
            Self::PortfolioBalance => "Pass: Portfolio Balance (manual)",
            Self::SuggestedLaunchWave => "Suggested Launch Wave",
        }
    }
}

/// Caller-supplied overrides keyed by canonical label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(pub HashMap<String, String>);

impl ColumnMapping {
    pub fn from_json(raw: &str) -> Result<Self, IngestError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|error| IngestError::InvalidMapping(error.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for ColumnMapping {
    fn from(value: HashMap<String, String>) -> Self {
        Self(value)
    }
}

/// Resolves each canonical field to a column of the header row.
#[derive(Clone, Debug, Default)]
pub struct ColumnMapper {
    mapping: ColumnMapping,
}

impl ColumnMapper {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    /// Label to look up for `field`: the override when one exists, else the
    /// canonical label.
    pub fn column_label<'a>(&'a self, field: CanonicalField) -> &'a str {
        let label = field.label();
        self.mapping.0.get(label).map(String::as_str).unwrap_or(label)
    }

    /// Binds every field to a column index. A label missing from `headers`
    /// leaves the field unbound; duplicate labels bind to the first match.
    pub fn bind(&self, headers: &[String]) -> BoundColumns {
        let columns = CanonicalField::ALL
            .iter()
            .map(|field| {
                let label = self.column_label(*field);
                let index = headers.iter().position(|header| header == label);
                (*field, BoundColumn { label: label.to_string(), index })
            })
            .collect();
        BoundColumns { columns }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundColumn {
    pub label: String,
    pub index: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct BoundColumns {
    columns: HashMap<CanonicalField, BoundColumn>,
}

impl BoundColumns {
    pub fn index(&self, field: CanonicalField) -> Option<usize> {
        self.columns.get(&field).and_then(|column| column.index)
    }

    pub fn label(&self, field: CanonicalField) -> &str {
        self.columns.get(&field).map(|column| column.label.as_str()).unwrap_or(field.label())
    }
}
