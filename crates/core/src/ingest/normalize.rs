use tracing::debug;

use super::mapping::{BoundColumns, CanonicalField};
use super::workbook::Cell;
use super::IngestError;
use crate::domain::candidate::{Candidate, MarketFitScores, RiskScores, SkuId, SynergyScores};

/// Turns sheet rows into candidates.
///
/// A row without a SKU id or name is skipped (`Ok(None)`). A present cell that
/// cannot be coerced to its field's type fails the whole upload.
#[derive(Clone, Debug)]
pub struct RowNormalizer {
    columns: BoundColumns,
    default_market: Option<String>,
}

impl RowNormalizer {
    pub fn new(columns: BoundColumns, default_market: Option<String>) -> Self {
        let default_market =
            default_market.map(|market| market.trim().to_string()).filter(|market| !market.is_empty());
        Self { columns, default_market }
    }

    /// `sheet_row` is the zero-based index of the row within its sheet and is
    /// only used for diagnostics.
    pub fn normalize(&self, sheet_row: usize, cells: &[Cell]) -> Result<Option<Candidate>, IngestError> {
        let row = RowView { columns: &self.columns, cells, sheet_row };

        let Some(sku_id) = row.text(CanonicalField::SkuId) else {
            debug!(event_name = "ingest.row.skipped", row = sheet_row + 1, reason = "missing_sku_id");
            return Ok(None);
        };
        let Some(sku_name) = row.text(CanonicalField::SkuName) else {
            debug!(
                event_name = "ingest.row.skipped",
                row = sheet_row + 1,
                sku_id = %sku_id,
                reason = "missing_sku_name"
            );
            return Ok(None);
        };

        let target_market = match &self.default_market {
            Some(market) => Some(market.clone()),
            None => row.text(CanonicalField::TargetMarket),
        };

        Ok(Some(Candidate {
            sku_id: SkuId(sku_id),
            sku_name,
            brand: row.text(CanonicalField::Brand),
            category: row.text(CanonicalField::Category).unwrap_or_default(),
            target_market,
            primary_channel: row.text(CanonicalField::PrimaryChannel),
            ramp_month: row.integer(CanonicalField::RampMonth)?,
            regulatory_eligible: row.flag(CanonicalField::RegulatoryEligible),
            regulatory_prohibition: row.flag(CanonicalField::RegulatoryProhibition),
            ip_risk_high: Some(row.flag(CanonicalField::IpRiskHigh).unwrap_or(false)),
            supply_ready: row.flag(CanonicalField::SupplyReady),
            moq: row.integer(CanonicalField::Moq)?,
            lead_time_days: row.integer(CanonicalField::LeadTimeDays)?,
            shelf_life_months: row.integer(CanonicalField::ShelfLifeMonths)?,
            local_list_price: row.float(CanonicalField::LocalListPrice)?,
            landed_cost: row.float(CanonicalField::LandedCost)?,
            market_fit: MarketFitScores {
                consumer_trend: row.integer(CanonicalField::ConsumerTrend)?,
                point_of_diff: row.integer(CanonicalField::PointOfDiff)?,
                channel_suitability: row.integer(CanonicalField::ChannelSuitability)?,
                strategic_role: row.integer(CanonicalField::StrategicRole)?,
                marketing_leverage: row.integer(CanonicalField::MarketingLeverage)?,
            },
            synergy: SynergyScores {
                price_ladder: row.integer(CanonicalField::PriceLadder)?,
                usage_occasion: row.integer(CanonicalField::UsageOccasion)?,
                channel_diff: row.integer(CanonicalField::ChannelDiff)?,
                story_cohesion: row.integer(CanonicalField::StoryCohesion)?,
                operational_synergy: row.integer(CanonicalField::OperationalSynergy)?,
            },
            risk: RiskScores {
                regulatory_delay: row.integer(CanonicalField::RegulatoryDelay)?,
                retail_listing: row.integer(CanonicalField::RetailListing)?,
                competitive: row.integer(CanonicalField::Competitive)?,
                supply_chain: row.integer(CanonicalField::SupplyChain)?,
                price_war: row.integer(CanonicalField::PriceWar)?,
            },
            pass_portfolio_balance: row.flag(CanonicalField::PortfolioBalance),
            suggested_launch_wave: row.text(CanonicalField::SuggestedLaunchWave),
        }))
    }
}

struct RowView<'a> {
    columns: &'a BoundColumns,
    cells: &'a [Cell],
    sheet_row: usize,
}

impl RowView<'_> {
    fn cell(&self, field: CanonicalField) -> &Cell {
        self.columns
            .index(field)
            .and_then(|index| self.cells.get(index))
            .unwrap_or(&Cell::Empty)
    }

    fn text(&self, field: CanonicalField) -> Option<String> {
        self.cell(field).render()
    }

    /// Case-insensitive match against "yes"; blank is `None`.
    fn flag(&self, field: CanonicalField) -> Option<bool> {
        self.cell(field).render().map(|value| value.eq_ignore_ascii_case("yes"))
    }

    fn integer(&self, field: CanonicalField) -> Result<Option<i64>, IngestError> {
        match self.cell(field) {
            Cell::Empty => Ok(None),
            Cell::Number(value) if value.is_finite() => Ok(Some(value.trunc() as i64)),
            Cell::Text(value) => match value.trim().parse::<i64>() {
                Ok(parsed) => Ok(Some(parsed)),
                Err(_) => Err(self.invalid(field, "integer")),
            },
            _ => Err(self.invalid(field, "integer")),
        }
    }

    fn float(&self, field: CanonicalField) -> Result<Option<f64>, IngestError> {
        match self.cell(field) {
            Cell::Empty => Ok(None),
            Cell::Number(value) => Ok(Some(*value)),
            Cell::Text(value) => match value.trim().parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
                _ => Err(self.invalid(field, "number")),
            },
            Cell::Bool(_) => Err(self.invalid(field, "number")),
        }
    }

    fn invalid(&self, field: CanonicalField, expected: &'static str) -> IngestError {
        IngestError::InvalidCell {
            row: self.sheet_row + 1,
            column: self.columns.label(field).to_string(),
            value: self.cell(field).render().unwrap_or_default(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RowNormalizer;
    use crate::ingest::mapping::{CanonicalField, ColumnMapper};
    use crate::ingest::workbook::Cell;
    use crate::ingest::IngestError;

    fn normalizer(labels: &[&str], default_market: Option<&str>) -> RowNormalizer {
        let headers = labels.iter().map(|label| label.to_string()).collect::<Vec<_>>();
        RowNormalizer::new(ColumnMapper::default().bind(&headers), default_market.map(str::to_string))
    }

    #[test]
    fn skips_rows_without_identity() {
        let normalizer = normalizer(&["SKU ID", "SKU Name"], None);

        let missing_id = normalizer
            .normalize(4, &[Cell::Empty, Cell::text("Night Cream")])
            .expect("skip is not an error");
        assert!(missing_id.is_none());

        let missing_name =
            normalizer.normalize(5, &[Cell::text("SKU-1")]).expect("skip is not an error");
        assert!(missing_name.is_none());
    }

    #[test]
    fn skips_every_row_when_identity_columns_are_absent() {
        let normalizer = normalizer(&["Code", "Title"], None);
        let row = normalizer
            .normalize(1, &[Cell::text("SKU-1"), Cell::text("Serum")])
            .expect("skip is not an error");
        assert!(row.is_none());
    }

    #[test]
    fn blank_cells_are_absent_not_zero() {
        let normalizer = normalizer(
            &["SKU ID", "SKU Name", "MOQ", "Landed Cost (calc)", "Supply Ready", "IP Risk High"],
            None,
        );
        let candidate = normalizer
            .normalize(1, &[Cell::Number(1001.0), Cell::text("Serum")])
            .expect("row should normalize")
            .expect("row should not be skipped");

        assert_eq!(candidate.sku_id.as_str(), "1001");
        assert_eq!(candidate.category, "");
        assert_eq!(candidate.moq, None);
        assert_eq!(candidate.landed_cost, None);
        assert_eq!(candidate.supply_ready, None);
        assert_eq!(candidate.ip_risk_high, Some(false));
        assert_eq!(candidate.brand, None);
    }

    #[test]
    fn coerces_typed_cells() {
        let normalizer = normalizer(
            &[
                "SKU ID",
                "SKU Name",
                "Regulatory Eligible",
                "Regulatory Prohibition",
                "MOQ",
                "Local List Price (calc)",
                "Consumer Trend",
                "Price War",
            ],
            None,
        );
        let candidate = normalizer
            .normalize(
                2,
                &[
                    Cell::text("SKU-7"),
                    Cell::text("Lip Balm"),
                    Cell::text("YES"),
                    Cell::text("No"),
                    Cell::text(" 250 "),
                    Cell::text("12.5"),
                    Cell::Number(4.9),
                    Cell::Number(2.0),
                ],
            )
            .expect("row should normalize")
            .expect("row should not be skipped");

        assert_eq!(candidate.regulatory_eligible, Some(true));
        assert_eq!(candidate.regulatory_prohibition, Some(false));
        assert_eq!(candidate.moq, Some(250));
        assert_eq!(candidate.local_list_price, Some(12.5));
        assert_eq!(candidate.market_fit.consumer_trend, Some(4));
        assert_eq!(candidate.risk.price_war, Some(2));
    }

    #[test]
    fn unparseable_numeric_cell_fails_the_upload() {
        let normalizer = normalizer(&["SKU ID", "SKU Name", "Lead Time (days)"], None);
        let error = normalizer
            .normalize(6, &[Cell::text("SKU-9"), Cell::text("Mask"), Cell::text("about 30")])
            .expect_err("text lead time should fail");

        assert_eq!(
            error,
            IngestError::InvalidCell {
                row: 7,
                column: "Lead Time (days)".to_string(),
                value: "about 30".to_string(),
                expected: "integer",
            }
        );
    }

    #[test]
    fn default_market_overrides_every_row() {
        let normalizer = normalizer(&["SKU ID", "SKU Name", "Target Market"], Some("Nepal"));
        let candidate = normalizer
            .normalize(1, &[Cell::text("SKU-1"), Cell::text("Serum"), Cell::text("India")])
            .expect("row should normalize")
            .expect("row should not be skipped");
        assert_eq!(candidate.target_market.as_deref(), Some("Nepal"));

        let blank_default = super::RowNormalizer::new(
            ColumnMapper::default().bind(&["SKU ID".to_string(), "SKU Name".to_string()]),
            Some("  ".to_string()),
        );
        let candidate = blank_default
            .normalize(1, &[Cell::text("SKU-2"), Cell::text("Toner")])
            .expect("row should normalize")
            .expect("row should not be skipped");
        assert_eq!(candidate.target_market, None);
    }

    #[test]
    fn reads_from_overridden_column() {
        let headers = vec!["Item".to_string(), "Description".to_string()];
        let mapping = crate::ingest::mapping::ColumnMapping::from_json(
            r#"{"SKU ID": "Item", "SKU Name": "Description"}"#,
        )
        .expect("mapping parses");
        let bound = ColumnMapper::new(mapping).bind(&headers);
        assert_eq!(bound.index(CanonicalField::SkuName), Some(1));

        let candidate = RowNormalizer::new(bound, None)
            .normalize(1, &[Cell::text("A-1"), Cell::text("Face Wash")])
            .expect("row should normalize")
            .expect("row should not be skipped");
        assert_eq!(candidate.sku_name, "Face Wash");
    }
}
