//! Spreadsheet ingestion: workbook decoding, candidate sheet and header
//! discovery, column mapping, and row normalization.
//!
//! Nothing here touches the database. [`parse_upload`] turns raw bytes into a
//! [`ParsedUpload`] that the persistence layer replaces the candidate set with.

pub mod header;
pub mod mapping;
pub mod normalize;
pub mod workbook;

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::candidate::Candidate;

pub use header::{HeaderResolver, ResolvedSheet, GENERIC_SHEET, SHORTLIST_SHEET};
pub use mapping::{CanonicalField, ColumnMapper, ColumnMapping};
pub use normalize::RowNormalizer;
pub use workbook::{Cell, Sheet, Workbook};

pub const SETTINGS_SHEET: &str = "SETTINGS";
pub const SCENARIO_SETUP_SHEET: &str = "SCENARIO_SETUP";
pub const CTS_COMPONENTS_SHEET: &str = "CTS_Components";

/// Failures that abort a whole upload. Rows missing their identity are not
/// errors; they are skipped and counted.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("workbook could not be read: {0}")]
    Workbook(String),
    #[error("no valid candidate sheet found (sheets: {})", sheets.join(", "))]
    NoCandidateSheet { sheets: Vec<String> },
    #[error("row {row}, column `{column}`: expected {expected}, found `{value}`")]
    InvalidCell { row: usize, column: String, value: String, expected: &'static str },
    #[error("row {row}: duplicate SKU id `{sku_id}`")]
    DuplicateSku { row: usize, sku_id: String },
    #[error("column mapping is not a JSON object of strings: {0}")]
    InvalidMapping(String),
}

#[derive(Clone, Debug, Default)]
pub struct IngestOptions {
    pub mapping: ColumnMapping,
    pub default_market: Option<String>,
}

/// Candidates and auxiliary counts read from one workbook.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedUpload {
    pub sheet_name: String,
    pub header_row: usize,
    pub candidates: Vec<Candidate>,
    pub skipped_rows: usize,
    pub settings_rows: usize,
    pub channel_rows: usize,
    pub cts_rows: usize,
}

/// Column labels of the candidate sheet's header row, in sheet order.
pub fn extract_headers(bytes: &[u8]) -> Result<Vec<String>, IngestError> {
    let workbook = Workbook::from_bytes(bytes)?;
    Ok(HeaderResolver::resolve(&workbook)?.into_headers())
}

pub fn parse_upload(bytes: &[u8], options: &IngestOptions) -> Result<ParsedUpload, IngestError> {
    let workbook = Workbook::from_bytes(bytes)?;
    parse_workbook(&workbook, options)
}

pub fn parse_workbook(
    workbook: &Workbook,
    options: &IngestOptions,
) -> Result<ParsedUpload, IngestError> {
    let resolved = HeaderResolver::resolve(workbook)?;
    info!(
        event_name = "ingest.sheet.resolved",
        sheet = resolved.sheet_name(),
        header_row = resolved.header_row() + 1,
        columns = resolved.headers().len(),
        "candidate sheet resolved"
    );

    let columns = ColumnMapper::new(options.mapping.clone()).bind(resolved.headers());
    let normalizer = RowNormalizer::new(columns, options.default_market.clone());

    let mut candidates = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut skipped_rows = 0;
    for (index, cells) in resolved.data_rows() {
        match normalizer.normalize(index, cells)? {
            Some(candidate) => {
                if seen.insert(candidate.sku_id.0.clone(), index).is_some() {
                    return Err(IngestError::DuplicateSku {
                        row: index + 1,
                        sku_id: candidate.sku_id.0,
                    });
                }
                candidates.push(candidate);
            }
            None => skipped_rows += 1,
        }
    }

    let upload = ParsedUpload {
        sheet_name: resolved.sheet_name().to_string(),
        header_row: resolved.header_row(),
        candidates,
        skipped_rows,
        settings_rows: auxiliary_rows(workbook, SETTINGS_SHEET),
        channel_rows: auxiliary_rows(workbook, SCENARIO_SETUP_SHEET),
        cts_rows: auxiliary_rows(workbook, CTS_COMPONENTS_SHEET),
    };
    debug!(
        event_name = "ingest.parse.completed",
        candidates = upload.candidates.len(),
        skipped_rows = upload.skipped_rows,
        settings_rows = upload.settings_rows,
        channel_rows = upload.channel_rows,
        cts_rows = upload.cts_rows,
    );
    Ok(upload)
}

fn auxiliary_rows(workbook: &Workbook, name: &str) -> usize {
    workbook.sheet(name).map(|sheet| sheet.data_row_count(0)).unwrap_or(0)
}
