//! Locates the candidate sheet and its header row.
//!
//! Header detection is a best-effort heuristic: the first row whose text
//! contains any of [`HEADER_TOKENS`] (case-insensitive) is the header. When no
//! row matches, row 0 is used.

use super::workbook::{Cell, Sheet, Workbook};
use super::IngestError;

pub const SHORTLIST_SHEET: &str = "SKUs Shortlist";
pub const GENERIC_SHEET: &str = "Sheet1";
pub const HEADER_TOKENS: [&str; 3] = ["sku", "name", "category"];

/// Candidate sheet with its header row resolved.
#[derive(Clone, Debug)]
pub struct ResolvedSheet<'a> {
    sheet: &'a Sheet,
    header_row: usize,
    headers: Vec<String>,
}

impl<'a> ResolvedSheet<'a> {
    pub fn sheet_name(&self) -> &str {
        &self.sheet.name
    }

    /// Zero-based index of the header row within the sheet.
    pub fn header_row(&self) -> usize {
        self.header_row
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn into_headers(self) -> Vec<String> {
        self.headers
    }

    /// Rows below the header, paired with their zero-based sheet index.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &'a [Cell])> + 'a {
        let start = self.header_row + 1;
        self.sheet.rows.iter().enumerate().skip(start).map(|(index, row)| (index, row.as_slice()))
    }
}

pub struct HeaderResolver;

impl HeaderResolver {
    pub fn resolve(workbook: &Workbook) -> Result<ResolvedSheet<'_>, IngestError> {
        let sheet = Self::select_sheet(workbook)?;
        let header_row = Self::detect_header_row(sheet);
        let headers = Self::header_labels(sheet, header_row);
        Ok(ResolvedSheet { sheet, header_row, headers })
    }

    /// Shortlist sheet, then the generic first sheet, then a lone sheet.
    pub fn select_sheet(workbook: &Workbook) -> Result<&Sheet, IngestError> {
        if let Some(sheet) = workbook.sheet(SHORTLIST_SHEET) {
            return Ok(sheet);
        }
        if let Some(sheet) = workbook.sheet(GENERIC_SHEET) {
            return Ok(sheet);
        }
        match workbook.sheets.as_slice() {
            [only] => Ok(only),
            sheets => Err(IngestError::NoCandidateSheet {
                sheets: sheets.iter().map(|sheet| sheet.name.clone()).collect(),
            }),
        }
    }

    pub fn detect_header_row(sheet: &Sheet) -> usize {
        sheet
            .rows
            .iter()
            .position(|row| {
                let flattened = row
                    .iter()
                    .filter_map(Cell::render)
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                HEADER_TOKENS.iter().any(|token| flattened.contains(token))
            })
            .unwrap_or(0)
    }

    /// Trimmed header labels. Blank header cells are labelled `Unnamed: <index>`
    /// so every column stays addressable by a mapping.
    pub fn header_labels(sheet: &Sheet, header_row: usize) -> Vec<String> {
        let width = sheet.rows.iter().skip(header_row).map(Vec::len).max().unwrap_or(0);
        let header = sheet.rows.get(header_row).map(Vec::as_slice).unwrap_or(&[]);

        (0..width)
            .map(|index| {
                header
                    .get(index)
                    .and_then(Cell::render)
                    .unwrap_or_else(|| format!("Unnamed: {index}"))
            })
            .collect()
    }
}
