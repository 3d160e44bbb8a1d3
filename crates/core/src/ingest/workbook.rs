use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::IngestError;

/// One decoded spreadsheet cell. Blank, whitespace-only, and error cells all
/// decode to [`Cell::Empty`].
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Display form used for labels and text fields. Integral numbers render
    /// without a fractional part.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(value) => Some(value.trim().to_string()),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                Some(format!("{}", *value as i64))
            }
            Self::Number(value) => Some(value.to_string()),
            Self::Bool(value) => Some(value.to_string()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::String(text) => Self::text(text.as_str()),
            Data::Float(number) => Self::Number(*number),
            Data::Int(number) => Self::Number(*number as f64),
            Data::Bool(flag) => Self::Bool(*flag),
            other => Self::text(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// Number of rows below `header_row` containing at least one value.
    pub fn data_row_count(&self, header_row: usize) -> usize {
        self.rows
            .iter()
            .skip(header_row + 1)
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .count()
    }
}

/// Every sheet of an uploaded workbook, in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Decodes `.xlsx`, `.xls`, `.xlsb` or `.ods` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IngestError> {
        let mut reader = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|error| IngestError::Workbook(error.to_string()))?;

        let mut sheets = Vec::new();
        for name in reader.sheet_names() {
            let range = reader
                .worksheet_range(&name)
                .map_err(|error| IngestError::Workbook(format!("sheet `{name}`: {error}")))?;
            // Ranges start at the first used cell; pad back to absolute A1 positions.
            let (first_row, first_col) = range.start().unwrap_or((0, 0));
            let mut rows = vec![Vec::new(); first_row as usize];
            rows.extend(range.rows().map(|row| {
                let mut cells = vec![Cell::Empty; first_col as usize];
                cells.extend(row.iter().map(Cell::from));
                cells
            }));
            sheets.push(Sheet::new(name, rows));
        }

        Ok(Self { sheets })
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}
