//! SheetTable - Metric Deriver output, Sheet Publisher input

use serde::{Serialize, Serializer};

use crate::{ColumnFormat, PartnerKind};

/// One output cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Empty,
}

impl CellValue {
    /// Text cell; an empty string becomes `Empty`
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map(Self::Number).unwrap_or(Self::Empty)
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(Self::text).unwrap_or(Self::Empty)
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Empty => serializer.serialize_str(""),
        }
    }
}

/// Ordered cells aligned with a partner's header row
pub type OutputRow = Vec<CellValue>;

/// Complete content for one destination sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetTable {
    /// Destination sheet name
    pub sheet_name: String,

    /// Partner keyword the table was built for
    pub partner_keyword: String,

    /// Header row
    pub headers: Vec<String>,

    /// Data rows, each `headers.len()` cells long
    pub rows: Vec<OutputRow>,

    /// Number formats to apply to the data rows
    pub formats: Vec<ColumnFormat>,
}

impl SheetTable {
    /// Build a table with the header row and formats of `kind`
    pub fn new(
        sheet_name: impl Into<String>,
        partner_keyword: impl Into<String>,
        kind: PartnerKind,
        rows: Vec<OutputRow>,
    ) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            partner_keyword: partner_keyword.into(),
            headers: kind.headers(),
            rows,
            formats: kind.column_formats(),
        }
    }

    /// Header + data rows, as written to the destination
    pub fn values(&self) -> Vec<Vec<CellValue>> {
        std::iter::once(self.headers.iter().cloned().map(CellValue::text).collect())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// Number of cells including the header row
    pub fn cell_count(&self) -> usize {
        self.headers.len() + self.rows.iter().map(Vec::len).sum::<usize>()
    }
}

/// Result of publishing one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Cells written, as reported by the destination
    pub updated_cells: usize,
}
