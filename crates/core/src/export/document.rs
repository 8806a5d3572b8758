//! Export document model and sinks.

use async_trait::async_trait;
use opendal::Operator;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::error::ExportError;

/// One cell of a data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExportCell {
    /// Free text.
    Text(String),
    /// Money, written as a decimal string.
    Amount(#[serde(with = "rust_decimal::serde::str")] Decimal),
    /// Row number or count.
    Count(usize),
}

impl From<&str> for ExportCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ExportCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for ExportCell {
    fn from(value: Decimal) -> Self {
        Self::Amount(value)
    }
}

impl From<usize> for ExportCell {
    fn from(value: usize) -> Self {
        Self::Count(value)
    }
}

/// A headline figure shown above the tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryItem {
    /// Caption.
    pub label: String,
    /// Figure.
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
}

/// A titled table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataBlock {
    /// Table caption.
    pub title: String,
    /// Column headers.
    pub headers: Vec<String>,
    /// Rows, each as wide as the headers.
    pub rows: Vec<Vec<ExportCell>>,
}

/// A report ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Sheet title.
    pub title: String,
    /// Suggested file name, `.xlsx`.
    pub filename: String,
    /// Headline figures.
    pub summary: Vec<SummaryItem>,
    /// Tables.
    pub blocks: Vec<DataBlock>,
}

impl ExportDocument {
    pub(super) fn summary_item(label: &str, value: Decimal) -> SummaryItem {
        SummaryItem {
            label: label.to_string(),
            value,
        }
    }

    pub(super) fn block(title: &str, headers: &[&str], rows: Vec<Vec<ExportCell>>) -> DataBlock {
        DataBlock {
            title: title.to_string(),
            headers: headers.iter().map(ToString::to_string).collect(),
            rows,
        }
    }
}

/// Destination for export documents, such as a spreadsheet writer.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Writes the document.
    async fn deliver(&self, document: &ExportDocument) -> Result<(), ExportError>;
}

/// Writes documents as pretty JSON next to the store, under `exports/`.
pub struct JsonExportSink {
    operator: Operator,
}

impl JsonExportSink {
    /// Create a sink over an OpenDAL operator.
    #[must_use]
    pub const fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Path a document is written to.
    #[must_use]
    pub fn path_for(document: &ExportDocument) -> String {
        let stem = document
            .filename
            .strip_suffix(".xlsx")
            .unwrap_or(&document.filename);
        format!("exports/{stem}.json")
    }
}

#[async_trait]
impl ExportSink for JsonExportSink {
    async fn deliver(&self, document: &ExportDocument) -> Result<(), ExportError> {
        let path = Self::path_for(document);
        let bytes = serde_json::to_vec_pretty(document)?;
        self.operator.write(&path, bytes).await.map(|_| ())?;
        info!(%path, blocks = document.blocks.len(), "export written");
        Ok(())
    }
}
