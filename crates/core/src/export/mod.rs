//! Export documents for shifts, days and fiscal months.
//!
//! A document is a title, a filename, a few summary figures and a list of
//! tables. Turning it into a spreadsheet is up to the [`ExportSink`].

mod builders;
mod document;
mod error;

pub use builders::{day_document, month_document, shift_document};
pub use document::{
    DataBlock, ExportCell, ExportDocument, ExportSink, JsonExportSink, SummaryItem,
};
pub use error::ExportError;
