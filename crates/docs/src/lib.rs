//! Reference dataset sources for special-case companies.
//!
//! `SpreadsheetSource` reads the first worksheet of an xlsx/xls/ods workbook, taking the first
//! row as column headers. `InMemoryDocumentSource` serves fixed tables to tests and demos.

pub mod memory;
pub mod spreadsheet;

pub use memory::InMemoryDocumentSource;
pub use spreadsheet::SpreadsheetSource;
