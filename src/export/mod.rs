//! Exporting the ledger.
//!
//! Statements include only the transactions that were never exported and
//! mark them as exported once the statement file has been written. CSV
//! exports always include every transaction.

mod csv_file;
mod endpoints;
mod statement;
mod tracker;

pub use csv_file::{csv_file_name, write_csv_file, write_transactions_csv};
pub use endpoints::{
    export_csv_endpoint, export_statement_endpoint, get_export_page, reset_ledger_endpoint,
};
pub use statement::{statement_file_name, write_statement_file};
pub use tracker::{ExportScope, ExportSelection, commit_export, export_with, select_unexported};
