//! CSV export of the whole ledger.
//!
//! Unlike statements, CSV exports always contain every transaction and do
//! not change the exported flag.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error, TransactionId,
    transaction::{Transaction, TransactionKind, get_all_transactions},
};

const CSV_DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "ID")]
    id: TransactionId,
    #[serde(rename = "Kind")]
    kind: TransactionKind,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Exported")]
    exported: u8,
}

impl<'a> From<&'a Transaction> for CsvRow<'a> {
    fn from(transaction: &'a Transaction) -> Self {
        Self {
            id: transaction.id,
            kind: transaction.kind,
            amount: format!("{:.2}", transaction.amount),
            category: &transaction.category,
            date: transaction
                .timestamp
                .format(CSV_DATE_FORMAT)
                .unwrap_or_else(|_| transaction.timestamp.to_string()),
            exported: transaction.exported.into(),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            Error::ExportIo(error.to_string())
        } else {
            Error::CsvError(error.to_string())
        }
    }
}

/// Write `transactions` as CSV with the header
/// `ID,Kind,Amount,Category,Date,Exported`.
///
/// # Errors
/// Returns an [Error::ExportIo] if `writer` fails, or an [Error::CsvError]
/// if a record cannot be encoded.
pub fn write_transactions_csv<W: Write>(transactions: &[Transaction], writer: W) -> Result<(), Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if transactions.is_empty() {
        // serialize only writes the header along with the first record.
        csv_writer.write_record(["ID", "Kind", "Amount", "Category", "Date", "Exported"])?;
    }

    for transaction in transactions {
        csv_writer.serialize(CsvRow::from(transaction))?;
    }

    csv_writer
        .flush()
        .map_err(|error| Error::ExportIo(error.to_string()))
}

/// The name of the CSV file exported on `date`, e.g. `finance_tracker_2025-03-02.csv`.
pub fn csv_file_name(date: Date) -> String {
    format!("finance_tracker_{date}.csv")
}

/// Write every transaction to a CSV file in `dir` and return its path.
///
/// An existing export from the same day is overwritten.
///
/// # Errors
/// Returns an [Error::ExportIo] if the file cannot be written, an
/// [Error::CsvError] if a record cannot be encoded or an
/// [Error::SqlError] if the transactions cannot be read.
pub fn write_csv_file(connection: &Connection, dir: &Path, today: Date) -> Result<PathBuf, Error> {
    let transactions = get_all_transactions(connection)?;
    let path = dir.join(csv_file_name(today));

    let file = File::create(&path)
        .map_err(|error| Error::ExportIo(format!("{}: {error}", path.display())))?;

    if let Err(error) = write_transactions_csv(&transactions, file) {
        let _ = fs::remove_file(&path);
        return Err(error);
    }

    tracing::info!(
        "Wrote {} transactions to {}",
        transactions.len(),
        path.display()
    );

    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        db::initialize,
        export::{ExportScope, commit_export, csv_file_name, write_csv_file, write_transactions_csv},
        transaction::{Transaction, TransactionKind, create_transaction, get_all_transactions},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn writes_header_and_rows() {
        let conn = get_test_connection();
        create_transaction(
            Transaction::build(TransactionKind::Income, 1000.0, "Salary")
                .timestamp(datetime!(2025-03-01 09:00:00)),
            &conn,
        )
        .unwrap();
        commit_export(ExportScope::All, &conn).unwrap();
        create_transaction(
            Transaction::build(TransactionKind::Expense, 12.5, "Lunch, with team")
                .timestamp(datetime!(2025-03-02 12:30:15)),
            &conn,
        )
        .unwrap();
        let transactions = get_all_transactions(&conn).unwrap();
        let mut buffer = Vec::new();

        write_transactions_csv(&transactions, &mut buffer).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "ID,Kind,Amount,Category,Date,Exported\n\
            1,Income,1000.00,Salary,2025-03-01 09:00:00,1\n\
            2,Expense,12.50,\"Lunch, with team\",2025-03-02 12:30:15,0\n"
        );
    }

    #[test]
    fn empty_ledger_writes_header_only() {
        let mut buffer = Vec::new();

        write_transactions_csv(&[], &mut buffer).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "ID,Kind,Amount,Category,Date,Exported\n"
        );
    }

    #[test]
    fn writes_file_named_after_date_without_marking_exported() {
        let conn = get_test_connection();
        create_transaction(
            Transaction::build(TransactionKind::Expense, 80.0, "Power"),
            &conn,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = write_csv_file(&conn, dir.path(), date!(2025 - 03 - 02)).unwrap();

        assert_eq!(path, dir.path().join("finance_tracker_2025-03-02.csv"));
        assert_eq!(csv_file_name(date!(2025 - 03 - 02)), "finance_tracker_2025-03-02.csv");
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(!get_all_transactions(&conn).unwrap()[0].exported);
    }
}
