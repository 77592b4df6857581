//! Printable statements of the unexported transactions.
//!
//! A statement is a standalone HTML document, with its styles inlined so it
//! can be opened and printed without the web server.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use maud::{DOCTYPE, Markup, PreEscaped, html};
use rusqlite::Connection;
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    export::{ExportScope, ExportSelection, export_with},
    html::{format_currency, format_timestamp},
    transaction::Transaction,
};

const FILE_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[day].[month].[year]_[hour]-[minute]-[second]");

const STATEMENT_STYLE: &str = r#"
    body { font-family: Helvetica, Arial, sans-serif; margin: 2.5rem; color: #111827; }
    h1 { font-size: 1.5rem; margin-bottom: 0.25rem; }
    h2 { font-size: 1.1rem; margin-top: 2rem; }
    table { width: 100%; border-collapse: collapse; }
    th, td { text-align: left; padding: 0.3rem 0.5rem; border-bottom: 1px solid #e5e7eb; }
    td.amount, th.amount { text-align: right; }
    tfoot th, tfoot td { font-weight: bold; border-bottom: none; }
    .balance { margin-top: 2rem; font-size: 1.1rem; font-weight: bold; }
    @media print { body { margin: 0; } }
"#;

/// The name of the statement file for `scope`, created at `now`.
///
/// For example `finance_tracker_02.03.2025_08-15-00.html`, or
/// `finance_tracker_03.2025_02.03.2025_08-15-00.html` for March 2025.
pub fn statement_file_name(scope: ExportScope, now: PrimitiveDateTime) -> String {
    let timestamp = now
        .format(FILE_TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| now.to_string().replace([' ', ':'], "_"));

    match scope {
        ExportScope::All => format!("finance_tracker_{timestamp}.html"),
        ExportScope::Month(period) => {
            format!("finance_tracker_{}_{timestamp}.html", period.file_label())
        }
    }
}

fn transaction_section(
    title: &str,
    total_label: &str,
    transactions: &[Transaction],
    total: f64,
) -> Markup {
    html! {
        h2 { (title) }

        table
        {
            thead
            {
                tr
                {
                    th { "ID" }
                    th { "Date" }
                    th { "Category" }
                    th class="amount" { "Amount" }
                }
            }

            tbody
            {
                @for transaction in transactions {
                    tr
                    {
                        td { (transaction.id) }
                        td { (format_timestamp(transaction.timestamp)) }
                        td { (transaction.category) }
                        td class="amount" { (format_currency(transaction.amount)) }
                    }
                }

                @if transactions.is_empty() {
                    tr { td colspan="4" { "None" } }
                }
            }

            tfoot
            {
                tr
                {
                    th colspan="3" { (total_label) }
                    td class="amount" { (format_currency(total)) }
                }
            }
        }
    }
}

/// Render the statement for `selection`.
fn statement_view(selection: &ExportSelection, generated_at: PrimitiveDateTime) -> Markup {
    let title = match selection.scope {
        ExportScope::All => "Statement".to_owned(),
        ExportScope::Month(period) => format!("Statement for {period}"),
    };

    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                title { (title) " - Finance Tracker" }
                style { (PreEscaped(STATEMENT_STYLE)) }
            }

            body
            {
                h1 { (title) }
                p { "Generated on " (format_timestamp(generated_at)) " (UTC)" }

                (transaction_section(
                    "Incomes",
                    "Total income",
                    &selection.incomes,
                    selection.total_income(),
                ))
                (transaction_section(
                    "Expenses",
                    "Total expenses",
                    &selection.expenses,
                    selection.total_expenses(),
                ))

                p class="balance" { "Remaining balance: " (format_currency(selection.balance())) }
            }
        }
    }
}

/// Write a statement of the unexported transactions in `scope` to `dir` and
/// mark them as exported.
///
/// Returns the path of the new file, or `None` if there was nothing to
/// export. If the file cannot be written, any partially written file is
/// removed and no transactions are marked as exported. A file that already
/// exists at the statement's path is left untouched and the export fails.
///
/// # Errors
/// Returns an [Error::ExportIo] if the file cannot be written or an
/// [Error::SqlError] if there is an SQL error.
pub fn write_statement_file(
    scope: ExportScope,
    connection: &Connection,
    dir: &Path,
    now: PrimitiveDateTime,
) -> Result<Option<PathBuf>, Error> {
    export_with(scope, connection, |selection| {
        let path = dir.join(statement_file_name(scope, now));
        let document = statement_view(selection, now).into_string();

        // An existing file holds an earlier statement, so it is never replaced.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|error| Error::ExportIo(format!("{}: {error}", path.display())))?;

        if let Err(error) = file.write_all(document.as_bytes()) {
            let _ = fs::remove_file(&path);
            return Err(Error::ExportIo(format!("{}: {error}", path.display())));
        }

        tracing::info!(
            "Wrote statement of {} transactions to {}",
            selection.len(),
            path.display()
        );

        Ok(path)
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        export::{ExportScope, select_unexported, statement_file_name, write_statement_file},
        transaction::{MonthPeriod, Transaction, TransactionKind, create_transaction},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert(kind: TransactionKind, amount: f64, category: &str, conn: &Connection) {
        create_transaction(
            Transaction::build(kind, amount, category).timestamp(datetime!(2025-03-02 08:15:00)),
            conn,
        )
        .unwrap();
    }

    #[test]
    fn file_names() {
        let now = datetime!(2025-03-02 08:15:09);

        assert_eq!(
            statement_file_name(ExportScope::All, now),
            "finance_tracker_02.03.2025_08-15-09.html"
        );
        assert_eq!(
            statement_file_name(ExportScope::Month(MonthPeriod::new(2025, 3).unwrap()), now),
            "finance_tracker_03.2025_02.03.2025_08-15-09.html"
        );
    }

    #[test]
    fn writes_statement_and_marks_transactions() {
        let conn = get_test_connection();
        insert(TransactionKind::Income, 1000.0, "Salary", &conn);
        insert(TransactionKind::Expense, 200.0, "Rent", &conn);
        let dir = tempfile::tempdir().unwrap();

        let path = write_statement_file(
            ExportScope::All,
            &conn,
            dir.path(),
            datetime!(2025-03-31 18:00:00),
        )
        .unwrap()
        .expect("want a statement file");

        assert_eq!(
            path,
            dir.path().join("finance_tracker_31.03.2025_18-00-00.html")
        );
        let document = Html::parse_document(&fs::read_to_string(&path).unwrap());
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Salary"), "got {text}");
        assert!(text.contains("Rent"), "got {text}");
        assert!(text.contains("CHF 1'000.00"), "got {text}");
        assert!(text.contains("CHF 800.00"), "got {text}");
        let rows = document.select(&Selector::parse("tbody tr").unwrap()).count();
        assert_eq!(rows, 2);
        assert!(select_unexported(ExportScope::All, &conn).unwrap().is_empty());
    }

    #[test]
    fn nothing_to_export_writes_no_file() {
        let conn = get_test_connection();
        let dir = tempfile::tempdir().unwrap();

        let path = write_statement_file(
            ExportScope::All,
            &conn,
            dir.path(),
            datetime!(2025-03-31 18:00:00),
        );

        assert_eq!(path, Ok(None));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_write_keeps_transactions_unexported() {
        let conn = get_test_connection();
        insert(TransactionKind::Income, 1000.0, "Salary", &conn);
        let dir = tempfile::tempdir().unwrap();
        let missing_dir = dir.path().join("missing");

        let result = write_statement_file(
            ExportScope::All,
            &conn,
            &missing_dir,
            datetime!(2025-03-31 18:00:00),
        );

        assert!(matches!(result, Err(Error::ExportIo(_))), "got {result:?}");
        assert_eq!(select_unexported(ExportScope::All, &conn).unwrap().len(), 1);
    }

    #[test]
    fn second_export_in_same_second_keeps_first_statement() {
        let conn = get_test_connection();
        insert(TransactionKind::Income, 1000.0, "Salary", &conn);
        let dir = tempfile::tempdir().unwrap();
        let now = datetime!(2025-03-31 18:00:00);
        let first_path = write_statement_file(ExportScope::All, &conn, dir.path(), now)
            .unwrap()
            .expect("want a statement file");
        insert(TransactionKind::Expense, 4.5, "Coffee", &conn);

        let result = write_statement_file(ExportScope::All, &conn, dir.path(), now);

        assert!(matches!(result, Err(Error::ExportIo(_))), "got {result:?}");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        let first_statement = fs::read_to_string(&first_path).unwrap();
        assert!(first_statement.contains("Salary"), "got {first_statement}");
        assert!(!first_statement.contains("Coffee"), "got {first_statement}");
        let remaining = select_unexported(ExportScope::All, &conn).unwrap();
        assert_eq!(remaining.expenses.len(), 1);
        assert_eq!(remaining.expenses[0].category, "Coffee");
    }
}
