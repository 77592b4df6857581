/*! Initialisation of the application's database.

The schema is built up from a versioned list of [migrations](MIGRATIONS).
The version of the last applied migration is kept in SQLite's
`user_version` pragma, so each migration runs at most once per database and
re-initialising an existing database never touches its data.
*/

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    transaction::{create_datetime_index, create_transaction_table},
};

/// An additive schema change.
struct Migration {
    /// The schema version after this migration has been applied.
    version: u32,
    description: &'static str,
    apply: fn(&Connection) -> Result<(), rusqlite::Error>,
}

/// Migrations in the order they must be applied. Only ever append to this list.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create the transactions table",
        apply: create_transaction_table,
    },
    Migration {
        version: 2,
        description: "add the exported flag to transactions",
        apply: add_exported_column,
    },
    Migration {
        version: 3,
        description: "rename the kinds of transactions recorded by the Python ledger",
        apply: rename_legacy_kinds,
    },
    Migration {
        version: 4,
        description: "index transactions by their normalised timestamp",
        apply: create_datetime_index,
    },
];

/// Create or upgrade the schema of the application database.
///
/// All pending migrations are applied inside one exclusive transaction, so
/// the database is either fully upgraded or left as it was.
///
/// # Errors
/// Returns an [Error::SqlError] if a migration fails.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    let current_version: u32 =
        transaction.pragma_query_value(None, "user_version", |row| row.get(0))?;

    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        tracing::info!(
            "Applying migration {}: {}",
            migration.version,
            migration.description
        );
        (migration.apply)(&transaction)?;
        transaction.pragma_update(None, "user_version", migration.version)?;
    }

    transaction.commit()?;

    Ok(())
}

/// Add the `exported` column to a transactions table that predates it.
///
/// Tables created by [create_transaction_table] already have the column, in
/// which case this is a no-op.
fn add_exported_column(connection: &Connection) -> Result<(), rusqlite::Error> {
    let has_exported_column = connection
        .prepare("SELECT 1 FROM pragma_table_info('transactions') WHERE name = 'exported'")?
        .exists([])?;

    if !has_exported_column {
        connection.execute(
            "ALTER TABLE transactions ADD COLUMN exported INTEGER NOT NULL DEFAULT 0",
            (),
        )?;
    }

    Ok(())
}

/// Rename the `Einnahme` and `Ausgabe` kinds written by the Python ledger
/// to `Income` and `Expense`.
fn rename_legacy_kinds(connection: &Connection) -> Result<(), rusqlite::Error> {
    let incomes = connection.execute(
        "UPDATE transactions SET type = 'Income' WHERE type = 'Einnahme'",
        (),
    )?;
    let expenses = connection.execute(
        "UPDATE transactions SET type = 'Expense' WHERE type = 'Ausgabe'",
        (),
    )?;

    if incomes + expenses > 0 {
        tracing::info!("Renamed the kinds of {incomes} incomes and {expenses} expenses");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        export::{ExportScope, select_unexported},
        transaction::{
            PERIOD_FILTER, TRANSACTION_COLUMNS, Transaction, TransactionKind, create_transaction,
            get_all_transactions, get_balance, sum_by_kind,
        },
    };

    const LATEST_VERSION: u32 = 4;

    fn get_schema_version(conn: &Connection) -> u32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    /// Create the table layout of the Python ledger, before it had an exported flag.
    fn create_legacy_table(conn: &Connection) {
        conn.execute(
            "CREATE TABLE transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .unwrap();
    }

    fn get_query_plan(sql: &str, conn: &Connection) -> String {
        conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))
            .unwrap()
            .query_map(
                (
                    datetime!(2025-03-01 00:00:00),
                    datetime!(2025-04-01 00:00:00),
                ),
                |row| row.get::<_, String>(3),
            )
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .join("\n")
    }

    fn index_exists(name: &str, conn: &Connection) -> bool {
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1")
            .unwrap()
            .exists([name])
            .unwrap()
    }

    #[test]
    fn initialize_applies_all_migrations() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();

        assert_eq!(get_schema_version(&conn), LATEST_VERSION);
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_transaction(
            Transaction::build(TransactionKind::Income, 1000.0, "Salary"),
            &conn,
        )
        .unwrap();

        initialize(&conn).unwrap();

        assert_eq!(get_schema_version(&conn), LATEST_VERSION);
        assert_eq!(get_all_transactions(&conn).unwrap().len(), 1);
    }

    #[test]
    fn adds_exported_column_to_legacy_table() {
        let conn = Connection::open_in_memory().unwrap();
        create_legacy_table(&conn);
        conn.execute(
            "INSERT INTO transactions (type, amount, category, date)
             VALUES ('Expense', 80.0, 'Power', '2025-03-02 08:15:00')",
            (),
        )
        .unwrap();

        initialize(&conn).unwrap();

        let transactions = get_all_transactions(&conn).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].category, "Power");
        assert_eq!(transactions[0].timestamp, datetime!(2025-03-02 08:15:00));
        assert!(!transactions[0].exported);
    }

    #[test]
    fn renames_kinds_of_legacy_transactions() {
        let conn = Connection::open_in_memory().unwrap();
        create_legacy_table(&conn);
        conn.execute_batch(
            "INSERT INTO transactions (type, amount, category, date)
                 VALUES ('Einnahme', 1000.0, 'Lohn', '2025-03-01 09:00:00');
             INSERT INTO transactions (type, amount, category, date)
                 VALUES ('Ausgabe', 200.0, 'Miete', '2025-03-02 09:00:00');",
        )
        .unwrap();

        initialize(&conn).unwrap();

        let transactions = get_all_transactions(&conn).unwrap();
        let kinds: Vec<_> = transactions
            .iter()
            .map(|transaction| (transaction.kind, transaction.category.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TransactionKind::Income, "Lohn"),
                (TransactionKind::Expense, "Miete"),
            ]
        );
        assert_eq!(sum_by_kind(TransactionKind::Income, &conn), Ok(1000.0));
        assert_eq!(get_balance(&conn), Ok(800.0));
        let selection = select_unexported(ExportScope::All, &conn).unwrap();
        assert_eq!(selection.incomes.len(), 1);
        assert_eq!(selection.expenses.len(), 1);
    }

    #[test]
    fn period_filters_use_datetime_index() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let list_plan = get_query_plan(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE {PERIOD_FILTER} ORDER BY id"),
            &conn,
        );
        let export_plan = get_query_plan(
            &format!("UPDATE transactions SET exported = 1 WHERE exported = 0 AND {PERIOD_FILTER}"),
            &conn,
        );

        assert!(list_plan.contains("idx_transactions_datetime"), "got {list_plan}");
        assert!(export_plan.contains("idx_transactions_datetime"), "got {export_plan}");
    }

    #[test]
    fn replaces_plain_date_index_of_older_schema() {
        let conn = Connection::open_in_memory().unwrap();
        create_legacy_table(&conn);
        conn.execute_batch(
            "ALTER TABLE transactions ADD COLUMN exported INTEGER NOT NULL DEFAULT 0;
             CREATE INDEX idx_transactions_date ON transactions(date);
             PRAGMA user_version = 2;",
        )
        .unwrap();

        initialize(&conn).unwrap();

        assert!(!index_exists("idx_transactions_date", &conn));
        assert!(index_exists("idx_transactions_datetime", &conn));
    }

    #[test]
    fn data_persists_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ledger.db");

        {
            let conn = Connection::open(&db_path).unwrap();
            initialize(&conn).unwrap();
            create_transaction(
                Transaction::build(TransactionKind::Expense, 200.0, "Rent"),
                &conn,
            )
            .unwrap();
        }

        let conn = Connection::open(&db_path).unwrap();
        initialize(&conn).unwrap();

        let transactions = get_all_transactions(&conn).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].category, "Rent");
    }
}
