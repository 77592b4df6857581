//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, Transaction as SqlTransaction, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{Error, database_id::TransactionId, transaction::MonthPeriod};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money that was earned, e.g. a salary.
    Income,
    /// Money that was spent, e.g. rent.
    Expense,
}

impl TransactionKind {
    /// The label used for the kind in the database and in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    /// Parse a kind from user input, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(Error::InvalidKind(s.to_owned())),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,
    /// The amount of money spent or earned, never negative.
    pub amount: f64,
    /// A short label such as "Salary" or "Rent".
    pub category: String,
    /// When the transaction was recorded (UTC, second precision).
    pub timestamp: PrimitiveDateTime,
    /// Whether the transaction has been included in a completed statement export.
    pub exported: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(kind: TransactionKind, amount: f64, category: &str) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount,
            category: category.to_owned(),
            timestamp: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The builder is not validated until it is passed to [create_transaction].
///
/// # Examples
///
/// ```ignore
/// use time::macros::datetime;
///
/// use crate::transaction::{Transaction, TransactionKind};
///
/// let builder = Transaction::build(TransactionKind::Expense, 1500.0, "Rent")
///     .timestamp(datetime!(2025-03-01 09:30:00));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,

    /// The amount of money. Must be finite and zero or greater.
    pub amount: f64,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    ///
    /// Surrounding whitespace is removed before saving, and the remaining
    /// text must not be empty.
    pub category: String,

    /// When the transaction was recorded.
    ///
    /// Defaults to the current UTC time when the transaction is created.
    /// Sub-second precision is discarded.
    pub timestamp: Option<PrimitiveDateTime>,
}

impl TransactionBuilder {
    /// Set the timestamp for the transaction.
    pub fn timestamp(mut self, timestamp: PrimitiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Parse an amount of money typed in by a user.
///
/// Apostrophes used as thousands separators (e.g. `1'800.00`) and
/// surrounding whitespace are ignored.
///
/// # Errors
/// Returns an [Error::InvalidAmount] if the text is not a finite number, or
/// an [Error::NegativeAmount] if the number is negative.
pub fn parse_amount(text: &str) -> Result<f64, Error> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != '\'' && *c != '’')
        .collect();

    let amount: f64 = cleaned
        .parse()
        .map_err(|_| Error::InvalidAmount(text.to_owned()))?;

    if !amount.is_finite() {
        return Err(Error::InvalidAmount(text.to_owned()));
    }

    if amount < 0.0 {
        return Err(Error::NegativeAmount(amount));
    }

    Ok(amount)
}

/// The current UTC time with the sub-second part removed.
pub fn now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    truncate_to_seconds(PrimitiveDateTime::new(now.date(), now.time()))
}

fn truncate_to_seconds(timestamp: PrimitiveDateTime) -> PrimitiveDateTime {
    timestamp.replace_nanosecond(0).unwrap_or(timestamp)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of the transactions table in the order expected by [map_transaction_row].
pub(crate) const TRANSACTION_COLUMNS: &str = "id, type, amount, category, date, exported";

/// The SQL condition for transactions recorded in a [MonthPeriod], with the
/// period's start and end bound to `?1` and `?2`.
///
/// Dates are compared through `datetime` so that timestamps with and without
/// fractional seconds compare equal. The expression is indexed by
/// `idx_transactions_datetime`, see [create_datetime_index].
pub(crate) const PERIOD_FILTER: &str =
    "datetime(date) >= datetime(?1) AND datetime(date) < datetime(?2)";

/// Create a new transaction in the database from a builder.
///
/// New transactions are never exported.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not a finite number,
/// - [Error::NegativeAmount] if the amount is less than zero,
/// - [Error::EmptyCategory] if the category is empty or only whitespace,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !builder.amount.is_finite() {
        return Err(Error::InvalidAmount(builder.amount.to_string()));
    }

    if builder.amount < 0.0 {
        return Err(Error::NegativeAmount(builder.amount));
    }

    let category = builder.category.trim();
    if category.is_empty() {
        return Err(Error::EmptyCategory);
    }

    let timestamp = builder
        .timestamp
        .map(truncate_to_seconds)
        .unwrap_or_else(now_utc);

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO transactions (type, amount, category, date, exported)
             VALUES (?1, ?2, ?3, ?4, 0)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (builder.kind, builder.amount, category, timestamp),
            map_transaction_row,
        )?;

    tracing::debug!(
        "Created transaction {}: {} {:.2} {}",
        transaction.id,
        transaction.kind,
        transaction.amount,
        transaction.category
    );

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve every transaction, ordered by ID.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY id"
        ))?
        .query_map([], map_transaction_row)?
        .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Retrieve the transactions recorded in the calendar month `period`, ordered by ID.
///
/// A transaction belongs to the month if its timestamp is at or after
/// midnight on the first day of the month and before midnight on the first
/// day of the next month.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_in_period(
    period: MonthPeriod,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE {PERIOD_FILTER} ORDER BY id"
        ))?
        .query_map((period.start(), period.end()), map_transaction_row)?
        .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM transactions;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Delete every transaction and restart the ID counter at 1.
///
/// This cannot be undone. Asking the user for confirmation is up to the caller.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// in which case no transactions are deleted.
pub fn reset_ledger(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let deleted = transaction.execute("DELETE FROM transactions", ())?;
    transaction.execute(
        "DELETE FROM sqlite_sequence WHERE name = 'transactions'",
        (),
    )?;

    transaction.commit()?;

    tracing::info!("Deleted {deleted} transactions and reset the ID counter");

    Ok(())
}

/// Create the transactions table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                exported INTEGER NOT NULL DEFAULT 0
                )",
        (),
    )?;

    Ok(())
}

/// Index the transactions by the normalised timestamp used in [PERIOD_FILTER].
///
/// Replaces the plain `date` index of older schemas, which the period
/// filters could not use.
///
/// # Errors
/// Returns an error if the index cannot be created or if there is an SQL error.
pub fn create_datetime_index(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "DROP INDEX IF EXISTS idx_transactions_date;
         CREATE INDEX IF NOT EXISTS idx_transactions_datetime
             ON transactions(datetime(date));",
    )
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let kind = row.get(1)?;
    let amount = row.get(2)?;
    let category = row.get(3)?;
    let timestamp = row.get(4)?;
    let exported = row.get(5)?;

    Ok(Transaction {
        id,
        kind,
        amount,
        category,
        timestamp,
        exported,
    })
}

// ============================================================================
// TESTS
// ============================================================================
