//! Tracks which transactions have been included in a completed statement.
//!
//! A statement export is a three step sequence: select the unexported
//! transactions in scope, produce the statement from exactly that snapshot,
//! then mark the snapshot as exported. [export_with] runs all three steps in
//! one immediate SQL transaction, so a statement that fails to be produced
//! leaves every transaction unexported and the export can be retried.

use std::fmt::Display;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior, params_from_iter};
use time::PrimitiveDateTime;

use crate::{
    Error,
    transaction::{
        MonthPeriod, PERIOD_FILTER, TRANSACTION_COLUMNS, Transaction, TransactionKind,
        map_transaction_row,
    },
};

/// Which transactions an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    /// Every transaction in the ledger.
    All,
    /// Only the transactions recorded in one calendar month.
    Month(MonthPeriod),
}

impl ExportScope {
    /// Build a scope from an optional year and month, e.g. from a form.
    ///
    /// Neither means [ExportScope::All].
    ///
    /// # Errors
    /// Returns an [Error::IncompletePeriod] if only one of them is given, or
    /// an [Error::InvalidPeriod] if they do not form a valid month.
    pub fn from_parts(year: Option<i32>, month: Option<u8>) -> Result<Self, Error> {
        Ok(match MonthPeriod::from_parts(year, month)? {
            Some(period) => ExportScope::Month(period),
            None => ExportScope::All,
        })
    }

    /// The SQL condition and its parameters that select the unexported
    /// transactions in scope.
    fn unexported_filter(&self) -> (String, Vec<PrimitiveDateTime>) {
        match self {
            ExportScope::All => ("exported = 0".to_owned(), vec![]),
            ExportScope::Month(period) => (
                format!("exported = 0 AND {PERIOD_FILTER}"),
                vec![period.start(), period.end()],
            ),
        }
    }
}

impl Display for ExportScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportScope::All => f.write_str("all transactions"),
            ExportScope::Month(period) => write!(f, "{period}"),
        }
    }
}

/// The unexported transactions in a scope, split by kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSelection {
    /// The scope the transactions were selected with.
    pub scope: ExportScope,
    /// The unexported incomes, ordered by ID.
    pub incomes: Vec<Transaction>,
    /// The unexported expenses, ordered by ID.
    pub expenses: Vec<Transaction>,
}

impl ExportSelection {
    /// Whether there is nothing to export.
    pub fn is_empty(&self) -> bool {
        self.incomes.is_empty() && self.expenses.is_empty()
    }

    /// The number of selected transactions.
    pub fn len(&self) -> usize {
        self.incomes.len() + self.expenses.len()
    }

    /// The sum of the selected incomes.
    pub fn total_income(&self) -> f64 {
        self.incomes.iter().map(|transaction| transaction.amount).sum()
    }

    /// The sum of the selected expenses.
    pub fn total_expenses(&self) -> f64 {
        self.expenses.iter().map(|transaction| transaction.amount).sum()
    }

    /// The selected incomes minus the selected expenses.
    pub fn balance(&self) -> f64 {
        self.total_income() - self.total_expenses()
    }
}

fn query_unexported(scope: ExportScope, connection: &Connection) -> Result<ExportSelection, Error> {
    let (filter, params) = scope.unexported_filter();

    let transactions = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE {filter} ORDER BY id"
        ))?
        .query_map(params_from_iter(params), map_transaction_row)?
        .collect::<Result<Vec<Transaction>, rusqlite::Error>>()?;

    let (incomes, expenses) = transactions
        .into_iter()
        .partition(|transaction| transaction.kind == TransactionKind::Income);

    Ok(ExportSelection {
        scope,
        incomes,
        expenses,
    })
}

fn mark_exported(scope: ExportScope, connection: &Connection) -> Result<usize, Error> {
    let (filter, params) = scope.unexported_filter();

    connection
        .execute(
            &format!("UPDATE transactions SET exported = 1 WHERE {filter}"),
            params_from_iter(params),
        )
        .map_err(Error::from)
}

/// Get the transactions in `scope` that have not been exported yet.
///
/// This only reads the database, so calling it repeatedly without a
/// [commit_export] in between gives the same selection.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn select_unexported(
    scope: ExportScope,
    connection: &Connection,
) -> Result<ExportSelection, Error> {
    query_unexported(scope, connection)
}

/// Mark every unexported transaction in `scope` as exported and return how
/// many were marked.
///
/// Only call this after the statement built from [select_unexported] with
/// the same scope has been written in full. Prefer [export_with], which
/// enforces that order.
///
/// Returns 0 if there was nothing to mark.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// in which case no transactions are marked.
pub fn commit_export(scope: ExportScope, connection: &Connection) -> Result<usize, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let count = mark_exported(scope, &transaction)?;
    transaction.commit()?;

    tracing::info!("Marked {count} transactions in {scope} as exported");

    Ok(count)
}

/// Select the unexported transactions in `scope`, pass them to `produce` and
/// mark them as exported if, and only if, `produce` succeeds.
///
/// Returns `Ok(None)` without calling `produce` if there is nothing to
/// export. The database is locked for writing from the selection until the
/// transactions are marked, so the marked transactions are exactly the ones
/// `produce` was given.
///
/// # Errors
/// Returns the error from `produce` if it fails, or an [Error::SqlError] if
/// there is an SQL error. In both cases no transactions are marked.
pub fn export_with<T, F>(
    scope: ExportScope,
    connection: &Connection,
    produce: F,
) -> Result<Option<T>, Error>
where
    F: FnOnce(&ExportSelection) -> Result<T, Error>,
{
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let selection = query_unexported(scope, &transaction)?;

    if selection.is_empty() {
        tracing::info!("Nothing to export for {scope}");
        return Ok(None);
    }

    let output = produce(&selection).inspect_err(|error| {
        tracing::warn!(
            "Export of {} transactions in {scope} failed, none were marked as exported: {error}",
            selection.len()
        )
    })?;

    let count = mark_exported(scope, &transaction)?;
    transaction.commit()?;

    tracing::info!("Exported and marked {count} transactions in {scope}");

    Ok(Some(output))
}
