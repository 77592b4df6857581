//! Aggregate queries over the transactions table.

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, transaction::TransactionKind};

/// Get the sum of the amounts of every transaction of `kind`.
///
/// Returns zero if there are no transactions of that kind.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn sum_by_kind(kind: TransactionKind, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM transactions WHERE type = ?1",
            [kind],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the total income minus the total expenses.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_balance(connection: &Connection) -> Result<f64, Error> {
    let income = sum_by_kind(TransactionKind::Income, connection)?;
    let expenses = sum_by_kind(TransactionKind::Expense, connection)?;

    Ok(income - expenses)
}

/// The total amount for one category and kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category the amounts were summed over.
    pub category: String,
    /// Whether the total is income or expenses.
    pub kind: TransactionKind,
    /// The sum of the amounts.
    pub total: f64,
}

/// Get the total amount for each distinct pair of category and kind.
///
/// The totals are ordered by category and then kind. A category that has
/// both income and expenses appears once for each kind.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn sum_by_category_and_kind(connection: &Connection) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT category, type, SUM(amount) FROM transactions
             GROUP BY category, type
             ORDER BY category, type",
        )?
        .query_map([], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                kind: row.get(1)?,
                total: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        transaction::{
            CategoryTotal, Transaction, TransactionKind, create_transaction, get_balance,
            sum_by_category_and_kind, sum_by_kind,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert(kind: TransactionKind, amount: f64, category: &str, conn: &Connection) {
        create_transaction(Transaction::build(kind, amount, category), conn).unwrap();
    }

    #[test]
    fn totals_are_zero_for_empty_ledger() {
        let conn = get_test_connection();

        assert_eq!(sum_by_kind(TransactionKind::Income, &conn), Ok(0.0));
        assert_eq!(sum_by_kind(TransactionKind::Expense, &conn), Ok(0.0));
        assert_eq!(get_balance(&conn), Ok(0.0));
        assert_eq!(sum_by_category_and_kind(&conn), Ok(vec![]));
    }

    #[test]
    fn balance_is_income_minus_expenses() {
        let conn = get_test_connection();
        insert(TransactionKind::Income, 1000.0, "Salary", &conn);
        insert(TransactionKind::Expense, 200.0, "Rent", &conn);
        insert(TransactionKind::Expense, 50.5, "Groceries", &conn);

        assert_eq!(sum_by_kind(TransactionKind::Income, &conn), Ok(1000.0));
        assert_eq!(sum_by_kind(TransactionKind::Expense, &conn), Ok(250.5));
        assert_eq!(get_balance(&conn), Ok(749.5));
    }

    #[test]
    fn balance_can_be_negative() {
        let conn = get_test_connection();
        insert(TransactionKind::Expense, 20.0, "Coffee", &conn);

        assert_eq!(get_balance(&conn), Ok(-20.0));
    }

    #[test]
    fn groups_by_category_and_kind() {
        let conn = get_test_connection();
        insert(TransactionKind::Expense, 1500.0, "Rent", &conn);
        insert(TransactionKind::Expense, 40.0, "Groceries", &conn);
        insert(TransactionKind::Expense, 60.0, "Groceries", &conn);
        insert(TransactionKind::Income, 25.0, "Groceries", &conn);
        insert(TransactionKind::Income, 6500.0, "Salary", &conn);

        let totals = sum_by_category_and_kind(&conn).unwrap();

        assert_eq!(
            totals,
            vec![
                CategoryTotal {
                    category: "Groceries".to_owned(),
                    kind: TransactionKind::Expense,
                    total: 100.0,
                },
                CategoryTotal {
                    category: "Groceries".to_owned(),
                    kind: TransactionKind::Income,
                    total: 25.0,
                },
                CategoryTotal {
                    category: "Rent".to_owned(),
                    kind: TransactionKind::Expense,
                    total: 1500.0,
                },
                CategoryTotal {
                    category: "Salary".to_owned(),
                    kind: TransactionKind::Income,
                    total: 6500.0,
                },
            ]
        );
    }
}
