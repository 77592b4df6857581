//! Defines the endpoints for creating transactions.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints,
    transaction::{
        Transaction, TransactionBuilder, TransactionKind, core::create_transaction, parse_amount,
        parse_expense_list,
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a transaction.
///
/// The fields are kept as text so that invalid input is reported with an
/// alert instead of a bare rejection.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// "Income" or "Expense".
    pub kind: String,
    /// The amount in CHF, e.g. "1'500.00".
    pub amount: String,
    /// A short label such as "Salary" or "Rent".
    pub category: String,
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let builder = match parse_form(&form) {
        Ok(builder) => builder,
        Err(error) => {
            tracing::debug!("rejected transaction form {form:?}: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_transaction(builder, &connection) {
        tracing::error!("could not create transaction: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

fn parse_form(form: &TransactionForm) -> Result<TransactionBuilder, Error> {
    let kind: TransactionKind = form.kind.parse()?;
    let amount = parse_amount(&form.amount)?;

    Ok(Transaction::build(kind, amount, &form.category))
}

/// The form data for creating several expenses at once.
#[derive(Debug, Deserialize)]
pub struct QuickExpensesForm {
    /// A list like "Rent: 1500, Power: 80".
    pub expenses: String,
}

/// A route handler for creating an expense for each item of a quick expense list.
///
/// Valid items are saved even when other items are invalid. If every item
/// was saved, the client is redirected to the transactions view, otherwise
/// an alert lists the items that could not be read.
pub async fn create_quick_expenses_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<QuickExpensesForm>,
) -> Response {
    let entries = parse_expense_list(&form.expenses);

    if entries.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Alert::ErrorSimple {
                message: "Enter at least one expense, e.g. \"Rent: 1500\"".to_owned(),
            }
            .into_html(),
        )
            .into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let mut saved = 0;
    let mut failures = Vec::new();

    for entry in entries {
        let result = entry.and_then(|entry| {
            create_transaction(
                Transaction::build(TransactionKind::Expense, entry.amount, &entry.category),
                &connection,
            )
        });

        match result {
            Ok(_) => saved += 1,
            Err(error) if error.is_user_error() => failures.push(error.to_string()),
            Err(error) => {
                tracing::error!("could not create expense: {error}");
                return error.into_alert_response();
            }
        }
    }

    tracing::info!(
        "Saved {saved} quick expenses, {} items were invalid",
        failures.len()
    );

    if failures.is_empty() {
        return (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response();
    }

    (
        StatusCode::BAD_REQUEST,
        Alert::Error {
            message: format!("Saved {saved} expenses, {} could not be read", failures.len()),
            details: failures.join("; "),
        }
        .into_html(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        test_utils::{assert_hx_redirect, parse_html_fragment},
        transaction::{
            TransactionKind,
            create_endpoint::{CreateTransactionState, QuickExpensesForm, TransactionForm},
            create_quick_expenses_endpoint, create_transaction_endpoint, get_all_transactions,
        },
    };

    fn get_test_state() -> CreateTransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn transaction_form(kind: &str, amount: &str, category: &str) -> TransactionForm {
        TransactionForm {
            kind: kind.to_owned(),
            amount: amount.to_owned(),
            category: category.to_owned(),
        }
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let state = get_test_state();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Form(transaction_form("Income", "1'000.50", "Salary")),
        )
        .await
        .into_response();

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let transactions = get_all_transactions(&connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, TransactionKind::Income);
        assert_eq!(transactions[0].amount, 1000.5);
        assert_eq!(transactions[0].category, "Salary");
        assert!(!transactions[0].exported);
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let cases = [
            transaction_form("Transfer", "10", "Rent"),
            transaction_form("Expense", "ten", "Rent"),
            transaction_form("Expense", "-10", "Rent"),
            transaction_form("Expense", "10", "  "),
        ];

        for form in cases {
            let state = get_test_state();

            let response = create_transaction_endpoint(State(state.clone()), Form(form))
                .await
                .into_response();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let html = parse_html_fragment(response).await;
            let text = html.root_element().text().collect::<String>();
            assert!(text.contains("Invalid input"), "got alert {text}");
            let connection = state.db_connection.lock().unwrap();
            assert_eq!(get_all_transactions(&connection).unwrap(), vec![]);
        }
    }

    #[tokio::test]
    async fn quick_expenses_are_saved() {
        let state = get_test_state();

        let response = create_quick_expenses_endpoint(
            State(state.clone()),
            Form(QuickExpensesForm {
                expenses: "Rent: 1500, Power: 80".to_owned(),
            }),
        )
        .await;

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let saved: Vec<_> = get_all_transactions(&connection)
            .unwrap()
            .into_iter()
            .map(|transaction| (transaction.kind, transaction.category, transaction.amount))
            .collect();
        assert_eq!(
            saved,
            vec![
                (TransactionKind::Expense, "Rent".to_owned(), 1500.0),
                (TransactionKind::Expense, "Power".to_owned(), 80.0),
            ]
        );
    }

    #[tokio::test]
    async fn quick_expenses_save_valid_items_and_report_invalid_ones() {
        let state = get_test_state();

        let response = create_quick_expenses_endpoint(
            State(state.clone()),
            Form(QuickExpensesForm {
                expenses: "Rent: 1500, Power 80".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Saved 1 expenses, 1 could not be read"), "got {text}");
        assert!(text.contains("Power 80"), "got {text}");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_all_transactions(&connection).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn quick_expenses_rejects_empty_list() {
        let state = get_test_state();

        let response = create_quick_expenses_endpoint(
            State(state.clone()),
            Form(QuickExpensesForm {
                expenses: " , ".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
