//! Finance Tracker is a personal finance ledger.
//!
//! It records income and expense transactions in a local SQLite database,
//! aggregates totals, renders charts and exports the ledger to CSV and to
//! printable statements. Statement exports only ever include transactions
//! that have not been exported before.
//!
//! The library is shared by two front-ends: a web app that directly serves
//! HTML pages (the `server` binary) and a console app (the `ledger` binary).

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod export;
mod html;
mod internal_server_error;
mod navigation;
mod not_found;
mod routing;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use database_id::{DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use export::{
    ExportScope, ExportSelection, commit_export, csv_file_name, export_with, select_unexported,
    statement_file_name, write_csv_file, write_statement_file, write_transactions_csv,
};
pub use html::{format_currency, format_date, format_timestamp};
pub use routing::{STATIC_DIR, build_router, missing_static_assets};
pub use transaction::{
    CategoryTotal, ExpenseEntry, MonthPeriod, Transaction, TransactionBuilder, TransactionKind,
    count_transactions, create_transaction, get_all_transactions, get_balance, get_transaction,
    get_transactions_in_period, now_utc, parse_amount, parse_expense_list, reset_ledger,
    sum_by_category_and_kind, sum_by_kind,
};

use crate::{
    alert::Alert, html::error_view, internal_server_error::InternalServerError,
    not_found::NotFound,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction kind other than income or expense was given.
    #[error("\"{0}\" is not a valid transaction kind, expected \"Income\" or \"Expense\"")]
    InvalidKind(String),

    /// The amount could not be parsed as a finite number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A negative amount was used to create a transaction.
    ///
    /// Whether money was earned or spent is recorded by the transaction kind,
    /// so amounts are always zero or greater.
    #[error("the amount {0} is negative, amounts must be zero or greater")]
    NegativeAmount(f64),

    /// An empty string was used as the category of a transaction.
    #[error("the category cannot be empty")]
    EmptyCategory,

    /// An item of a quick expense list was not of the form `category: amount`.
    #[error("could not read \"{0}\", expected an item like \"Rent: 1500\"")]
    InvalidExpenseEntry(String),

    /// The month is outside of 1 to 12, or the year is outside of the
    /// supported calendar range.
    #[error("{year}-{month} is not a valid period, the month must be between 1 and 12")]
    InvalidPeriod {
        /// The requested calendar year.
        year: i32,
        /// The requested month, 1-indexed.
        month: u8,
    },

    /// Only one of the year and month was given for a month scope.
    #[error("both a year and a month are needed to select a month")]
    IncompletePeriod,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error, e.g. the database file is
    /// unreachable or corrupt.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An export file could not be written.
    #[error("could not write the export file: {0}")]
    ExportIo(String),

    /// A transaction could not be written as a CSV record.
    #[error("could not write CSV: {0}")]
    CsvError(String),
}

impl Error {
    /// Whether the error was caused by invalid user input rather than by
    /// the application or its storage.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidKind(_)
                | Error::InvalidAmount(_)
                | Error::NegativeAmount(_)
                | Error::EmptyCategory
                | Error::InvalidExpenseEntry(_)
                | Error::InvalidPeriod { .. }
                | Error::IncompletePeriod
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFound.into_response(),
            Error::InvalidPeriod { .. } | Error::IncompletePeriod => {
                let view = error_view("Bad Request", "400", "Invalid Period", &self.to_string());
                (StatusCode::BAD_REQUEST, Html(view.into_string())).into_response()
            }
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            error if error.is_user_error() => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid input".to_owned(),
                    details: error.to_string(),
                },
            ),
            Error::ExportIo(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Export failed".to_owned(),
                    details: format!(
                        "{reason}. No transactions were marked as exported, \
                        so you can safely try again."
                    ),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}
