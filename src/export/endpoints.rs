//! The export page and the endpoints that write export files.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints,
    export::{ExportScope, select_unexported, write_csv_file, write_statement_file},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base, format_currency, format_date, loading_spinner,
    },
    navigation::NavBar,
    transaction::{MonthPeriod, count_transactions, now_utc, reset_ledger},
};

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The database connection for reading and marking transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The directory export files are written to.
    pub export_dir: PathBuf,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            export_dir: state.export_dir.clone(),
        }
    }
}

/// The form data for exporting a statement.
///
/// Leaving both fields empty exports every unexported transaction.
#[derive(Debug, Default, Deserialize)]
pub struct StatementForm {
    /// The calendar year, e.g. 2025.
    pub year: Option<i32>,
    /// The month of the year, 1 to 12.
    pub month: Option<u8>,
}

struct ExportSummary {
    transaction_count: u32,
    unexported_count: usize,
    unexported_balance: f64,
    /// Suggested in the statement form.
    current_month: MonthPeriod,
}

/// Renders the export page.
pub async fn get_export_page(State(state): State<ExportState>) -> Result<Response, Error> {
    let summary = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let unexported = select_unexported(ExportScope::All, &connection)?;

        ExportSummary {
            transaction_count: count_transactions(&connection)?,
            unexported_count: unexported.len(),
            unexported_balance: unexported.balance(),
            current_month: MonthPeriod::containing(now_utc().date())?,
        }
    };

    Ok(export_view(&summary).into_response())
}

fn export_view(summary: &ExportSummary) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPORT_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            section id="export-summary" class="w-full space-y-2"
            {
                h2 class="text-xl font-bold" { "Export" }

                p id="unexported-count"
                {
                    (summary.unexported_count) " of " (summary.transaction_count)
                    " transactions have not been exported yet."
                }

                @if summary.unexported_count > 0 {
                    p { "Their balance is " (format_currency(summary.unexported_balance)) "." }
                }
            }

            form
                id="statement-form"
                hx-post=(endpoints::EXPORT_STATEMENT_API)
                hx-target="#alert-container"
                hx-target-error="#alert-container"
                class="w-full space-y-4 mt-8"
            {
                h3 class="text-lg font-semibold" { "Statement" }

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    "Statements only include transactions that have not been exported before. \
                    Leave the year and month empty to export all of them."
                }

                div class="flex gap-4"
                {
                    div class="flex-1"
                    {
                        label for="year" class=(FORM_LABEL_STYLE) { "Year" }
                        input
                            name="year"
                            id="year"
                            type="number"
                            min="1970"
                            placeholder=(summary.current_month.year())
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div class="flex-1"
                    {
                        label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                        input
                            name="month"
                            id="month"
                            type="number"
                            min="1"
                            max="12"
                            placeholder=(summary.current_month.month())
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                button type="submit" id="indicator" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" { (spinner) }
                    " Export Statement"
                }
            }

            form
                id="csv-form"
                hx-post=(endpoints::EXPORT_CSV_API)
                hx-target="#alert-container"
                hx-target-error="#alert-container"
                class="w-full space-y-4 mt-8"
            {
                h3 class="text-lg font-semibold" { "CSV" }

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    "Exports every transaction, whether it was exported before or not."
                }

                button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Export CSV"
                }
            }

            form
                id="reset-form"
                hx-post=(endpoints::RESET_API)
                hx-confirm="Delete every transaction? This cannot be undone."
                hx-target-error="#alert-container"
                class="w-full space-y-4 mt-8"
            {
                h3 class="text-lg font-semibold" { "Reset" }

                button type="submit" tabindex="0" class=(BUTTON_DELETE_STYLE)
                {
                    "Delete All Transactions"
                }
            }
        }
    };

    base("Export", &[], &content)
}

/// A route handler that writes a statement of the unexported transactions
/// to the export directory and marks them as exported.
pub async fn export_statement_endpoint(
    State(state): State<ExportState>,
    Form(form): Form<StatementForm>,
) -> Response {
    let scope = match ExportScope::from_parts(form.year, form.month) {
        Ok(scope) => scope,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match write_statement_file(scope, &connection, &state.export_dir, now_utc()) {
        Ok(Some(path)) => Alert::Success {
            message: format!("Exported a statement for {scope}"),
            details: format!("Saved to {}", path.display()),
        }
        .into_response(),
        Ok(None) => Alert::Success {
            message: "Nothing to export".to_owned(),
            details: match scope {
                ExportScope::All => "Every transaction has already been exported.".to_owned(),
                ExportScope::Month(period) => {
                    format!("Every transaction in {period} has already been exported.")
                }
            },
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not export statement for {scope}: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler that writes every transaction to a CSV file in the
/// export directory.
pub async fn export_csv_endpoint(State(state): State<ExportState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let today = now_utc().date();

    match write_csv_file(&connection, &state.export_dir, today) {
        Ok(path) => Alert::Success {
            message: "Exported all transactions to CSV".to_owned(),
            details: format!(
                "Saved the ledger as of {} to {}",
                format_date(today),
                path.display()
            ),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not export CSV: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler that deletes every transaction, redirects to the
/// transactions view on success.
pub async fn reset_ledger_endpoint(State(state): State<ExportState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = reset_ledger(&connection) {
        tracing::error!("could not reset the ledger: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
