//! Defines the route handler for the page that lists incomes and expenses.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// axum_extra's Query treats the empty values of a cleared form field as None.
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, EXPORTED_BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, format_timestamp, link,
    },
    navigation::NavBar,
    transaction::{
        MonthPeriod, Transaction, TransactionKind, get_all_transactions,
        get_transactions_in_period,
    },
};

/// The optional month filter of the transactions page.
///
/// Both fields must be given to filter by month. Neither means every
/// transaction is shown.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// The calendar year, e.g. 2025.
    pub year: Option<i32>,
    /// The month of the year, 1 to 12.
    pub month: Option<u8>,
}

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the incomes and expenses side by side, optionally for a single month.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, Error> {
    let period = MonthPeriod::from_parts(query.year, query.month)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        match period {
            Some(period) => get_transactions_in_period(period, &connection),
            None => get_all_transactions(&connection),
        }
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    let (incomes, expenses): (Vec<Transaction>, Vec<Transaction>) = transactions
        .into_iter()
        .partition(|transaction| transaction.kind == TransactionKind::Income);

    Ok(transactions_view(period, &incomes, &expenses).into_response())
}

fn transactions_view(
    period: Option<MonthPeriod>,
    incomes: &[Transaction],
    expenses: &[Transaction],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let total_income: f64 = incomes.iter().map(|transaction| transaction.amount).sum();
    let total_expenses: f64 = expenses.iter().map(|transaction| transaction.amount).sum();
    let heading = match period {
        Some(period) => format!("Transactions in {period}"),
        None => "All Transactions".to_owned(),
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                div class="flex flex-wrap items-end justify-between gap-4"
                {
                    h2 class="text-xl font-bold" { (heading) }

                    (period_filter(period))
                }

                @if incomes.is_empty() && expenses.is_empty() {
                    p class="text-gray-600 dark:text-gray-400" id="no-transactions"
                    {
                        "No transactions recorded yet. "
                        (link(endpoints::NEW_TRANSACTION_VIEW, "Add a transaction"))
                        " to get started."
                    }
                } @else {
                    div class="grid gap-6 lg:grid-cols-2"
                    {
                        (transaction_table("incomes", "Incomes", incomes, total_income))
                        (transaction_table("expenses", "Expenses", expenses, total_expenses))
                    }

                    p id="balance" class="text-lg font-semibold"
                    {
                        "Remaining balance: " (format_currency(total_income - total_expenses))
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

fn period_filter(period: Option<MonthPeriod>) -> Markup {
    let year = period.map(|period| period.year().to_string());
    let month = period.map(|period| period.month());

    html! {
        form method="get" action=(endpoints::TRANSACTIONS_VIEW) class="flex items-end gap-2"
        {
            div
            {
                label for="year" class=(FORM_LABEL_STYLE) { "Year" }
                input
                    type="number"
                    name="year"
                    id="year"
                    min="1"
                    max="9999"
                    value=[year]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                select name="month" id="month" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Any" }
                    @for number in 1..=12u8 {
                        option value=(number) selected[month == Some(number)] { (number) }
                    }
                }
            }

            div
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
            }

            @if period.is_some() {
                (link(endpoints::TRANSACTIONS_VIEW, "Show all"))
            }
        }
    }
}

fn transaction_table(id: &str, title: &str, transactions: &[Transaction], total: f64) -> Markup {
    html! {
        section id=(id) class="overflow-x-auto shadow-md rounded"
        {
            h3 class="text-lg font-semibold p-4 bg-white dark:bg-gray-800" { (title) }

            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                        {
                            td class=(TABLE_CELL_STYLE) { (transaction.id) }
                            td class=(TABLE_CELL_STYLE) { (format_timestamp(transaction.timestamp)) }
                            td class=(TABLE_CELL_STYLE) { (transaction.category) }
                            td class="px-6 py-4 text-right" { (format_currency(transaction.amount)) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @if transaction.exported {
                                    span class=(EXPORTED_BADGE_STYLE) { "Exported" }
                                }
                            }
                        }
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="5" class=(TABLE_CELL_STYLE) { "None" }
                        }
                    }
                }

                tfoot
                {
                    tr class="font-semibold text-gray-900 dark:text-white"
                    {
                        th scope="row" colspan="3" class=(TABLE_CELL_STYLE) { "Total" }
                        td class="px-6 py-4 text-right total" { (format_currency(total)) }
                        td {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::{ElementRef, Html, Selector};
    use time::macros::datetime;

    use crate::{
        db::initialize,
        export::{ExportScope, commit_export},
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{
            Transaction, TransactionKind, create_transaction, get_transactions_page,
            transactions_page::{PeriodQuery, TransactionsViewState},
        },
    };

    fn get_test_state() -> TransactionsViewState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        TransactionsViewState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn insert(state: &TransactionsViewState, kind: TransactionKind, amount: f64, category: &str) {
        let connection = state.db_connection.lock().unwrap();
        create_transaction(
            Transaction::build(kind, amount, category).timestamp(datetime!(2025-03-15 12:00:00)),
            &connection,
        )
        .unwrap();
    }

    #[track_caller]
    fn must_get_section<'a>(html: &'a Html, id: &str) -> ElementRef<'a> {
        html.select(&Selector::parse(&format!("section#{id}")).unwrap())
            .next()
            .unwrap_or_else(|| panic!("No section with id {id} found"))
    }

    #[track_caller]
    fn get_row_ids(section: ElementRef) -> Vec<String> {
        section
            .select(&Selector::parse("tbody tr[data-transaction-id]").unwrap())
            .map(|row| {
                row.value()
                    .attr("data-transaction-id")
                    .unwrap_or_default()
                    .to_owned()
            })
            .collect()
    }

    #[track_caller]
    fn get_total(section: ElementRef) -> String {
        section
            .select(&Selector::parse("td.total").unwrap())
            .next()
            .expect("No total found")
            .text()
            .collect::<String>()
    }

    #[tokio::test]
    async fn shows_incomes_and_expenses_separately() {
        let state = get_test_state();
        insert(&state, TransactionKind::Income, 1000.0, "Salary");
        insert(&state, TransactionKind::Expense, 200.0, "Rent");
        insert(&state, TransactionKind::Expense, 50.0, "Groceries");

        let response = get_transactions_page(State(state), Query(PeriodQuery::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let incomes = must_get_section(&html, "incomes");
        let expenses = must_get_section(&html, "expenses");
        assert_eq!(get_row_ids(incomes), vec!["1"]);
        assert_eq!(get_row_ids(expenses), vec!["2", "3"]);
        assert_eq!(get_total(incomes), "CHF 1'000.00");
        assert_eq!(get_total(expenses), "CHF 250.00");
        let balance = html
            .select(&Selector::parse("#balance").unwrap())
            .next()
            .expect("No balance found")
            .text()
            .collect::<String>();
        assert!(balance.contains("CHF 750.00"), "got {balance}");
    }

    #[tokio::test]
    async fn filters_by_month() {
        let state = get_test_state();
        insert(&state, TransactionKind::Income, 1000.0, "Salary");
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(TransactionKind::Expense, 20.0, "Coffee")
                    .timestamp(datetime!(2025-04-01 00:00:00)),
                &connection,
            )
            .unwrap();
        }

        let response = get_transactions_page(
            State(state),
            Query(PeriodQuery {
                year: Some(2025),
                month: Some(3),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(get_row_ids(must_get_section(&html, "incomes")), vec!["1"]);
        assert!(get_row_ids(must_get_section(&html, "expenses")).is_empty());
    }

    #[tokio::test]
    async fn marks_exported_transactions() {
        let state = get_test_state();
        insert(&state, TransactionKind::Income, 1000.0, "Salary");
        {
            let connection = state.db_connection.lock().unwrap();
            commit_export(ExportScope::All, &connection).unwrap();
        }
        insert(&state, TransactionKind::Income, 10.0, "Gift");

        let response = get_transactions_page(State(state), Query(PeriodQuery::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let badges: Vec<_> = must_get_section(&html, "incomes")
            .select(&Selector::parse("tbody tr").unwrap())
            .map(|row| row.text().any(|text| text == "Exported"))
            .collect();
        assert_eq!(badges, vec![true, false]);
    }

    #[tokio::test]
    async fn shows_empty_state() {
        let state = get_test_state();

        let response = get_transactions_page(State(state), Query(PeriodQuery::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert!(
            html.select(&Selector::parse("#no-transactions").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn rejects_incomplete_period() {
        let state = get_test_state();

        let response = get_transactions_page(
            State(state),
            Query(PeriodQuery {
                year: Some(2025),
                month: None,
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
