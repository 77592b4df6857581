//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    dashboard::{
        cards::{Summary, expense_cards_view, summary_cards_view},
        charts::{
            DashboardChart, charts_script, charts_view, expenses_by_category_chart,
            income_and_expenses_chart,
        },
    },
    endpoints,
    html::{HeadElement, base, link},
    navigation::NavBar,
    transaction::{CategoryTotal, TransactionKind, sum_by_category_and_kind, sum_by_kind},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    summary: Summary,
    category_totals: Vec<CategoryTotal>,
}

/// Display a page with an overview of the ledger.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let data = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        build_dashboard_data(&connection)?
    };

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    match data {
        Some(data) => Ok(dashboard_view(nav_bar, &data).into_response()),
        None => Ok(dashboard_no_data_view(nav_bar).into_response()),
    }
}

/// Fetches the totals shown on the dashboard.
///
/// Returns `None` if there are no transactions.
fn build_dashboard_data(connection: &Connection) -> Result<Option<DashboardData>, Error> {
    let category_totals = sum_by_category_and_kind(connection)
        .inspect_err(|error| tracing::error!("could not get category totals: {error}"))?;

    if category_totals.is_empty() {
        return Ok(None);
    }

    let summary = Summary {
        total_income: sum_by_kind(TransactionKind::Income, connection)?,
        total_expenses: sum_by_kind(TransactionKind::Expense, connection)?,
    };

    Ok(Some(DashboardData {
        summary,
        category_totals,
    }))
}

fn build_dashboard_charts(category_totals: &[CategoryTotal]) -> [DashboardChart; 2] {
    [
        DashboardChart {
            id: "expenses-by-category-chart",
            options: expenses_by_category_chart(category_totals).to_string(),
        },
        DashboardChart {
            id: "income-and-expenses-chart",
            options: income_and_expenses_chart(category_totals).to_string(),
        },
    ]
}

/// Renders the dashboard page when no transaction data exists.
fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "add a transaction");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p id="no-data"
            {
                "Your totals and charts will show up here once you "
                (new_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn dashboard_view(nav_bar: NavBar<'_>, data: &DashboardData) -> Markup {
    let nav_bar = nav_bar.into_html();
    let charts = build_dashboard_charts(&data.category_totals);

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (summary_cards_view(&data.summary))
            (charts_view(&charts))
            (expense_cards_view(&data.category_totals))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&charts),
    ];

    base("Dashboard", &scripts, &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        dashboard::handlers::{DashboardState, get_dashboard_page},
        db::initialize,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    fn get_test_state(transactions: &[(TransactionKind, f64, &str)]) -> DashboardState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        for &(kind, amount, category) in transactions {
            create_transaction(Transaction::build(kind, amount, category), &conn).unwrap();
        }

        DashboardState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[track_caller]
    fn assert_element_exists(html: &Html, selector: &str) {
        assert!(
            html.select(&Selector::parse(selector).unwrap())
                .next()
                .is_some(),
            "{selector} not found in {}",
            html.html()
        );
    }

    #[tokio::test]
    async fn dashboard_page_shows_summary_and_charts() {
        let state = get_test_state(&[
            (TransactionKind::Income, 1000.0, "Salary"),
            (TransactionKind::Expense, 200.0, "Rent"),
            (TransactionKind::Expense, 50.0, "Food"),
        ]);

        let response = get_dashboard_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_element_exists(&html, "#expenses-by-category-chart");
        assert_element_exists(&html, "#income-and-expenses-chart");
        assert_element_exists(&html, "#expense-cards");
        let balance = html
            .select(&Selector::parse("#balance p").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(balance, "CHF 750.00");
    }

    #[tokio::test]
    async fn displays_prompt_text_on_no_data() {
        let state = get_test_state(&[]);

        let response = get_dashboard_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_element_exists(&html, "#no-data");
        assert!(
            html.select(&Selector::parse("#charts").unwrap())
                .next()
                .is_none()
        );
    }
}
