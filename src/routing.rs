//! Application router configuration.

use std::path::Path;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    dashboard::get_dashboard_page,
    endpoints,
    export::{
        export_csv_endpoint, export_statement_endpoint, get_export_page, reset_ledger_endpoint,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        create_quick_expenses_endpoint, create_transaction_endpoint, get_create_transaction_page,
        get_transactions_page,
    },
};

/// The directory served under [endpoints::STATIC], relative to the working directory.
pub const STATIC_DIR: &str = "static";

/// The files in [STATIC_DIR] that the pages load. `scripts/build_static.sh`
/// creates them.
const STATIC_ASSETS: [&str; 4] = [
    "main.css",
    "htmx-2.0.8-min.js",
    "htmx-ext-response-targets-2.0.4.js",
    "echarts.6.0.0.min.js",
];

/// The static assets that are missing from `dir`.
pub fn missing_static_assets(dir: &Path) -> Vec<&'static str> {
    STATIC_ASSETS
        .into_iter()
        .filter(|asset| !dir.join(asset).is_file())
        .collect()
}

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let view_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(endpoints::EXPORT_VIEW, get(get_export_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::QUICK_EXPENSES_API,
            post(create_quick_expenses_endpoint),
        )
        .route(
            endpoints::EXPORT_STATEMENT_API,
            post(export_statement_endpoint),
        )
        .route(endpoints::EXPORT_CSV_API, post(export_csv_endpoint))
        .route(endpoints::RESET_API, post(reset_ledger_endpoint));

    view_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new(STATIC_DIR))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
