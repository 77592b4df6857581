//! The URIs of the pages and API endpoints.

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page with the summary and charts.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing incomes and expenses.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for exporting the ledger and resetting it.
pub const EXPORT_VIEW: &str = "/export";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to create several expenses from a quick expense list.
pub const QUICK_EXPENSES_API: &str = "/api/transactions/quick";
/// The route to export the unexported transactions as a statement.
pub const EXPORT_STATEMENT_API: &str = "/api/export/statement";
/// The route to export every transaction as CSV.
pub const EXPORT_CSV_API: &str = "/api/export/csv";
/// The route to delete every transaction.
pub const RESET_API: &str = "/api/reset";
