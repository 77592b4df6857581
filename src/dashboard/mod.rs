//! Dashboard module
//!
//! Provides an overview page with the ledger totals and charts of the
//! totals per category.

mod cards;
mod charts;
mod handlers;

pub use handlers::get_dashboard_page;
