//! The transaction ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, aggregating and resetting transactions
//! - Parsing of user input such as amounts and quick expense lists
//! - View handlers for transaction-related web pages

mod core;
mod create_endpoint;
mod create_page;
mod period;
mod quick_entry;
mod totals;
mod transactions_page;

pub use core::{
    Transaction, TransactionBuilder, TransactionKind, count_transactions, create_datetime_index,
    create_transaction, create_transaction_table, get_all_transactions, get_transaction, get_transactions_in_period,
    map_transaction_row, now_utc, parse_amount, reset_ledger,
};
pub use create_endpoint::{create_quick_expenses_endpoint, create_transaction_endpoint};
pub use create_page::get_create_transaction_page;
pub use period::MonthPeriod;
pub use quick_entry::{ExpenseEntry, parse_expense_list};
pub use totals::{CategoryTotal, get_balance, sum_by_category_and_kind, sum_by_kind};
pub use transactions_page::get_transactions_page;

pub(crate) use core::{PERIOD_FILTER, TRANSACTION_COLUMNS};
