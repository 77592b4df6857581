use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, macros::datetime};

use finance_tracker::{
    ExportScope, MonthPeriod, Transaction, TransactionKind, commit_export, create_transaction,
    initialize_db,
};

/// A utility for creating a test database for finance_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The number of months of transactions to create, ending in December 2025.
    #[arg(long, default_value_t = 6)]
    months: u8,
}

const MONTHLY_TRANSACTIONS: [(TransactionKind, f64, &str, i64); 7] = [
    (TransactionKind::Income, 5200.0, "Salary", 24),
    (TransactionKind::Expense, 1800.0, "Rent", 0),
    (TransactionKind::Expense, 84.5, "Power", 4),
    (TransactionKind::Expense, 312.4, "Groceries", 7),
    (TransactionKind::Expense, 49.9, "Phone", 11),
    (TransactionKind::Expense, 120.0, "Transport", 14),
    (TransactionKind::Expense, 64.25, "Eating Out", 20),
];

/// Create and populate a database for manual testing.
///
/// Every month except the last one is marked as exported, so the export
/// page has a month of unexported transactions to work with.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    if !(1..=12).contains(&args.months) {
        eprintln!("The number of months must be between 1 and 12.");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let first_month = 13 - args.months;

    for month in first_month..=12 {
        let period = MonthPeriod::new(2025, month)?;
        println!("Creating transactions for {period}...");

        for (kind, amount, category, day_offset) in MONTHLY_TRANSACTIONS {
            let timestamp = period.start() + Duration::days(day_offset) + Duration::hours(9);
            create_transaction(
                Transaction::build(kind, amount, category).timestamp(timestamp),
                &conn,
            )?;
        }

        if month < 12 {
            commit_export(ExportScope::Month(period), &conn)?;
        }
    }

    create_transaction(
        Transaction::build(TransactionKind::Income, 250.0, "Bonus")
            .timestamp(datetime!(2025-12-23 17:30:00)),
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
