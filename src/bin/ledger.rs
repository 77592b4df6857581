use std::{error::Error, io, path::PathBuf, process::exit};

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use finance_tracker::{
    ExportScope, MonthPeriod, Transaction, TransactionKind, create_transaction, format_currency,
    format_timestamp, get_all_transactions, get_transactions_in_period, initialize_db, now_utc,
    parse_amount, parse_expense_list, reset_ledger, sum_by_category_and_kind, sum_by_kind,
    write_csv_file, write_statement_file,
};

/// The console app for finance_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File path to the application SQLite database.
    #[arg(long, global = true, default_value = "finance_tracker.db")]
    db_path: PathBuf,

    /// The directory that statements and CSV files are exported to.
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record an income or an expense
    Add {
        /// "income" or "expense"
        kind: String,
        /// The amount in CHF, e.g. 1'500.00
        amount: String,
        /// A short label such as "Salary" or "Rent"
        category: String,
    },

    /// Record several expenses at once, e.g. "Rent: 1500, Power: 80"
    AddExpenses {
        /// A comma separated list of "category: amount" items
        expenses: String,
    },

    /// List the incomes and expenses
    List {
        /// Only list transactions from this year (requires --month)
        #[arg(long, requires = "month")]
        year: Option<i32>,
        /// Only list transactions from this month, 1 to 12 (requires --year)
        #[arg(long, requires = "year")]
        month: Option<u8>,
    },

    /// Show the totals per kind and category and the balance
    Summary,

    /// Write every transaction to a CSV file
    ExportCsv,

    /// Write a statement of the transactions that were not exported yet
    ExportStatement {
        /// Only export transactions from this year (requires --month)
        #[arg(long, requires = "month")]
        year: Option<i32>,
        /// Only export transactions from this month, 1 to 12 (requires --year)
        #[arg(long, requires = "year")]
        month: Option<u8>,
    },

    /// Delete every transaction and restart the IDs at 1
    Reset {
        /// Confirm that every transaction should be deleted
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        eprintln!("Error: {error}");
        exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let conn = Connection::open(&cli.db_path)?;
    initialize_db(&conn)?;

    match cli.command {
        Command::Add {
            kind,
            amount,
            category,
        } => {
            let kind: TransactionKind = kind.parse()?;
            let amount = parse_amount(&amount)?;
            let transaction = create_transaction(Transaction::build(kind, amount, &category), &conn)?;
            println!(
                "Added {} #{}: {} {}",
                transaction.kind,
                transaction.id,
                transaction.category,
                format_currency(transaction.amount)
            );
        }
        Command::AddExpenses { expenses } => add_expenses(&expenses, &conn)?,
        Command::List { year, month } => {
            let transactions = match MonthPeriod::from_parts(year, month)? {
                Some(period) => get_transactions_in_period(period, &conn)?,
                None => get_all_transactions(&conn)?,
            };
            print_transactions(&transactions);
        }
        Command::Summary => print_summary(&conn)?,
        Command::ExportCsv => {
            let path = write_csv_file(&conn, &cli.output_dir, now_utc().date())?;
            println!("Exported all transactions to {}", path.display());
        }
        Command::ExportStatement { year, month } => {
            let scope = ExportScope::from_parts(year, month)?;

            match write_statement_file(scope, &conn, &cli.output_dir, now_utc())? {
                Some(path) => println!("Exported a statement for {scope} to {}", path.display()),
                None => println!("Nothing to export for {scope}, no unexported transactions"),
            }
        }
        Command::Reset { yes } => {
            if !yes {
                return Err("refusing to delete every transaction without --yes".into());
            }

            reset_ledger(&conn)?;
            println!("Deleted every transaction");
        }
    }

    Ok(())
}

fn add_expenses(expenses: &str, conn: &Connection) -> Result<(), Box<dyn Error>> {
    let entries = parse_expense_list(expenses);

    if entries.is_empty() {
        return Err("enter at least one expense, e.g. \"Rent: 1500\"".into());
    }

    let mut failures = 0;

    for entry in entries {
        let result = entry.and_then(|entry| {
            create_transaction(
                Transaction::build(TransactionKind::Expense, entry.amount, &entry.category),
                conn,
            )
        });

        match result {
            Ok(transaction) => println!(
                "Added Expense #{}: {} {}",
                transaction.id,
                transaction.category,
                format_currency(transaction.amount)
            ),
            Err(error) if error.is_user_error() => {
                failures += 1;
                eprintln!("Skipped: {error}");
            }
            Err(error) => return Err(error.into()),
        }
    }

    if failures > 0 {
        return Err(format!("{failures} expenses could not be read").into());
    }

    Ok(())
}

fn print_transactions(transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions");
        return;
    }

    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        println!("{kind}s");

        let mut total = 0.0;

        for transaction in transactions.iter().filter(|transaction| transaction.kind == kind) {
            total += transaction.amount;
            println!(
                "  {:>4}  {}  {:<20} {:>16}{}",
                transaction.id,
                format_timestamp(transaction.timestamp),
                transaction.category,
                format_currency(transaction.amount),
                if transaction.exported { "  (exported)" } else { "" }
            );
        }

        println!("  Total: {}", format_currency(total));
    }
}

fn print_summary(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let income = sum_by_kind(TransactionKind::Income, conn)?;
    let expenses = sum_by_kind(TransactionKind::Expense, conn)?;

    println!("Total income:   {}", format_currency(income));
    println!("Total expenses: {}", format_currency(expenses));
    println!("Balance:        {}", format_currency(income - expenses));

    let totals = sum_by_category_and_kind(conn)?;

    if !totals.is_empty() {
        println!();
        println!("By category:");

        for total in totals {
            println!(
                "  {:<20} {:<8} {:>16}",
                total.category,
                total.kind.as_str(),
                format_currency(total.total)
            );
        }
    }

    Ok(())
}
