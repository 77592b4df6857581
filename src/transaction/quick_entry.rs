//! Parsing of quick expense lists such as `Rent: 1500, Power: 80`.

use crate::{Error, transaction::parse_amount};

/// One `category: amount` item of a quick expense list.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEntry {
    /// The category of the expense, trimmed.
    pub category: String,
    /// The amount spent.
    pub amount: f64,
}

/// Parse a comma separated list of `category: amount` items.
///
/// Each item is parsed independently, so one malformed item does not stop
/// the others from being recorded. Empty items (e.g. from a trailing comma)
/// are skipped.
///
/// An item fails with an [Error::InvalidExpenseEntry] if it has no colon or
/// an empty category, or with the error from [parse_amount] if the amount is
/// invalid.
pub fn parse_expense_list(text: &str) -> Vec<Result<ExpenseEntry, Error>> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_expense_entry)
        .collect()
}

fn parse_expense_entry(item: &str) -> Result<ExpenseEntry, Error> {
    let (category, amount) = item
        .split_once(':')
        .ok_or_else(|| Error::InvalidExpenseEntry(item.to_owned()))?;

    let category = category.trim();
    if category.is_empty() {
        return Err(Error::InvalidExpenseEntry(item.to_owned()));
    }

    Ok(ExpenseEntry {
        category: category.to_owned(),
        amount: parse_amount(amount)?,
    })
}
