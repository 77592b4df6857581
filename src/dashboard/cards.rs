//! Card components for the dashboard summary.
//!
//! Provides:
//! - Summary cards with the total income, total expenses and balance
//! - One card per expense category with its share of the total expenses

use maud::{Markup, html};

use crate::{
    html::format_currency,
    transaction::{CategoryTotal, TransactionKind},
};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

/// The ledger totals shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
}

impl Summary {
    pub fn balance(&self) -> f64 {
        self.total_income - self.total_expenses
    }
}

/// Formats a percentage value, avoiding "-0%" display.
fn format_percentage(value: f64) -> String {
    let rounded = value.round();
    if rounded.abs() < 0.5 {
        "0".to_string()
    } else {
        format!("{:.0}", rounded)
    }
}

fn summary_card(id: &str, title: &str, amount: f64, amount_style: &str) -> Markup {
    let amount_style = format!("mt-2 text-2xl font-semibold {amount_style}");

    html! {
        div id=(id) class=(CARD_STYLE)
        {
            h4 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }
            p class=(amount_style) { (format_currency(amount)) }
        }
    }
}

/// Renders the income, expenses and balance cards.
pub(super) fn summary_cards_view(summary: &Summary) -> Markup {
    let balance = summary.balance();
    let balance_style = if balance < 0.0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-green-600 dark:text-green-400"
    };

    html! {
        section id="summary" class="w-full mx-auto mb-8"
        {
            div class="grid grid-cols-1 sm:grid-cols-3 gap-4"
            {
                (summary_card("total-income", "Total Income", summary.total_income, ""))
                (summary_card("total-expenses", "Total Expenses", summary.total_expenses, ""))
                (summary_card("balance", "Balance", balance, balance_style))
            }
        }
    }
}

/// Renders a card for every expense category, largest first.
///
/// Renders nothing if there are no expenses.
pub(super) fn expense_cards_view(totals: &[CategoryTotal]) -> Markup {
    let mut expenses: Vec<&CategoryTotal> = totals
        .iter()
        .filter(|total| total.kind == TransactionKind::Expense)
        .collect();
    expenses.sort_by(|a, b| b.total.total_cmp(&a.total));

    let total_expenses: f64 = expenses.iter().map(|total| total.total).sum();

    if expenses.is_empty() {
        return html! {};
    }

    html! {
        section id="expense-cards" class="w-full mx-auto mt-8 mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { "Expenses by Category" }

            div class="grid grid-cols-1 sm:grid-cols-2 md:grid-cols-3 lg:grid-cols-4 gap-4"
            {
                @for expense in expenses {
                    @let share = if total_expenses > 0.0 {
                        expense.total / total_expenses * 100.0
                    } else {
                        0.0
                    };

                    div class=(CARD_STYLE) data-category=(expense.category)
                    {
                        h4 class="font-semibold" { (expense.category) }
                        p class="mt-2 text-lg" { (format_currency(expense.total)) }
                        p class="text-sm text-gray-600 dark:text-gray-400"
                        {
                            (format_percentage(share)) "% of expenses"
                        }
                    }
                }
            }
        }
    }
}
