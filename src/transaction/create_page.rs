//! Defines the route handler for the page for creating new transactions.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
    transaction::TransactionKind,
};

fn kind_radio(kind: TransactionKind, checked: bool) -> Markup {
    let id = format!("kind-{}", kind.as_str().to_lowercase());

    html! {
        div class="flex flex-1 items-center gap-2"
        {
            input
                type="radio"
                name="kind"
                id=(id)
                value=(kind.as_str())
                checked[checked]
                required
                class=(FORM_RADIO_INPUT_STYLE);

            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (kind) }
        }
    }
}

fn create_transaction_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Transaction" }

                fieldset
                {
                    legend class=(FORM_LABEL_STYLE) { "Kind" }

                    div class=(FORM_RADIO_GROUP_STYLE)
                    {
                        (kind_radio(TransactionKind::Income, false))
                        (kind_radio(TransactionKind::Expense, true))
                    }
                }

                div
                {
                    label
                        for="amount"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Amount in CHF"
                    }

                    input
                        name="amount"
                        id="amount"
                        type="number"
                        min="0"
                        step="0.01"
                        placeholder="0.00"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="category"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Category"
                    }

                    input
                        name="category"
                        id="category"
                        type="text"
                        placeholder="e.g. Salary, Rent, Groceries"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Save Transaction"
                }
            }

            form
                hx-post=(endpoints::QUICK_EXPENSES_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6 mt-10"
            {
                h2 class="text-xl font-bold" { "Quick Expenses" }

                div
                {
                    label
                        for="expenses"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Expenses as \"category: amount\", separated by commas"
                    }

                    input
                        name="expenses"
                        id="expenses"
                        type="text"
                        placeholder="Rent: 1500, Power: 80"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Save Expenses"
                }
            }
        }
    };

    base("New Transaction", &[], &content)
}

/// Renders the page for creating transactions.
pub async fn get_create_transaction_page() -> Response {
    create_transaction_view().into_response()
}
