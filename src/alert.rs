//! Alert system for displaying success and error messages to users.
//!
//! Alerts are returned by the API endpoints and swapped into the
//! `#alert-container` element of the page by HTMX.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// A message shown to the user after they submit a form.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action succeeded, with some extra information.
    Success {
        /// The headline of the alert.
        message: String,
        /// Extra text shown under the headline.
        details: String,
    },
    /// The action failed, with some information on what went wrong.
    Error {
        /// The headline of the alert.
        message: String,
        /// What went wrong and how to fix it.
        details: String,
    },
    /// The action failed.
    ErrorSimple {
        /// The headline of the alert.
        message: String,
    },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (is_success, message, details) = match self {
            Alert::Success { message, details } => (true, message, details),
            Alert::Error { message, details } => (false, message, details),
            Alert::ErrorSimple { message } => (false, message, String::new()),
        };

        let style = if is_success {
            "flex items-start p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
            border border-green-300 dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        } else {
            "flex items-start p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
            border border-red-300 dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        };

        html! {
            div
                id="alert"
                role="alert"
                class=(style)
                data-alert-kind=(if is_success { "success" } else { "error" })
            {
                div class="flex-1"
                {
                    p class="font-medium" { (message) }

                    @if !details.is_empty() {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Close"
                    class="ms-3 -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex h-8 w-8 \
                        items-center justify-center hover:bg-gray-100 dark:hover:bg-gray-700"
                    onclick="this.closest('#alert-container').classList.add('hidden')"
                {
                    "✕"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::alert::Alert;

    #[test]
    fn renders_message_and_details() {
        let alert = Alert::Error {
            message: "Export failed".to_owned(),
            details: "Disk full".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());

        let alert = html
            .select(&Selector::parse("#alert").unwrap())
            .next()
            .expect("No alert found");
        assert_eq!(alert.value().attr("data-alert-kind"), Some("error"));
        let text = alert.text().collect::<String>();
        assert!(text.contains("Export failed"), "got {text}");
        assert!(text.contains("Disk full"), "got {text}");
    }

    #[test]
    fn simple_alert_has_no_details() {
        let alert = Alert::ErrorSimple {
            message: "Could not save the expenses".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());

        let paragraphs = html.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(paragraphs, 1);
    }
}
