//! Defines the page to display when a route or resource does not exist.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// The 404 page.
pub struct NotFound;

impl IntoResponse for NotFound {
    fn into_response(self) -> Response {
        let view = error_view(
            "Not Found",
            "404",
            "Page not found",
            "Sorry, we can't find that page. You'll find lots to explore on the home page.",
        );

        (StatusCode::NOT_FOUND, Html(view.into_string())).into_response()
    }
}

/// The fallback route handler for unknown paths.
pub async fn get_404_not_found() -> Response {
    NotFound.into_response()
}
