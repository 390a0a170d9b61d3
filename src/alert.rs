//! Alerts for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element of the base page.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// A dismissable message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Success { message: String, details: String },
    SuccessSimple { message: String },
    Error { message: String, details: String },
}

const SUCCESS_STYLE: &str = "flex items-start p-4 mb-4 text-sm rounded-lg shadow \
    text-green-800 bg-green-50 border border-green-300 \
    dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_STYLE: &str = "flex items-start p-4 mb-4 text-sm rounded-lg shadow \
    text-red-800 bg-red-50 border border-red-300 \
    dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

impl Alert {
    pub fn into_html(self) -> Markup {
        let (style, role, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, "status", message, details),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, "status", message, String::new()),
            Alert::Error { message, details } => (ERROR_STYLE, "alert", message, details),
        };

        html! {
            div class=(style) role=(role) data-alert
            {
                div class="flex-1"
                {
                    p class="font-medium" { (message) }

                    @if !details.is_empty()
                    {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    class="ms-3 font-bold"
                    aria-label="Dismiss"
                    onclick="this.closest('[data-alert]').remove()"
                {
                    "×"
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
    use axum::response::IntoResponse;
    use scraper::Selector;

    use crate::test_utils::{assert_status_ok, assert_valid_html, parse_html_fragment};

    use super::Alert;

    #[tokio::test]
    async fn error_alert_shows_message_and_details() {
        let response = Alert::Error {
            message: "Could not save record".to_owned(),
            details: "Weight must be a number".to_owned(),
        }
        .into_response();

        assert_status_ok(&response);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("No alert found");
        let text = alert.text().collect::<String>();
        assert!(text.contains("Could not save record"));
        assert!(text.contains("Weight must be a number"));
    }

    #[tokio::test]
    async fn simple_success_alert_has_one_paragraph() {
        let response = Alert::SuccessSimple {
            message: "Record deleted".to_owned(),
        }
        .into_response();

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let paragraphs = html.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(paragraphs, 1);
    }
}
