//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    alert::Alert, endpoints, internal_server_error::InternalServerError, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The remote API rejected the username, password or 2FA token.
    #[error("invalid username, password or 2FA token")]
    InvalidCredentials,

    /// The remote API no longer accepts the session token.
    ///
    /// The client should be logged out and sent to the log-in page.
    #[error("the session has expired")]
    SessionExpired,

    /// The auth cookie is missing from the cookie jar, has expired, or could
    /// not be decoded.
    #[error("no valid auth cookie in the cookie jar")]
    CookieMissing,

    /// There was an error formatting the expiry date time of the auth cookie.
    #[error("could not format the auth cookie expiry: {0}")]
    InvalidDateFormat(String),

    /// The remote API could not be reached, e.g. the connection was refused or
    /// the request timed out.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("could not reach the API: {0}")]
    ApiUnavailable(String),

    /// The remote API responded with an unexpected status code.
    #[error("the API responded with status {0}")]
    ApiStatus(u16),

    /// The remote API refused a request and explained why.
    #[error("the API rejected the request: {0}")]
    ApiRejected(String),

    /// The body of a response from the remote API could not be parsed.
    #[error("could not parse the API response: {0}")]
    ApiResponse(String),

    /// The data submitted in a form is invalid.
    ///
    /// The string should describe the problem in a way the user can act on.
    #[error("{0}")]
    InvalidForm(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the record store lock.
    #[error("could not acquire the record store lock")]
    StoreLockError,

    /// The records could not be written as CSV.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

const API_UNAVAILABLE_FIX: &str = "The records service could not be reached. \
    Try again in a few minutes or check the server logs.";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::SessionExpired | Error::CookieMissing => {
                Redirect::to(endpoints::LOG_OUT).into_response()
            }
            Error::ApiUnavailable(_) | Error::ApiStatus(_) | Error::ApiResponse(_) => {
                InternalServerError {
                    description: "Could not load data",
                    fix: API_UNAVAILABLE_FIX,
                }
                .into_response()
            }
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::StoreLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::SessionExpired | Error::CookieMissing => {
                return (HxRedirect(endpoints::LOG_OUT.to_owned()), StatusCode::OK).into_response();
            }
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::ApiUnavailable(_) | Error::ApiStatus(_) | Error::ApiResponse(_) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Could not reach the records service".to_owned(),
                    details: API_UNAVAILABLE_FIX.to_owned(),
                },
            ),
            Error::ApiRejected(reason) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "The records service rejected the request".to_owned(),
                    details: reason,
                },
            ),
            Error::InvalidForm(reason) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid record".to_owned(),
                    details: reason,
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not find record".to_owned(),
                    details: "The record could not be found. \
                    Try refreshing the page to see if the record has been deleted."
                        .to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
