//! The registration page and the handler that creates a user with the remote API.

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    api::{ApiClient, RegisterRequest},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, base, link, loading_spinner, log_in_register, password_input,
        text_input,
    },
};

use super::log_in::MISSING_FIELDS_ERROR_MSG;

pub const PASSWORD_MISMATCH_ERROR_MSG: &str = "Passwords do not match";
pub const REGISTRATION_FAILED_ERROR_MSG: &str =
    "An error occurred during registration. Please try again.";

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegisterState {
    pub api: ApiClient,
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
        }
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

fn register_form(user: &str, email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("user", "Username", "text", user, true))

            (text_input("email", "Email", "email", email, false))

            (password_input("password", "Password", 8, None))

            (password_input("confirm_password", "Confirm password", 8, None))

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = register_form("", "", None);
    let content = log_in_register("Create an account", &form);

    base("Register", &[], &content).into_response()
}

/// Handler for registration requests via the POST method.
///
/// On success the client is redirected to the log-in page, otherwise the
/// form is returned with an error message explaining the problem.
pub async fn post_register(
    State(state): State<RegisterState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let user = form.user.trim();
    let email = form.email.trim();
    let form_with_error =
        |error_message: &str| register_form(user, email, Some(error_message)).into_response();

    if user.is_empty() || email.is_empty() || form.password.is_empty() {
        return form_with_error(MISSING_FIELDS_ERROR_MSG);
    }

    if form.password != form.confirm_password {
        return form_with_error(PASSWORD_MISMATCH_ERROR_MSG);
    }

    let request = RegisterRequest {
        user: user.to_owned(),
        password: form.password.clone(),
        email: email.to_owned(),
    };

    match state.api.register(&request).await {
        Ok(()) => {
            tracing::info!("Registered user {user}");
            let redirect_url = format!("{}?registered=true", endpoints::LOG_IN_VIEW);

            (HxRedirect(redirect_url), StatusCode::SEE_OTHER).into_response()
        }
        Err(Error::ApiRejected(reason)) => form_with_error(&reason),
        Err(error) => {
            tracing::error!("Could not register {user}: {error}");
            form_with_error(REGISTRATION_FAILED_ERROR_MSG)
        }
    }
}
