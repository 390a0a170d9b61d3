//! The log-in page and the handler that exchanges credentials for a session with the remote API.

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    api::{ApiClient, LogInRequest},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, base, link, loading_spinner, log_in_register, password_input,
        text_input,
    },
};

use super::{invalidate_auth_cookie, normalize_redirect_url, set_auth_cookie};

pub const MISSING_FIELDS_ERROR_MSG: &str = "Please complete all fields.";
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Invalid username, password, or 2FA token";
pub const LOG_IN_FAILED_ERROR_MSG: &str = "An error occurred. Please try again.";

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

struct LogInFormView<'a> {
    user: &'a str,
    require_2fa: bool,
    error_message: Option<&'a str>,
    redirect_url: Option<&'a str>,
    registered: bool,
}

fn log_in_form(view: LogInFormView<'_>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if view.registered {
                p class="text-green-600 dark:text-green-400 text-base"
                {
                    "Registration successful, please log in."
                }
            }

            @if let Some(redirect_url) = view.redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (text_input("user", "Username", "text", view.user, true))

            (password_input("password", "Password", 0, None))

            @if view.require_2fa {
                div
                {
                    (text_input("token_2fa", "2FA token", "text", "", false))
                }
            }

            @if let Some(error_message) = view.error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                (link(endpoints::REGISTER_VIEW, "Register here"))
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// The query parameters accepted by the log-in page.
#[derive(Debug, Default, Deserialize)]
pub struct LogInQuery {
    pub redirect_url: Option<String>,
    /// Set after a successful registration.
    pub registered: Option<String>,
}

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The client for the API that checks the credentials.
    pub api: ApiClient,
    /// Whether users must enter a 2FA token.
    pub require_2fa: bool,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            api: state.api.clone(),
            require_2fa: state.require_2fa,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// Display the log-in page.
pub async fn get_log_in_page(
    State(state): State<LogInState>,
    Query(query): Query<LogInQuery>,
) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let form = log_in_form(LogInFormView {
        user: "",
        require_2fa: state.require_2fa,
        error_message: None,
        redirect_url: redirect_url.as_deref(),
        registered: query.registered.is_some(),
    });
    let content = log_in_register("Log in to your account", &form);

    base("Log In", &[], &content).into_response()
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LogInData {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// The one-time code from the user's authenticator app, only shown when 2FA is enabled.
    pub token_2fa: Option<String>,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set.
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On success the session token is stored in the auth cookie and the client
/// is redirected to the dashboard, or the page it was trying to reach.
/// Otherwise, the form is returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();
    let user = user_data.user.trim();
    let token_2fa = user_data
        .token_2fa
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let form_with_error = |error_message: &str| {
        log_in_form(LogInFormView {
            user,
            require_2fa: state.require_2fa,
            error_message: Some(error_message),
            redirect_url,
            registered: false,
        })
        .into_response()
    };

    let is_missing_2fa = state.require_2fa && token_2fa.is_none();
    if user.is_empty() || user_data.password.is_empty() || is_missing_2fa {
        return form_with_error(MISSING_FIELDS_ERROR_MSG);
    }

    let request = LogInRequest {
        user: user.to_owned(),
        password: user_data.password.clone(),
        token_2fa: if state.require_2fa {
            token_2fa.map(str::to_owned)
        } else {
            None
        },
    };

    let session = match state.api.log_in(&request).await {
        Ok(session) => session,
        Err(Error::InvalidCredentials) => return form_with_error(INVALID_CREDENTIALS_ERROR_MSG),
        Err(error) => {
            tracing::error!("Could not log in {user}: {error}");
            return form_with_error(LOG_IN_FAILED_ERROR_MSG);
        }
    };

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };
    let redirect_url = redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW);

    set_auth_cookie(jar.clone(), session, cookie_duration)
        .map(|updated_jar| {
            (
                StatusCode::SEE_OTHER,
                HxRedirect(redirect_url.to_owned()),
                updated_jar,
            )
        })
        .map_err(|error| {
            tracing::error!("Error setting auth cookie: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}
