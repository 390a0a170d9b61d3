//! Log-out route handler that invalidates the auth cookie and drops the session's records.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{AppState, endpoints, source::RecordStore};

use super::{cookie::get_token_from_cookies, invalidate_auth_cookie};

/// The state needed to log a user out.
#[derive(Debug, Clone)]
pub struct LogOutState {
    pub cookie_key: Key,
    pub record_store: RecordStore,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            record_store: state.record_store.clone(),
        }
    }
}

impl FromRef<LogOutState> for Key {
    fn from_ref(state: &LogOutState) -> Self {
        state.cookie_key.clone()
    }
}

/// Invalidate the auth cookie and redirect the client to the log-in page.
pub async fn get_log_out(State(state): State<LogOutState>, jar: PrivateCookieJar) -> Response {
    if let Ok(token) = get_token_from_cookies(&jar) {
        if let Err(error) = state.record_store.forget(&token.session) {
            tracing::error!("Could not drop records for session: {error}");
        }
    }

    let jar = invalidate_auth_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}

#[cfg(test)]
mod log_out_tests {
    use axum::{
        body::Body,
        extract::State,
        http::{Response, StatusCode, header::SET_COOKIE},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use serde_json::json;
    use sha2::{Digest, Sha512};
    use time::OffsetDateTime;

    use crate::{
        api::SessionToken,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, set_auth_cookie},
        endpoints,
        source::RecordStore,
        test_utils::{FAKE_TOKEN, FakeApi},
    };

    use super::{LogOutState, get_log_out};

    fn get_state(record_store: RecordStore) -> LogOutState {
        LogOutState {
            cookie_key: Key::from(&Sha512::digest("42")),
            record_store,
        }
    }

    #[tokio::test]
    async fn log_out_invalidates_auth_cookie_and_redirects() {
        let state = get_state(RecordStore::default());
        let jar = set_auth_cookie(
            PrivateCookieJar::new(state.cookie_key.clone()),
            SessionToken::new(FAKE_TOKEN),
            DEFAULT_COOKIE_DURATION,
        )
        .unwrap();

        let response = get_log_out(State(state), jar).await;

        assert_redirect(&response, endpoints::LOG_IN_VIEW);
        assert_cookie_expired(&response);
    }

    #[tokio::test]
    async fn log_out_drops_session_records() {
        let api = FakeApi::start().await;
        api.set_records(vec![json!({"_id": "a1"})]);
        let store = RecordStore::default();
        let token = SessionToken::new(FAKE_TOKEN);
        store.snapshot(&api.client(), &token).await.unwrap();
        let state = get_state(store.clone());
        let jar = set_auth_cookie(
            PrivateCookieJar::new(state.cookie_key.clone()),
            token.clone(),
            DEFAULT_COOKIE_DURATION,
        )
        .unwrap();

        get_log_out(State(state), jar).await;
        store.snapshot(&api.client(), &token).await.unwrap();

        assert_eq!(api.fetch_count(), 2);
    }

    #[track_caller]
    fn assert_redirect(response: &Response<Body>, want_location: &str) {
        let redirect_location = response.headers().get("location").unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect_location, want_location);
    }

    #[track_caller]
    fn assert_cookie_expired(response: &Response<Body>) {
        let mut found = false;

        for cookie_header in response.headers().get_all(SET_COOKIE) {
            let cookie = Cookie::parse(cookie_header.to_str().unwrap()).unwrap();

            if cookie.name() != COOKIE_TOKEN {
                continue;
            }

            found = true;
            assert_eq!(
                cookie.expires_datetime(),
                Some(OffsetDateTime::UNIX_EPOCH),
                "got expires {:?}, want {:?}",
                cookie.expires_datetime(),
                Some(OffsetDateTime::UNIX_EPOCH),
            );
        }

        assert!(found, "no {COOKIE_TOKEN} cookie in the response");
    }
}
