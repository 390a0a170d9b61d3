//! Implements a struct that holds the state of the web server.

use std::time::Duration as StdDuration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    api::{ApiClient, DEFAULT_TIMEOUT},
    auth::DEFAULT_COOKIE_DURATION,
    source::RecordStore,
    timezone::get_local_offset,
};

/// The state of the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "America/Bogota".
    pub local_timezone: String,

    /// The client for the remote records API.
    pub api: ApiClient,

    /// The per-session snapshots of the records fetched from the API.
    pub record_store: RecordStore,

    /// Whether the log-in form asks for a 2FA token.
    pub require_2fa: bool,
}

impl AppState {
    /// Create a new [AppState] that talks to the records API at `api_url`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "America/Bogota".
    /// Snapshots of the records are refetched after `refresh_interval`.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidTimezoneError] if `local_timezone` is not a known timezone.
    /// - [Error::ApiUnavailable] if the HTTP client cannot be created.
    pub fn new(
        api_url: &str,
        cookie_secret: &str,
        local_timezone: &str,
        refresh_interval: StdDuration,
        require_2fa: bool,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            api: ApiClient::new(api_url, DEFAULT_TIMEOUT)?,
            record_store: RecordStore::new(refresh_interval)
                .with_session_ttl(DEFAULT_COOKIE_DURATION.unsigned_abs()),
            require_2fa,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
