//! The client for the remote API that owns the cooperative's users and records.

use std::{fmt::Debug, time::Duration};

use reqwest::{Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Error,
    record::{Record, RecordDraft},
};

/// The bearer token issued by the remote API when a user logs in.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens must not end up in the logs.
impl Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(********)")
    }
}

/// The credentials sent to the remote API to log in.
#[derive(Clone, Serialize)]
pub struct LogInRequest {
    pub user: String,
    pub password: String,
    /// `null` when two-factor authentication is disabled.
    #[serde(rename = "token2FA")]
    pub token_2fa: Option<String>,
}

/// The details sent to the remote API to create a user.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub user: String,
    pub password: String,
    pub email: String,
}

#[derive(Deserialize)]
struct LogInResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

/// The default time to wait for the remote API before giving up on a request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const LOG_IN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const RECORDS_PATH: &str = "/api/aspirantes";

/// A client for the remote REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the API hosted at `base_url`, e.g. "https://api.example.com".
    ///
    /// # Errors
    /// Returns [Error::ApiUnavailable] if the HTTP client cannot be created.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .inspect_err(|error| tracing::error!("Could not create HTTP client: {error}"))
            .map_err(|error| Error::ApiUnavailable(error.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The URL of the record `id`, with `id` percent-encoded as a single path segment.
    fn record_url(&self, id: &str) -> Result<Url, Error> {
        let mut url = Url::parse(&self.url(RECORDS_PATH))
            .inspect_err(|error| tracing::error!("Invalid API URL {}: {error}", self.base_url))
            .map_err(|error| Error::ApiUnavailable(error.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| Error::ApiUnavailable(format!("{} cannot have a path", self.base_url)))?
            .push(id);

        Ok(url)
    }

    /// Exchange a user's credentials for a session token.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidCredentials] if the API rejects the credentials.
    /// - [Error::ApiUnavailable] if the API cannot be reached.
    /// - [Error::ApiStatus] or [Error::ApiResponse] if the API responds unexpectedly.
    pub async fn log_in(&self, request: &LogInRequest) -> Result<SessionToken, Error> {
        let response = self
            .client
            .post(self.url(LOG_IN_PATH))
            .json(request)
            .send()
            .await
            .map_err(unavailable)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Log-in for {} rejected by the API", request.user);
            return Err(Error::InvalidCredentials);
        }

        let body: LogInResponse = check_status(response)
            .await?
            .json()
            .await
            .inspect_err(|error| tracing::error!("Could not parse log-in response: {error}"))
            .map_err(|error| Error::ApiResponse(error.to_string()))?;

        Ok(SessionToken::new(body.token))
    }

    /// Create a new user.
    ///
    /// # Errors
    /// Returns [Error::ApiRejected] with the API's explanation if the user
    /// could not be created, or the errors described in [ApiClient::log_in].
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), Error> {
        let response = self
            .client
            .post(self.url(REGISTER_PATH))
            .json(request)
            .send()
            .await
            .map_err(unavailable)?;

        check_status(response).await.map(|_| ())
    }

    /// Fetch every record visible to the session.
    ///
    /// Entries that are not JSON objects are skipped.
    ///
    /// # Errors
    /// Returns [Error::SessionExpired] if the API no longer accepts `token`,
    /// or the errors described in [ApiClient::log_in].
    pub async fn fetch_records(&self, token: &SessionToken) -> Result<Vec<Record>, Error> {
        let response = self
            .client
            .get(self.url(RECORDS_PATH))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(unavailable)?;

        let entries: Vec<Value> = check_session(response)
            .await?
            .json()
            .await
            .inspect_err(|error| tracing::error!("Could not parse records: {error}"))
            .map_err(|error| Error::ApiResponse(error.to_string()))?;

        let total = entries.len();
        let records: Vec<Record> = entries
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|entry| {
                serde_json::from_value(entry)
                    .inspect_err(|error| tracing::warn!("Skipping malformed record: {error}"))
                    .ok()
            })
            .collect();

        if records.len() < total {
            tracing::warn!("Skipped {} of {total} records", total - records.len());
        }

        Ok(records)
    }

    /// Create a record from `draft`.
    ///
    /// # Errors
    /// See [ApiClient::fetch_records].
    pub async fn create_record(
        &self,
        token: &SessionToken,
        draft: &RecordDraft,
    ) -> Result<(), Error> {
        let response = self
            .client
            .post(self.url(RECORDS_PATH))
            .bearer_auth(token.as_str())
            .json(draft)
            .send()
            .await
            .map_err(unavailable)?;

        check_session(response).await.map(|_| ())
    }

    /// Replace the record `id` with `draft`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the API has no record `id`, otherwise see
    /// [ApiClient::fetch_records].
    pub async fn update_record(
        &self,
        token: &SessionToken,
        id: &str,
        draft: &RecordDraft,
    ) -> Result<(), Error> {
        let response = self
            .client
            .put(self.record_url(id)?)
            .bearer_auth(token.as_str())
            .json(draft)
            .send()
            .await
            .map_err(unavailable)?;

        check_session(response).await.map(|_| ())
    }

    /// Delete the record `id`.
    ///
    /// # Errors
    /// See [ApiClient::update_record].
    pub async fn delete_record(&self, token: &SessionToken, id: &str) -> Result<(), Error> {
        let response = self
            .client
            .delete(self.record_url(id)?)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(unavailable)?;

        check_session(response).await.map(|_| ())
    }
}

fn unavailable(error: reqwest::Error) -> Error {
    tracing::error!("Could not reach the API: {error}");
    Error::ApiUnavailable(error.to_string())
}

/// Map an expired session to [Error::SessionExpired], then check the status like [check_status].
async fn check_session(response: Response) -> Result<Response, Error> {
    if response.status() == StatusCode::UNAUTHORIZED {
        tracing::info!("The API rejected the session token");
        return Err(Error::SessionExpired);
    }

    check_status(response).await
}

async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound);
    }

    if status.is_client_error() {
        if let Ok(ErrorResponse { message }) = response.json::<ErrorResponse>().await {
            tracing::warn!("The API rejected the request ({status}): {message}");
            return Err(Error::ApiRejected(message));
        }
    }

    tracing::error!("The API responded with {status}");
    Err(Error::ApiStatus(status.as_u16()))
}
