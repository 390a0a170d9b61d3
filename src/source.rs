//! Per-session snapshots of the records held by the remote API.
//!
//! Pages read records from a [RecordStore] instead of calling the API on
//! every request. A snapshot is refetched when it is older than the refresh
//! interval or when it has been marked stale, e.g. after the user edits a
//! record or asks for fresh data.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    api::{ApiClient, SessionToken},
    auth::hx_current_path,
    endpoints,
    record::Record,
};

/// The default time after which a snapshot is refetched.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// The records fetched for a session.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<[Record]>,
    /// When the records were fetched.
    pub fetched_at: OffsetDateTime,
    /// Why the latest attempt to refresh the records failed, if it did.
    pub refresh_error: Option<String>,
}

#[derive(Debug, Clone)]
struct Entry {
    snapshot: Snapshot,
    fetched: Instant,
    stale: bool,
}

/// The default time after which a session's snapshot is dropped when it is not refetched.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Holds one [Snapshot] per session.
///
/// Sessions that end without logging out are dropped once their snapshot is
/// older than the session TTL, the next time any session fetches records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    refresh_interval: Duration,
    session_ttl: Duration,
}

impl RecordStore {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            refresh_interval,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Drop snapshots that have not been fetched for `session_ttl`.
    pub fn with_session_ttl(self, session_ttl: Duration) -> Self {
        Self {
            session_ttl,
            ..self
        }
    }

    /// Get the records for the session `token`, fetching them from `api` if
    /// there is no fresh snapshot.
    ///
    /// If a refresh fails and an older snapshot exists, the older snapshot is
    /// returned with [Snapshot::refresh_error] set.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::SessionExpired] if the API no longer accepts `token`. The
    ///   session's snapshot is dropped.
    /// - Any other API error if the records have never been fetched for the session.
    /// - [Error::StoreLockError] if the store's lock is poisoned.
    pub async fn snapshot(&self, api: &ApiClient, token: &SessionToken) -> Result<Snapshot, Error> {
        let key = session_key(token);
        let cached = self.lock()?.get(&key).cloned();

        let fresh = cached.as_ref().filter(|entry| {
            !entry.stale && entry.fetched.elapsed() < self.refresh_interval
        });

        if let Some(entry) = fresh {
            return Ok(entry.snapshot.clone());
        }

        match api.fetch_records(token).await {
            Ok(records) => {
                tracing::debug!("Fetched {} records", records.len());

                let snapshot = Snapshot {
                    records: records.into(),
                    fetched_at: OffsetDateTime::now_utc(),
                    refresh_error: None,
                };
                let entry = Entry {
                    snapshot: snapshot.clone(),
                    fetched: Instant::now(),
                    stale: false,
                };
                let mut entries = self.lock()?;
                entries.retain(|_, cached| cached.fetched.elapsed() < self.session_ttl);
                entries.insert(key, entry);

                Ok(snapshot)
            }
            Err(Error::SessionExpired) => {
                self.lock()?.remove(&key);
                Err(Error::SessionExpired)
            }
            Err(error) => match cached {
                Some(entry) => {
                    tracing::warn!("Could not refresh records, serving previous snapshot: {error}");

                    Ok(Snapshot {
                        refresh_error: Some(error.to_string()),
                        ..entry.snapshot
                    })
                }
                None => Err(error),
            },
        }
    }

    /// Make the next call to [RecordStore::snapshot] refetch the records for `token`.
    pub fn mark_stale(&self, token: &SessionToken) -> Result<(), Error> {
        if let Some(entry) = self.lock()?.get_mut(&session_key(token)) {
            entry.stale = true;
        }

        Ok(())
    }

    /// Drop the snapshot for `token`.
    pub fn forget(&self, token: &SessionToken) -> Result<(), Error> {
        self.lock()?.remove(&session_key(token));

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, Error> {
        self.entries
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire record store lock: {error}"))
            .map_err(|_| Error::StoreLockError)
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

/// Snapshots are keyed by a hash of the token so the raw token is only kept in the cookie.
fn session_key(token: &SessionToken) -> String {
    format!("{:x}", Sha256::digest(token.as_str()))
}

/// The state needed by pages that display records.
#[derive(Debug, Clone)]
pub struct DataState {
    pub api: ApiClient,
    pub store: RecordStore,
    /// The local timezone as a canonical timezone name, e.g. "America/Bogota".
    pub local_timezone: String,
}

impl FromRef<AppState> for DataState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
            store: state.record_store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Route handler that marks the session's records as stale and reloads the current page.
pub async fn refresh_records(
    State(state): State<DataState>,
    Extension(token): Extension<SessionToken>,
    headers: HeaderMap,
) -> Response {
    if let Err(error) = state.store.mark_stale(&token) {
        return error.into_alert_response();
    }

    let redirect_url =
        hx_current_path(&headers).unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

    (HxRedirect(redirect_url), StatusCode::OK).into_response()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;
    use time::OffsetDateTime;

    use crate::{
        Error,
        api::SessionToken,
        test_utils::{FAKE_TOKEN, FakeApi},
    };

    use super::{Entry, Record, RecordStore, Snapshot, session_key};

    fn token() -> SessionToken {
        SessionToken::new(FAKE_TOKEN)
    }

    #[tokio::test]
    async fn fresh_snapshot_is_reused() {
        let api = FakeApi::start().await;
        api.set_records(vec![json!({"_id": "a1"})]);
        let store = RecordStore::new(Duration::from_secs(600));

        let first = store.snapshot(&api.client(), &token()).await.unwrap();
        let second = store.snapshot(&api.client(), &token()).await.unwrap();

        assert_eq!(api.fetch_count(), 1);
        assert_eq!(first.records.len(), 1);
        assert!(std::sync::Arc::ptr_eq(&first.records, &second.records));
    }

    #[tokio::test]
    async fn expired_snapshot_is_refetched() {
        let api = FakeApi::start().await;
        let store = RecordStore::new(Duration::ZERO);

        store.snapshot(&api.client(), &token()).await.unwrap();
        store.snapshot(&api.client(), &token()).await.unwrap();

        assert_eq!(api.fetch_count(), 2);
    }

    #[tokio::test]
    async fn stale_snapshot_is_refetched() {
        let api = FakeApi::start().await;
        let store = RecordStore::new(Duration::from_secs(600));

        store.snapshot(&api.client(), &token()).await.unwrap();
        api.set_records(vec![json!({"_id": "a1"}), json!({"_id": "b2"})]);
        store.mark_stale(&token()).unwrap();
        let snapshot = store.snapshot(&api.client(), &token()).await.unwrap();

        assert_eq!(api.fetch_count(), 2);
        assert_eq!(snapshot.records.len(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_serves_previous_snapshot() {
        let api = FakeApi::start().await;
        api.set_records(vec![json!({"_id": "a1"})]);
        let store = RecordStore::new(Duration::ZERO);

        store.snapshot(&api.client(), &token()).await.unwrap();
        api.fail_fetches(true);
        let snapshot = store.snapshot(&api.client(), &token()).await.unwrap();

        assert_eq!(snapshot.records.len(), 1);
        assert!(snapshot.refresh_error.is_some());
    }

    #[tokio::test]
    async fn failed_first_fetch_is_error() {
        let api = FakeApi::start().await;
        api.fail_fetches(true);
        let store = RecordStore::default();

        let got = store.snapshot(&api.client(), &token()).await;

        assert_eq!(got.map(|snapshot| snapshot.records.len()), Err(Error::ApiStatus(500)));
    }

    #[tokio::test]
    async fn expired_session_is_forgotten() {
        let api = FakeApi::start().await;
        let store = RecordStore::new(Duration::ZERO);
        let stale_token = SessionToken::new("stale");

        let got = store.snapshot(&api.client(), &stale_token).await;

        assert_eq!(got.map(|_| ()), Err(Error::SessionExpired));
        assert!(store.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forget_drops_snapshot() {
        let api = FakeApi::start().await;
        let store = RecordStore::new(Duration::from_secs(600));

        store.snapshot(&api.client(), &token()).await.unwrap();
        store.forget(&token()).unwrap();
        store.snapshot(&api.client(), &token()).await.unwrap();

        assert_eq!(api.fetch_count(), 2);
    }

    #[tokio::test]
    async fn abandoned_sessions_are_dropped_on_fetch() {
        let api = FakeApi::start().await;
        let store =
            RecordStore::new(Duration::from_secs(600)).with_session_ttl(Duration::from_secs(60));
        let abandoned = session_key(&SessionToken::new("abandoned"));
        let recent = session_key(&SessionToken::new("recent"));
        let entry = |age: Duration| Entry {
            snapshot: Snapshot {
                records: Vec::<Record>::new().into(),
                fetched_at: OffsetDateTime::now_utc(),
                refresh_error: None,
            },
            fetched: Instant::now().checked_sub(age).unwrap(),
            stale: false,
        };
        store
            .lock()
            .unwrap()
            .insert(abandoned.clone(), entry(Duration::from_secs(3600)));
        store
            .lock()
            .unwrap()
            .insert(recent.clone(), entry(Duration::from_secs(1)));

        store.snapshot(&api.client(), &token()).await.unwrap();

        let entries = store.lock().unwrap();
        assert!(!entries.contains_key(&abandoned));
        assert!(entries.contains_key(&recent));
        assert!(entries.contains_key(&session_key(&token())));
    }
}
