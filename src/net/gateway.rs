//! Request gateway with transparent session refresh.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every store call goes through [`Gateway`]. When a protected endpoint
//! answers 401, the gateway performs one `POST /auth/refresh` and replays the
//! original request, so callers never observe an expired access cookie.
//!
//! CONCURRENCY
//! ===========
//! At most one refresh is in flight per gateway. Requests that hit 401 while
//! it is running park a `oneshot` continuation in `RefreshState::waiters`; the
//! refresh leader releases them in FIFO order once the refresh settles. The
//! state mutex is never held across an `.await`.
//!
//! A request is refreshed at most once. Replays carry the retried flag, so a
//! second 401 goes straight back to the caller instead of looping.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use super::error::ApiError;
use super::transport::{AUTH_REFRESH, ApiRequest, Transport};
use crate::state::session::SessionState;
use crate::state::store::Store;

type RefreshOutcome = Result<(), ApiError>;

#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    refresh: Arc<Mutex<RefreshState>>,
    session: Store<SessionState>,
}

impl Gateway {
    /// Wrap `transport`. `session` is cleared when a refresh fails.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, session: Store<SessionState>) -> Self {
        Self { transport, refresh: Arc::new(Mutex::new(RefreshState::default())), session }
    }

    #[must_use]
    pub fn session(&self) -> &Store<SessionState> {
        &self.session
    }

    #[must_use]
    pub fn has_session_cookie(&self) -> bool {
        self.transport.has_session_cookie()
    }

    /// True while a refresh call is outstanding.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        lock(&self.refresh).in_progress
    }

    /// Send `request`, recovering once from an expired session.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged for network failures, auth-flow
    /// endpoints, non-401 statuses, and replayed requests. Returns the refresh
    /// error when the session could not be renewed.
    pub async fn send(&self, mut request: ApiRequest) -> Result<Value, ApiError> {
        let err = match self.transport.send(&request).await {
            Ok(response) => return Ok(response.body),
            Err(err) => err,
        };
        if !err.is_unauthorized() || request.retried || request.is_auth_route() {
            return Err(err);
        }

        request.retried = true;
        self.refresh_session().await?;

        tracing::debug!(method = %request.method, path = %request.path, "replaying request after refresh");
        self.transport.send(&request).await.map(|response| response.body)
    }

    /// `GET` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`]; also fails with [`ApiError::Decode`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        decode(self.send(ApiRequest::get(path)).await?)
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`]; also fails with encode/decode errors.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = ApiRequest::post(path).with_body(encode(body)?);
        decode(self.send(request).await?)
    }

    /// `POST` without a body, returning the raw response.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`].
    pub async fn post_empty(&self, path: &str) -> Result<Value, ApiError> {
        self.send(ApiRequest::post(path)).await
    }

    /// `PUT` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`]; also fails with encode/decode errors.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = ApiRequest::put(path).with_body(encode(body)?);
        decode(self.send(request).await?)
    }

    /// `DELETE`, returning the raw response.
    ///
    /// # Errors
    ///
    /// See [`Gateway::send`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Join the in-flight refresh, or lead a new one.
    async fn refresh_session(&self) -> RefreshOutcome {
        let waiter = {
            let mut state = lock(&self.refresh);
            if state.in_progress {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.in_progress = true;
                None
            }
        };

        if let Some(rx) = waiter {
            tracing::debug!("request queued behind in-flight session refresh");
            return rx.await.unwrap_or(Err(ApiError::RefreshAbandoned));
        }

        let lease = RefreshLease { state: &self.refresh, settled: false };
        let outcome = self
            .transport
            .send(&ApiRequest::post(AUTH_REFRESH))
            .await
            .map(|_| ());

        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "session refresh failed; clearing session");
            self.session.update(SessionState::sign_out);
        }

        let released = lease.settle(&outcome);
        tracing::debug!(released, ok = outcome.is_ok(), "session refresh settled");
        outcome
    }
}

/// Ownership of the in-flight refresh. Dropping it unsettled (the leader's
/// future was cancelled) releases waiters with `RefreshAbandoned`.
struct RefreshLease<'a> {
    state: &'a Mutex<RefreshState>,
    settled: bool,
}

impl RefreshLease<'_> {
    fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        release(self.state, outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            release(self.state, &Err(ApiError::RefreshAbandoned));
        }
    }
}

/// Clear the in-progress flag and hand `outcome` to every queued waiter.
fn release(state: &Mutex<RefreshState>, outcome: &RefreshOutcome) -> usize {
    let waiters = {
        let mut state = lock(state);
        state.in_progress = false;
        std::mem::take(&mut state.waiters)
    };
    let count = waiters.len();
    for waiter in waiters {
        // Receiver gone means the queued caller was cancelled.
        let _ = waiter.send(outcome.clone());
    }
    count
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}
