//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session is bootstrapped once on startup from the server-verified cookie
//! and mutated by login/logout. The gateway clears it when a refresh fails, so
//! route guards fall back to the login screen on the next protected view.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::net::transport::{AUTH_LOGIN, AUTH_LOGOUT, AUTH_ME, AUTH_SIGNUP};
use crate::net::types::{LoginRequest, LoginResponse, Role, SignupRequest, User};
use crate::net::{ApiError, Gateway};
use crate::state::store::Store;

/// Current identity plus the bootstrap flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    /// True only until the initial bootstrap settles.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

impl SessionState {
    /// Forget the user and end any pending bootstrap.
    pub fn clear(&mut self) {
        self.user = None;
        self.loading = false;
    }

    /// Forget the user only. A bootstrap still in flight keeps `loading` and
    /// settles it itself.
    pub fn sign_out(&mut self) {
        self.user = None;
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_employer(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_employer)
    }

    /// Decide what a view guarded by `route` should do right now.
    #[must_use]
    pub fn guard(&self, route: RouteKind) -> RouteDecision {
        if self.loading {
            return RouteDecision::Loading;
        }
        match (route, self.user.is_some()) {
            (RouteKind::Protected, false) => RouteDecision::Redirect(LOGIN_ROUTE),
            (RouteKind::GuestOnly, true) => RouteDecision::Redirect(HOME_ROUTE),
            _ => RouteDecision::Render,
        }
    }
}

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";

/// Guard class of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteKind {
    /// Requires a signed-in user (dashboard, tasks, users, profile).
    Protected,
    /// Only for signed-out visitors (login, signup).
    GuestOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// Bootstrap still running; show a loader.
    Loading,
    Render,
    Redirect(&'static str),
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// Session manager: owns the session state through the gateway it shares with
/// the resource stores.
#[derive(Clone)]
pub struct SessionStore {
    gateway: Gateway,
}

impl SessionStore {
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn state(&self) -> &Store<SessionState> {
        self.gateway.session()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state().snapshot()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state().with(|s| s.user.clone())
    }

    /// Bootstrap the session from the stored cookie.
    ///
    /// Without a session cookie no request is made. Any failure of
    /// `GET /auth/me` leaves the session signed out; `loading` is always
    /// cleared.
    pub async fn init(&self) {
        if !self.gateway.has_session_cookie() {
            tracing::debug!("no session cookie; skipping bootstrap");
            self.state().update(|s| s.loading = false);
            return;
        }

        match self.gateway.get::<User>(AUTH_ME).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "session restored");
                self.state().update(|s| {
                    s.user = Some(user);
                    s.loading = false;
                });
            }
            Err(err) => {
                tracing::info!(error = %err, "session bootstrap failed");
                self.state().update(SessionState::clear);
            }
        }
    }

    /// Sign in and adopt the returned user.
    ///
    /// # Errors
    ///
    /// Returns the server error (e.g. 401 "Invalid email or password") as-is.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let response: LoginResponse = self.gateway.post(AUTH_LOGIN, &LoginRequest { email, password }).await?;
        let user = response.user;
        tracing::info!(user_id = user.id, "logged in");
        self.state().update(|s| {
            s.user = Some(user.clone());
            s.loading = false;
        });
        Ok(user)
    }

    /// Register a new account. The session is left untouched; the caller logs
    /// in separately.
    ///
    /// # Errors
    ///
    /// Returns validation/conflict errors from the server as-is.
    pub async fn signup(&self, name: &str, email: &str, password: &str, role: Role) -> Result<(), ApiError> {
        let body = SignupRequest { name, email, password, role };
        let _: serde_json::Value = self.gateway.post(AUTH_SIGNUP, &body).await?;
        Ok(())
    }

    /// Sign out. The local session is cleared whatever the server says.
    ///
    /// # Errors
    ///
    /// Returns the server/network error after the session has been cleared.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.gateway.post_empty(AUTH_LOGOUT).await;
        self.state().update(SessionState::clear);
        match result {
            Ok(_) => {
                tracing::info!("logged out");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "logout request failed; session cleared locally");
                Err(err)
            }
        }
    }

    /// Refetch the current user, e.g. after a profile edit.
    ///
    /// # Errors
    ///
    /// Returns the request error; the session is left unchanged on failure.
    pub async fn fetch_me(&self) -> Result<User, ApiError> {
        let user: User = self.gateway.get(AUTH_ME).await?;
        self.state().update(|s| {
            s.user = Some(user.clone());
            s.loading = false;
        });
        Ok(user)
    }

    /// Drop the current user without contacting the server.
    pub fn clear_user(&self) {
        self.state().update(SessionState::sign_out);
    }

    #[must_use]
    pub fn is_employer(&self) -> bool {
        self.state().with(SessionState::is_employer)
    }

    #[must_use]
    pub fn guard(&self, route: RouteKind) -> RouteDecision {
        self.state().with(|s| s.guard(route))
    }
}
