//! Wiring of transport, gateway, and stores into one client.
//!
//! DESIGN
//! ======
//! All stores share one gateway, so they share one cookie jar, one refresh
//! slot, and one session. Cloning `App` is cheap and yields handles to the
//! same state.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::net::types::User;
use crate::net::{ApiError, Gateway, HttpTransport, Transport};
use crate::state::session::{SessionState, SessionStore};
use crate::state::store::Store;
use crate::state::tasks::TasksStore;
use crate::state::users::{self, ProfileError, ProfileForm, UsersStore};

#[derive(Clone)]
pub struct App {
    pub session: SessionStore,
    pub tasks: TasksStore,
    pub users: UsersStore,
    gateway: Gateway,
}

impl App {
    /// Build an HTTP-backed client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config)?;
        tracing::debug!(base_url = %config.base_url, "api client ready");
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Build a client over any transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        let gateway = Gateway::new(transport, Store::new(SessionState::default()));
        Self {
            session: SessionStore::new(gateway.clone()),
            tasks: TasksStore::new(gateway.clone()),
            users: UsersStore::new(gateway.clone()),
            gateway,
        }
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Save the signed-in user's profile and refresh the session identity.
    ///
    /// # Errors
    ///
    /// See [`users::update_profile`].
    pub async fn update_profile(&self, form: &ProfileForm) -> Result<User, ProfileError> {
        users::update_profile(&self.session, &self.users, form).await
    }
}
