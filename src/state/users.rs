//! Team member store and the profile-edit flow.
//!
//! SYSTEM CONTEXT
//! ==============
//! Employers list and manage their employees here. Every user also edits their
//! own account through [`update_profile`], which goes through this store and
//! then refetches the session identity so the header reflects the change.

#[cfg(test)]
#[path = "users_test.rs"]
mod users_test;

use crate::net::ApiError;
use crate::net::types::{NewEmployee, User, UserId, UserPatch};
use crate::state::resource::{InsertAt, Resource, ResourceStore};
use crate::state::session::SessionStore;

impl Resource for User {
    type Create = NewEmployee;
    type Patch = UserPatch;

    const COLLECTION: &'static str = "/users/";
    const FETCH_FALLBACK: &'static str = "Failed to fetch users";
    const INSERT_AT: InsertAt = InsertAt::Back;

    fn id(&self) -> i64 {
        self.id
    }
}

pub type UsersStore = ResourceStore<User>;

/// Number of users employed by `employer_id`.
#[must_use]
pub fn team_size(users: &[User], employer_id: UserId) -> usize {
    users.iter().filter(|u| u.employer_id == Some(employer_id)).count()
}

// =============================================================================
// PROFILE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("not signed in")]
    NotSignedIn,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ProfileError {
    /// Text for the profile form's error banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message("Update failed"),
            other => other.to_string(),
        }
    }
}

/// Profile form input. An empty `password` keeps the current one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl ProfileForm {
    /// Prefill from the signed-in user.
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self { name: user.name.clone(), email: user.email.clone(), ..Self::default() }
    }

    /// # Errors
    ///
    /// Returns [`ProfileError::PasswordMismatch`] when a new password is given
    /// and the confirmation differs.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.password.is_empty() && self.password != self.confirm_password {
            return Err(ProfileError::PasswordMismatch);
        }
        Ok(())
    }

    #[must_use]
    pub fn to_patch(&self) -> UserPatch {
        UserPatch {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            password: (!self.password.is_empty()).then(|| self.password.clone()),
        }
    }
}

/// Save the signed-in user's profile, then refresh the session identity.
///
/// # Errors
///
/// Returns a validation error before any request, [`ProfileError::NotSignedIn`]
/// without a session, or the failing request's error.
pub async fn update_profile(session: &SessionStore, users: &UsersStore, form: &ProfileForm) -> Result<User, ProfileError> {
    form.validate()?;
    let user_id = session
        .current_user()
        .map(|u| u.id)
        .ok_or(ProfileError::NotSignedIn)?;
    users.update(user_id, &form.to_patch()).await?;
    let me = session.fetch_me().await?;
    tracing::info!(user_id, "profile updated");
    Ok(me)
}
