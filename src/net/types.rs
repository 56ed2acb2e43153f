//! Wire DTOs for the REST API.
//!
//! DESIGN
//! ======
//! Entity types mirror the server's JSON rows. Request payloads skip absent
//! optional fields so partial updates only touch what the caller set.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type TaskId = i64;

// =============================================================================
// ENTITIES
// =============================================================================

/// Account role. Employers own a team of employees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employer,
    #[default]
    Employee,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Employee => "employee",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employer" => Ok(Self::Employer),
            "employee" => Ok(Self::Employee),
            other => Err(format!("unknown role '{other}' (expected 'employer' or 'employee')")),
        }
    }
}

/// A user account as returned by `/auth/me` and `/users/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Owning employer for employee accounts.
    #[serde(default)]
    pub employer_id: Option<UserId>,
}

impl User {
    #[must_use]
    pub fn is_employer(&self) -> bool {
        self.role == Role::Employer
    }

    /// Up to two uppercase initials from the display name, `?` when empty.
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect();
        if initials.is_empty() { "?".to_owned() } else { initials }
    }
}

/// Task workflow status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unknown status '{other}' (expected 'pending', 'in_progress' or 'completed')"
            )),
        }
    }
}

/// A task row joined with assignee/creator names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

// =============================================================================
// AUTH PAYLOADS
// =============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of a successful `POST /auth/login`.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

// =============================================================================
// RESOURCE PAYLOADS
// =============================================================================

/// Body of `POST /tasks/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
}

/// Body of `PUT /tasks/{id}`. Absent fields keep their server value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// `Some(None)` is sent as `null` and unassigns the task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<UserId>>,
}

/// Body of `POST /users/`. The server creates an employee of the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of `PUT /users/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
