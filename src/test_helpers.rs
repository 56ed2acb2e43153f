//! Shared fixtures for unit tests: a scripted transport and sample entities.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::net::transport::{ApiRequest, ApiResponse, Transport};
use crate::net::types::{Role, Task, TaskStatus, User};
use crate::net::{ApiError, Gateway};
use crate::state::session::SessionState;
use crate::state::store::Store;

type Scripted = Result<Value, ApiError>;

/// Transport that answers from per-route scripts and records every call.
///
/// Each route holds a queue of responses; the last one is sticky and answers
/// every later call. Unscripted routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<ApiRequest>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    session_cookie: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, result: Scripted) {
        self.routes
            .lock()
            .expect("routes mutex should lock")
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(result);
    }

    pub fn ok(&self, method: Method, path: &str, body: Value) {
        self.respond(method, path, Ok(body));
    }

    pub fn fail(&self, method: Method, path: &str, err: ApiError) {
        self.respond(method, path, Err(err));
    }

    /// Hold the next call to `path` until the returned `Notify` fires.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("gates mutex should lock")
            .insert(path.to_owned(), Arc::clone(&notify));
        notify
    }

    pub fn set_session_cookie(&self, present: bool) {
        self.session_cookie.store(present, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().expect("calls mutex should lock").clone()
    }

    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| &c.method == method && c.path == path)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls
            .lock()
            .expect("calls mutex should lock")
            .push(request.clone());

        let gate = self
            .gates
            .lock()
            .expect("gates mutex should lock")
            .remove(&request.path);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let scripted = {
            let mut routes = self.routes.lock().expect("routes mutex should lock");
            match routes.get_mut(&(request.method.clone(), request.path.clone())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        scripted
            .unwrap_or_else(|| Err(status(404, "no mock route")))
            .map(|body| ApiResponse { status: 200, body })
    }

    fn has_session_cookie(&self) -> bool {
        self.session_cookie.load(Ordering::SeqCst)
    }
}

pub fn status(code: u16, message: &str) -> ApiError {
    ApiError::Status { status: code, message: Some(message.to_owned()) }
}

pub fn unauthorized() -> ApiError {
    status(401, "Token has expired")
}

pub fn gateway(transport: &Arc<MockTransport>) -> Gateway {
    let transport: Arc<dyn Transport> = Arc::clone(transport) as Arc<dyn Transport>;
    Gateway::new(transport, Store::new(SessionState::default()))
}

pub fn user(id: i64, email: &str, role: Role) -> User {
    User { id, name: format!("User {id}"), email: email.to_owned(), role, employer_id: None }
}

pub fn user_json(id: i64, email: &str, role: Role) -> Value {
    serde_json::to_value(user(id, email, role)).expect("user should serialize")
}

pub fn task(id: i64, title: &str, status: TaskStatus) -> Task {
    Task {
        id,
        title: title.to_owned(),
        description: None,
        status,
        assigned_to: None,
        created_by: 1,
        assigned_to_name: None,
        created_by_name: Some("User 1".to_owned()),
        created_at: None,
        updated_at: None,
    }
}

pub fn task_json(id: i64, title: &str, status: TaskStatus) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "status": status.as_str(),
        "assigned_to": null,
        "created_by": 1,
        "created_by_name": "User 1"
    })
}
