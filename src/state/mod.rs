//! Client-side stores observed by the view layer.

pub mod resource;
pub mod session;
pub mod store;
pub mod tasks;
pub mod users;
