//! Client core for the WorkManager team/task application.
//!
//! ARCHITECTURE
//! ============
//! - [`net`]: wire types, the `Transport` seam, and the `Gateway` that
//!   attaches the session cookie and recovers once from an expired session.
//! - [`state`]: the session manager and the task/user collection stores,
//!   all observable through `Store`.
//! - [`app`]: wires the pieces over one shared gateway.

pub mod app;
pub mod config;
pub mod net;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use app::App;
pub use config::ClientConfig;
pub use net::{ApiError, Gateway};
