//! Networking: wire types, transport, and the refresh-aware gateway.

pub mod error;
pub mod gateway;
pub mod transport;
pub mod types;

pub use error::{ApiError, ErrorKind};
pub use gateway::Gateway;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
