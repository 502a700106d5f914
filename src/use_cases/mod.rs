// Use cases layer: session gate and orchestration workflows.

pub mod errors;
pub mod ports;
pub mod session;
pub mod session_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::ServiceError;
pub use ports::{DirectoryError, IdGenerator, SessionDirectory};
pub use session::Session;
pub use session_service::{JoinedSession, SessionService, SessionSettings};
