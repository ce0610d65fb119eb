pub mod buffers;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod hal;
pub mod observability;
pub mod resilience;
pub mod storage;

pub use config::SessionConfig;
pub use engine::{start_session, Session, SessionState};
pub use error::{DecodeError, SessionError, SinkError, TransportError};
