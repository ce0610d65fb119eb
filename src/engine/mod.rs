pub mod ingestion;
pub mod session;
pub mod state;

pub use ingestion::{IngestionLoop, LoopOptions, SessionShared};
pub use session::{create_transport, start_session, Session, SessionOptions};
pub use state::SessionState;
