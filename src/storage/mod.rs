pub mod record;
pub mod sink;

pub use record::{read_records, PersistedRecord};
pub use sink::{FileSink, MemorySink, PersistenceSink};
