pub mod channel;

pub use channel::{ChannelBuffer, ChannelBuffers, DEFAULT_CAPACITY};
