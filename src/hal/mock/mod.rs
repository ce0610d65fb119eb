pub mod gatt;
pub mod scripted;

pub use gatt::{encode_le, ConnectBehavior, ReadEvent, SimulatedGattClient};
pub use scripted::{ScriptHandle, ScriptedTransport};
