pub mod ble;
#[cfg(feature = "ble")]
pub mod btleplug_client;
pub mod mock;
pub mod state;
pub mod traits;
pub mod udp;

pub use ble::BleTransport;
#[cfg(feature = "ble")]
pub use btleplug_client::BtleplugClient;
pub use state::{CloseHandle, ConnectionState, StateCell};
pub use traits::{GattClient, TransportSource};
pub use udp::UdpTransport;
