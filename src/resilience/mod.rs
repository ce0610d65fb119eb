pub mod policy;

pub use policy::ReconnectPolicy;
