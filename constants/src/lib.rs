pub mod node;
pub mod config;

pub use config::{ConfigError, ProtocolConfig, ProtocolConfigRef};
