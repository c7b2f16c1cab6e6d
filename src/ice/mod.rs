//! Host candidate gathering, STUN connectivity checks and nomination over UDP.
pub mod gathering_service;
pub mod ice_config;
pub mod ice_credentials;
pub mod ice_error;
pub mod stun;
pub mod type_ice;

pub use ice_config::IceConfig;
pub use ice_credentials::IceCredentials;
pub use ice_error::IceError;
pub use type_ice::candidate::Candidate;
pub use type_ice::ice_agent::{IceAgent, IceEvent, IceRole, SelectedPath};
