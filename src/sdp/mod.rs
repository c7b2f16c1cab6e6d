//! Text form of the negotiation artifacts.
pub mod addr_type;
pub mod attribute;
pub mod connection;
pub mod media;
pub mod origin;
pub mod sdp_error;
pub mod sdpc;

pub use attribute::Attribute;
pub use media::Media;
pub use origin::Origin;
pub use sdp_error::SdpError;
pub use sdpc::Sdp;
