pub mod hook;
pub mod subscribe_error;

pub use hook::{Hook, SubscriptionId};
pub use subscribe_error::SubscribeError;
