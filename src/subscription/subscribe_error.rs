use thiserror::Error;

use crate::subscription::hook::SubscriptionId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("hook already has a subscriber ({0:?}); unsubscribe it first")]
    AlreadySubscribed(SubscriptionId),
}
