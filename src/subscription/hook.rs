use std::fmt;

use crate::subscription::subscribe_error::SubscribeError;

/// Token returned by [`Hook::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T) + Send>;

/// Single-subscriber notification point.
///
/// A second `subscribe` fails instead of replacing the current callback, so a
/// consumer can never be silently disconnected by another one.
pub struct Hook<T> {
    slot: Option<(SubscriptionId, Callback<T>)>,
    next_id: u64,
}

impl<T> Hook<T> {
    pub fn new() -> Self {
        Self {
            slot: None,
            next_id: 1,
        }
    }

    /// Registers `callback`.
    ///
    /// # Errors
    /// `AlreadySubscribed` with the current subscriber's id when the slot is taken.
    pub fn subscribe<F>(&mut self, callback: F) -> Result<SubscriptionId, SubscribeError>
    where
        F: FnMut(&T) + Send + 'static,
    {
        if let Some((current, _)) = &self.slot {
            return Err(SubscribeError::AlreadySubscribed(*current));
        }
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.slot = Some((id, Box::new(callback)));
        Ok(id)
    }

    /// Removes the subscriber if `id` is the current one. Returns whether it was.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match &self.slot {
            Some((current, _)) if *current == id => {
                self.slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.slot.is_some()
    }

    /// Invokes the subscriber, if any. Returns whether one was invoked.
    pub fn emit(&mut self, value: &T) -> bool {
        match &mut self.slot {
            Some((_, callback)) => {
                callback(value);
                true
            }
            None => false,
        }
    }
}

impl<T> Default for Hook<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("subscriber", &self.slot.as_ref().map(|(id, _)| *id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn refuses_second_subscriber() {
        let mut hook: Hook<u32> = Hook::new();
        let first = hook.subscribe(|_| {}).unwrap();
        assert_eq!(
            hook.subscribe(|_| {}),
            Err(SubscribeError::AlreadySubscribed(first))
        );
    }

    #[test]
    fn accepts_new_subscriber_after_unsubscribe() {
        let mut hook: Hook<u32> = Hook::new();
        let first = hook.subscribe(|_| {}).unwrap();
        assert!(hook.unsubscribe(first));
        assert!(!hook.unsubscribe(first));
        let second = hook.subscribe(|_| {}).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn stale_id_does_not_remove_current_subscriber() {
        let mut hook: Hook<u32> = Hook::new();
        let first = hook.subscribe(|_| {}).unwrap();
        hook.unsubscribe(first);
        hook.subscribe(|_| {}).unwrap();
        assert!(!hook.unsubscribe(first));
        assert!(hook.is_subscribed());
    }

    #[test]
    fn emit_reaches_subscriber_in_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut hook: Hook<u32> = Hook::new();
        assert!(!hook.emit(&0));
        hook.subscribe(move |v| sink.lock().unwrap().push(*v)).unwrap();
        for v in 1..=3 {
            assert!(hook.emit(&v));
        }
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn unsubscribed_hook_stops_delivering() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut hook: Hook<()> = Hook::new();
        let id = hook.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        hook.emit(&());
        hook.unsubscribe(id);
        hook.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
