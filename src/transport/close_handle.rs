use std::sync::{
    Weak,
    atomic::{AtomicBool, Ordering},
};

/// Weak back-reference used to close a channel owned by someone else.
///
/// The close takes effect on the owner's next `poll`. Once the channel is
/// dropped the handle does nothing.
#[derive(Debug, Clone)]
pub struct CloseHandle(pub(crate) Weak<AtomicBool>);

impl CloseHandle {
    /// Requests the close. Returns `false` if the channel no longer exists.
    pub fn close(&self) -> bool {
        match self.0.upgrade() {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
