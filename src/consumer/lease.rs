//! Scoped ownership of a consumer handle

use std::ops::{Deref, DerefMut};
use tracing::trace;

use crate::client::ConsumerHandle;

/// Owns a consumer handle and closes it exactly once, when released or
/// dropped, whichever comes first.
pub struct ConsumerLease {
    handle: Box<dyn ConsumerHandle>,
    closed: bool,
}

impl ConsumerLease {
    pub fn new(handle: Box<dyn ConsumerHandle>) -> Self {
        Self {
            handle,
            closed: false,
        }
    }

    /// Close the handle now
    pub fn release(mut self) {
        self.close_once();
    }

    fn close_once(&mut self) {
        if !self.closed {
            self.closed = true;
            self.handle.close();
            trace!("Consumer handle closed");
        }
    }
}

impl Deref for ConsumerLease {
    type Target = dyn ConsumerHandle;

    fn deref(&self) -> &Self::Target {
        &*self.handle
    }
}

impl DerefMut for ConsumerLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.handle
    }
}

impl Drop for ConsumerLease {
    fn drop(&mut self) {
        self.close_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConsumer;

    #[test]
    fn test_drop_closes_once() {
        let consumer = MockConsumer::new();
        let tracker = consumer.tracker();
        drop(ConsumerLease::new(Box::new(consumer)));
        assert_eq!(tracker.close_calls(), 1);
    }

    #[test]
    fn test_release_then_drop_closes_once() {
        let consumer = MockConsumer::new();
        let tracker = consumer.tracker();
        ConsumerLease::new(Box::new(consumer)).release();
        assert_eq!(tracker.close_calls(), 1);
    }

    #[test]
    fn test_unwinding_closes() {
        let consumer = MockConsumer::new();
        let tracker = consumer.tracker();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _lease = ConsumerLease::new(Box::new(consumer));
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(tracker.close_calls(), 1);
    }
}
