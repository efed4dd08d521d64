// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded outbox for screen-channel results.

use agora_app_core::{DisplayMessage, FeedError, ScreenSource};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Default number of undelivered messages kept.
pub const SCREEN_SLOT_CAPACITY: usize = 100;

/// FIFO of screen messages waiting to be polled; the oldest entry is dropped
/// once `capacity` is exceeded. Clones share the same outbox.
#[derive(Debug, Clone)]
pub struct ScreenSlot {
    inner: Arc<Mutex<VecDeque<DisplayMessage>>>,
    capacity: usize,
}

impl Default for ScreenSlot {
    fn default() -> Self {
        Self::with_capacity(SCREEN_SLOT_CAPACITY)
    }
}

impl ScreenSlot {
    /// Slot with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot keeping at most `capacity` messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DisplayMessage>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver a message.
    pub fn push(&self, message: DisplayMessage) {
        let mut queue = self.lock();
        if queue.len() == self.capacity {
            queue.pop_front();
            debug!(capacity = self.capacity, "screen slot full; dropped oldest");
        }
        queue.push_back(message);
    }

    /// Take the oldest undelivered message.
    pub fn take(&self) -> Option<DisplayMessage> {
        self.lock().pop_front()
    }

    /// Undelivered messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop everything waiting.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[async_trait]
impl ScreenSource for ScreenSlot {
    async fn next_message(&self) -> Result<Option<DisplayMessage>, FeedError> {
        Ok(self.take())
    }
}
