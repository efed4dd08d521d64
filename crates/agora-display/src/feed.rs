// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Screen-channel poller: pulls messages from a [`ScreenSource`] on a fixed
//! interval and enqueues them on a [`DisplayQueue`].

use crate::queue::DisplayQueue;
use agora_app_core::{ScreenSource, TimerSlot};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument, warn};

/// Running poll loop; stops when dropped.
#[derive(Debug)]
pub struct ScreenFeed {
    task: TimerSlot,
}

impl ScreenFeed {
    /// Start polling `source` every `interval`.
    pub fn spawn(
        runtime: &Handle,
        source: Arc<dyn ScreenSource>,
        queue: DisplayQueue,
        interval: Duration,
    ) -> Self {
        let mut task = TimerSlot::new();
        task.arm(runtime, poll_loop(source, queue, interval));
        Self { task }
    }

    /// True while the loop runs.
    pub fn is_running(&self) -> bool {
        self.task.is_armed()
    }

    /// Stop polling.
    pub fn stop(&mut self) {
        self.task.cancel();
    }
}

#[instrument(skip_all, fields(interval = ?interval))]
async fn poll_loop(source: Arc<dyn ScreenSource>, queue: DisplayQueue, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if queue.is_disposed() {
            debug!("display queue gone; screen feed exits");
            return;
        }
        match source.next_message().await {
            Ok(Some(message)) => queue.enqueue(message),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "screen poll failed"),
        }
    }
}
