// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cancellable single-task slot.
//!
//! Each timer-driven component keeps one `TimerSlot` per kind of pending work.
//! Arming a slot aborts whatever it held; dropping it aborts too. Aborting
//! cannot stop a task that is already running on another worker, so owners
//! pair every slot with an epoch counter and ignore stale completions.

use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Holds at most one spawned task.
#[derive(Debug, Default)]
pub struct TimerSlot {
    task: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` on `runtime`, aborting the previous task.
    pub fn arm<F>(&mut self, runtime: &Handle, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.task = Some(runtime.spawn(fut));
    }

    /// Abort the held task, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// True while a task is held and has not finished.
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
