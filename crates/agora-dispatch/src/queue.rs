// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-worker generation queue.
//!
//! The local model serves one request at a time. Jobs from the user channel
//! always run before waiting screen-channel jobs; a job already running is
//! never preempted.

use crate::error::DispatchError;
use crate::handlers::{Handlers, Processed};
use agora_app_core::{ProcessingMode, TimerSlot};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};

/// Which channel submitted a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Immediate reply to the submitter.
    User,
    /// Asynchronous on-screen text.
    Screen,
}

struct Job {
    mode: ProcessingMode,
    input: String,
    reply: oneshot::Sender<Result<Processed, DispatchError>>,
}

/// Handle to the generation worker. Clones share the worker.
#[derive(Clone)]
pub struct GenerationQueue {
    user: mpsc::UnboundedSender<Job>,
    screen: mpsc::UnboundedSender<Job>,
    worker: Arc<Mutex<TimerSlot>>,
}

impl std::fmt::Debug for GenerationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationQueue")
            .field("closed", &self.user.is_closed())
            .finish()
    }
}

impl GenerationQueue {
    /// Spawn the worker on `runtime`.
    pub fn spawn(runtime: &Handle, handlers: Handlers) -> Self {
        let (user, user_rx) = mpsc::unbounded_channel();
        let (screen, screen_rx) = mpsc::unbounded_channel();
        let mut worker = TimerSlot::new();
        worker.arm(runtime, run_worker(handlers, user_rx, screen_rx));
        Self {
            user,
            screen,
            worker: Arc::new(Mutex::new(worker)),
        }
    }

    /// Queue `input` for `mode` on `channel` and wait up to `timeout`.
    ///
    /// A job abandoned by its waiter is skipped if it has not started yet.
    pub async fn submit(
        &self,
        channel: Channel,
        mode: ProcessingMode,
        input: &str,
        timeout: Duration,
    ) -> Result<Processed, DispatchError> {
        let (reply, rx) = oneshot::channel();
        let job = Job {
            mode,
            input: input.to_owned(),
            reply,
        };
        let sender = match channel {
            Channel::User => &self.user,
            Channel::Screen => &self.screen,
        };
        sender.send(job).map_err(|_| DispatchError::QueueClosed)?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(DispatchError::QueueClosed),
            Err(_) => Err(DispatchError::Timeout(timeout)),
        }
    }

    /// Stop the worker; pending and future jobs fail with `QueueClosed`.
    pub fn shutdown(&self) {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

#[instrument(skip_all)]
async fn run_worker(
    handlers: Handlers,
    mut user: mpsc::UnboundedReceiver<Job>,
    mut screen: mpsc::UnboundedReceiver<Job>,
) {
    loop {
        let (channel, job) = tokio::select! {
            biased;
            Some(job) = user.recv() => (Channel::User, job),
            Some(job) = screen.recv() => (Channel::Screen, job),
            else => break,
        };
        if job.reply.is_closed() {
            debug!(?channel, "skipping abandoned generation job");
            continue;
        }
        debug!(?channel, mode = %job.mode, "generation job started");
        let result = handlers.run(job.mode, &job.input).await;
        if job.reply.send(result).is_err() {
            warn!(?channel, "generation finished after its waiter gave up");
        }
    }
    debug!("generation worker exits");
}
