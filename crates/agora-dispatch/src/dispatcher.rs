// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dual-channel dispatcher.
//!
//! `submit` computes the user reply, returns it, and leaves the screen text
//! to a background task whose result lands in the [`ScreenSlot`]. The two
//! channels share nothing but the slot and the generation queue, so a
//! failing screen computation never reaches the submitter.

use crate::error::DispatchError;
use crate::handlers::{Handlers, Processed};
use crate::ports::{QuoteLookup, TextGenerator};
use crate::queue::{Channel, GenerationQueue};
use crate::slot::ScreenSlot;
use agora_app_core::{DispatchPrefs, ProcessingMode};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Processing mode per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DispatchSettings {
    /// Mode for the returned reply.
    pub user_mode: ProcessingMode,
    /// Mode for the on-screen text.
    pub screen_mode: ProcessingMode,
}

impl From<&DispatchPrefs> for DispatchSettings {
    fn from(prefs: &DispatchPrefs) -> Self {
        Self {
            user_mode: prefs.user_mode,
            screen_mode: prefs.screen_mode,
        }
    }
}

/// Per-call overrides of [`DispatchSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct ModeOverrides {
    /// Overrides the user mode.
    #[serde(default)]
    pub user_mode: Option<ProcessingMode>,
    /// Overrides the screen mode.
    #[serde(default)]
    pub screen_mode: Option<ProcessingMode>,
}

/// Reply returned to the submitter.
pub type UserResponse = Processed;

#[derive(Clone)]
struct Pipeline {
    handlers: Handlers,
    queue: GenerationQueue,
    timeout: Duration,
}

impl Pipeline {
    async fn process(
        &self,
        channel: Channel,
        mode: ProcessingMode,
        input: &str,
    ) -> Result<Processed, DispatchError> {
        if mode.uses_generation() {
            self.queue.submit(channel, mode, input, self.timeout).await
        } else {
            self.handlers.run(mode, input).await
        }
    }
}

/// Routes each submitted text through a user channel and a screen channel.
pub struct Dispatcher {
    runtime: Handle,
    pipeline: Pipeline,
    settings: RwLock<DispatchSettings>,
    slot: ScreenSlot,
    background: Mutex<JoinSet<()>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("settings", &self.settings())
            .field("pending_screen", &self.slot.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher over the given ports; spawns the generation worker on `runtime`.
    pub fn new(
        runtime: Handle,
        prefs: &DispatchPrefs,
        generator: Arc<dyn TextGenerator>,
        lookup: Arc<dyn QuoteLookup>,
    ) -> Self {
        let handlers = Handlers::new(generator, lookup, prefs.prompt_template.clone());
        let queue = GenerationQueue::spawn(&runtime, handlers.clone());
        Self {
            pipeline: Pipeline {
                handlers,
                queue,
                timeout: prefs.generation_timeout(),
            },
            runtime,
            settings: RwLock::new(DispatchSettings::from(prefs)),
            slot: ScreenSlot::new(),
            background: Mutex::new(JoinSet::new()),
        }
    }

    /// Deliver screen results to `slot` instead of a private one.
    pub fn with_screen_slot(mut self, slot: ScreenSlot) -> Self {
        self.slot = slot;
        self
    }

    /// The outbox screen results are delivered to.
    pub fn screen_slot(&self) -> &ScreenSlot {
        &self.slot
    }

    /// Current modes.
    pub fn settings(&self) -> DispatchSettings {
        *self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the modes.
    pub fn update_settings(&self, settings: DispatchSettings) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
        info!(user = %settings.user_mode, screen = %settings.screen_mode, "dispatch settings updated");
    }

    /// Process `text` with the configured modes.
    pub async fn submit(&self, text: &str) -> UserResponse {
        self.submit_with(text, ModeOverrides::default()).await
    }

    /// Process `text`, overriding the configured modes where given.
    ///
    /// Returns once the user reply is ready. When both channels use the same
    /// mode, the reply itself is delivered to the screen slot; otherwise the
    /// screen computation runs in the background.
    pub async fn submit_with(&self, text: &str, overrides: ModeOverrides) -> UserResponse {
        let settings = self.settings();
        let user_mode = overrides.user_mode.unwrap_or(settings.user_mode);
        let screen_mode = overrides.screen_mode.unwrap_or(settings.screen_mode);
        debug!(%user_mode, %screen_mode, "dispatching message");

        let reply = match self.pipeline.process(Channel::User, user_mode, text).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, mode = %user_mode, "user channel failed; passing input through");
                Processed::fallback_for(user_mode, text)
            }
        };

        if screen_mode == user_mode {
            self.slot.push(reply.to_message());
        } else {
            self.spawn_screen(screen_mode, text.to_owned());
        }
        reply
    }

    fn spawn_screen(&self, mode: ProcessingMode, text: String) {
        let pipeline = self.pipeline.clone();
        let slot = self.slot.clone();
        let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        while background.try_join_next().is_some() {}
        background.spawn_on(
            async move {
                match pipeline.process(Channel::Screen, mode, &text).await {
                    Ok(result) => slot.push(result.to_message()),
                    Err(err) => warn!(error = %err, %mode, "screen channel failed; nothing displayed"),
                }
            },
            &self.runtime,
        );
    }

    /// Wait for every background screen computation started so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(
            &mut *self.background.lock().unwrap_or_else(PoisonError::into_inner),
        );
        while pending.join_next().await.is_some() {}
    }

    /// Stop the generation worker and abort background screen work.
    pub fn shutdown(&self) {
        self.background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
        self.pipeline.queue.shutdown();
        debug!("dispatcher shut down");
    }
}
