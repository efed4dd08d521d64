// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tokio driver for [`DisplayMachine`].

use crate::machine::{DisplayEffect, DisplayEvent, DisplayMachine, DisplayPhase};
use crate::port::{DisplaySurface, Enhancer};
use agora_app_core::{DisplayMessage, DisplayPrefs, TimerSlot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tracing::{debug, warn};

struct Inner {
    machine: DisplayMachine,
    timer: TimerSlot,
    surface: Option<Arc<dyn DisplaySurface>>,
    enhancer: Option<Arc<dyn Enhancer>>,
    disposed: bool,
}

struct Shared {
    runtime: Handle,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Single-flight message overlay: one message typed at a time, the rest queued.
#[derive(Clone)]
pub struct DisplayQueue {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DisplayQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("DisplayQueue")
            .field("phase", &inner.machine.phase())
            .field("queued", &inner.machine.queue_len())
            .field("disposed", &inner.disposed)
            .finish()
    }
}

impl DisplayQueue {
    /// Queue rendering through `surface`.
    pub fn new(runtime: Handle, surface: Arc<dyn DisplaySurface>, prefs: DisplayPrefs) -> Self {
        Self {
            shared: Arc::new(Shared {
                runtime,
                inner: Mutex::new(Inner {
                    machine: DisplayMachine::new(prefs),
                    timer: TimerSlot::new(),
                    surface: Some(surface),
                    enhancer: None,
                    disposed: false,
                }),
            }),
        }
    }

    /// Use `enhancer` for messages started while `DisplayPrefs::enhance` is set.
    pub fn with_enhancer(self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.shared.lock().enhancer = Some(enhancer);
        self
    }

    /// Show `message` now when idle, otherwise after everything queued.
    pub fn enqueue(&self, message: DisplayMessage) {
        dispatch(&self.shared, DisplayEvent::Enqueue(message));
    }

    /// Drop the queue, fade the live message and show `message` after the fade.
    pub fn add_message_with_interrupt(&self, message: DisplayMessage) {
        dispatch(&self.shared, DisplayEvent::Interrupt(message));
    }

    /// Fade the live message now instead of waiting for its dismiss timer.
    pub fn dismiss(&self) {
        dispatch(&self.shared, DisplayEvent::Dismiss);
    }

    /// Remove everything without fading.
    pub fn clear(&self) {
        dispatch(&self.shared, DisplayEvent::Clear);
    }

    /// Change typing speed, durations or enhancement for the next steps.
    pub fn set_prefs(&self, prefs: DisplayPrefs) {
        dispatch(&self.shared, DisplayEvent::SetPrefs(prefs));
    }

    /// Current timing parameters.
    pub fn prefs(&self) -> DisplayPrefs {
        self.shared.lock().machine.prefs().clone()
    }

    /// Phase of the live message.
    pub fn phase(&self) -> DisplayPhase {
        self.shared.lock().machine.phase()
    }

    /// The live message.
    pub fn live(&self) -> Option<DisplayMessage> {
        self.shared.lock().machine.live().cloned()
    }

    /// Number of waiting messages.
    pub fn queue_len(&self) -> usize {
        self.shared.lock().machine.queue_len()
    }

    /// True once [`DisplayQueue::dispose`] ran.
    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }

    /// Clear, cancel timers and refuse further work. Safe to call twice.
    pub fn dispose(&self) {
        let mut inner = self.shared.lock();
        if inner.disposed {
            return;
        }
        let effects = inner.machine.apply(DisplayEvent::Clear);
        run_effects(&self.shared, &mut inner, effects);
        inner.timer.cancel();
        inner.surface = None;
        inner.enhancer = None;
        inner.disposed = true;
        debug!("display queue disposed");
    }
}

fn dispatch(shared: &Arc<Shared>, event: DisplayEvent) {
    let mut inner = shared.lock();
    if inner.disposed {
        return;
    }
    let effects = inner.machine.apply(event);
    run_effects(shared, &mut inner, effects);
}

fn run_effects(shared: &Arc<Shared>, inner: &mut Inner, effects: Vec<DisplayEffect>) {
    for effect in effects {
        match effect {
            DisplayEffect::Enhance { epoch, text } => {
                let weak = Arc::downgrade(shared);
                let enhancer = inner.enhancer.clone();
                let timeout = inner.machine.prefs().enhance_timeout();
                inner.timer.arm(&shared.runtime, async move {
                    let rewritten = match enhancer {
                        Some(enhancer) => {
                            match tokio::time::timeout(timeout, enhancer.enhance(&text)).await {
                                Ok(Ok(rewritten)) if !rewritten.trim().is_empty() => {
                                    Some(rewritten)
                                }
                                Ok(Ok(_)) => {
                                    warn!("enhancer returned empty text; using original");
                                    None
                                }
                                Ok(Err(err)) => {
                                    warn!(error = %err, "enhancement failed; using original");
                                    None
                                }
                                Err(_) => {
                                    warn!(?timeout, "enhancement timed out; using original");
                                    None
                                }
                            }
                        }
                        None => None,
                    };
                    if let Some(shared) = weak.upgrade() {
                        dispatch(
                            &shared,
                            DisplayEvent::Enhanced {
                                epoch,
                                text: rewritten,
                            },
                        );
                    }
                });
            }
            DisplayEffect::Schedule { epoch, after } => {
                let weak = Arc::downgrade(shared);
                inner.timer.arm(&shared.runtime, async move {
                    tokio::time::sleep(after).await;
                    if let Some(shared) = weak.upgrade() {
                        dispatch(&shared, DisplayEvent::TimerFired { epoch });
                    }
                });
            }
            DisplayEffect::CancelTimer => inner.timer.cancel(),
            DisplayEffect::Show(message) => {
                debug!(kind = %message.kind, chars = message.text.chars().count(), "display message");
                if let Some(surface) = &inner.surface {
                    surface.show(&message);
                }
            }
            DisplayEffect::Reveal { text } => {
                if let Some(surface) = &inner.surface {
                    surface.reveal(&text);
                }
            }
            DisplayEffect::Fade { duration } => {
                if let Some(surface) = &inner.surface {
                    surface.fade(duration);
                }
            }
            DisplayEffect::Remove => {
                if let Some(surface) = &inner.surface {
                    surface.remove();
                }
            }
        }
    }
}
