// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-flight message state machine.
//!
//! One message is live at a time (`Typing`, `Complete` or `Fading`); the rest
//! wait in a FIFO. The machine never sleeps: every timed step is requested as
//! a [`DisplayEffect::Schedule`] carrying the current epoch, and a
//! [`DisplayEvent::TimerFired`] with any other epoch is ignored.

use agora_app_core::{DisplayMessage, DisplayPrefs};
use std::collections::VecDeque;
use std::time::Duration;

/// Externally visible phase of the live message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPhase {
    /// Nothing on screen.
    Idle,
    /// Being enhanced or typed out.
    Typing,
    /// Fully typed, waiting for the dismiss timer.
    Complete,
    /// Fading out.
    Fading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Enhancing,
    Typing { revealed: usize },
    Complete,
    Fading,
}

/// Input to the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    /// Append a message (shown immediately when idle).
    Enqueue(DisplayMessage),
    /// Drop the queue, fade the live message, then show this one.
    Interrupt(DisplayMessage),
    /// Force the live message to fade now.
    Dismiss,
    /// Hard reset: drop everything without fading.
    Clear,
    /// The timer armed under `epoch` fired.
    TimerFired {
        /// Epoch echoed from [`DisplayEffect::Schedule`].
        epoch: u64,
    },
    /// Enhancement finished; `None` means fall back to the original text.
    Enhanced {
        /// Epoch echoed from [`DisplayEffect::Enhance`].
        epoch: u64,
        /// Rewritten text.
        text: Option<String>,
    },
    /// Replace the timing parameters (applies from the next scheduled step).
    SetPrefs(DisplayPrefs),
}

/// Work the driver performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEffect {
    /// Run the enhancer over `text` and answer with [`DisplayEvent::Enhanced`].
    Enhance {
        /// Current epoch.
        epoch: u64,
        /// Original text.
        text: String,
    },
    /// Arm the single timer.
    Schedule {
        /// Current epoch.
        epoch: u64,
        /// Delay.
        after: Duration,
    },
    /// Cancel the pending timer or enhancement.
    CancelTimer,
    /// Create the overlay for a new live message with nothing revealed.
    Show(DisplayMessage),
    /// Update the visible prefix of the live message.
    Reveal {
        /// Characters revealed so far.
        text: String,
    },
    /// Start fading the overlay over `duration`.
    Fade {
        /// Fade time.
        duration: Duration,
    },
    /// Remove the overlay.
    Remove,
}

/// Message presentation state machine.
#[derive(Debug, Clone)]
pub struct DisplayMachine {
    phase: Phase,
    live: Option<DisplayMessage>,
    chars: Vec<char>,
    queue: VecDeque<DisplayMessage>,
    interrupt: Option<DisplayMessage>,
    prefs: DisplayPrefs,
    epoch: u64,
}

impl DisplayMachine {
    /// Idle machine.
    pub fn new(prefs: DisplayPrefs) -> Self {
        Self {
            phase: Phase::Idle,
            live: None,
            chars: Vec::new(),
            queue: VecDeque::new(),
            interrupt: None,
            prefs: prefs.sanitized(),
            epoch: 0,
        }
    }

    /// Phase of the live message.
    pub fn phase(&self) -> DisplayPhase {
        match self.phase {
            Phase::Idle => DisplayPhase::Idle,
            Phase::Enhancing | Phase::Typing { .. } => DisplayPhase::Typing,
            Phase::Complete => DisplayPhase::Complete,
            Phase::Fading => DisplayPhase::Fading,
        }
    }

    /// The message currently on screen (or being prepared).
    pub fn live(&self) -> Option<&DisplayMessage> {
        self.live.as_ref()
    }

    /// Messages waiting behind the live one.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Message waiting for the current fade to finish after an interrupt.
    pub fn pending_interrupt(&self) -> Option<&DisplayMessage> {
        self.interrupt.as_ref()
    }

    /// Active timing parameters.
    pub fn prefs(&self) -> &DisplayPrefs {
        &self.prefs
    }

    /// Current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Apply one event.
    pub fn apply(&mut self, event: DisplayEvent) -> Vec<DisplayEffect> {
        let mut fx = Vec::new();
        match event {
            DisplayEvent::Enqueue(msg) => {
                if self.phase == Phase::Idle {
                    self.begin(msg, &mut fx);
                } else {
                    self.queue.push_back(msg);
                }
            }
            DisplayEvent::Interrupt(msg) => {
                self.queue.clear();
                match self.phase {
                    Phase::Idle => self.begin(msg, &mut fx),
                    Phase::Enhancing => {
                        self.abandon_enhancement(&mut fx);
                        self.begin(msg, &mut fx);
                    }
                    Phase::Fading => self.interrupt = Some(msg),
                    Phase::Typing { .. } | Phase::Complete => {
                        self.interrupt = Some(msg);
                        self.start_fade(&mut fx);
                    }
                }
            }
            DisplayEvent::Dismiss => match self.phase {
                Phase::Enhancing => {
                    self.abandon_enhancement(&mut fx);
                    if let Some(next) = self.queue.pop_front() {
                        self.begin(next, &mut fx);
                    }
                }
                Phase::Typing { .. } | Phase::Complete => self.start_fade(&mut fx),
                Phase::Idle | Phase::Fading => {}
            },
            DisplayEvent::Clear => {
                self.queue.clear();
                self.interrupt = None;
                if self.phase != Phase::Idle {
                    self.epoch += 1;
                    fx.push(DisplayEffect::CancelTimer);
                    fx.push(DisplayEffect::Remove);
                    self.phase = Phase::Idle;
                    self.live = None;
                    self.chars.clear();
                }
            }
            DisplayEvent::TimerFired { epoch } if epoch == self.epoch => self.step(&mut fx),
            DisplayEvent::TimerFired { .. } => {}
            DisplayEvent::Enhanced { epoch, text } => {
                if epoch == self.epoch && self.phase == Phase::Enhancing {
                    if let (Some(text), Some(live)) = (text, self.live.as_mut()) {
                        live.text = text;
                    }
                    self.start_typing(&mut fx);
                }
            }
            DisplayEvent::SetPrefs(prefs) => self.prefs = prefs.sanitized(),
        }
        fx
    }

    fn begin(&mut self, msg: DisplayMessage, fx: &mut Vec<DisplayEffect>) {
        self.epoch += 1;
        if self.prefs.enhance {
            fx.push(DisplayEffect::Enhance {
                epoch: self.epoch,
                text: msg.text.clone(),
            });
            self.live = Some(msg);
            self.phase = Phase::Enhancing;
        } else {
            self.live = Some(msg);
            self.start_typing(fx);
        }
    }

    fn start_typing(&mut self, fx: &mut Vec<DisplayEffect>) {
        let Some(live) = &self.live else {
            self.phase = Phase::Idle;
            return;
        };
        self.chars = live.text.chars().collect();
        fx.push(DisplayEffect::Show(live.clone()));
        self.phase = Phase::Typing { revealed: 0 };
        self.schedule(self.prefs.pre_delay(), fx);
    }

    fn step(&mut self, fx: &mut Vec<DisplayEffect>) {
        match self.phase {
            Phase::Idle | Phase::Enhancing => {}
            Phase::Typing { revealed } => {
                let revealed = (revealed + 1).min(self.chars.len());
                if revealed > 0 {
                    fx.push(DisplayEffect::Reveal {
                        text: self.chars[..revealed].iter().collect(),
                    });
                }
                if revealed >= self.chars.len() {
                    self.phase = Phase::Complete;
                    self.schedule(self.prefs.message_duration(), fx);
                } else {
                    self.phase = Phase::Typing { revealed };
                    self.schedule(self.prefs.char_delay(), fx);
                }
            }
            Phase::Complete => self.start_fade(fx),
            Phase::Fading => {
                fx.push(DisplayEffect::Remove);
                self.phase = Phase::Idle;
                self.live = None;
                self.chars.clear();
                if let Some(next) = self.interrupt.take().or_else(|| self.queue.pop_front()) {
                    self.begin(next, fx);
                }
            }
        }
    }

    /// Drop a live message that never reached the surface: no fade, no removal.
    fn abandon_enhancement(&mut self, fx: &mut Vec<DisplayEffect>) {
        self.epoch += 1;
        fx.push(DisplayEffect::CancelTimer);
        self.phase = Phase::Idle;
        self.live = None;
        self.chars.clear();
    }

    fn start_fade(&mut self, fx: &mut Vec<DisplayEffect>) {
        self.phase = Phase::Fading;
        self.epoch += 1;
        fx.push(DisplayEffect::CancelTimer);
        fx.push(DisplayEffect::Fade {
            duration: self.prefs.fade(),
        });
        self.schedule(self.prefs.fade(), fx);
    }

    fn schedule(&mut self, after: Duration, fx: &mut Vec<DisplayEffect>) {
        self.epoch += 1;
        fx.push(DisplayEffect::Schedule {
            epoch: self.epoch,
            after,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> DisplayMessage {
        DisplayMessage::new(text, "echo")
    }

    fn fire(m: &mut DisplayMachine) -> Vec<DisplayEffect> {
        let epoch = m.epoch();
        m.apply(DisplayEvent::TimerFired { epoch })
    }

    fn reveals(fx: &[DisplayEffect]) -> Vec<String> {
        fx.iter()
            .filter_map(|e| match e {
                DisplayEffect::Reveal { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn types_one_char_per_step_then_completes() {
        let mut m = DisplayMachine::new(DisplayPrefs::default());
        let fx = m.apply(DisplayEvent::Enqueue(msg("héy")));
        assert!(fx.contains(&DisplayEffect::Show(msg("héy"))));
        assert_eq!(m.phase(), DisplayPhase::Typing);

        let mut typed = Vec::new();
        for _ in 0..3 {
            typed.extend(reveals(&fire(&mut m)));
        }
        assert_eq!(typed, vec!["h", "hé", "héy"]);
        assert_eq!(m.phase(), DisplayPhase::Complete);

        let fx = fire(&mut m);
        assert_eq!(m.phase(), DisplayPhase::Fading);
        assert!(fx.iter().any(|e| matches!(e, DisplayEffect::Fade { .. })));

        let fx = fire(&mut m);
        assert_eq!(fx, vec![DisplayEffect::Remove]);
        assert_eq!(m.phase(), DisplayPhase::Idle);
    }

    #[test]
    fn empty_text_completes_after_pre_delay() {
        let mut m = DisplayMachine::new(DisplayPrefs::default());
        m.apply(DisplayEvent::Enqueue(msg("")));
        let fx = fire(&mut m);
        assert!(reveals(&fx).is_empty());
        assert_eq!(m.phase(), DisplayPhase::Complete);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut m = DisplayMachine::new(DisplayPrefs::default());
        m.apply(DisplayEvent::Enqueue(msg("ab")));
        let stale = m.epoch();
        m.apply(DisplayEvent::Dismiss);
        assert!(m.apply(DisplayEvent::TimerFired { epoch: stale }).is_empty());
        assert_eq!(m.phase(), DisplayPhase::Fading);
    }

    #[test]
    fn queue_drains_in_order() {
        let mut m = DisplayMachine::new(DisplayPrefs::default());
        for t in ["a", "b", "c"] {
            m.apply(DisplayEvent::Enqueue(msg(t)));
        }
        assert_eq!(m.queue_len(), 2);
        let mut shown = Vec::new();
        for _ in 0..20 {
            for e in fire(&mut m) {
                if let DisplayEffect::Show(s) = e {
                    shown.push(s.text);
                }
            }
        }
        assert_eq!(shown, vec!["b", "c"]);
        assert_eq!(m.queue_len(), 0);
        assert_eq!(m.phase(), DisplayPhase::Idle);
    }

    #[test]
    fn interrupt_discards_queue_and_fades_live() {
        let mut m = DisplayMachine::new(DisplayPrefs::default());
        m.apply(DisplayEvent::Enqueue(msg("a")));
        m.apply(DisplayEvent::Enqueue(msg("b")));
        let fx = m.apply(DisplayEvent::Interrupt(msg("x")));
        assert_eq!(m.queue_len(), 0);
        assert_eq!(m.phase(), DisplayPhase::Fading);
        assert!(fx.iter().any(|e| matches!(e, DisplayEffect::Fade { .. })));

        let fx = fire(&mut m);
        assert_eq!(fx[0], DisplayEffect::Remove);
        assert!(fx.contains(&DisplayEffect::Show(msg("x"))));
        assert_eq!(m.live().map(|l| l.text.as_str()), Some("x"));
    }

    #[test]
    fn interrupt_while_idle_shows_immediately() {
        let mut m = DisplayMachine::new(DisplayPrefs::default());
        let fx = m.apply(DisplayEvent::Interrupt(msg("x")));
        assert!(fx.contains(&DisplayEffect::Show(msg("x"))));
    }

    #[test]
    fn clear_removes_without_fade() {
        let mut m = DisplayMachine::new(DisplayPrefs::default());
        m.apply(DisplayEvent::Enqueue(msg("a")));
        m.apply(DisplayEvent::Enqueue(msg("b")));
        let fx = m.apply(DisplayEvent::Clear);
        assert_eq!(fx, vec![DisplayEffect::CancelTimer, DisplayEffect::Remove]);
        assert_eq!(m.phase(), DisplayPhase::Idle);
        assert_eq!(m.queue_len(), 0);
        assert!(m.apply(DisplayEvent::Clear).is_empty());
    }

    #[test]
    fn enhancement_replaces_text_or_falls_back() {
        let prefs = DisplayPrefs {
            enhance: true,
            ..DisplayPrefs::default()
        };
        let mut m = DisplayMachine::new(prefs.clone());
        let fx = m.apply(DisplayEvent::Enqueue(msg("raw")));
        let DisplayEffect::Enhance { epoch, text } = &fx[0] else {
            panic!("expected enhance, got {fx:?}");
        };
        assert_eq!(text, "raw");
        let fx = m.apply(DisplayEvent::Enhanced {
            epoch: *epoch,
            text: Some("polished".into()),
        });
        assert!(fx.contains(&DisplayEffect::Show(msg("polished"))));

        let mut m = DisplayMachine::new(prefs);
        m.apply(DisplayEvent::Enqueue(msg("raw")));
        let epoch = m.epoch();
        let fx = m.apply(DisplayEvent::Enhanced { epoch, text: None });
        assert!(fx.contains(&DisplayEffect::Show(msg("raw"))));
    }

    #[test]
    fn interrupt_during_enhancement_never_fades_the_unshown_message() {
        let prefs = DisplayPrefs {
            enhance: true,
            ..DisplayPrefs::default()
        };
        let mut m = DisplayMachine::new(prefs);
        m.apply(DisplayEvent::Enqueue(msg("a")));
        m.apply(DisplayEvent::Enqueue(msg("b")));
        let stale = m.epoch();

        let fx = m.apply(DisplayEvent::Interrupt(msg("x")));
        assert_eq!(fx[0], DisplayEffect::CancelTimer);
        assert!(!fx
            .iter()
            .any(|e| matches!(e, DisplayEffect::Fade { .. } | DisplayEffect::Remove)));
        assert!(matches!(&fx[1], DisplayEffect::Enhance { text, .. } if text == "x"));
        assert_eq!(m.queue_len(), 0);
        assert_eq!(m.pending_interrupt(), None);
        assert_eq!(m.live().map(|l| l.text.as_str()), Some("x"));

        let late = m.apply(DisplayEvent::Enhanced {
            epoch: stale,
            text: Some("A".into()),
        });
        assert!(late.is_empty());
    }

    #[test]
    fn dismiss_during_enhancement_moves_to_the_next_message() {
        let prefs = DisplayPrefs {
            enhance: true,
            ..DisplayPrefs::default()
        };
        let mut m = DisplayMachine::new(prefs);
        m.apply(DisplayEvent::Enqueue(msg("a")));
        m.apply(DisplayEvent::Enqueue(msg("b")));

        let fx = m.apply(DisplayEvent::Dismiss);
        assert!(!fx
            .iter()
            .any(|e| matches!(e, DisplayEffect::Fade { .. } | DisplayEffect::Remove)));
        assert_eq!(m.live().map(|l| l.text.as_str()), Some("b"));

        let fx = m.apply(DisplayEvent::Dismiss);
        assert_eq!(fx, vec![DisplayEffect::CancelTimer]);
        assert_eq!(m.phase(), DisplayPhase::Idle);
    }
}
