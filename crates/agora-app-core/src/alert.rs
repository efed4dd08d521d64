// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! User-facing alerts (graph-load failures and similar) with TTL + dedupe.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Informational note.
    Info,
    /// Something degraded but the view is intact.
    Warn,
    /// An operation failed and the user must know (e.g. graph load).
    Error,
}

/// A single alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Stable identifier.
    pub id: u64,
    /// Severity.
    pub kind: AlertKind,
    /// Message text.
    pub text: String,
    /// When the alert was raised (or last re-raised).
    pub raised: Instant,
    /// How long the alert stays visible.
    pub ttl: Duration,
}

impl Alert {
    /// Remaining visibility as a fraction: 1.0 fresh, 0.0 expired.
    pub fn remaining(&self, now: Instant) -> f32 {
        let ttl = self.ttl.as_secs_f32();
        if ttl <= 0.0 {
            return 0.0;
        }
        (1.0 - now.duration_since(self.raised).as_secs_f32() / ttl).clamp(0.0, 1.0)
    }

    fn visible(&self, now: Instant) -> bool {
        now.duration_since(self.raised) < self.ttl
    }
}

/// Bounded alert list; identical alerts raised within the dedupe window are merged.
#[derive(Debug)]
pub struct AlertService {
    alerts: VecDeque<Alert>,
    capacity: usize,
    dedupe_window: Duration,
    next_id: u64,
}

impl Default for AlertService {
    fn default() -> Self {
        Self::new(8)
    }
}

impl AlertService {
    /// Create a list holding at most `capacity` alerts.
    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: VecDeque::new(),
            capacity: capacity.max(1),
            dedupe_window: Duration::from_millis(500),
            next_id: 1,
        }
    }

    /// Raise an alert and return its id.
    pub fn raise(
        &mut self,
        kind: AlertKind,
        text: impl Into<String>,
        ttl: Duration,
        now: Instant,
    ) -> u64 {
        let text = text.into();
        let window = self.dedupe_window;
        if let Some(existing) = self.alerts.iter_mut().find(|a| {
            a.kind == kind && a.text == text && now.duration_since(a.raised) <= window
        }) {
            existing.raised = now;
            existing.ttl = ttl;
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.alerts.len() == self.capacity {
            self.alerts.pop_front();
        }
        self.alerts.push_back(Alert {
            id,
            kind,
            text,
            raised: now,
            ttl,
        });
        id
    }

    /// Drop expired alerts.
    pub fn prune(&mut self, now: Instant) {
        self.alerts.retain(|a| a.visible(now));
    }

    /// Alerts still visible at `now`, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<Alert> {
        self.alerts.iter().filter(|a| a.visible(now)).cloned().collect()
    }

    /// Most recent alert regardless of expiry.
    pub fn latest(&self) -> Option<&Alert> {
        self.alerts.back()
    }

    /// Dismiss one alert by id.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        before != self.alerts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_within_window_is_merged() {
        let mut alerts = AlertService::default();
        let t0 = Instant::now();
        let a = alerts.raise(AlertKind::Error, "load failed", Duration::from_secs(5), t0);
        let b = alerts.raise(
            AlertKind::Error,
            "load failed",
            Duration::from_secs(5),
            t0 + Duration::from_millis(100),
        );
        assert_eq!(a, b);
        assert_eq!(alerts.visible(t0 + Duration::from_millis(200)).len(), 1);
    }

    #[test]
    fn expired_alerts_are_pruned() {
        let mut alerts = AlertService::default();
        let t0 = Instant::now();
        alerts.raise(AlertKind::Info, "hi", Duration::from_secs(1), t0);
        let later = t0 + Duration::from_secs(2);
        assert!(alerts.visible(later).is_empty());
        alerts.prune(later);
        assert!(alerts.latest().is_none());
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut alerts = AlertService::new(2);
        let t0 = Instant::now();
        for (i, text) in ["a", "b", "c"].into_iter().enumerate() {
            alerts.raise(AlertKind::Warn, text, Duration::from_secs(10), t0 + Duration::from_secs(i as u64));
        }
        let texts: Vec<_> = alerts.visible(t0 + Duration::from_secs(3)).into_iter().map(|a| a.text).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[test]
    fn dismiss_removes_by_id() {
        let mut alerts = AlertService::default();
        let id = alerts.raise(AlertKind::Info, "x", Duration::from_secs(1), Instant::now());
        assert!(alerts.dismiss(id));
        assert!(!alerts.dismiss(id));
    }
}
