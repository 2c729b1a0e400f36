//! Reusable puzzle helpers: settle detection and timed despawn.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which part of the velocity a [`SettleRule`] looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VelocityMetric {
    /// Absolute vertical velocity only. A block sliding sideways on the
    /// floor still counts as landed.
    Vertical,
    /// Full speed.
    Speed,
}

/// When a dropped object counts as having landed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettleRule {
    /// Velocity below which the object is considered at rest (m/s).
    pub velocity_tolerance: f32,

    pub metric: VelocityMetric,

    /// Object center must be at or below this height to count.
    pub max_height: Option<f32>,
}

impl Default for SettleRule {
    fn default() -> Self {
        Self {
            velocity_tolerance: 0.1,
            metric: VelocityMetric::Vertical,
            max_height: None,
        }
    }
}

impl SettleRule {
    fn measure(&self, velocity: Vec3) -> f32 {
        match self.metric {
            VelocityMetric::Vertical => velocity.y.abs(),
            VelocityMetric::Speed => velocity.length(),
        }
    }

    /// Whether the object is moving fast enough to count as in flight.
    pub fn is_moving(&self, velocity: Vec3) -> bool {
        self.measure(velocity) >= self.velocity_tolerance
    }

    pub fn is_settled(&self, position: Vec3, velocity: Vec3) -> bool {
        if self.is_moving(velocity) {
            return false;
        }
        self.max_height.map_or(true, |max| position.y <= max)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LandingEntry {
    /// Seen moving at least once since spawn.
    armed: bool,
    handled: bool,
}

/// Reports each tracked object's landing exactly once.
///
/// An object is only eligible after it has been seen moving, so a freshly
/// spawned body that has not been stepped yet (velocity still zero) is not
/// mistaken for one that already came to rest.
#[derive(Debug, Clone)]
pub struct LandingTracker<K> {
    rule: SettleRule,
    entries: Vec<(K, LandingEntry)>,
}

impl<K: Copy + Eq> LandingTracker<K> {
    pub fn new(rule: SettleRule) -> Self {
        Self {
            rule,
            entries: Vec::new(),
        }
    }

    pub fn rule(&self) -> &SettleRule {
        &self.rule
    }

    /// Start watching an object. Re-tracking resets its state.
    pub fn track(&mut self, key: K) {
        self.forget(key);
        self.entries.push((key, LandingEntry::default()));
    }

    /// Stop watching an object.
    pub fn forget(&mut self, key: K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.len() != before
    }

    /// Feed this frame's state for `key`, read after the step.
    ///
    /// Returns `true` on the single frame the object is judged to have
    /// landed. Untracked keys and already-handled objects return `false`.
    pub fn observe(&mut self, key: K, position: Vec3, velocity: Vec3) -> bool {
        let rule = self.rule;
        let Some((_, entry)) = self.entries.iter_mut().find(|(k, _)| *k == key) else {
            return false;
        };
        if entry.handled {
            return false;
        }

        if !entry.armed {
            entry.armed = rule.is_moving(velocity);
            return false;
        }

        if rule.is_settled(position, velocity) {
            entry.handled = true;
            return true;
        }
        false
    }

    pub fn is_handled(&self, key: K) -> bool {
        self.entries
            .iter()
            .any(|(k, entry)| *k == key && entry.handled)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Wall-clock countdowns that expire objects regardless of their state.
#[derive(Debug, Clone)]
pub struct DespawnTimers<K> {
    pending: Vec<(K, f32)>,
}

impl<K> Default for DespawnTimers<K> {
    fn default() -> Self {
        Self { pending: Vec::new() }
    }
}

impl<K: Copy + Eq> DespawnTimers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire `key` after `delay` seconds. Rescheduling replaces the timer.
    pub fn schedule(&mut self, key: K, delay: f32) {
        self.cancel(key);
        self.pending.push((key, delay.max(0.0)));
    }

    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(k, _)| *k != key);
        self.pending.len() != before
    }

    /// Advance every timer by `elapsed` seconds and return the keys that
    /// expired, in scheduling order. Expired timers are removed.
    pub fn advance(&mut self, elapsed: f32) -> Vec<K> {
        let elapsed = elapsed.max(0.0);
        let mut expired = Vec::new();

        self.pending.retain_mut(|(key, remaining)| {
            *remaining -= elapsed;
            if *remaining <= 0.0 {
                expired.push(*key);
                false
            } else {
                true
            }
        });

        expired
    }

    pub fn remaining(&self, key: K) -> Option<f32> {
        self.pending
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, remaining)| *remaining)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLING: Vec3 = Vec3::new(0.0, -3.0, 0.0);

    #[test]
    fn test_settle_metrics() {
        let vertical = SettleRule::default();
        let sliding = Vec3::new(2.0, 0.05, 0.0);
        assert!(vertical.is_settled(Vec3::ZERO, sliding));

        let speed = SettleRule {
            metric: VelocityMetric::Speed,
            ..SettleRule::default()
        };
        assert!(!speed.is_settled(Vec3::ZERO, sliding));
        assert!(speed.is_settled(Vec3::ZERO, Vec3::new(0.05, 0.05, 0.0)));
    }

    #[test]
    fn test_settle_height_limit() {
        let rule = SettleRule {
            max_height: Some(0.75),
            ..SettleRule::default()
        };
        assert!(rule.is_settled(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO));

        // Resting on top of another block
        assert!(!rule.is_settled(Vec3::new(0.0, 1.5, 0.0), Vec3::ZERO));
    }

    #[test]
    fn test_landing_needs_prior_motion() {
        let mut tracker = LandingTracker::new(SettleRule::default());
        tracker.track(1u32);

        // Spawn frame, not stepped yet
        assert!(!tracker.observe(1, Vec3::new(0.0, 5.5, 0.0), Vec3::ZERO));
        assert!(!tracker.observe(1, Vec3::new(0.0, 5.4, 0.0), FALLING));
        assert!(tracker.observe(1, Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO));
    }

    #[test]
    fn test_landing_reported_at_most_once() {
        let mut tracker = LandingTracker::new(SettleRule::default());
        tracker.track(7u32);
        tracker.observe(7, Vec3::ZERO, FALLING);

        // Bouncing above and below the threshold after the first landing
        let velocities = [0.05, 0.3, -0.02, 0.5, 0.0, -0.4, 0.01];
        let landings = velocities
            .iter()
            .filter(|vy| tracker.observe(7, Vec3::ZERO, Vec3::new(0.0, **vy, 0.0)))
            .count();

        assert_eq!(landings, 1);
        assert!(tracker.is_handled(7));
    }

    #[test]
    fn test_untracked_never_lands() {
        let mut tracker = LandingTracker::new(SettleRule::default());
        tracker.track(1u32);
        tracker.forget(1);

        tracker.observe(1, Vec3::ZERO, FALLING);
        assert!(!tracker.observe(1, Vec3::ZERO, Vec3::ZERO));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_retrack_resets() {
        let mut tracker = LandingTracker::new(SettleRule::default());
        tracker.track(1u32);
        tracker.observe(1, Vec3::ZERO, FALLING);
        assert!(tracker.observe(1, Vec3::ZERO, Vec3::ZERO));

        // Slot reused for a new spawn
        tracker.track(1);
        assert!(!tracker.is_handled(1));
        tracker.observe(1, Vec3::ZERO, FALLING);
        assert!(tracker.observe(1, Vec3::ZERO, Vec3::ZERO));
    }

    #[test]
    fn test_despawn_expires_in_order() {
        let mut timers = DespawnTimers::new();
        timers.schedule('a', 6.0);
        timers.schedule('b', 1.0);
        timers.schedule('c', 6.0);

        assert_eq!(timers.advance(0.5), Vec::<char>::new());
        assert_eq!(timers.advance(0.5), vec!['b']);
        assert_eq!(timers.advance(5.0), vec!['a', 'c']);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_despawn_cancel_and_reschedule() {
        let mut timers = DespawnTimers::new();
        timers.schedule(1u8, 2.0);
        timers.schedule(1u8, 4.0);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.remaining(1), Some(4.0));

        assert!(timers.cancel(1));
        assert!(!timers.cancel(1));
        assert!(timers.advance(10.0).is_empty());
    }
}
