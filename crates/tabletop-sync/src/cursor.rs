//! Remote cursor tracking.
//!
//! Every seat broadcasts its pointer and the pointer position at which its
//! drag started. Samples arrive at irregular intervals, so remote pointers are
//! rendered one interval in the past and interpolated between the two latest
//! samples.

use crate::info::MouseInfo;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tabletop_core::{Seat, Vec3};

/// Milliseconds since the epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Clone, Debug, Default)]
struct SeatCursor {
    previous: Option<MouseInfo>,
    current: Option<MouseInfo>,
}

/// Latest pointer samples of every remote seat.
#[derive(Clone, Debug)]
pub struct CursorTracker {
    interval_ms: u64,
    seats: HashMap<Seat, SeatCursor>,
}

impl CursorTracker {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            seats: HashMap::new(),
        }
    }

    /// Build the sample to broadcast for the local pointer.
    pub fn sample(mouse: Option<Vec3>, held_mouse: Option<Vec3>, now: u64) -> MouseInfo {
        MouseInfo {
            mouse,
            held_mouse,
            time: now,
        }
    }

    /// Record a sample received from `seat`. Out-of-order samples are dropped.
    pub fn update(&mut self, seat: Seat, info: MouseInfo) {
        let cursor = self.seats.entry(seat).or_default();
        if let Some(current) = cursor.current {
            if info.time < current.time {
                return;
            }
        }
        cursor.previous = cursor.current.replace(info);
    }

    /// Where `seat`'s pointer should be drawn at `now`.
    pub fn mouse(&self, seat: Seat, now: u64) -> Option<Vec3> {
        let cursor = self.seats.get(&seat)?;
        let current = cursor.current?;
        let target = current.mouse?;

        let Some(previous) = cursor.previous else {
            return Some(target);
        };
        let (Some(start), true) = (previous.mouse, current.time > previous.time) else {
            return Some(target);
        };

        let render_time = now.saturating_sub(self.interval_ms);
        let span = (current.time - previous.time) as f32;
        let t = (render_time.saturating_sub(previous.time) as f32 / span).clamp(0.0, 1.0);
        Some(start.lerp(target, t))
    }

    /// The pointer position at which `seat` started its drag.
    pub fn held(&self, seat: Seat) -> Option<Vec3> {
        self.seats.get(&seat)?.current?.held_mouse
    }

    pub fn forget(&mut self, seat: Seat) {
        self.seats.remove(&seat);
    }
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, time: u64) -> MouseInfo {
        CursorTracker::sample(Some(Vec3::new(x, 0.0, 0.0)), Some(Vec3::ZERO), time)
    }

    #[test]
    fn test_single_sample_is_returned_as_is() {
        let mut tracker = CursorTracker::new(100);
        tracker.update(Seat(1), at(5.0, 1000));
        assert_eq!(tracker.mouse(Seat(1), 1000), Some(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(tracker.held(Seat(1)), Some(Vec3::ZERO));
        assert_eq!(tracker.mouse(Seat(2), 1000), None);
    }

    #[test]
    fn test_interpolates_one_interval_behind() {
        let mut tracker = CursorTracker::new(100);
        tracker.update(Seat(1), at(0.0, 1000));
        tracker.update(Seat(1), at(10.0, 1100));

        assert_eq!(tracker.mouse(Seat(1), 1100), Some(Vec3::new(0.0, 0.0, 0.0)));
        assert_eq!(tracker.mouse(Seat(1), 1150), Some(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(tracker.mouse(Seat(1), 5000), Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_stale_sample_ignored() {
        let mut tracker = CursorTracker::new(100);
        tracker.update(Seat(0), at(10.0, 2000));
        tracker.update(Seat(0), at(99.0, 1000));
        assert_eq!(tracker.mouse(Seat(0), 9000), Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_released_pointer_clears_held() {
        let mut tracker = CursorTracker::new(100);
        tracker.update(Seat(3), at(1.0, 10));
        tracker.update(Seat(3), CursorTracker::sample(Some(Vec3::ZERO), None, 20));
        assert_eq!(tracker.held(Seat(3)), None);
    }
}
