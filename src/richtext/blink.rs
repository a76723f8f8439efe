// Cursor Blink
// Scheduled cursor visibility toggling, driven by the host's clock.
// The host asks for the next deadline, sleeps until then and calls `tick`.

use std::time::{Duration, Instant};

/// Cancellable blink schedule
///
/// While running, the cursor is visible for one interval and hidden for the
/// next, counted from the last `start`/`reset`. A stopped blink is hidden and
/// never schedules.
#[derive(Debug, Clone)]
pub struct CursorBlink {
    interval: Duration,
    reset_at: Option<Instant>,
    visible: bool,
}

impl CursorBlink {
    pub fn new(interval: Duration) -> Self {
        CursorBlink {
            interval: interval.max(Duration::from_millis(1)),
            reset_at: None,
            visible: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.reset_at.is_some()
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Start blinking with the cursor shown; no-op if already running
    pub fn start(&mut self, now: Instant) {
        if self.reset_at.is_none() {
            self.reset(now);
        }
    }

    /// Stop blinking and hide the cursor. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.reset_at = None;
        self.visible = false;
    }

    /// Restart the phase with the cursor shown
    pub fn reset(&mut self, now: Instant) {
        self.reset_at = Some(now);
        self.visible = true;
    }

    /// Update visibility for `now`. Returns true if it changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(reset_at) = self.reset_at else {
            return false;
        };
        let elapsed = now.saturating_duration_since(reset_at).as_millis();
        let phase = elapsed / self.interval.as_millis().max(1);
        let visible = phase % 2 == 0;
        if visible != self.visible {
            self.visible = visible;
            return true;
        }
        false
    }

    /// When the next toggle is due, or None while stopped
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let reset_at = self.reset_at?;
        let interval_ms = self.interval.as_millis().max(1) as u64;
        let elapsed_ms = now.saturating_duration_since(reset_at).as_millis() as u64;
        let next_toggle_ms = (elapsed_ms / interval_ms + 1) * interval_ms;
        Some(reset_at + Duration::from_millis(next_toggle_ms))
    }
}
