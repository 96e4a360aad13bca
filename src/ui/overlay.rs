use std::time::{Duration, Instant};

/// How long the pointer must stay idle before the panel hides.
pub const HIDE_DELAY: Duration = Duration::from_millis(3000);

/// Visibility state for the overlay control panel.
///
/// The panel hides only while playback is running and the pointer has been
/// idle past the delay, and never while the pointer is over the panel
/// itself. The conditions are re-checked when the deadline fires, not when
/// it is armed, so a pause or pointer move between the two always wins.
pub struct OverlayVisibility {
    visible: bool,
    over_controls: bool,
    hide_at: Option<Instant>,
}

impl Default for OverlayVisibility {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayVisibility {
    pub fn new() -> Self {
        Self {
            visible: true,
            over_controls: false,
            hide_at: None,
        }
    }

    /// Qualifying pointer activity: motion over the window or entering it.
    /// Shows the panel and re-arms the hide deadline where applicable.
    pub fn pointer_activity(&mut self, now: Instant, playing: bool) {
        self.visible = true;
        self.rearm(now, playing);
    }

    /// Pointer moved onto the control panel: hiding is suppressed.
    pub fn enter_controls(&mut self) {
        self.over_controls = true;
        self.hide_at = None;
    }

    /// Pointer left the control panel.
    pub fn leave_controls(&mut self, now: Instant, playing: bool) {
        self.over_controls = false;
        self.rearm(now, playing);
    }

    /// Playback was paused: cancel any pending hide and keep the panel up.
    pub fn playback_paused(&mut self) {
        self.hide_at = None;
        self.visible = true;
    }

    /// Playback resumed: the idle countdown starts again.
    pub fn playback_resumed(&mut self, now: Instant) {
        self.rearm(now, true);
    }

    fn rearm(&mut self, now: Instant, playing: bool) {
        if playing && !self.over_controls {
            self.hide_at = Some(now + HIDE_DELAY);
        }
    }

    /// Check the deadline. Hides only if the arming conditions still hold
    /// at fire time.
    pub fn tick(&mut self, now: Instant, playing: bool) {
        if let Some(deadline) = self.hide_at {
            if now >= deadline {
                self.hide_at = None;
                if playing && !self.over_controls {
                    self.visible = false;
                }
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_over_controls(&self) -> bool {
        self.over_controls
    }

    /// Pending deadline, if any, so the app can schedule a repaint for it.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.hide_at
    }
}
