//! Debounced dialogue-display state machine.
//!
//! `Idle → TextVisible → Stabilized → Resolved | Unresolved → Idle`

/// Where the tracker is for the current dialogue box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Idle,
    /// Text is on screen but may still be typing out.
    TextVisible { text: String, stable_for: u32 },
    /// Text has been unchanged long enough; resolution is due.
    Stabilized { text: String },
    Resolved { text: String },
    Unresolved { text: String },
}

/// What a single observation asks the caller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    Nothing,
    /// Resolve this text now, then call [`DisplayTracker::complete`].
    Stabilized(String),
    /// The dialogue box has been gone long enough to count as closed.
    ReturnedToIdle,
}

#[derive(Debug, Clone)]
pub struct DisplayTracker {
    state: DisplayState,
    stable_ticks: u32,
    absent_ticks: u32,
    absent_for: u32,
}

impl DisplayTracker {
    pub fn new(stable_ticks: u32, absent_ticks: u32) -> Self {
        Self {
            state: DisplayState::Idle,
            stable_ticks: stable_ticks.max(1),
            absent_ticks: absent_ticks.max(1),
            absent_for: 0,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = DisplayState::Idle;
        self.absent_for = 0;
    }

    /// Feed one tick. `None` means no dialogue box is on screen.
    pub fn observe(&mut self, text: Option<&str>) -> TrackerEvent {
        let Some(text) = text else {
            return self.observe_absent();
        };
        self.absent_for = 0;

        let stable_for = match &self.state {
            DisplayState::TextVisible {
                text: current,
                stable_for,
            } if current == text => stable_for + 1,
            DisplayState::Stabilized { text: current }
            | DisplayState::Resolved { text: current }
            | DisplayState::Unresolved { text: current }
                if current == text =>
            {
                return TrackerEvent::Nothing;
            }
            _ => 1,
        };

        if stable_for >= self.stable_ticks && !text.trim().is_empty() {
            self.state = DisplayState::Stabilized {
                text: text.to_string(),
            };
            TrackerEvent::Stabilized(text.to_string())
        } else {
            self.state = DisplayState::TextVisible {
                text: text.to_string(),
                stable_for,
            };
            TrackerEvent::Nothing
        }
    }

    fn observe_absent(&mut self) -> TrackerEvent {
        if self.state == DisplayState::Idle {
            return TrackerEvent::Nothing;
        }
        self.absent_for += 1;
        if self.absent_for >= self.absent_ticks {
            self.reset();
            TrackerEvent::ReturnedToIdle
        } else {
            TrackerEvent::Nothing
        }
    }

    /// Record the outcome of resolving the stabilized text.
    pub fn complete(&mut self, resolved: bool) {
        if let DisplayState::Stabilized { text } = &self.state {
            let text = text.clone();
            self.state = if resolved {
                DisplayState::Resolved { text }
            } else {
                DisplayState::Unresolved { text }
            };
        }
    }
}
