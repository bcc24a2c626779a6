// Visual renderer seam - phase display owned by the UI thread
// The sequencer notifies the renderer fire-and-forget; the renderer owns
// all animation timing and the sequencer never waits on it.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::session::config::CueKind;

/// Receives phase notifications from the sequencer.
pub trait PhaseRenderer: Send {
    /// A phase was entered. The hold kind selects the pulse animation
    /// instead of a grow/shrink.
    fn render_phase(&mut self, label: &'static str, duration_seconds: u32, kind: CueKind);

    /// Session stopped: return to baseline scale and an idle label.
    fn render_idle(&mut self);
}

/// Snapshot of the visual state, shared with the UI thread.
/// The UI interpolates the circle scale from `entered_at` and
/// `duration_seconds`; the sequencer only replaces the snapshot.
#[derive(Debug, Clone)]
pub struct VisualSnapshot {
    pub label: &'static str,
    pub kind: Option<CueKind>,
    pub duration_seconds: u32,
    pub entered_at: Option<Instant>,
}

impl VisualSnapshot {
    pub fn idle() -> Self {
        Self {
            label: "Tap to begin",
            kind: None,
            duration_seconds: 0,
            entered_at: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.kind.is_none()
    }
}

/// Shared handle to the visual snapshot
pub type SharedVisualState = Arc<Mutex<VisualSnapshot>>;

pub fn shared_visual_state() -> SharedVisualState {
    Arc::new(Mutex::new(VisualSnapshot::idle()))
}

/// Renderer that publishes snapshots for the egui thread to read.
pub struct VisualStateRenderer {
    state: SharedVisualState,
}

impl VisualStateRenderer {
    pub fn new(state: SharedVisualState) -> Self {
        Self { state }
    }
}

impl PhaseRenderer for VisualStateRenderer {
    fn render_phase(&mut self, label: &'static str, duration_seconds: u32, kind: CueKind) {
        if let Ok(mut snapshot) = self.state.lock() {
            *snapshot = VisualSnapshot {
                label,
                kind: Some(kind),
                duration_seconds,
                entered_at: Some(Instant::now()),
            };
        }
    }

    fn render_idle(&mut self) {
        if let Ok(mut snapshot) = self.state.lock() {
            *snapshot = VisualSnapshot::idle();
        }
    }
}

/// Println-based renderer for headless use.
pub struct ConsoleRenderer;

impl PhaseRenderer for ConsoleRenderer {
    fn render_phase(&mut self, label: &'static str, duration_seconds: u32, _kind: CueKind) {
        println!("{} ({}s)", label, duration_seconds);
    }

    fn render_idle(&mut self) {
        println!("Session stopped");
    }
}
