// breathpace - guided-breathing pacer with generative audio cues

pub mod audio;
pub mod render;
pub mod session;
pub mod ui;

// Re-export commonly used types for convenience
pub use audio::backend::{AudioBackend, NullBackend};
pub use audio::engine::{AudioError, CpalBackend, CueEngine};
pub use render::{ConsoleRenderer, PhaseRenderer, SharedVisualState, VisualStateRenderer};
pub use session::config::{BreathingCycle, CueKind, CueMode, Phase, PhaseName, SessionConfig};
pub use session::cue::CueScheduler;
pub use session::driver::{SessionCommand, SessionDriver};
pub use session::sequencer::PhaseSequencer;
