// Session module - breathing cycle configuration, phase sequencing,
// cue scheduling and the session thread

pub mod config;
pub mod cue;
pub mod driver;
pub mod sequencer;

pub use config::{BreathingCycle, CueKind, CueMode, Phase, PhaseName, SessionConfig};
pub use cue::CueScheduler;
pub use driver::{SessionCommand, SessionDriver};
pub use sequencer::PhaseSequencer;
