// Session configuration - Breathing cycle and cue settings
// All user input is clamped here; downstream code assumes committed
// configs are valid.

use std::fmt;

/// Shortest allowed phase, in seconds
pub const MIN_PHASE_SECONDS: u32 = 1;
/// Longest allowed phase, in seconds
pub const MAX_PHASE_SECONDS: u32 = 30;

/// Named slot in a breathing cycle.
/// `Hold2` is the optional second hold of a 4-phase (box breathing) cycle;
/// for cue and visual purposes it is indistinguishable from `Hold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PhaseName {
    Inhale,
    Hold,
    Exhale,
    Hold2,
}

impl PhaseName {
    /// Audio/visual kind for this slot (both holds collapse to one kind)
    pub fn kind(&self) -> CueKind {
        match self {
            PhaseName::Inhale => CueKind::Inhale,
            PhaseName::Hold | PhaseName::Hold2 => CueKind::Hold,
            PhaseName::Exhale => CueKind::Exhale,
        }
    }

    /// Display label shown by the renderer
    pub fn label(&self) -> &'static str {
        match self {
            PhaseName::Inhale => "Inhale",
            PhaseName::Hold | PhaseName::Hold2 => "Hold",
            PhaseName::Exhale => "Exhale",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Cue/visual kind of a phase (what the backend and renderer care about)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CueKind {
    Inhale,
    Hold,
    Exhale,
}

impl CueKind {
    pub fn is_hold(&self) -> bool {
        matches!(self, CueKind::Hold)
    }
}

/// Cueing policy within a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CueMode {
    /// One accented cue at phase entry, nothing else
    Signal,
    /// One cue per elapsed second (first accented)
    Metronome,
}

impl Default for CueMode {
    fn default() -> Self {
        CueMode::Signal
    }
}

/// One phase of a breathing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Phase {
    pub name: PhaseName,
    pub duration_seconds: u32,
}

impl Phase {
    /// Create a phase, clamping the duration into [1, 30] seconds
    pub fn new(name: PhaseName, duration_seconds: u32) -> Self {
        Self {
            name,
            duration_seconds: duration_seconds.clamp(MIN_PHASE_SECONDS, MAX_PHASE_SECONDS),
        }
    }
}

/// Ordered, wrapping sequence of 3 or 4 phases defining one repetition
/// of the breathing pattern. Index 0 is always Inhale.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BreathingCycle {
    phases: Vec<Phase>,
}

impl BreathingCycle {
    /// 3-phase cycle: inhale / hold / exhale
    pub fn three_phase(inhale: u32, hold: u32, exhale: u32) -> Self {
        Self {
            phases: vec![
                Phase::new(PhaseName::Inhale, inhale),
                Phase::new(PhaseName::Hold, hold),
                Phase::new(PhaseName::Exhale, exhale),
            ],
        }
    }

    /// 4-phase cycle: inhale / hold / exhale / second hold
    pub fn four_phase(inhale: u32, hold: u32, exhale: u32, hold2: u32) -> Self {
        Self {
            phases: vec![
                Phase::new(PhaseName::Inhale, inhale),
                Phase::new(PhaseName::Hold, hold),
                Phase::new(PhaseName::Exhale, exhale),
                Phase::new(PhaseName::Hold2, hold2),
            ],
        }
    }

    /// Classic 4-7-8 relaxation pattern
    pub fn relaxing() -> Self {
        Self::three_phase(4, 7, 8)
    }

    /// Box breathing (4-4-4-4)
    pub fn box_breathing() -> Self {
        Self::four_phase(4, 4, 4, 4)
    }

    /// Number of phases (3 or 4)
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Phase at a wrapped index
    pub fn phase(&self, index: usize) -> Phase {
        self.phases[index % self.phases.len()]
    }

    /// Sum of all phase durations in seconds
    pub fn total_seconds(&self) -> u32 {
        self.phases.iter().map(|p| p.duration_seconds).sum()
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }
}

impl Default for BreathingCycle {
    fn default() -> Self {
        Self::relaxing()
    }
}

/// Immutable snapshot of the session settings, taken at session start.
/// Later edits to the live settings apply only after a restart.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionConfig {
    pub cycle: BreathingCycle,
    /// Total session length in seconds; 0 means unbounded.
    /// Advisory: checked only at phase boundaries, so the last phase may
    /// run to completion past the bound.
    pub total_duration_seconds: u32,
    pub cue_enabled: bool,
    pub cue_mode: CueMode,
    pub cue_volume: f32,
    pub mute_hold: bool,
}

impl SessionConfig {
    pub fn new(cycle: BreathingCycle) -> Self {
        Self {
            cycle,
            total_duration_seconds: 0,
            cue_enabled: true,
            cue_mode: CueMode::Signal,
            cue_volume: 0.5,
            mute_hold: false,
        }
    }

    pub fn with_total_duration(mut self, seconds: u32) -> Self {
        self.total_duration_seconds = seconds;
        self
    }

    pub fn with_cue_mode(mut self, mode: CueMode) -> Self {
        self.cue_mode = mode;
        self
    }

    pub fn with_cue_volume(mut self, volume: f32) -> Self {
        self.cue_volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_mute_hold(mut self, mute: bool) -> Self {
        self.mute_hold = mute;
        self
    }

    pub fn with_cues_enabled(mut self, enabled: bool) -> Self {
        self.cue_enabled = enabled;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(BreathingCycle::default())
    }
}
