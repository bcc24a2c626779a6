// Cue scheduler - decides which audio cues fire within a phase
// Consumes phase entries from the sequencer and runs at most one
// metronome runtime, strictly nested inside the current phase.

use std::time::{Duration, Instant};

use crate::audio::backend::AudioBackend;
use crate::session::config::{CueKind, CueMode, SessionConfig};

/// Metronome state for one phase activation.
/// Torn down unconditionally before the next phase entry or on stop,
/// so two phases' runtimes can never coexist.
#[derive(Debug)]
struct CueRuntime {
    kind: CueKind,
    /// Deadline of the next unaccented beat
    next_beat: Instant,
    /// Beats already fired this phase; the entry beat counts as beat 1
    beats_elapsed: u32,
    /// Phase duration in seconds = total beats this phase may produce
    total_beats: u32,
}

/// Schedules audio cues against phase entries.
///
/// Two policies: Signal fires exactly one accented cue per phase entry;
/// Metronome additionally fires one unaccented cue per elapsed second,
/// never exceeding the phase duration.
pub struct CueScheduler {
    backend: Box<dyn AudioBackend>,
    runtime: Option<CueRuntime>,
}

impl CueScheduler {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            runtime: None,
        }
    }

    /// Handle a phase entry at instant `now`.
    ///
    /// Always cancels the previous phase's metronome first, even when this
    /// phase turns out to be silent.
    pub fn on_phase_enter(
        &mut self,
        config: &SessionConfig,
        kind: CueKind,
        duration_seconds: u32,
        now: Instant,
    ) {
        // Clear before schedule: no two runtimes may overlap
        self.runtime = None;

        if !config.cue_enabled {
            return;
        }
        if config.mute_hold && kind.is_hold() {
            return;
        }

        // Platforms suspend audio output until a user gesture; ask for a
        // resume before every phase's first cue. Fire-and-forget.
        self.backend.ensure_resumed();

        // Phase-entry beat, always accented
        self.backend.play_cue(kind, true);

        if config.cue_mode == CueMode::Metronome && duration_seconds > 1 {
            self.runtime = Some(CueRuntime {
                kind,
                next_beat: now + Duration::from_secs(1),
                beats_elapsed: 1,
                total_beats: duration_seconds,
            });
        }
    }

    /// Fire every metronome beat due at or before `now`.
    pub fn poll(&mut self, now: Instant) {
        loop {
            let (kind, finished) = match self.runtime.as_mut() {
                Some(runtime) if runtime.next_beat <= now => {
                    let kind = runtime.kind;
                    runtime.beats_elapsed += 1;
                    if runtime.beats_elapsed >= runtime.total_beats {
                        // Exactly `total_beats` beats per phase, never one
                        // at t = phase duration
                        (kind, true)
                    } else {
                        runtime.next_beat += Duration::from_secs(1);
                        (kind, false)
                    }
                }
                _ => break,
            };
            if finished {
                self.runtime = None;
            }
            self.backend.play_cue(kind, false);
        }
    }

    /// Deadline of the next pending beat, if a metronome is armed
    pub fn next_deadline(&self) -> Option<Instant> {
        self.runtime.as_ref().map(|r| r.next_beat)
    }

    /// Cancel any pending metronome runtime (called on stop)
    pub fn cancel(&mut self) {
        self.runtime = None;
    }

    /// Clamp and forward the cue volume to the backend.
    /// Takes effect immediately, including for in-flight tones.
    pub fn set_volume(&mut self, volume: f32) {
        self.backend.set_volume(volume.clamp(0.0, 1.0));
    }
}
