// Audio backend seam - what the cue scheduler needs from the audio layer
// The scheduler depends on this trait, never on the cpal engine directly,
// so tests can substitute a recording fake.

use crate::session::config::CueKind;

/// Sink for synthesized cues.
///
/// Implementations must be non-fatal throughout: a backend that cannot
/// produce sound drops cues silently, it never propagates a fault that
/// could halt the phase sequencer.
pub trait AudioBackend: Send {
    /// Fire one cue. `accent` marks the first beat of a phase.
    fn play_cue(&mut self, kind: CueKind, accent: bool);

    /// Master cue volume in [0.0, 1.0]. Applies to in-flight tones too.
    fn set_volume(&mut self, volume: f32);

    /// Ensure the output is running (platforms gate audio behind a user
    /// gesture). Fire-and-forget: cues issued while the resume is still
    /// pending may be dropped by the platform.
    fn ensure_resumed(&mut self);
}

/// Backend that produces no sound. Used when audio is unavailable so the
/// visual phase cycle keeps running.
#[derive(Debug, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn play_cue(&mut self, _kind: CueKind, _accent: bool) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn ensure_resumed(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_backend_accepts_all_calls() {
        let mut backend = NullBackend;
        backend.ensure_resumed();
        backend.play_cue(CueKind::Inhale, true);
        backend.play_cue(CueKind::Hold, false);
        backend.set_volume(0.7);
    }

    #[test]
    fn test_null_backend_is_object_safe() {
        let mut backend: Box<dyn AudioBackend> = Box::new(NullBackend);
        backend.play_cue(CueKind::Exhale, false);
    }
}
