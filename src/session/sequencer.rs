// Phase sequencer - wall-clock scheduling of the breathing cycle
// Explicit state machine with a single armed phase deadline, re-armed on
// each transition. Deadlines chain from the previous deadline rather than
// the observed wake-up instant, so scheduling jitter does not accumulate.

use std::time::{Duration, Instant};

use crate::render::PhaseRenderer;
use crate::session::config::SessionConfig;
use crate::session::cue::CueScheduler;

/// Transient per-session state. Created on start, destroyed on stop,
/// never shared outside the sequencer.
#[derive(Debug)]
struct SessionState {
    config: SessionConfig,
    current_phase_index: usize,
    session_start: Instant,
    /// The one armed timer: when the current phase ends
    phase_deadline: Instant,
}

/// Drives the breathing cycle: decides which phase is active, for how
/// long, and when the session ends.
///
/// Per phase entry the order is fixed: visual notification, then cue
/// scheduling, then arming the next deadline - all on one synchronous
/// turn, so phase entries can never interleave.
pub struct PhaseSequencer {
    renderer: Box<dyn PhaseRenderer>,
    cues: CueScheduler,
    state: Option<SessionState>,
}

impl PhaseSequencer {
    pub fn new(renderer: Box<dyn PhaseRenderer>, cues: CueScheduler) -> Self {
        Self {
            renderer,
            cues,
            state: None,
        }
    }

    /// Begin a session at instant `now` with an immutable config snapshot.
    /// No-op if a session is already running; the first phase is entered
    /// synchronously, with no initial delay.
    pub fn start(&mut self, config: SessionConfig, now: Instant) {
        if self.state.is_some() {
            return;
        }
        self.cues.set_volume(config.cue_volume);
        self.state = Some(SessionState {
            config,
            current_phase_index: 0,
            session_start: now,
            // Overwritten by enter_phase before anything can observe it
            phase_deadline: now,
        });
        self.enter_phase(now);
    }

    /// Stop the session: cancel the phase deadline and any nested cue
    /// runtime, then return the display to its idle baseline. Idempotent.
    pub fn stop(&mut self) {
        if self.state.take().is_none() {
            return;
        }
        self.cues.cancel();
        self.renderer.render_idle();
    }

    /// Fire everything due at or before `now`: metronome beats first, then
    /// at most one phase transition per iteration, repeating until nothing
    /// is due. A late poll catches up in the order real time would have
    /// produced (a phase's beats all land strictly before its deadline).
    pub fn poll(&mut self, now: Instant) {
        loop {
            self.cues.poll(now);
            let Some(state) = self.state.as_mut() else {
                return;
            };
            let deadline = state.phase_deadline;
            if deadline > now {
                return;
            }
            state.current_phase_index = (state.current_phase_index + 1) % state.config.cycle.len();
            self.enter_phase(deadline);
        }
    }

    /// Earliest pending deadline (phase end or next metronome beat), if a
    /// session is running. The driver sleeps until this.
    pub fn next_deadline(&self) -> Option<Instant> {
        let phase = self.state.as_ref().map(|s| s.phase_deadline)?;
        Some(match self.cues.next_deadline() {
            Some(beat) if beat < phase => beat,
            _ => phase,
        })
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    /// Index of the active phase, for display and tests
    pub fn current_phase_index(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.current_phase_index)
    }

    /// Forwarded to the cue scheduler; effective immediately
    pub fn set_volume(&mut self, volume: f32) {
        self.cues.set_volume(volume);
    }

    /// Enter the phase at `current_phase_index`, anchored at `anchor`.
    ///
    /// The session bound is evaluated here and only here - at phase
    /// boundaries - so the last phase may run to completion past the
    /// bound. That overshoot is deliberate: the bound is advisory, not a
    /// hard mid-phase cut.
    fn enter_phase(&mut self, anchor: Instant) {
        let phase = {
            let Some(state) = self.state.as_ref() else {
                return;
            };
            let total_seconds = state.config.total_duration_seconds;
            if total_seconds > 0
                && anchor.duration_since(state.session_start)
                    >= Duration::from_secs(total_seconds as u64)
            {
                self.stop();
                return;
            }
            state.config.cycle.phase(state.current_phase_index)
        };
        let kind = phase.name.kind();

        // Visual before audio, both before the deadline is armed
        self.renderer
            .render_phase(phase.name.label(), phase.duration_seconds, kind);
        if let Some(state) = self.state.as_ref() {
            self.cues
                .on_phase_enter(&state.config, kind, phase.duration_seconds, anchor);
        }
        if let Some(state) = self.state.as_mut() {
            state.phase_deadline = anchor + Duration::from_secs(phase.duration_seconds as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::AudioBackend;
    use crate::session::config::{BreathingCycle, CueKind, CueMode};
    use std::sync::{Arc, Mutex};

    /// One observable effect, in emission order
    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Phase(&'static str, u32),
        Idle,
        Cue(CueKind, bool),
    }

    type EventLog = Arc<Mutex<Vec<Event>>>;

    struct LogRenderer(EventLog);

    impl PhaseRenderer for LogRenderer {
        fn render_phase(&mut self, label: &'static str, duration_seconds: u32, _kind: CueKind) {
            self.0.lock().unwrap().push(Event::Phase(label, duration_seconds));
        }
        fn render_idle(&mut self) {
            self.0.lock().unwrap().push(Event::Idle);
        }
    }

    struct LogBackend(EventLog);

    impl AudioBackend for LogBackend {
        fn play_cue(&mut self, kind: CueKind, accent: bool) {
            self.0.lock().unwrap().push(Event::Cue(kind, accent));
        }
        fn set_volume(&mut self, _volume: f32) {}
        fn ensure_resumed(&mut self) {}
    }

    fn sequencer_with_log() -> (PhaseSequencer, EventLog) {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let renderer = LogRenderer(Arc::clone(&log));
        let cues = CueScheduler::new(Box::new(LogBackend(Arc::clone(&log))));
        (PhaseSequencer::new(Box::new(renderer), cues), log)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_start_enters_first_phase_synchronously() {
        let (mut seq, log) = sequencer_with_log();
        let t0 = Instant::now();

        seq.start(SessionConfig::default(), t0);
        assert!(seq.is_running());
        assert_eq!(seq.current_phase_index(), Some(0));
        // Visual first, then the accented entry cue
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[Event::Phase("Inhale", 4), Event::Cue(CueKind::Inhale, true)]
        );
    }

    #[test]
    fn test_cycle_advances_modulo_length() {
        let (mut seq, _log) = sequencer_with_log();
        let t0 = Instant::now();
        let config = SessionConfig::new(BreathingCycle::three_phase(4, 7, 8));

        seq.start(config, t0);
        assert_eq!(seq.current_phase_index(), Some(0));
        seq.poll(t0 + secs(4));
        assert_eq!(seq.current_phase_index(), Some(1));
        seq.poll(t0 + secs(11));
        assert_eq!(seq.current_phase_index(), Some(2));
        seq.poll(t0 + secs(19));
        assert_eq!(seq.current_phase_index(), Some(0)); // wrapped
    }

    #[test]
    fn test_full_cycle_repeats_identically() {
        let (mut seq, log) = sequencer_with_log();
        let t0 = Instant::now();
        let config = SessionConfig::new(BreathingCycle::three_phase(2, 3, 4));

        seq.start(config, t0);
        // Two full cycles (18s), polled second by second
        for s in 1..=18 {
            seq.poll(t0 + secs(s));
        }

        let log = log.lock().unwrap();
        let phases: Vec<&Event> = log
            .iter()
            .filter(|e| matches!(e, Event::Phase(_, _)))
            .collect();
        assert_eq!(phases.len(), 7); // 2 cycles + entry of the third
        assert_eq!(phases[0], phases[3]);
        assert_eq!(phases[1], phases[4]);
        assert_eq!(phases[2], phases[5]);
        assert_eq!(*phases[6], Event::Phase("Inhale", 2));
    }

    #[test]
    fn test_visual_precedes_audio_every_entry() {
        let (mut seq, log) = sequencer_with_log();
        let t0 = Instant::now();
        let config =
            SessionConfig::new(BreathingCycle::three_phase(2, 2, 2)).with_cue_mode(CueMode::Metronome);

        seq.start(config, t0);
        for s in 1..=6 {
            seq.poll(t0 + secs(s));
        }

        let log = log.lock().unwrap();
        // Every accented cue must be directly preceded by its phase render
        for (i, event) in log.iter().enumerate() {
            if let Event::Cue(_, true) = event {
                assert!(
                    matches!(log[i - 1], Event::Phase(_, _)),
                    "accented cue at {} not preceded by phase render: {:?}",
                    i,
                    *log
                );
            }
        }
    }

    #[test]
    fn test_late_poll_catches_up_in_order() {
        let (mut seq, log) = sequencer_with_log();
        let t0 = Instant::now();
        let config =
            SessionConfig::new(BreathingCycle::three_phase(2, 2, 2)).with_cue_mode(CueMode::Metronome);

        seq.start(config, t0);
        // Single poll 6 seconds late: one full cycle plus the next entry
        seq.poll(t0 + secs(6));

        let expected = [
            Event::Phase("Inhale", 2),
            Event::Cue(CueKind::Inhale, true),
            Event::Cue(CueKind::Inhale, false),
            Event::Phase("Hold", 2),
            Event::Cue(CueKind::Hold, true),
            Event::Cue(CueKind::Hold, false),
            Event::Phase("Exhale", 2),
            Event::Cue(CueKind::Exhale, true),
            Event::Cue(CueKind::Exhale, false),
            Event::Phase("Inhale", 2),
            Event::Cue(CueKind::Inhale, true),
        ];
        assert_eq!(log.lock().unwrap().as_slice(), &expected);
    }

    #[test]
    fn test_session_bound_checked_at_phase_boundary() {
        let (mut seq, log) = sequencer_with_log();
        let t0 = Instant::now();
        // 19s cycle, 60s bound: 3 cycles end at 57s, a 4th inhale starts
        // (57 < 60) and the stop lands at its end, 61s
        let config =
            SessionConfig::new(BreathingCycle::three_phase(4, 7, 8)).with_total_duration(60);

        seq.start(config, t0);
        for s in 1..=57 {
            seq.poll(t0 + secs(s));
        }
        assert!(seq.is_running());
        assert_eq!(seq.current_phase_index(), Some(0));

        seq.poll(t0 + secs(60));
        assert!(seq.is_running(), "bound must not cut a phase short");

        seq.poll(t0 + secs(61));
        assert!(!seq.is_running());
        assert_eq!(*log.lock().unwrap().last().unwrap(), Event::Idle);

        let phases = log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Event::Phase(_, _)))
            .count();
        assert_eq!(phases, 10); // 3 cycles of 3 + the final inhale
    }

    #[test]
    fn test_bound_exactly_at_cycle_end() {
        let (mut seq, _log) = sequencer_with_log();
        let t0 = Instant::now();
        let config =
            SessionConfig::new(BreathingCycle::three_phase(4, 7, 8)).with_total_duration(19);

        seq.start(config, t0);
        for s in 1..=19 {
            seq.poll(t0 + secs(s));
        }
        // Elapsed == bound at the boundary: no new phase is entered
        assert!(!seq.is_running());
    }

    #[test]
    fn test_unbounded_session_keeps_running() {
        let (mut seq, _log) = sequencer_with_log();
        let t0 = Instant::now();
        let config = SessionConfig::new(BreathingCycle::three_phase(1, 1, 1));

        seq.start(config, t0);
        seq.poll(t0 + secs(600));
        assert!(seq.is_running());
    }

    #[test]
    fn test_start_twice_is_noop() {
        let (mut seq, log) = sequencer_with_log();
        let t0 = Instant::now();

        seq.start(SessionConfig::default(), t0);
        let after_first = log.lock().unwrap().len();
        seq.start(SessionConfig::default(), t0 + secs(1));
        assert_eq!(log.lock().unwrap().len(), after_first);
        assert_eq!(seq.current_phase_index(), Some(0));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut seq, log) = sequencer_with_log();
        let t0 = Instant::now();

        seq.stop(); // stopping a stopped sequencer does nothing
        assert!(log.lock().unwrap().is_empty());

        seq.start(SessionConfig::default(), t0);
        seq.stop();
        assert_eq!(*log.lock().unwrap().last().unwrap(), Event::Idle);
        let len = log.lock().unwrap().len();

        seq.stop();
        assert_eq!(log.lock().unwrap().len(), len);
        assert!(seq.next_deadline().is_none());
    }

    #[test]
    fn test_stop_cancels_pending_metronome() {
        let (mut seq, log) = sequencer_with_log();
        let t0 = Instant::now();
        let config =
            SessionConfig::new(BreathingCycle::three_phase(10, 10, 10)).with_cue_mode(CueMode::Metronome);

        seq.start(config, t0);
        seq.poll(t0 + secs(2));
        seq.stop();
        let len = log.lock().unwrap().len();

        // Nothing may fire after stop, however late the poll
        seq.poll(t0 + secs(30));
        assert_eq!(log.lock().unwrap().len(), len);
    }

    #[test]
    fn test_restart_after_stop_begins_at_inhale() {
        let (mut seq, _log) = sequencer_with_log();
        let t0 = Instant::now();
        let config = SessionConfig::new(BreathingCycle::three_phase(2, 2, 2));

        seq.start(config.clone(), t0);
        seq.poll(t0 + secs(2));
        assert_eq!(seq.current_phase_index(), Some(1));

        // Settings change mid-session: stop then start, never live mutation
        seq.stop();
        let t1 = t0 + secs(5);
        seq.start(config, t1);
        assert_eq!(seq.current_phase_index(), Some(0));
    }

    #[test]
    fn test_next_deadline_prefers_nearest_beat() {
        let (mut seq, _log) = sequencer_with_log();
        let t0 = Instant::now();
        let config =
            SessionConfig::new(BreathingCycle::three_phase(5, 5, 5)).with_cue_mode(CueMode::Metronome);

        seq.start(config, t0);
        // Next metronome beat (t0+1) is nearer than the phase end (t0+5)
        assert_eq!(seq.next_deadline(), Some(t0 + secs(1)));

        seq.poll(t0 + secs(4));
        // Last beat of the phase fired; the phase deadline remains
        assert_eq!(seq.next_deadline(), Some(t0 + secs(5)));
    }
}
