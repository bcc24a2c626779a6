// Session driver - owns the sequencer on its own thread
// Maps the source platform's single-threaded event loop onto one thread
// that blocks until the next state-machine deadline or an incoming
// command, whichever comes first.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::render::PhaseRenderer;
use crate::session::config::SessionConfig;
use crate::session::cue::CueScheduler;
use crate::session::sequencer::PhaseSequencer;

/// Commands from the UI thread to the session thread
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Start(SessionConfig),
    Stop,
    /// Circle tap: start with this config if stopped, stop otherwise
    Toggle(SessionConfig),
    /// Settings changed while running: stop, then start with the new
    /// snapshot. Never mutates a live cycle.
    Restart(SessionConfig),
    SetVolume(f32),
    Shutdown,
}

/// Handle to the session thread. Dropping it shuts the thread down.
pub struct SessionDriver {
    command_tx: Sender<SessionCommand>,
    handle: Option<JoinHandle<()>>,
}

impl SessionDriver {
    /// Spawn the session thread around a sequencer built from the given
    /// renderer and cue scheduler.
    pub fn spawn(renderer: Box<dyn PhaseRenderer>, cues: CueScheduler) -> Self {
        let (command_tx, command_rx) = channel();
        let handle = std::thread::Builder::new()
            .name("session".into())
            .spawn(move || run_loop(PhaseSequencer::new(renderer, cues), command_rx))
            .expect("failed to spawn session thread");
        Self {
            command_tx,
            handle: Some(handle),
        }
    }

    pub fn send(&self, command: SessionCommand) {
        // A closed channel means the session thread is already gone;
        // nothing sensible to do from the UI side.
        let _ = self.command_tx.send(command);
    }

    /// Clone of the command sender, for UI code that outlives this handle
    pub fn sender(&self) -> Sender<SessionCommand> {
        self.command_tx.clone()
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        let _ = self.command_tx.send(SessionCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Longest sleep while idle; bounds how stale a lost wakeup can get
const IDLE_TICK: Duration = Duration::from_millis(500);

fn run_loop(mut sequencer: PhaseSequencer, command_rx: Receiver<SessionCommand>) {
    loop {
        let timeout = match sequencer.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => IDLE_TICK,
        };
        match command_rx.recv_timeout(timeout) {
            Ok(SessionCommand::Start(config)) => sequencer.start(config, Instant::now()),
            Ok(SessionCommand::Stop) => sequencer.stop(),
            Ok(SessionCommand::Toggle(config)) => {
                if sequencer.is_running() {
                    sequencer.stop();
                } else {
                    sequencer.start(config, Instant::now());
                }
            }
            Ok(SessionCommand::Restart(config)) => {
                sequencer.stop();
                sequencer.start(config, Instant::now());
            }
            Ok(SessionCommand::SetVolume(volume)) => sequencer.set_volume(volume),
            Ok(SessionCommand::Shutdown) => {
                sequencer.stop();
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                sequencer.stop();
                return;
            }
        }
        sequencer.poll(Instant::now());
    }
}
