// Main UI - breathing circle and settings panel
// Owns all animation timing: the session thread only publishes phase
// snapshots, the circle scale is interpolated here every frame.

use eframe::egui;
use std::time::Instant;

use crate::audio::engine::CueEngine;
use crate::render::SharedVisualState;
use crate::session::config::{BreathingCycle, CueKind, CueMode, SessionConfig};
use crate::session::driver::{SessionCommand, SessionDriver};

/// Circle scale at exhale rest and at full inhale
const REST_SCALE: f32 = 1.0;
const FULL_SCALE: f32 = 1.6;
const BASE_RADIUS: f32 = 70.0;

pub struct PacerApp {
    driver: SessionDriver,
    engine: Option<CueEngine>,
    visual: SharedVisualState,

    // Live settings; committed as a snapshot on (re)start
    four_phase: bool,
    inhale_seconds: u32,
    hold_seconds: u32,
    exhale_seconds: u32,
    hold2_seconds: u32,
    session_minutes: u32,
    cue_enabled: bool,
    cue_mode: CueMode,
    cue_volume: f32,
    mute_hold: bool,

    // Animation continuity across phase changes
    current_scale: f32,
    scale_at_entry: f32,
    last_entry: Option<Instant>,
}

impl PacerApp {
    pub fn new(driver: SessionDriver, engine: Option<CueEngine>, visual: SharedVisualState) -> Self {
        Self {
            driver,
            engine,
            visual,
            four_phase: false,
            inhale_seconds: 4,
            hold_seconds: 7,
            exhale_seconds: 8,
            hold2_seconds: 4,
            session_minutes: 0,
            cue_enabled: true,
            cue_mode: CueMode::Signal,
            cue_volume: 0.5,
            mute_hold: false,
            current_scale: REST_SCALE,
            scale_at_entry: REST_SCALE,
            last_entry: None,
        }
    }

    fn build_config(&self) -> SessionConfig {
        let cycle = if self.four_phase {
            BreathingCycle::four_phase(
                self.inhale_seconds,
                self.hold_seconds,
                self.exhale_seconds,
                self.hold2_seconds,
            )
        } else {
            BreathingCycle::three_phase(self.inhale_seconds, self.hold_seconds, self.exhale_seconds)
        };
        SessionConfig {
            cycle,
            total_duration_seconds: self.session_minutes * 60,
            cue_enabled: self.cue_enabled,
            cue_mode: self.cue_mode,
            cue_volume: self.cue_volume,
            mute_hold: self.mute_hold,
        }
    }

    fn settings_panel(&mut self, ui: &mut egui::Ui, running: bool) {
        ui.heading("Breathing pattern");
        let mut changed = false;

        let was_four_phase = self.four_phase;
        ui.horizontal(|ui| {
            changed |= ui.selectable_value(&mut self.four_phase, false, "3 phases").changed();
            changed |= ui.selectable_value(&mut self.four_phase, true, "4 phases").changed();
        });
        if self.four_phase != was_four_phase {
            // Sensible defaults per mode: 4-7-8 relaxation vs box breathing
            if self.four_phase {
                (self.inhale_seconds, self.hold_seconds, self.exhale_seconds, self.hold2_seconds) =
                    (4, 4, 4, 4);
            } else {
                (self.inhale_seconds, self.hold_seconds, self.exhale_seconds) = (4, 7, 8);
            }
        }

        changed |= ui
            .add(egui::Slider::new(&mut self.inhale_seconds, 1..=30).text("Inhale (s)"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.hold_seconds, 1..=30).text("Hold (s)"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.exhale_seconds, 1..=30).text("Exhale (s)"))
            .changed();
        if self.four_phase {
            changed |= ui
                .add(egui::Slider::new(&mut self.hold2_seconds, 1..=30).text("Hold 2 (s)"))
                .changed();
        }

        ui.separator();
        changed |= ui
            .add(egui::Slider::new(&mut self.session_minutes, 0..=60).text("Session (min, 0 = ∞)"))
            .changed();

        ui.separator();
        ui.heading("Audio cues");
        changed |= ui.checkbox(&mut self.cue_enabled, "Enable cues").changed();
        ui.horizontal(|ui| {
            changed |= ui
                .selectable_value(&mut self.cue_mode, CueMode::Signal, "Signal")
                .changed();
            changed |= ui
                .selectable_value(&mut self.cue_mode, CueMode::Metronome, "Metronome")
                .changed();
        });
        changed |= ui.checkbox(&mut self.mute_hold, "Mute hold phases").changed();

        if ui
            .add(egui::Slider::new(&mut self.cue_volume, 0.0..=1.0).text("Volume"))
            .changed()
        {
            // Volume applies live, no restart needed
            self.driver.send(SessionCommand::SetVolume(self.cue_volume));
        }

        if changed && running {
            // Cycle edits never mutate a live session
            self.driver.send(SessionCommand::Restart(self.build_config()));
        }
    }

    /// Interpolated circle scale for this frame
    fn circle_scale(&mut self) -> (f32, &'static str, bool) {
        let snapshot = match self.visual.lock() {
            Ok(s) => s.clone(),
            Err(_) => return (REST_SCALE, "", false),
        };

        if snapshot.entered_at != self.last_entry {
            self.scale_at_entry = self.current_scale;
            self.last_entry = snapshot.entered_at;
        }

        let scale = match (snapshot.kind, snapshot.entered_at) {
            (Some(kind), Some(entered_at)) => {
                let elapsed = entered_at.elapsed().as_secs_f32();
                let duration = snapshot.duration_seconds.max(1) as f32;
                let progress = (elapsed / duration).clamp(0.0, 1.0);
                match kind {
                    CueKind::Inhale => lerp(self.scale_at_entry, FULL_SCALE, progress),
                    CueKind::Exhale => lerp(self.scale_at_entry, REST_SCALE, progress),
                    CueKind::Hold => {
                        // Gentle pulse at whatever size the hold began
                        self.scale_at_entry
                            + 0.02 * (elapsed * std::f32::consts::TAU * 0.5).sin()
                    }
                }
            }
            _ => lerp(self.current_scale, REST_SCALE, 0.1),
        };
        self.current_scale = scale;
        (scale, snapshot.label, snapshot.is_idle())
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

impl eframe::App for PacerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(engine) = &self.engine {
            engine.pump();
        }

        let (scale, label, idle) = self.circle_scale();

        egui::SidePanel::right("settings")
            .default_width(240.0)
            .show(ctx, |ui| {
                self.settings_panel(ui, !idle);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            let response = ui.allocate_rect(rect, egui::Sense::click());
            if response.clicked() {
                self.driver.send(SessionCommand::Toggle(self.build_config()));
            }

            let painter = ui.painter();
            let center = rect.center();
            let radius = BASE_RADIUS * scale;
            painter.circle_filled(
                center,
                radius,
                egui::Color32::from_rgb(0x3a, 0x6e, 0xa5),
            );
            painter.circle_stroke(
                center,
                radius,
                egui::Stroke::new(2.0, egui::Color32::from_rgb(0x9f, 0xc5, 0xe8)),
            );
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                label,
                egui::FontId::proportional(20.0),
                egui::Color32::WHITE,
            );
        });

        // Keep animating while visible
        ctx.request_repaint();
    }
}
