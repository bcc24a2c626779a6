use breathpace::audio::backend::{AudioBackend, NullBackend};
use breathpace::audio::engine::CueEngine;
use breathpace::render::{VisualStateRenderer, shared_visual_state};
use breathpace::session::cue::CueScheduler;
use breathpace::session::driver::SessionDriver;
use breathpace::ui::app::PacerApp;

fn main() {
    println!("=== breathpace ===\n");

    // Audio is optional: if the device refuses us, phase cycling still
    // runs, just silently.
    let (engine, backend): (Option<CueEngine>, Box<dyn AudioBackend>) = match CueEngine::new() {
        Ok((engine, backend)) => (Some(engine), Box::new(backend)),
        Err(e) => {
            eprintln!("Audio unavailable, cues disabled: {}", e);
            (None, Box::new(NullBackend))
        }
    };

    let visual = shared_visual_state();
    let renderer = VisualStateRenderer::new(visual.clone());
    let cues = CueScheduler::new(backend);
    let driver = SessionDriver::spawn(Box::new(renderer), cues);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 480.0])
            .with_title("breathpace"),
        ..Default::default()
    };

    let _ = eframe::run_native(
        "breathpace",
        native_options,
        Box::new(move |_cc| Ok(Box::new(PacerApp::new(driver, engine, visual)))),
    );
}
