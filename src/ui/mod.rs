// UI module - egui front-end

pub mod app;

pub use app::PacerApp;
