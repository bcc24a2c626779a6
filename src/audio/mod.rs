// Audio module - backend seam, tone synthesis and the cpal engine

pub mod backend;
pub mod engine;
pub mod parameters;
pub mod tone;

pub use backend::{AudioBackend, NullBackend};
pub use engine::{AudioError, CpalBackend, CueEngine};
pub use parameters::AtomicF32;
pub use tone::{CuePlayer, ToneBank};
