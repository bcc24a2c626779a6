// Atomic parameters - lock-free sharing between control threads and the
// audio callback

use std::sync::atomic::{AtomicU32, Ordering};

/// f32 stored as raw bits in an AtomicU32, for parameters the audio
/// callback reads while control threads write. Shared via `Arc` at the
/// use site.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}
