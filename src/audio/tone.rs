// Cue tones - short synthesized bursts marking phase beats
// Tones are pre-generated per (kind, accent) for low CPU overhead in the
// audio callback; timbre is backend policy, not part of the scheduling
// contract.

use std::f32::consts::PI;

use crate::session::config::CueKind;

/// Envelope shape shared by all cue tones
const ATTACK_MS: f32 = 30.0;
const TONE_DURATION_MS: f32 = 350.0;
const DECAY_RATE: f32 = 9.0;

/// Base frequency per phase kind; accents sit a major third above
fn base_frequency(kind: CueKind) -> f32 {
    match kind {
        CueKind::Inhale => 660.0,
        CueKind::Hold => 440.0,
        CueKind::Exhale => 330.0,
    }
}

fn tone_params(kind: CueKind, accent: bool) -> (f32, f32) {
    let base = base_frequency(kind);
    if accent {
        (base * 1.25, 0.8)
    } else {
        (base, 0.5)
    }
}

/// Pre-generated tone buffers for every (kind, accent) combination
#[derive(Debug, Clone)]
pub struct ToneBank {
    buffers: Vec<Vec<f32>>,
}

const KINDS: [CueKind; 3] = [CueKind::Inhale, CueKind::Hold, CueKind::Exhale];

fn bank_index(kind: CueKind, accent: bool) -> usize {
    let k = match kind {
        CueKind::Inhale => 0,
        CueKind::Hold => 1,
        CueKind::Exhale => 2,
    };
    k * 2 + accent as usize
}

impl ToneBank {
    pub fn new(sample_rate: f32) -> Self {
        let mut buffers = Vec::with_capacity(6);
        for kind in KINDS {
            for accent in [false, true] {
                let (frequency, amplitude) = tone_params(kind, accent);
                buffers.push(generate_tone(sample_rate, frequency, amplitude));
            }
        }
        Self { buffers }
    }

    pub fn tone(&self, kind: CueKind, accent: bool) -> &[f32] {
        &self.buffers[bank_index(kind, accent)]
    }

    /// Tone length in samples (identical for all tones)
    pub fn tone_len(&self) -> usize {
        self.buffers[0].len()
    }
}

/// Sine burst: linear attack to peak, exponential decay to near-silence
fn generate_tone(sample_rate: f32, frequency: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = ((TONE_DURATION_MS / 1000.0) * sample_rate) as usize;
    let attack_samples = ((ATTACK_MS / 1000.0) * sample_rate) as usize;
    let phase_increment = 2.0 * PI * frequency / sample_rate;

    let mut samples = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let envelope = if i < attack_samples {
            i as f32 / attack_samples as f32
        } else {
            let t = (i - attack_samples) as f32 / (num_samples - attack_samples) as f32;
            (-t * DECAY_RATE).exp()
        };
        let phase = i as f32 * phase_increment;
        samples.push(phase.sin() * envelope * amplitude);
    }
    samples
}

/// Playback cursor into the tone bank. A new trigger replaces the current
/// tone; beats are a second apart and tones ~0.35 s, so truncation does
/// not occur in normal operation.
#[derive(Debug)]
struct TonePlayback {
    buffer_index: usize,
    position: usize,
}

/// Mixes triggered cue tones into the output, one sample at a time.
/// Lives inside the audio callback.
#[derive(Debug)]
pub struct CuePlayer {
    bank: ToneBank,
    current: Option<TonePlayback>,
}

impl CuePlayer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            bank: ToneBank::new(sample_rate),
            current: None,
        }
    }

    pub fn trigger(&mut self, kind: CueKind, accent: bool) {
        self.current = Some(TonePlayback {
            buffer_index: bank_index(kind, accent),
            position: 0,
        });
    }

    /// Next output sample, 0.0 when no tone is active
    pub fn process_sample(&mut self) -> f32 {
        if let Some(playback) = self.current.as_mut() {
            let buffer = &self.bank.buffers[playback.buffer_index];
            if playback.position < buffer.len() {
                let sample = buffer[playback.position];
                playback.position += 1;
                return sample;
            }
            self.current = None;
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_generation() {
        let bank = ToneBank::new(48000.0);

        // 350ms at 48kHz
        assert_eq!(bank.tone_len(), 16800);

        for kind in KINDS {
            for accent in [false, true] {
                let tone = bank.tone(kind, accent);
                assert!(!tone.is_empty());
                assert!(tone.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
            }
        }
    }

    #[test]
    fn test_accent_is_louder() {
        let bank = ToneBank::new(48000.0);
        for kind in KINDS {
            let peak = |accent: bool| {
                bank.tone(kind, accent)
                    .iter()
                    .map(|s| s.abs())
                    .fold(0.0f32, f32::max)
            };
            assert!(peak(true) > peak(false));
        }
    }

    #[test]
    fn test_kinds_have_distinct_frequencies() {
        assert!(base_frequency(CueKind::Inhale) > base_frequency(CueKind::Hold));
        assert!(base_frequency(CueKind::Hold) > base_frequency(CueKind::Exhale));
    }

    #[test]
    fn test_tone_decays_to_near_silence() {
        let bank = ToneBank::new(48000.0);
        let tone = bank.tone(CueKind::Inhale, true);
        let tail_peak = tone[tone.len() - 100..]
            .iter()
            .map(|s| s.abs())
            .fold(0.0f32, f32::max);
        assert!(tail_peak < 0.01, "tail peak {} too loud", tail_peak);
    }

    #[test]
    fn test_player_plays_then_goes_silent() {
        let mut player = CuePlayer::new(48000.0);
        assert_eq!(player.process_sample(), 0.0);

        player.trigger(CueKind::Exhale, true);
        let mut non_zero = 0;
        for _ in 0..player.bank.tone_len() {
            if player.process_sample().abs() > 0.0001 {
                non_zero += 1;
            }
        }
        assert!(non_zero > 1000);
        assert_eq!(player.process_sample(), 0.0);
    }

    #[test]
    fn test_retrigger_replaces_current_tone() {
        let mut player = CuePlayer::new(48000.0);
        player.trigger(CueKind::Inhale, true);
        for _ in 0..100 {
            player.process_sample();
        }
        player.trigger(CueKind::Hold, false);
        // Restarted from the attack, so the first sample is near zero
        assert!(player.process_sample().abs() < 0.05);
    }
}
