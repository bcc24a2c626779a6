// Cue engine - cpal output stream playing synthesized cue tones
//
// The engine owns the stream and stays on the thread that created it
// (the Stream is not Send on every platform). The session thread talks
// to it through a lock-free ringbuf of trigger messages plus two shared
// atomics: the master gain and the resume request flag.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::audio::backend::AudioBackend;
use crate::audio::parameters::AtomicF32;
use crate::audio::tone::CuePlayer;
use crate::session::config::CueKind;

/// Sized for the worst case of one cue per second plus catch-up bursts
/// after a long scheduler stall
const TRIGGER_RINGBUFFER_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoDevice,
    #[error("failed to query output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
}

/// One cue request crossing into the audio callback
#[derive(Debug, Clone, Copy)]
pub struct CueTrigger {
    pub kind: CueKind,
    pub accent: bool,
}

pub type TriggerProducer = ringbuf::HeapProd<CueTrigger>;
pub type TriggerConsumer = ringbuf::HeapCons<CueTrigger>;

/// Session-thread half of the audio layer. Send, cheap, and non-fatal:
/// a full ring buffer or a suspended stream just drops the cue.
pub struct CpalBackend {
    trigger_tx: TriggerProducer,
    volume: Arc<AtomicF32>,
    resume_requested: Arc<AtomicBool>,
}

impl AudioBackend for CpalBackend {
    fn play_cue(&mut self, kind: CueKind, accent: bool) {
        let _ = self.trigger_tx.try_push(CueTrigger { kind, accent });
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume.store(volume.clamp(0.0, 1.0));
    }

    fn ensure_resumed(&mut self) {
        self.resume_requested.store(true, Ordering::Relaxed);
    }
}

/// Owns the cpal stream. Must stay on its creation thread; the UI loop
/// calls `pump` to service pending resume requests.
pub struct CueEngine {
    _device: Device,
    stream: Stream,
    resume_requested: Arc<AtomicBool>,
}

impl CueEngine {
    /// Open the default output device and return the engine together
    /// with its session-thread backend half. The stream starts paused;
    /// the first resume request (the start gesture) un-pauses it.
    pub fn new() -> Result<(Self, CpalBackend), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        println!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let (trigger_tx, trigger_rx) = HeapRb::<CueTrigger>::new(TRIGGER_RINGBUFFER_CAPACITY).split();
        let trigger_rx = Arc::new(Mutex::new(trigger_rx));
        let player = Arc::new(Mutex::new(CuePlayer::new(sample_rate)));
        let volume = Arc::new(AtomicF32::new(0.5));

        let stream = match sample_format {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                trigger_rx,
                player,
                Arc::clone(&volume),
            ),
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                trigger_rx,
                player,
                Arc::clone(&volume),
            ),
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                trigger_rx,
                player,
                Arc::clone(&volume),
            ),
            other => return Err(AudioError::UnsupportedFormat(other)),
        }?;

        // Platforms gate output behind a user gesture; hold the stream
        // until the first resume request. Pause is unsupported on some
        // hosts, in which case the stream simply runs silence.
        let _ = stream.pause();

        let resume_requested = Arc::new(AtomicBool::new(false));
        let backend = CpalBackend {
            trigger_tx,
            volume,
            resume_requested: Arc::clone(&resume_requested),
        };
        let engine = Self {
            _device: device,
            stream,
            resume_requested,
        };
        Ok((engine, backend))
    }

    /// Service a pending resume request, if any. Called from the UI loop;
    /// failures are swallowed (the cue is allowed to drop).
    pub fn pump(&self) {
        if self.resume_requested.swap(false, Ordering::Relaxed) {
            let _ = self.stream.play();
        }
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        trigger_rx: Arc<Mutex<TriggerConsumer>>,
        player: Arc<Mutex<CuePlayer>>,
        volume: Arc<AtomicF32>,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // No allocations, no I/O, no blocking locks in here
                let gain = volume.load();

                if let Ok(mut guard) = player.try_lock() {
                    if let Ok(mut rx) = trigger_rx.try_lock() {
                        while let Some(trigger) = rx.try_pop() {
                            guard.trigger(trigger.kind, trigger.accent);
                        }
                    }
                    for frame in data.chunks_mut(channels) {
                        let sample: T = Sample::from_sample::<f32>(guard.process_sample() * gain);
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                } else {
                    for out in data.iter_mut() {
                        *out = Sample::from_sample::<f32>(0.0);
                    }
                }
            },
            move |err| {
                eprintln!("Audio stream error: {}", err);
            },
            None,
        )?;
        Ok(stream)
    }
}
