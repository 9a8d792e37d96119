/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

/// One cue per kind of game event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Gem,
    LevelClear,
    RunComplete,
}

pub fn sfx_for(event: &GameEvent) -> Sfx {
    match event {
        GameEvent::GemCollected { .. } => Sfx::Gem,
        GameEvent::LevelCleared => Sfx::LevelClear,
        GameEvent::RunComplete => Sfx::RunComplete,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::warn;

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_gem: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        sfx_run: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_gem: Arc::new(make_wav(&gen_pickup())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
                sfx_run: Arc::new(make_wav(&gen_run_complete())),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Gem => &self.sfx_gem,
                Sfx::LevelClear => &self.sfx_clear,
                Sfx::RunComplete => &self.sfx_run,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Append one note: sine plus a weighted overtone, linear decay to `tail`.
    fn note(samples: &mut Vec<f32>, freq: f32, dur: f32, overtone: f32, tail: f32, volume: f32) {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32) * (1.0 - tail);
            let wave = (t * freq * TAU).sin() * (1.0 - overtone)
                + (t * freq * 2.0 * TAU).sin() * overtone;
            samples.push(wave * env * volume);
        }
    }

    /// Gem pickup: quick ascending arpeggio C6→E6→G6
    fn gen_pickup() -> Vec<f32> {
        let mut samples = Vec::new();
        for freq in [1047.0_f32, 1319.0, 1568.0] {
            note(&mut samples, freq, 0.045, 0.3, 0.0, 0.25);
        }
        samples
    }

    /// Level clear: ascending fanfare C5→E5→G5→C6 with a held top note
    fn gen_clear() -> Vec<f32> {
        let mut samples = Vec::new();
        for freq in [523.0_f32, 659.0, 784.0, 1047.0] {
            note(&mut samples, freq, 0.1, 0.3, 0.7, 0.3);
        }
        note(&mut samples, 1047.0, 0.25, 0.0, 0.0, 0.3);
        samples
    }

    /// Run complete: slower fanfare that resolves an octave up
    fn gen_run_complete() -> Vec<f32> {
        let mut samples = Vec::new();
        for (freq, dur) in [(392.0_f32, 0.15), (523.0, 0.15), (659.0, 0.15), (784.0, 0.3)] {
            note(&mut samples, freq, dur, 0.35, 0.6, 0.3);
        }
        note(&mut samples, 1047.0, 0.6, 0.2, 0.0, 0.3);
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

impl SoundEngine {
    pub fn play_events(&self, events: &[GameEvent]) {
        for event in events {
            self.play(sfx_for(event));
        }
    }
}
