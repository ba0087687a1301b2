//! Sample-level loop mixer with linear gain ramps.
//!
//! Shared between the output callback (which calls [`Mixer::render`]) and
//! the control thread (which issues play/stop/ramp commands). Everything
//! here is allocation-free per sample.

use std::sync::Arc;

use super::engine::{RampToken, SoundId};

/// Linear gain ramp with an optional completion token
#[derive(Debug, Clone)]
pub struct GainRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: u64,
    completion: Option<RampToken>,
}

impl GainRamp {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
            completion: None,
        }
    }

    /// Start a new ramp from the current value, replacing any ramp in flight
    ///
    /// The replaced ramp's completion token is discarded.
    pub fn set(
        &mut self,
        target: f32,
        ramp_secs: f32,
        sample_rate: f32,
        completion: Option<RampToken>,
    ) {
        let target = target.clamp(0.0, 1.0);
        let samples = (ramp_secs.max(0.0) * sample_rate).round() as u64;

        self.target = target;
        self.completion = completion;
        if samples == 0 {
            self.current = target;
            self.step = 0.0;
            self.remaining = 0;
        } else {
            self.step = (target - self.current) / samples as f32;
            self.remaining = samples;
        }
    }

    /// Advance by one sample and return the new value
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                // Land exactly on target regardless of accumulated rounding
                self.current = self.target;
            } else {
                self.current += self.step;
            }
        }
        self.current
    }

    /// Completion token of a finished ramp (yielded once)
    #[inline]
    pub fn take_completion(&mut self) -> Option<RampToken> {
        if self.remaining == 0 {
            self.completion.take()
        } else {
            None
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.remaining == 0
    }
}

/// One resident looping sound
struct Voice {
    samples: Arc<[f32]>,
    /// Source samples advanced per output sample (sample-rate conversion)
    step: f64,
    position: f64,
    playing: bool,
    gain: GainRamp,
    /// Ring of recent post-gain output for the analysis taps
    history: Vec<f32>,
    write: usize,
}

impl Voice {
    fn new(samples: Arc<[f32]>, source_rate: u32, output_rate: f32, history_len: usize) -> Self {
        Self {
            samples,
            step: source_rate as f64 / output_rate as f64,
            position: 0.0,
            playing: false,
            gain: GainRamp::new(0.0),
            history: vec![0.0; history_len.max(1)],
            write: 0,
        }
    }

    /// Next source sample with linear interpolation across the loop point
    fn next_source(&mut self) -> f32 {
        if !self.playing || self.samples.is_empty() {
            return 0.0;
        }
        let len = self.samples.len();
        let index = self.position as usize;
        let frac = (self.position - index as f64) as f32;
        let a = self.samples[index % len];
        let b = self.samples[(index + 1) % len];

        self.position = (self.position + self.step).rem_euclid(len as f64);

        a + (b - a) * frac
    }

    fn next_output(&mut self) -> f32 {
        let gain = self.gain.advance();
        let value = self.next_source() * gain;
        self.history[self.write] = value;
        self.write = (self.write + 1) % self.history.len();
        value
    }

    fn read_recent(&self, out: &mut [f32]) {
        let len = self.history.len();
        let n = out.len().min(len);
        let split = out.len() - n;
        let (pad, tail) = out.split_at_mut(split);
        pad.fill(0.0);

        let start = (self.write + len - n) % len;
        for (i, slot) in tail.iter_mut().enumerate() {
            *slot = self.history[(start + i) % len];
        }
    }
}

/// Mixer of all resident voices plus a master gain
pub struct Mixer {
    sample_rate: f32,
    history_len: usize,
    voices: Vec<Voice>,
    master: GainRamp,
    completed: Vec<RampToken>,
}

impl Mixer {
    pub fn new(sample_rate: f32, history_len: usize) -> Self {
        Self {
            sample_rate,
            history_len,
            voices: Vec::new(),
            master: GainRamp::new(0.0),
            completed: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Register a sound; playback starts stopped and silent
    pub fn add_voice(&mut self, samples: Arc<[f32]>, source_rate: u32) -> SoundId {
        let id = SoundId::new(self.voices.len());
        self.voices.push(Voice::new(
            samples,
            source_rate,
            self.sample_rate,
            self.history_len,
        ));
        id
    }

    pub fn play_loop(&mut self, sound: SoundId) {
        if let Some(voice) = self.voices.get_mut(sound.index()) {
            voice.position = 0.0;
            voice.playing = true;
        }
    }

    pub fn stop(&mut self, sound: SoundId) {
        if let Some(voice) = self.voices.get_mut(sound.index()) {
            voice.playing = false;
            voice.position = 0.0;
        }
    }

    pub fn is_playing(&self, sound: SoundId) -> bool {
        self.voices
            .get(sound.index())
            .is_some_and(|voice| voice.playing)
    }

    pub fn ramp_gain(
        &mut self,
        sound: SoundId,
        target: f32,
        ramp_secs: f32,
        on_complete: Option<RampToken>,
    ) {
        let sample_rate = self.sample_rate;
        if let Some(voice) = self.voices.get_mut(sound.index()) {
            voice.gain.set(target, ramp_secs, sample_rate, on_complete);
        }
    }

    pub fn ramp_master(&mut self, target: f32, ramp_secs: f32) {
        self.master.set(target, ramp_secs, self.sample_rate, None);
    }

    /// Current gain of a voice (0 for unknown sounds)
    pub fn voice_gain(&self, sound: SoundId) -> f32 {
        self.voices
            .get(sound.index())
            .map_or(0.0, |voice| voice.gain.value())
    }

    pub fn master_gain(&self) -> f32 {
        self.master.value()
    }

    pub fn read_recent(&self, sound: SoundId, out: &mut [f32]) {
        match self.voices.get(sound.index()) {
            Some(voice) => voice.read_recent(out),
            None => out.fill(0.0),
        }
    }

    pub fn drain_completed(&mut self) -> Vec<RampToken> {
        std::mem::take(&mut self.completed)
    }

    /// Fill an interleaved buffer; every channel carries the same mono mix
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let master = self.master.advance();
            let mut mix = 0.0;
            for voice in &mut self.voices {
                mix += voice.next_output();
                if let Some(token) = voice.gain.take_completion() {
                    self.completed.push(token);
                }
            }
            // Safety limiter; NaN never reaches the device
            let out = mix * master;
            let out = if out.is_finite() { out.clamp(-1.0, 1.0) } else { 0.0 };
            frame.fill(out);
        }
    }
}
