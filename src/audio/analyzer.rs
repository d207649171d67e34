//! FFT frequency analyzer producing byte spectra like a browser analyser node.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::audio::error::PlayerError;
use crate::audio::host::FrequencyAnalyzer;
use crate::audio::tap::SampleTap;

/// FFT size (time-domain samples per analysis)
pub const FFT_SIZE: usize = 256;

/// Number of spectrum bins produced per sample
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// Weight of the previous frame in the smoothed magnitudes
const SMOOTHING: f32 = 0.8;

/// dB range mapped onto 0..=255
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

pub struct FftAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    spectrum: Vec<u8>,
    tap: Option<SampleTap>,
}

impl FftAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Blackman window
        let n = FFT_SIZE as f32;
        let window = (0..FFT_SIZE)
            .map(|i| {
                let x = i as f32 / n;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();

        Self {
            fft,
            window,
            samples: vec![0.0; FFT_SIZE],
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            smoothed: vec![0.0; BIN_COUNT],
            spectrum: vec![0; BIN_COUNT],
            tap: None,
        }
    }

    /// Run one analysis over the given time-domain block.
    fn analyze(&mut self) {
        for ((slot, sample), weight) in self
            .buffer
            .iter_mut()
            .zip(self.samples.iter())
            .zip(self.window.iter())
        {
            *slot = Complex::new(sample * weight, 0.0);
        }

        self.fft.process(&mut self.buffer);

        let scale = 1.0 / FFT_SIZE as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;
        for (bin, (smoothed, out)) in self
            .smoothed
            .iter_mut()
            .zip(self.spectrum.iter_mut())
            .enumerate()
        {
            let magnitude = self.buffer[bin].norm() * scale;
            *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;

            let db = if *smoothed > 0.0 {
                20.0 * smoothed.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 / range * (db - MIN_DECIBELS);
            *out = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

impl Default for FftAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyAnalyzer for FftAnalyzer {
    fn attach(&mut self, tap: SampleTap) -> Result<(), PlayerError> {
        if self.tap.is_some() {
            return Err(PlayerError::AnalyzerUnavailable(
                "already attached to an output".into(),
            ));
        }
        self.tap = Some(tap);
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.tap.is_some()
    }

    fn sample(&mut self) -> &[u8] {
        let Some(tap) = self.tap.as_ref() else {
            return &self.spectrum;
        };
        tap.read_latest(&mut self.samples);
        self.analyze();
        &self.spectrum
    }
}
