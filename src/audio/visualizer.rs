//! Mapping from an analyzer byte spectrum to the five panel bars.

/// Number of bars in the panel
pub const BAR_COUNT: usize = 5;

/// Lowest bar height, in percent
pub const IDLE_FLOOR: f32 = 20.0;

/// Bars shown whenever playback is not running
pub const IDLE_BARS: VisualizerBars = [IDLE_FLOOR; BAR_COUNT];

/// Spectrum bins read for each bar (128-bin spectrum)
pub const BAR_BINS: [usize; BAR_COUNT] = [2, 8, 16, 32, 64];

pub type VisualizerBars = [f32; BAR_COUNT];

/// Convert one byte magnitude (0-255) to a bar height in `[IDLE_FLOOR, 100]`.
pub fn bar_height(magnitude: u8) -> f32 {
    (magnitude as f32 / 255.0 * 100.0).max(IDLE_FLOOR)
}

/// Read the fixed bins out of a spectrum. Bins past the end count as silence.
pub fn bars_from_spectrum(spectrum: &[u8]) -> VisualizerBars {
    BAR_BINS.map(|bin| bar_height(spectrum.get(bin).copied().unwrap_or(0)))
}
