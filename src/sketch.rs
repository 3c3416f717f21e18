//! Synthetic waveform sketches for the per-band panels and the combined view.
//!
//! The sketches are not signal reconstructions: each band is drawn as a sine
//! whose visual frequency comes from [`crate::bands::sketch_frequency`] and
//! whose amplitude follows the band's current power.

use std::f64::consts::PI;

use crate::bands::{sketch_frequency, Band};
use crate::types::EegUpdate;

/// Power that maps to full amplitude.  Anything above saturates.
pub const FULL_SCALE_POWER: f64 = 1e-3;

/// Vertical offsets (fraction of height) of each band in the combined view.
pub const COMBINED_OFFSETS: [f64; 5] = [0.0, 0.2, 0.4, 0.6, 0.8];

/// Power → `[0, 1]`.  Negative and NaN powers draw flat.
pub fn normalized_power(power: f64) -> f64 {
    if power.is_nan() || power <= 0.0 {
        return 0.0;
    }
    (power / FULL_SCALE_POWER).min(1.0)
}

fn sine_points(
    frequency: f64,
    width: usize,
    baseline: f64,
    amplitude: f64,
) -> Vec<(f64, f64)> {
    (0..width)
        .map(|x| {
            // Two full periods of the base sine across the panel.
            let t = x as f64 / width as f64 * 4.0 * PI;
            (x as f64, baseline + (t * frequency).sin() * amplitude)
        })
        .collect()
}

/// One point per horizontal pixel for a single band panel of `width × height`.
pub fn band_sketch(band: &str, power: f64, width: usize, height: f64) -> Vec<(f64, f64)> {
    let amplitude = normalized_power(power) * height * 0.3;
    sine_points(sketch_frequency(band), width, height / 2.0, amplitude)
}

/// All five bands stacked at their [`COMBINED_OFFSETS`] with a smaller
/// amplitude, in [`Band::ALL`] order.
pub fn combined_sketch(update: &EegUpdate, width: usize, height: f64) -> Vec<(Band, Vec<(f64, f64)>)> {
    Band::ALL
        .into_iter()
        .zip(COMBINED_OFFSETS)
        .map(|(band, offset)| {
            let amplitude = normalized_power(update.power(band.name())) * height * 0.1;
            let points = sine_points(band.sketch_frequency(), width, offset * height, amplitude);
            (band, points)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_saturates() {
        assert_eq!(normalized_power(0.0), 0.0);
        assert_eq!(normalized_power(-1.0), 0.0);
        assert_eq!(normalized_power(f64::NAN), 0.0);
        assert!((normalized_power(5e-4) - 0.5).abs() < 1e-12);
        assert_eq!(normalized_power(42.0), 1.0);
    }

    #[test]
    fn zero_power_is_flat_midline() {
        let pts = band_sketch("alpha", 0.0, 50, 100.0);
        assert_eq!(pts.len(), 50);
        assert!(pts.iter().all(|&(_, y)| y == 50.0));
    }

    #[test]
    fn amplitude_bounded_by_thirty_percent() {
        let pts = band_sketch("gamma", 1.0, 400, 100.0);
        let max = pts.iter().map(|p| p.1).fold(f64::MIN, f64::max);
        let min = pts.iter().map(|p| p.1).fold(f64::MAX, f64::min);
        assert!(max <= 80.0 + 1e-9);
        assert!(min >= 20.0 - 1e-9);
        assert!(max > 79.0);
    }

    #[test]
    fn combined_uses_offsets() {
        let update = EegUpdate::default();
        let lines = combined_sketch(&update, 10, 100.0);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].0, Band::Delta);
        assert!(lines[3].1.iter().all(|&(_, y)| (y - 60.0).abs() < 1e-9));
    }

    #[test]
    fn zero_width_draws_nothing() {
        assert!(band_sketch("delta", 1.0, 0, 100.0).is_empty());
    }
}
