//! Map a sounding onto every gate of a radar volume.
use crate::{sounding::SoundingProfile, volume::ScanGeometry};
use metfor::{Meters, Quantity};
use ndarray::Array2;

/// Temperature (C) at every gate, interpolated from the sounding at the gate heights.
///
/// `heights` are the gate heights above mean sea level in meters, see
/// [`gate_heights`](crate::geometry::gate_heights). Returns `None` if the sounding is not usable.
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::{temperature::interpolate_temperature, SoundingProfile};
/// use metfor::{Celsius, Meters};
/// use ndarray::arr2;
/// use optional::some;
///
/// let snd = SoundingProfile::from_levels(
///     &[some(Meters(0.0)), some(Meters(10_000.0))],
///     &[some(Celsius(20.0)), some(Celsius(-50.0))],
/// ).unwrap();
///
/// let temps = interpolate_temperature(&snd, &arr2(&[[0.0, 5000.0, 20_000.0]])).unwrap();
/// assert_eq!(temps[(0, 0)], 20.0);
/// assert!((temps[(0, 1)] + 15.0).abs() < 1.0e-9);
/// assert_eq!(temps[(0, 2)], -50.0);
/// ```
pub fn interpolate_temperature(
    snd: &SoundingProfile,
    heights: &Array2<f64>,
) -> Option<Array2<f64>> {
    if !snd.is_usable() {
        return None;
    }

    // Gates with a NaN height get a NaN temperature.
    Some(heights.map(|&h| {
        snd.temperature_at(Meters(h))
            .into_option()
            .map_or(std::f64::NAN, |t| t.unpack())
    }))
}

/// Temperature at every gate of a scan.
pub fn gate_temperatures(snd: &SoundingProfile, geometry: &ScanGeometry) -> Option<Array2<f64>> {
    interpolate_temperature(snd, &crate::geometry::gate_heights(geometry))
}
