//! Conversion of radar beam coordinates (range, azimuth, elevation) to Cartesian coordinates.
//!
//! Beam propagation uses the standard 4/3 effective earth radius model for atmospheric
//! refraction.
use crate::volume::ScanGeometry;
use metfor::{Meters, Quantity};
use ndarray::Array2;

/// Mean radius of the earth.
pub const EARTH_RADIUS: Meters = Meters(6_371_000.0);

/// Multiplier on the earth radius to account for standard atmospheric refraction.
pub const EFFECTIVE_RADIUS_FACTOR: f64 = 4.0 / 3.0;

/// Cartesian coordinates of every gate in a scan relative to the antenna, in meters.
///
/// `x` is east, `y` is north, and `z` is up.
#[derive(Clone, Debug, PartialEq)]
pub struct GateCoordinates {
    /// Distance east of the radar.
    pub x: Array2<f64>,
    /// Distance north of the radar.
    pub y: Array2<f64>,
    /// Height above the antenna.
    pub z: Array2<f64>,
}

/// Convert a single gate location to Cartesian coordinates relative to the antenna.
///
/// Angles are in degrees, azimuth is clockwise from north. Returns (x, y, z).
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::antenna_to_cartesian;
/// use metfor::Meters;
///
/// let (x, y, z) = antenna_to_cartesian(Meters(10_000.0), 90.0, 0.0);
/// assert!(x.0 > 9_990.0 && x.0 < 10_000.0);
/// assert!(y.0.abs() < 1.0e-6);
/// // The beam rises above the curving earth even at zero elevation.
/// assert!(z.0 > 0.0);
/// ```
pub fn antenna_to_cartesian(
    range: Meters,
    azimuth_deg: f64,
    elevation_deg: f64,
) -> (Meters, Meters, Meters) {
    let r = range.unpack();
    let big_r = EARTH_RADIUS.unpack() * EFFECTIVE_RADIUS_FACTOR;
    let theta_e = elevation_deg.to_radians();
    let theta_a = azimuth_deg.to_radians();

    let z = (r * r + big_r * big_r + 2.0 * r * big_r * theta_e.sin()).sqrt() - big_r;
    // Distance along the surface of the earth
    let s = big_r * (r * theta_e.cos() / (big_r + z)).asin();

    let x = s * theta_a.sin();
    let y = s * theta_a.cos();

    (Meters(x), Meters(y), Meters(z))
}

/// Cartesian coordinates of every gate in the scan, relative to the antenna.
pub fn gate_coordinates(geometry: &ScanGeometry) -> GateCoordinates {
    let shape = geometry.shape();
    let mut x = Array2::zeros(shape);
    let mut y = Array2::zeros(shape);
    let mut z = Array2::zeros(shape);

    for (ray, (&az, &el)) in geometry
        .azimuth()
        .iter()
        .zip(geometry.elevation())
        .enumerate()
    {
        for (gate, &rng) in geometry.range().iter().enumerate() {
            let (gx, gy, gz) = antenna_to_cartesian(rng, az, el);
            x[(ray, gate)] = gx.unpack();
            y[(ray, gate)] = gy.unpack();
            z[(ray, gate)] = gz.unpack();
        }
    }

    GateCoordinates { x, y, z }
}

/// Height of every gate above mean sea level in meters.
pub fn gate_heights(geometry: &ScanGeometry) -> Array2<f64> {
    let altitude = geometry.altitude().unpack();
    let GateCoordinates { z, .. } = gate_coordinates(geometry);
    z + altitude
}

/// The range of every gate in km, repeated for every ray.
pub fn range_matrix_km(geometry: &ScanGeometry) -> Array2<f64> {
    let range = geometry.range();
    Array2::from_shape_fn(geometry.shape(), |(_, gate)| range[gate].unpack() / 1000.0)
}
