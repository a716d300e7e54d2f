//! The contract between the retrieval stages and the physical retrieval algorithms.
//!
//! The stages handle field lookup, masking, ordering, and storing results. The numerical work is
//! done by an implementation of `RetrievalAlgorithms`. Inputs are borrowed from the volume for
//! the duration of a single call, and every output array must have the (rays, gates) shape of
//! the volume, or (categories, rays, gates) for the classification scores.
use crate::{
    config::{Band, FhcMethod, FhcWeights},
    field::Field,
};
use metfor::{Km, Meters};
use ndarray::{Array2, Array3};

/// Inputs to the specific differential phase estimator.
///
/// Masked gates hold the bad data value.
#[derive(Clone, Copy, Debug)]
pub struct KdpInput<'a> {
    /// Differential phase (deg).
    pub differential_phase: &'a Array2<f64>,
    /// Reflectivity (dBZ).
    pub reflectivity: &'a Array2<f64>,
    /// Range of each gate (km).
    pub range_km: &'a Array2<f64>,
    /// Spacing between gates.
    pub gate_spacing: Meters,
    /// Length of the phase filter window.
    pub window: Km,
    /// Threshold on the standard deviation of differential phase.
    pub thresh_sdp: f64,
    /// The bad data value.
    pub bad: f64,
}

/// Output of the specific differential phase estimator.
#[derive(Clone, Debug, PartialEq)]
pub struct KdpOutput {
    /// Specific differential phase (deg/km).
    pub kdp: Array2<f64>,
    /// Filtered differential phase (deg).
    pub filtered_phase: Array2<f64>,
    /// Standard deviation of differential phase (deg).
    pub phase_std_dev: Array2<f64>,
}

/// Inputs to the hydrometeor classification scoring.
#[derive(Clone, Copy, Debug)]
pub struct FhcInput<'a> {
    /// Reflectivity.
    pub reflectivity: &'a Field,
    /// Differential reflectivity.
    pub differential_reflectivity: &'a Field,
    /// Correlation coefficient.
    pub correlation_coefficient: &'a Field,
    /// Specific differential phase.
    pub specific_differential_phase: &'a Field,
    /// Linear depolarization ratio, if used.
    pub depolarization_ratio: Option<&'a Field>,
    /// Temperature at each gate (C), if a sounding is in use.
    pub temperature: Option<&'a Array2<f64>>,
    /// Radar band.
    pub band: Band,
    /// How to combine the scores.
    pub method: FhcMethod,
    /// Weights for each variable.
    pub weights: FhcWeights,
    /// Extra weight on temperature.
    pub t_factor: f64,
}

/// Inputs shared by both rainfall methods.
#[derive(Clone, Copy, Debug)]
pub struct RainInput<'a> {
    /// Reflectivity.
    pub reflectivity: &'a Field,
    /// Differential reflectivity.
    pub differential_reflectivity: &'a Field,
    /// Specific differential phase.
    pub specific_differential_phase: &'a Field,
    /// Radar band.
    pub band: Band,
}

/// Output of the classification based rainfall method.
#[derive(Clone, Debug, PartialEq)]
pub struct RainOutput {
    /// Rainfall rate (mm/h).
    pub rate: Array2<f64>,
    /// The estimator used at each gate, a rain method code.
    pub method: Array2<f64>,
}

/// Output of the blended rainfall method.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendedRainOutput {
    /// Rainfall rate (mm/h).
    pub rate: Array2<f64>,
    /// The estimator used at each gate, a rain method code.
    pub method: Array2<f64>,
    /// Difference reflectivity and ice fraction, only when they were asked for.
    pub ice: Option<(Array2<f64>, Array2<f64>)>,
}

/// Inputs to the drop size distribution retrieval.
#[derive(Clone, Copy, Debug)]
pub struct DsdInput<'a> {
    /// Reflectivity.
    pub reflectivity: &'a Field,
    /// Differential reflectivity.
    pub differential_reflectivity: &'a Field,
    /// Specific differential phase.
    pub specific_differential_phase: &'a Field,
    /// Radar band.
    pub band: Band,
}

/// Output of the drop size distribution retrieval.
#[derive(Clone, Debug, PartialEq)]
pub struct DsdOutput {
    /// Median volume diameter (mm).
    pub d0: Array2<f64>,
    /// Normalized intercept parameter.
    pub nw: Array2<f64>,
    /// Shape parameter.
    pub mu: Array2<f64>,
}

/// Inputs to the liquid and ice mass retrieval.
#[derive(Clone, Copy, Debug)]
pub struct MassInput<'a> {
    /// Reflectivity.
    pub reflectivity: &'a Field,
    /// Differential reflectivity.
    pub differential_reflectivity: &'a Field,
    /// Height of each gate (km MSL).
    pub height_km: &'a Array2<f64>,
    /// Temperature at each gate (C).
    pub temperature: &'a Array2<f64>,
}

/// Output of the liquid and ice mass retrieval.
#[derive(Clone, Debug, PartialEq)]
pub struct MassOutput {
    /// Liquid water mass (g/m^3).
    pub liquid: Array2<f64>,
    /// Ice water mass (g/m^3).
    pub ice: Array2<f64>,
}

/// The physical retrieval algorithms.
///
/// Implementations must not keep references to their inputs, and are expected to be
/// deterministic for a given input.
pub trait RetrievalAlgorithms {
    /// Estimate the specific differential phase from the differential phase.
    fn specific_differential_phase(&self, input: &KdpInput) -> KdpOutput;

    /// Score every hydrometeor category at every gate, shape
    /// ([`HID_CATEGORIES`](crate::HID_CATEGORIES), rays, gates).
    ///
    /// Category `i` along the first axis corresponds to hydrometeor code `i + 1`.
    fn hydrometeor_scores(&self, input: &FhcInput) -> Array3<f64>;

    /// Rainfall rate with the estimator chosen from the hydrometeor classification.
    fn hidro_rain(&self, input: &RainInput, fhc: &Field) -> RainOutput;

    /// Rainfall rate from the blended estimator.
    fn blended_rain(&self, input: &RainInput, ice_flag: bool) -> BlendedRainOutput;

    /// Drop size distribution parameters.
    fn drop_size_distribution(&self, input: &DsdInput) -> DsdOutput;

    /// Liquid and ice water mass.
    fn liquid_ice_mass(&self, input: &MassInput) -> MassOutput;
}
