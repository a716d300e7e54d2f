//! Compute specific differential phase from differential phase.
use crate::{
    algorithms::{KdpInput, KdpOutput, RetrievalAlgorithms},
    config::RetrievalConfig,
    error::{Result, RetrievalError},
    geometry::range_matrix_km,
    keys::{DerivedField, FieldRole},
    volume::RadarVolume,
};
use log::debug;

/// Run the estimator and store its three outputs as fields derived from `reflectivity`.
///
/// Returns the name the specific differential phase was stored under.
pub(crate) fn compute_kdp<A: RetrievalAlgorithms + ?Sized>(
    vol: &mut RadarVolume,
    reflectivity: &str,
    differential_phase: &str,
    config: &RetrievalConfig,
    algorithms: &A,
) -> Result<String> {
    let bad = config.bad();

    let dp = vol
        .field(differential_phase)
        .map(|fld| fld.filled(bad))
        .ok_or_else(|| RetrievalError::MissingRequiredField {
            role: FieldRole::DifferentialPhase,
            name: Some(differential_phase.to_owned()),
        })?;
    let dz = vol
        .field(reflectivity)
        .map(|fld| fld.filled(bad))
        .ok_or_else(|| RetrievalError::MissingRequiredField {
            role: FieldRole::Reflectivity,
            name: Some(reflectivity.to_owned()),
        })?;
    let range_km = range_matrix_km(vol.geometry());

    debug!(
        "estimating kdp with gate spacing {:?} and window {:?}",
        config.gate_spacing(),
        config.kdp_window()
    );

    let KdpOutput {
        kdp,
        filtered_phase,
        phase_std_dev,
    } = algorithms.specific_differential_phase(&KdpInput {
        differential_phase: &dp,
        reflectivity: &dz,
        range_km: &range_km,
        gate_spacing: config.gate_spacing(),
        window: config.kdp_window(),
        thresh_sdp: config.thresh_sdp(),
        bad,
    });

    let kdp_name = config.output_name(DerivedField::SpecificDifferentialPhase);
    let outputs = vec![
        (kdp_name.clone(), kdp, DerivedField::SpecificDifferentialPhase),
        (
            config.output_name(DerivedField::FilteredDifferentialPhase),
            filtered_phase,
            DerivedField::FilteredDifferentialPhase,
        ),
        (
            config.output_name(DerivedField::DifferentialPhaseStdDev),
            phase_std_dev,
            DerivedField::DifferentialPhaseStdDev,
        ),
    ]
    .into_iter()
    .map(|(name, raw, fld)| (name, raw, fld.metadata()))
    .collect();

    vol.commit_derived(reflectivity, outputs, bad)?;

    Ok(kdp_name)
}
