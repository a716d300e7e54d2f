//! Quality control of the reflectivity field.
//!
//! Three filters are combined into one mask: insects (moderate reflectivity with high
//! differential reflectivity), noisy differential phase, and speckles (short runs of valid gates
//! isolated along a ray). The combined mask replaces the mask of the reflectivity field, so every
//! field derived after quality control inherits it.
use crate::{
    config::RetrievalConfig,
    error::{Result, RetrievalError},
    keys::{DerivedField, FieldRole},
    volume::RadarVolume,
};
use itertools::{izip, Itertools};
use ndarray::{Array2, Zip};

/// Number of gates flagged by each filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QcReport {
    /// Gates flagged as insects or clutter.
    pub insect: usize,
    /// Gates flagged for noisy differential phase.
    pub phase_noise: usize,
    /// Valid gates removed as speckles after the other filters ran.
    pub speckle: usize,
    /// Total masked gates in the reflectivity field after quality control.
    pub masked: usize,
}

#[inline]
fn is_valid(val: f64, bad: f64) -> bool {
    val.is_finite() && val != bad
}

/// Flag gates with reflectivity in `[lo, hi)` of one of `dz_range` and differential reflectivity
/// at or above the matching threshold in `thresh_dr`.
///
/// Gates holding the bad data value in either input are never flagged.
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::qc::insect_filter;
/// use ndarray::arr2;
///
/// let dz = arr2(&[[5.0, 5.0, 45.0]]);
/// let dr = arr2(&[[0.5, 1.5, 1.5]]);
/// let mask = insect_filter(&dz, &dr, &[(0.0, 10.0), (40.0, 50.0)], &[1.0, 2.0], -32768.0);
/// assert_eq!(mask, arr2(&[[false, true, false]]));
/// ```
pub fn insect_filter(
    dz: &Array2<f64>,
    dr: &Array2<f64>,
    dz_range: &[(f64, f64)],
    thresh_dr: &[f64],
    bad: f64,
) -> Array2<bool> {
    debug_assert_eq!(dz_range.len(), thresh_dr.len());

    Zip::from(dz).and(dr).map_collect(|&z, &d| {
        is_valid(z, bad)
            && is_valid(d, bad)
            && izip!(dz_range, thresh_dr).any(|(&(lo, hi), &thresh)| z >= lo && z < hi && d >= thresh)
    })
}

/// Flag gates where the standard deviation of differential phase is above `thresh_sdp`.
pub fn differential_phase_filter(sdp: &Array2<f64>, thresh_sdp: f64, bad: f64) -> Array2<bool> {
    sdp.map(|&s| is_valid(s, bad) && s > thresh_sdp)
}

/// Flag invalid gates and every run of at most `speckle` consecutive valid gates along a ray.
///
/// A gate is invalid if it holds the bad data value or is not finite. The ends of a ray bound a
/// run the same way an invalid gate does.
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::qc::despeckle;
/// use ndarray::arr2;
///
/// let bad = -32768.0;
/// let dz = arr2(&[[bad, 10.0, 10.0, bad, 10.0, 10.0, 10.0, bad]]);
/// let mask = despeckle(&dz, 2, bad);
/// assert_eq!(mask, arr2(&[[true, true, true, true, false, false, false, true]]));
/// ```
pub fn despeckle(dz: &Array2<f64>, speckle: usize, bad: f64) -> Array2<bool> {
    let mut mask = Array2::from_elem(dz.dim(), false);

    for (dz_ray, mut mask_ray) in dz.outer_iter().zip(mask.outer_iter_mut()) {
        let runs = dz_ray
            .iter()
            .map(|&val| is_valid(val, bad))
            .enumerate()
            .group_by(|&(_, valid)| valid);

        for (valid, run) in &runs {
            let run: Vec<usize> = run.map(|(gate, _)| gate).collect();
            if !valid || run.len() <= speckle {
                for gate in run {
                    mask_ray[gate] = true;
                }
            }
        }
    }

    mask
}

/// Compute the combined quality control mask from plain reflectivity, differential reflectivity,
/// and phase noise arrays with the bad data value at invalid gates.
///
/// The speckle filter runs on reflectivity after the insect and phase noise gates have been
/// removed from it. Every gate that is invalid on input stays masked.
pub fn quality_control_mask(
    dz: &Array2<f64>,
    dr: &Array2<f64>,
    sdp: &Array2<f64>,
    config: &RetrievalConfig,
) -> (Array2<bool>, QcReport) {
    let bad = config.bad();

    let insect = insect_filter(dz, dr, config.dz_range(), config.thresh_dr(), bad);
    let phase_noise = differential_phase_filter(sdp, config.thresh_sdp(), bad);
    let removed = Zip::from(&insect).and(&phase_noise).map_collect(|&a, &b| a || b);

    let composite = Zip::from(dz)
        .and(&removed)
        .map_collect(|&val, &rm| if rm { bad } else { val });
    let speckle = despeckle(&composite, config.speckle(), bad);

    let mask = Zip::from(&removed).and(&speckle).map_collect(|&a, &b| a || b);

    let count = |arr: &Array2<bool>| arr.iter().filter(|&&flag| flag).count();
    let speckle_removed = Zip::from(&composite)
        .and(&speckle)
        .fold(0, |acc, &val, &flag| {
            if flag && is_valid(val, bad) {
                acc + 1
            } else {
                acc
            }
        });

    let report = QcReport {
        insect: count(&insect),
        phase_noise: count(&phase_noise),
        speckle: speckle_removed,
        masked: count(&mask),
    };

    (mask, report)
}

/// Run quality control on a volume, replacing the mask of the reflectivity field.
///
/// Returns `None` without touching the volume if the phase noise field does not exist.
pub(crate) fn apply_quality_control(
    vol: &mut RadarVolume,
    reflectivity: &str,
    differential_reflectivity: &str,
    config: &RetrievalConfig,
) -> Result<Option<QcReport>> {
    let bad = config.bad();
    let sdp_name = config.output_name(DerivedField::DifferentialPhaseStdDev);

    let sdp = match vol.field(&sdp_name) {
        Some(fld) => fld.filled(bad),
        None => return Ok(None),
    };
    let dz = vol
        .field(reflectivity)
        .map(|fld| fld.filled(bad))
        .ok_or_else(|| missing(FieldRole::Reflectivity, reflectivity))?;
    let dr = vol
        .field(differential_reflectivity)
        .map(|fld| fld.filled(bad))
        .ok_or_else(|| missing(FieldRole::DifferentialReflectivity, differential_reflectivity))?;

    let (mask, report) = quality_control_mask(&dz, &dr, &sdp, config);

    vol.field_mut(reflectivity)
        .ok_or_else(|| missing(FieldRole::Reflectivity, reflectivity))?
        .set_mask(mask);

    Ok(Some(report))
}

fn missing(role: FieldRole, name: &str) -> RetrievalError {
    RetrievalError::MissingRequiredField {
        role,
        name: Some(name.to_owned()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr2;

    const BAD: f64 = -32768.0;

    #[test]
    fn test_speckle_run_length_boundary() {
        let speckle = 4;

        // Exactly `speckle` valid gates between invalid gates is removed.
        let mut row = vec![BAD];
        row.extend(vec![20.0; speckle]);
        row.push(BAD);
        let dz = Array2::from_shape_vec((1, row.len()), row).unwrap();
        assert!(despeckle(&dz, speckle, BAD).iter().all(|&m| m));

        // One more valid gate and the run survives.
        let mut row = vec![BAD];
        row.extend(vec![20.0; speckle + 1]);
        row.push(BAD);
        let dz = Array2::from_shape_vec((1, row.len()), row).unwrap();
        let mask = despeckle(&dz, speckle, BAD);
        assert!(mask[(0, 0)] && mask[(0, speckle + 2)]);
        assert!((1..=speckle + 1).all(|gate| !mask[(0, gate)]));
    }

    #[test]
    fn test_speckle_runs_do_not_cross_rays() {
        let dz = arr2(&[[10.0, 10.0, 10.0], [10.0, 10.0, 10.0]]);
        assert!(despeckle(&dz, 2, BAD).iter().all(|&m| !m));
        assert!(despeckle(&dz, 3, BAD).iter().all(|&m| m));
    }

    #[test]
    fn test_nan_is_invalid() {
        let dz = arr2(&[[std::f64::NAN, 10.0, 10.0, 10.0]]);
        let mask = despeckle(&dz, 2, BAD);
        assert_eq!(mask, arr2(&[[true, false, false, false]]));
    }

    #[test]
    fn test_insect_ranges_are_half_open() {
        let dz = arr2(&[[10.0, 9.999, 60.0]]);
        let dr = arr2(&[[1.29, 1.0, 5.0]]);
        let config = RetrievalConfig::new();
        let mask = insect_filter(&dz, &dr, config.dz_range(), config.thresh_dr(), BAD);
        // 10 dBZ belongs to the second bin, 60 dBZ to no bin.
        assert_eq!(mask, arr2(&[[false, true, false]]));
    }

    #[test]
    fn test_phase_noise() {
        let sdp = arr2(&[[12.0, 12.5, BAD]]);
        assert_eq!(
            differential_phase_filter(&sdp, 12.0, BAD),
            arr2(&[[false, true, false]])
        );
    }

    #[test]
    fn test_combined_mask() {
        let config = RetrievalConfig::new().with_speckle(2);

        // gate:       0     1     2     3     4     5     6     7
        let dz = arr2(&[[30.0, 30.0, 30.0, 30.0, 5.0, 30.0, 30.0, 30.0]]);
        let dr = arr2(&[[0.5, 0.5, 0.5, 0.5, 3.0, 0.5, 0.5, 0.5]]);
        let sdp = arr2(&[[2.0, 20.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0]]);

        let (mask, report) = quality_control_mask(&dz, &dr, &sdp, &config);

        let insect = insect_filter(&dz, &dr, config.dz_range(), config.thresh_dr(), BAD);
        let noise = differential_phase_filter(&sdp, config.thresh_sdp(), BAD);
        assert_eq!(insect, arr2(&[[false, false, false, false, true, false, false, false]]));
        assert_eq!(noise, arr2(&[[false, true, false, false, false, false, false, false]]));

        // Gate 0 is a run of one between the ray start and the noisy gate, gates 2-3 are a run
        // of two between the noisy gate and the insect gate.
        assert_eq!(
            mask,
            arr2(&[[true, true, true, true, true, false, false, false]])
        );
        assert_eq!(
            report,
            QcReport {
                insect: 1,
                phase_noise: 1,
                speckle: 3,
                masked: 5,
            }
        );
    }

    #[test]
    fn test_apply_commits_onto_reflectivity() {
        let mut vol = crate::doctest::make_test_volume(2, 8);
        let config = RetrievalConfig::new();

        // No phase noise field, nothing happens.
        assert_eq!(
            apply_quality_control(&mut vol, "DZ", "DR", &config).unwrap(),
            None
        );
        assert!(vol.field("DZ").unwrap().mask().is_none());

        let mut sdp = Array2::from_elem((2, 8), 2.0);
        sdp[(1, 3)] = 30.0;
        vol.insert_field("SDP_CSU", crate::Field::new(sdp)).unwrap();

        let report = apply_quality_control(&mut vol, "DZ", "DR", &config)
            .unwrap()
            .unwrap();
        assert_eq!(report.phase_noise, 1);

        let dz = vol.field("DZ").unwrap();
        assert!(dz.is_masked((1, 3)));
        assert!(!dz.is_masked((0, 3)));
        assert_eq!(dz.masked_count(), report.masked);
    }
}
