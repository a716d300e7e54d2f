//! Synthetic volumes and algorithms for doc tests, integration tests, and benches.
//!
//! Not part of the public API.
use crate::{
    algorithms::*,
    categories::HID_CATEGORIES,
    field::{Field, FieldMeta},
    volume::{RadarVolume, ScanGeometry},
};
use metfor::Meters;
use ndarray::{Array2, Array3, Zip};
use std::cell::Cell;

/// Gate spacing of the test volumes.
pub const TEST_GATE_SPACING: Meters = Meters(150.0);

/// A volume with uniform light rain: DZ 30 dBZ, DR 1 dB, RH 0.98 and a slowly increasing DP.
///
/// Rays are evenly spaced in azimuth at 0.5 degrees elevation, the radar is at 100 m. There is
/// no mask on any field and no KD or LD field.
pub fn make_test_volume(nrays: usize, ngates: usize) -> RadarVolume {
    let geom = ScanGeometry::new(
        (0..ngates)
            .map(|g| Meters(TEST_GATE_SPACING.0 * g as f64))
            .collect(),
        (0..nrays)
            .map(|r| 360.0 * r as f64 / nrays as f64)
            .collect(),
        vec![0.5; nrays],
        Meters(100.0),
    );

    let shape = (nrays, ngates);
    let field = |data: Array2<f64>, units: &str, name: &str| {
        Field::new(data).with_meta(FieldMeta::new(units, name, name))
    };

    let fields = vec![
        ("DZ", field(Array2::from_elem(shape, 30.0), "dBZ", "Reflectivity")),
        (
            "DR",
            field(Array2::from_elem(shape, 1.0), "dB", "Differential Reflectivity"),
        ),
        (
            "RH",
            field(Array2::from_elem(shape, 0.98), "", "Correlation Coefficient"),
        ),
        (
            "DP",
            field(
                Array2::from_shape_fn(shape, |(_, g)| 0.1 * g as f64),
                "deg",
                "Differential Phase",
            ),
        ),
    ];

    let mut vol = RadarVolume::new(geom);
    for (name, fld) in fields {
        vol.insert_field(name, fld)
            .expect("test fields have the shape of the geometry");
    }
    vol
}

/// How many times each algorithm was called.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct CallCounts {
    pub kdp: usize,
    pub fhc: usize,
    pub hidro_rain: usize,
    pub blended_rain: usize,
    pub dsd: usize,
    pub mass: usize,
}

/// Simple, deterministic stand ins for the retrieval algorithms.
///
///  - KDP is 0.5 deg/km, FDP is a copy of DP, SDP is 5 deg.
///  - Classification picks hail for DZ at or above 50 dBZ, ice crystals where the temperature is
///    below -10 C, and rain everywhere else.
///  - Rainfall is DZ / 10, the method is R(Z) for `hidro` and R(Z, Zdr) for blended.
///  - D0 is 1 + DR, NW is 3, MU is 2.
///  - All the water is liquid above 0 C and ice below.
#[derive(Debug, Default)]
pub struct FakeAlgorithms {
    calls: Cell<CallCounts>,
    fhc_had_temperature: Cell<Option<bool>>,
    bad_kdp_shape: bool,
    bad_score_shape: bool,
    score_categories: Option<usize>,
}

impl FakeAlgorithms {
    /// Make the KDP estimator return arrays of the wrong shape.
    pub fn with_bad_kdp_shape(self) -> Self {
        Self {
            bad_kdp_shape: true,
            ..self
        }
    }

    /// Make the classification return scores of the wrong shape.
    pub fn with_bad_score_shape(self) -> Self {
        Self {
            bad_score_shape: true,
            ..self
        }
    }

    /// Make the classification score `categories` categories. Any category past the last
    /// hydrometeor code gets the highest score.
    pub fn with_score_categories(self, categories: usize) -> Self {
        Self {
            score_categories: Some(categories),
            ..self
        }
    }

    /// Number of calls so far.
    pub fn calls(&self) -> CallCounts {
        self.calls.get()
    }

    /// Whether the last classification call was given temperatures, none if it was never called.
    pub fn fhc_had_temperature(&self) -> Option<bool> {
        self.fhc_had_temperature.get()
    }

    fn count<F: FnOnce(&mut CallCounts)>(&self, f: F) {
        let mut calls = self.calls.get();
        f(&mut calls);
        self.calls.set(calls);
    }
}

impl RetrievalAlgorithms for FakeAlgorithms {
    fn specific_differential_phase(&self, input: &KdpInput) -> KdpOutput {
        self.count(|c| c.kdp += 1);

        let shape = if self.bad_kdp_shape {
            (1, 1)
        } else {
            input.differential_phase.dim()
        };

        KdpOutput {
            kdp: Array2::from_elem(shape, 0.5),
            filtered_phase: input.differential_phase.clone(),
            phase_std_dev: Array2::from_elem(input.differential_phase.dim(), 5.0),
        }
    }

    fn hydrometeor_scores(&self, input: &FhcInput) -> Array3<f64> {
        self.count(|c| c.fhc += 1);
        self.fhc_had_temperature.set(Some(input.temperature.is_some()));

        let (nrays, ngates) = input.reflectivity.shape();
        let categories = self.score_categories.unwrap_or(HID_CATEGORIES);
        let shape = if self.bad_score_shape {
            (categories, nrays + 1, ngates)
        } else {
            (categories, nrays, ngates)
        };

        let dz = input.reflectivity.data();
        Array3::from_shape_fn(shape, |(cat, ray, gate)| {
            let code = if dz.get((ray, gate)).map(|&z| z >= 50.0).unwrap_or(false) {
                9
            } else if input
                .temperature
                .and_then(|t| t.get((ray, gate)))
                .map(|&t| t < -10.0)
                .unwrap_or(false)
            {
                3
            } else {
                2
            };

            if cat >= HID_CATEGORIES {
                2.0
            } else if cat + 1 == code {
                1.0
            } else {
                0.25
            }
        })
    }

    fn hidro_rain(&self, input: &RainInput, _fhc: &Field) -> RainOutput {
        self.count(|c| c.hidro_rain += 1);

        let dz = input.reflectivity.data();
        RainOutput {
            rate: dz / 10.0,
            method: Array2::from_elem(dz.dim(), 4.0),
        }
    }

    fn blended_rain(&self, input: &RainInput, ice_flag: bool) -> BlendedRainOutput {
        self.count(|c| c.blended_rain += 1);

        let dz = input.reflectivity.data();
        let ice = if ice_flag {
            Some((dz - 10.0, Array2::zeros(dz.dim())))
        } else {
            None
        };

        BlendedRainOutput {
            rate: dz / 10.0,
            method: Array2::from_elem(dz.dim(), 3.0),
            ice,
        }
    }

    fn drop_size_distribution(&self, input: &DsdInput) -> DsdOutput {
        self.count(|c| c.dsd += 1);

        let dr = input.differential_reflectivity.data();
        DsdOutput {
            d0: dr + 1.0,
            nw: Array2::from_elem(dr.dim(), 3.0),
            mu: Array2::from_elem(dr.dim(), 2.0),
        }
    }

    fn liquid_ice_mass(&self, input: &MassInput) -> MassOutput {
        self.count(|c| c.mass += 1);

        let liquid = input.temperature.map(|&t| if t > 0.0 { 0.5 } else { 0.0 });
        let ice = Zip::from(&liquid)
            .and(input.temperature)
            .map_collect(|&l, &t| if t > 0.0 { 0.0 } else { 0.5 - l });

        MassOutput { liquid, ice }
    }
}
