use dualpol_analysis::{
    doctest::{make_test_volume, CallCounts, FakeAlgorithms},
    DualPolRetrieval, Field, FieldRole, Notice, RadarVolume, RainMethod, RetrievalConfig,
    RetrievalError, ScanGeometry, Stage,
};
use metfor::Meters;
use ndarray::Array2;

mod utils;

const DERIVED: [&str; 10] = [
    "KDP_CSU", "FDP_CSU", "SDP_CSU", "FH", "rain", "method", "D0", "NW", "MU", "MW",
];

fn config() -> RetrievalConfig {
    RetrievalConfig::new().with_differential_phase("DP")
}

#[test]
fn test_light_rain_without_qc() {
    let mut vol = make_test_volume(6, 50);
    let algs = FakeAlgorithms::default();

    let retrieval = DualPolRetrieval::new(&mut vol, config(), &algs).unwrap();
    let vol = retrieval.volume();

    assert!(vol.field("DZ").unwrap().mask().is_none());
    let fh = vol.field("FH").unwrap();
    assert!(fh.mask().is_none());
    assert!(fh.data().iter().all(|&code| code >= 1.0 && code <= 10.0));
    // Uniform rain
    assert!(fh.data().iter().all(|&code| code == 2.0));

    assert_eq!(fh.meta().long_name, "Hydrometeor ID");
    assert_eq!(vol.field("rain").unwrap().meta().units, "mm h-1");
}

#[test]
fn test_derived_fields_inherit_reflectivity_mask() {
    let mask = Array2::from_shape_fn((4, 30), |(ray, gate)| ray == 1 || gate % 7 == 0);
    let mut vol = utils::with_reflectivity_mask(make_test_volume(4, 30), mask.clone());
    let algs = FakeAlgorithms::default();

    DualPolRetrieval::new(
        &mut vol,
        config().with_sounding(utils::sample_sounding()),
        &algs,
    )
    .unwrap();

    utils::assert_masks_equal(&vol, &DERIVED, Some(&mask));
    assert_fill_values(&vol, &DERIVED);
}

#[test]
fn test_blended_ice_fields_inherit_reflectivity_mask() {
    let mask = Array2::from_shape_fn((3, 25), |(ray, gate)| ray == 2 || gate % 5 == 1);
    let mut vol = utils::with_reflectivity_mask(make_test_volume(3, 25), mask.clone());
    let config = config()
        .with_rain_method(RainMethod::Blended)
        .with_ice_flag(true);

    DualPolRetrieval::new(&mut vol, config, &FakeAlgorithms::default()).unwrap();

    let blended = ["rain", "method", "ZDP", "FI"];
    utils::assert_masks_equal(&vol, &blended, Some(&mask));
    assert_fill_values(&vol, &blended);
}

fn assert_fill_values(vol: &RadarVolume, names: &[&str]) {
    for name in names {
        assert_eq!(vol.field(name).unwrap().fill_value().unpack(), utils::BAD);
    }
}

#[test]
fn test_base_fill_value_is_inherited() {
    let mut vol = make_test_volume(2, 10);
    let dz = vol.remove_field("DZ").unwrap().with_fill_value(-9999.0);
    vol.insert_field("DZ", dz).unwrap();

    DualPolRetrieval::new(&mut vol, config(), &FakeAlgorithms::default()).unwrap();
    assert_eq!(vol.field("FH").unwrap().fill_value().unpack(), -9999.0);
}

#[test]
fn test_qc_mask_applies_after_kdp() {
    // A speckle of three gates at the start of ray 0, the rest of the ray is valid.
    let mut mask = Array2::from_elem((3, 40), false);
    mask[(0, 3)] = true;
    let mut vol = utils::with_reflectivity_mask(make_test_volume(3, 40), mask.clone());
    let algs = FakeAlgorithms::default();

    let retrieval = DualPolRetrieval::new(&mut vol, config().with_qc(true), &algs).unwrap();
    let report = retrieval.qc_report().unwrap();
    assert_eq!(report.speckle, 3);
    assert_eq!(report.insect, 0);
    assert_eq!(report.phase_noise, 0);

    let vol = retrieval.volume();
    let dz = vol.field("DZ").unwrap();
    assert_eq!(dz.masked_count(), 4);
    assert!((0..4).all(|gate| dz.is_masked((0, gate))));

    // Computed before quality control, so they keep the mask from before.
    utils::assert_masks_equal(vol, &["KDP_CSU", "FDP_CSU", "SDP_CSU"], Some(&mask));
    // Computed after.
    utils::assert_masks_equal(vol, &["FH", "rain", "method", "D0", "NW", "MU"], dz.mask());
}

#[test]
fn test_qc_skipped_without_phase_noise_field() {
    let mut vol = make_test_volume(2, 10)
        .with_field("KD", Field::new(Array2::zeros((2, 10))))
        .unwrap();
    let config = config().with_specific_differential_phase("KD").with_qc(true);

    let retrieval = DualPolRetrieval::new(&mut vol, config, &FakeAlgorithms::default()).unwrap();
    assert!(retrieval.qc_report().is_none());
    assert!(retrieval.notices().contains(&Notice::QualityControlSkipped {
        missing: "SDP_CSU".to_owned()
    }));
    assert!(retrieval.volume().field("DZ").unwrap().mask().is_none());
}

#[test]
fn test_kdp_computed_from_differential_phase() {
    let mut vol = make_test_volume(2, 10);
    let algs = FakeAlgorithms::default();
    let retrieval = DualPolRetrieval::new(&mut vol, config(), &algs).unwrap();

    assert_eq!(algs.calls().kdp, 1);
    assert_eq!(retrieval.kdp_name(), "KDP_CSU");
    assert!(retrieval.resolved_fields().computes_kdp());
    assert!(retrieval
        .notices()
        .contains(&Notice::SpecificDifferentialPhaseComputed {
            from: "DP".to_owned()
        }));
    assert!(retrieval.volume().has_field("KDP_CSU"));
}

#[test]
fn test_existing_kdp_is_used() {
    let mut vol = make_test_volume(2, 10)
        .with_field("KD", Field::new(Array2::from_elem((2, 10), 1.5)))
        .unwrap();
    let algs = FakeAlgorithms::default();

    let retrieval = DualPolRetrieval::new(
        &mut vol,
        config().with_specific_differential_phase("KD"),
        &algs,
    )
    .unwrap();

    assert_eq!(algs.calls().kdp, 0);
    assert_eq!(retrieval.kdp_name(), "KD");
    assert!(!retrieval.volume().has_field("KDP_CSU"));
}

#[test]
fn test_no_kdp_and_no_differential_phase() {
    let mut vol = make_test_volume(2, 10);
    vol.remove_field("DP");
    let algs = FakeAlgorithms::default();

    let err = DualPolRetrieval::new(&mut vol, config(), &algs).unwrap_err();
    assert_eq!(
        err,
        RetrievalError::MissingRequiredField {
            role: FieldRole::SpecificDifferentialPhase,
            name: None
        }
    );
    assert_eq!(algs.calls(), CallCounts::default());

    // The caller still has the volume, as it was.
    let names: Vec<&str> = vol.field_names().collect();
    assert_eq!(names, vec!["DR", "DZ", "RH"]);
}

#[test]
fn test_missing_correlation_coefficient() {
    let mut vol = make_test_volume(2, 10);
    let err = DualPolRetrieval::new(
        &mut vol,
        config().with_correlation_coefficient("RHOHV"),
        &FakeAlgorithms::default(),
    )
    .unwrap_err();

    assert_eq!(
        err,
        RetrievalError::MissingRequiredField {
            role: FieldRole::CorrelationCoefficient,
            name: Some("RHOHV".to_owned())
        }
    );
}

#[test]
fn test_depolarization_ratio_dropped() {
    let mut vol = make_test_volume(2, 10);
    let retrieval = DualPolRetrieval::new(
        &mut vol,
        config().with_linear_depolarization_ratio("LD"),
        &FakeAlgorithms::default(),
    )
    .unwrap();

    assert_eq!(retrieval.resolved_fields().depolarization_ratio, None);
    assert_eq!(
        retrieval.notices()[0],
        Notice::OptionalFieldDropped {
            role: FieldRole::LinearDepolarizationRatio,
            name: "LD".to_owned()
        }
    );
}

#[test]
fn test_hidro_rain_needs_classification() {
    let mut vol = make_test_volume(2, 10);
    let algs = FakeAlgorithms::default();
    let retrieval = DualPolRetrieval::new(&mut vol, config().with_fhc(false), &algs).unwrap();

    assert_eq!(algs.calls().fhc, 0);
    assert_eq!(algs.calls().hidro_rain, 0);
    assert!(!retrieval.volume().has_field("rain"));
    assert!(retrieval.notices().iter().any(|notice| matches!(
        notice,
        Notice::StageFailed {
            stage: Stage::PrecipitationRate,
            error: RetrievalError::InvalidRetrievalDependency { .. },
        }
    )));

    // The stages after it still ran.
    assert_eq!(algs.calls().dsd, 1);
    assert!(retrieval.volume().has_field("D0"));
}

#[test]
fn test_classification_in_volume_is_not_enough_for_hidro() {
    // An old classification field from some other run doesn't count.
    let mut vol = make_test_volume(2, 10)
        .with_field("FH", Field::new(Array2::from_elem((2, 10), 2.0)))
        .unwrap();
    let algs = FakeAlgorithms::default();

    let mut retrieval = DualPolRetrieval::new(&mut vol, config().with_fhc(false), &algs).unwrap();
    assert_eq!(algs.calls().hidro_rain, 0);

    let err = retrieval.run_precipitation_rate(&algs).unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::InvalidRetrievalDependency {
            stage: Stage::PrecipitationRate,
            ..
        }
    ));

    // Once the classification has run here, rain can be computed.
    retrieval.run_classification(&algs).unwrap();
    retrieval.run_precipitation_rate(&algs).unwrap();
    assert_eq!(algs.calls().hidro_rain, 1);
    assert!(retrieval.volume().has_field("rain"));
}

#[test]
fn test_blended_rain_with_ice() {
    let algs = FakeAlgorithms::default();
    let config = config()
        .with_fhc(false)
        .with_rain_method(RainMethod::Blended)
        .with_ice_flag(true);

    let mut vol = make_test_volume(2, 10);
    DualPolRetrieval::new(&mut vol, config, &algs).unwrap();
    assert_eq!(algs.calls().blended_rain, 1);

    for name in &["rain", "method", "ZDP", "FI"] {
        assert!(vol.has_field(name), "missing {}", name);
    }
    assert_eq!(vol.field("method").unwrap().data()[(0, 0)], 3.0);

    let config = self::config().with_rain_method(RainMethod::Blended);
    let mut vol = make_test_volume(2, 10);
    DualPolRetrieval::new(&mut vol, config, &algs).unwrap();
    assert!(!vol.has_field("ZDP"));
    assert!(!vol.has_field("FI"));
}

#[test]
fn test_stages_can_be_disabled() {
    let algs = FakeAlgorithms::default();
    let config = config()
        .with_fhc(false)
        .with_precip(false)
        .with_dsd(false)
        .with_liquid_ice(false);

    let mut vol = make_test_volume(2, 10);
    DualPolRetrieval::new(&mut vol, config, &algs).unwrap();
    assert_eq!(algs.calls().kdp, 1);
    assert_eq!(algs.calls().fhc + algs.calls().dsd + algs.calls().mass, 0);

    let names: Vec<&str> = vol.field_names().collect();
    assert_eq!(names, vec!["DP", "DR", "DZ", "FDP_CSU", "KDP_CSU", "RH", "SDP_CSU"]);
}

#[test]
fn test_custom_output_names() {
    let config = config().with_name_fhc("HID").with_name_sdp("PHIDP_SD");
    let mut vol = make_test_volume(2, 10);
    DualPolRetrieval::new(&mut vol, config, &FakeAlgorithms::default()).unwrap();

    assert!(vol.has_field("HID") && !vol.has_field("FH"));
    assert!(vol.has_field("PHIDP_SD") && !vol.has_field("SDP_CSU"));
    assert!(vol.has_field("rain"));
}

#[test]
fn test_output_names_cannot_replace_inputs() {
    let algs = FakeAlgorithms::default();

    for config in vec![
        config().with_name_fhc("DZ"),
        config().with_name_sdp("DR"),
        config().with_name_fhc("DP"),
        config().with_name_fhc("MW"),
    ] {
        let mut vol = make_test_volume(2, 10);
        let err = DualPolRetrieval::new(&mut vol, config, &algs).unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidConfig(_)), "{:?}", err);

        assert_eq!(vol.field("DZ").unwrap().data()[(0, 0)], 30.0);
        assert_eq!(vol.field("DR").unwrap().data()[(0, 0)], 1.0);
    }
    assert_eq!(algs.calls(), CallCounts::default());
}

#[test]
fn test_inconsistent_geometry() {
    let geom = ScanGeometry::new(
        vec![Meters(0.0), Meters(150.0)],
        vec![0.0, 90.0],
        vec![0.5],
        Meters(0.0),
    );
    let mut vol = RadarVolume::new(geom);
    let err = DualPolRetrieval::new(&mut vol, config(), &FakeAlgorithms::default()).unwrap_err();
    assert!(matches!(err, RetrievalError::InvalidInputObject(_)));
}
