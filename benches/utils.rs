#![allow(dead_code)]
use dualpol_analysis::{doctest::make_test_volume, Field, RadarVolume, SoundingSource};
use ndarray::Array2;
use std::path::PathBuf;

pub const NRAYS: usize = 360;
pub const NGATES: usize = 800;

pub fn sample_sounding() -> SoundingSource {
    let mut test_path = PathBuf::new();
    test_path.push("test_data");
    test_path.push("fwd_20150902_12z.txt");
    SoundingSource::file(test_path)
}

/// A full sized volume with scattered masked gates in reflectivity and a noisy phase field.
pub fn load_test_volume() -> RadarVolume {
    let mut vol = make_test_volume(NRAYS, NGATES);

    let dz = vol.remove_field("DZ").expect("test volume has reflectivity");
    let mask = Array2::from_shape_fn((NRAYS, NGATES), |(ray, gate)| (ray * 7 + gate * 13) % 11 == 0);
    vol.insert_field("DZ", dz.with_mask(mask)).expect("shapes match");

    let sdp = Array2::from_shape_fn((NRAYS, NGATES), |(ray, gate)| ((ray + gate) % 17) as f64);
    vol.insert_field("SDP_CSU", Field::new(sdp)).expect("shapes match");

    vol
}
