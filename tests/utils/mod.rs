#![allow(dead_code)]
use dualpol_analysis::{Field, RadarVolume, SoundingSource};
use ndarray::Array2;
use std::path::PathBuf;

pub const BAD: f64 = -32768.0;

pub fn test_data_path(fname: &str) -> PathBuf {
    let mut test_path = PathBuf::new();
    test_path.push("test_data");
    test_path.push(fname);
    test_path
}

pub fn sample_sounding() -> SoundingSource {
    SoundingSource::file(test_data_path("fwd_20150902_12z.txt"))
}

pub fn bad_sounding() -> SoundingSource {
    SoundingSource::file(test_data_path("not_a_sounding.txt"))
}

/// Replace the reflectivity field with one that has the same data but the given mask.
pub fn with_reflectivity_mask(mut vol: RadarVolume, mask: Array2<bool>) -> RadarVolume {
    let dz = vol.remove_field("DZ").expect("test volume has reflectivity");
    let dz = Field::new(dz.data().clone())
        .with_mask(mask)
        .with_meta(dz.meta().clone());
    vol.insert_field("DZ", dz).expect("mask has the volume shape");
    vol
}

/// Assert that every named field has exactly the given mask.
pub fn assert_masks_equal(vol: &RadarVolume, names: &[&str], mask: Option<&Array2<bool>>) {
    for name in names {
        let fld = vol
            .field(name)
            .unwrap_or_else(|| panic!("missing field {}", name));
        assert_eq!(fld.mask(), mask, "mask of {} differs", name);
    }
}
