#![warn(missing_docs)]
/*!
Hydrometeor and precipitation retrievals for polarimetric weather radar volumes.

A [`DualPolRetrieval`] borrows a [`RadarVolume`] holding reflectivity, differential reflectivity,
correlation coefficient, and either specific differential phase or differential phase, plus an
optional temperature sounding. It runs, in order:

 - field resolution, deciding which fields are used and computing specific differential phase
   from differential phase if it is not available,
 - sounding normalization and interpolation of temperature to every gate,
 - optional quality control of reflectivity (insects, noisy phase, speckles),
 - hydrometeor classification, rainfall rate, drop size distribution, and liquid/ice mass.

Every field the retrievals add to the volume carries the mask of the reflectivity field, so no
derived product is valid where reflectivity is not. The physical algorithms themselves are
supplied by an implementation of [`RetrievalAlgorithms`].

Progress is reported through the `log` crate, this library never installs a logger.
*/

//
// API
//
pub use crate::{
    algorithms::{
        BlendedRainOutput, DsdInput, DsdOutput, FhcInput, KdpInput, KdpOutput, MassInput,
        MassOutput, RainInput, RainOutput, RetrievalAlgorithms,
    },
    categories::{
        hid_colorbar_ticks, rain_method_colorbar_ticks, Hydrometeor, RainEstimator, HID_CATEGORIES,
        HID_COLORS,
    },
    config::{
        Band, FhcMethod, FhcWeights, FieldNames, KdpMethod, RainMethod, RetrievalConfig, BAD,
    },
    error::{Notice, Result, RetrievalError},
    field::{derive_field, Field, FieldMeta},
    geometry::{antenna_to_cartesian, gate_coordinates, gate_heights, GateCoordinates},
    keys::{DerivedField, FieldRole, Stage},
    qc::QcReport,
    resolve::{resolve_fields, KdpSource, ResolvedFields},
    retrieval::{hydrometeor_codes, DualPolRetrieval},
    sounding::{parse_uwyo_text, SoundingProfile, SoundingSource, UwyoSounding},
    volume::{RadarVolume, ScanGeometry},
};

pub mod qc;
pub mod temperature;

#[doc(hidden)]
pub mod doctest;

//
// Internal use only
//
mod algorithms;
mod categories;
mod config;
mod error;
mod field;
mod geometry;
mod interpolation;
mod kdp;
mod keys;
mod resolve;
mod retrieval;
mod sounding;
mod volume;
