//! Configuration for a retrieval run.
//!
//! A `RetrievalConfig` is built once with the `with_*` builder methods, moved into a
//! `DualPolRetrieval`, and never changed after that.

use crate::{
    error::{Result, RetrievalError},
    keys::{DerivedField, FieldRole},
    resolve::ResolvedFields,
    sounding::SoundingSource,
};
use metfor::{Km, Meters, Quantity};
use std::collections::HashMap;
use strum::IntoEnumIterator;
use std::str::FromStr;
use strum_macros::{Display, EnumIter};

/// The default bad data sentinel.
pub const BAD: f64 = -32768.0;

/// Default threshold on the standard deviation of differential phase (deg).
pub const DEFAULT_SDP: f64 = 12.0;

/// Default reflectivity ranges (dBZ) for the insect filter, `[low, high)`.
pub const DEFAULT_DZ_RANGE: [(f64, f64); 6] = [
    (-10.0, 10.0),
    (10.0, 20.0),
    (20.0, 30.0),
    (30.0, 40.0),
    (40.0, 50.0),
    (50.0, 60.0),
];

/// Default differential reflectivity thresholds (dB) for the insect filter, one per entry of
/// `DEFAULT_DZ_RANGE`.
pub const DEFAULT_DR_THRESH: [f64; 6] = [1.0, 1.3, 1.7, 2.1, 2.5, 2.8];

/// Radar frequency band, selects the coefficients used by the algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Band {
    /// S band, about 10 cm wavelength.
    #[strum(to_string = "S")]
    S,
    /// C band, about 5 cm wavelength.
    #[strum(to_string = "C")]
    C,
}

/// How the membership scores are combined in the hydrometeor classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FhcMethod {
    /// Hybrid method, the preferred one.
    #[strum(to_string = "hybrid")]
    Hybrid,
    /// Weighted sum of all scores.
    #[strum(to_string = "linear")]
    Linear,
}

/// Rainfall estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum RainMethod {
    /// Rainfall estimator chosen from the hydrometeor classification. Needs the classification.
    #[strum(to_string = "hidro")]
    Hidro,
    /// Blended estimator based on difference reflectivity and ice fraction.
    #[strum(to_string = "blended")]
    Blended,
}

/// Specific differential phase estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum KdpMethod {
    /// Filtered phase with a finite impulse response filter, then a least squares slope.
    #[strum(to_string = "CSU")]
    Csu,
}

// Options parse from their display names, ignoring ASCII case.
macro_rules! impl_from_str {
    ($($t:ty),*) => {
        $(
            impl FromStr for $t {
                type Err = strum::ParseError;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    Self::iter()
                        .find(|opt| opt.to_string().eq_ignore_ascii_case(s.trim()))
                        .ok_or(strum::ParseError::VariantNotFound)
                }
            }
        )*
    };
}

impl_from_str!(Band, FhcMethod, RainMethod, KdpMethod);

/// Weights of each variable in the hydrometeor classification.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct FhcWeights {
    pub dz: f64,
    pub dr: f64,
    pub kd: f64,
    pub rh: f64,
    pub ld: f64,
    pub t: f64,
}

impl Default for FhcWeights {
    fn default() -> Self {
        FhcWeights {
            dz: 1.5,
            dr: 0.8,
            kd: 1.0,
            rh: 0.8,
            ld: 0.5,
            t: 0.4,
        }
    }
}

/// Names of the fields in the radar volume for each role.
///
/// `None` for specific differential phase means it should be computed from differential phase.
/// `None` for linear depolarization ratio means it is not used.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct FieldNames {
    pub reflectivity: String,
    pub differential_reflectivity: String,
    pub correlation_coefficient: String,
    pub specific_differential_phase: Option<String>,
    pub linear_depolarization_ratio: Option<String>,
    pub differential_phase: Option<String>,
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames {
            reflectivity: "DZ".to_owned(),
            differential_reflectivity: "DR".to_owned(),
            correlation_coefficient: "RH".to_owned(),
            specific_differential_phase: None,
            linear_depolarization_ratio: None,
            differential_phase: None,
        }
    }
}

impl FieldNames {
    /// The name bound to a role, if any.
    pub fn name(&self, role: FieldRole) -> Option<&str> {
        use FieldRole::*;

        match role {
            Reflectivity => Some(&self.reflectivity),
            DifferentialReflectivity => Some(&self.differential_reflectivity),
            CorrelationCoefficient => Some(&self.correlation_coefficient),
            SpecificDifferentialPhase => self.specific_differential_phase.as_deref(),
            LinearDepolarizationRatio => self.linear_depolarization_ratio.as_deref(),
            DifferentialPhase => self.differential_phase.as_deref(),
        }
    }
}

/// All the options for a retrieval run.
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::{Band, RainMethod, RetrievalConfig};
///
/// let config = RetrievalConfig::new()
///     .with_band(Band::C)
///     .with_differential_phase("PH")
///     .with_rain_method(RainMethod::Blended)
///     .with_ice_flag(true)
///     .with_qc(true);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.band(), Band::C);
/// assert_eq!("hidro".parse::<RainMethod>().unwrap(), RainMethod::Hidro);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    names: FieldNames,
    sounding: Option<SoundingSource>,
    band: Band,

    // Stage switches
    qc: bool,
    fhc: bool,
    precip: bool,
    dsd: bool,
    liquid_ice: bool,
    winter: bool,

    // Classification
    fhc_method: FhcMethod,
    use_temp: bool,
    fhc_t_factor: f64,
    fhc_weights: FhcWeights,

    // Rainfall
    rain_method: RainMethod,
    ice_flag: bool,

    // Quality control
    thresh_sdp: f64,
    dz_range: Vec<(f64, f64)>,
    thresh_dr: Vec<f64>,
    speckle: usize,

    // Specific differential phase
    gate_spacing: Meters,
    kdp_window: Km,
    kdp_method: KdpMethod,

    // Output
    bad: f64,
    name_fhc: String,
    name_sdp: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        RetrievalConfig {
            names: FieldNames::default(),
            sounding: None,
            band: Band::S,

            qc: false,
            fhc: true,
            precip: true,
            dsd: true,
            liquid_ice: true,
            winter: false,

            fhc_method: FhcMethod::Hybrid,
            use_temp: true,
            fhc_t_factor: 1.0,
            fhc_weights: FhcWeights::default(),

            rain_method: RainMethod::Hidro,
            ice_flag: false,

            thresh_sdp: DEFAULT_SDP,
            dz_range: DEFAULT_DZ_RANGE.to_vec(),
            thresh_dr: DEFAULT_DR_THRESH.to_vec(),
            speckle: 4,

            gate_spacing: Meters(150.0),
            kdp_window: Km(3.0),
            kdp_method: KdpMethod::Csu,

            bad: BAD,
            name_fhc: DerivedField::HydrometeorId.default_name().to_owned(),
            name_sdp: DerivedField::DifferentialPhaseStdDev.default_name().to_owned(),
        }
    }
}

macro_rules! make_setter {
    ($(#[$attr:meta])* => $name:ident, $field:ident, $t:ty) => {
        $(#[$attr])*
        #[inline]
        pub fn $name(self, value: $t) -> Self {
            Self { $field: value, ..self }
        }
    };
}

impl RetrievalConfig {
    /// Create a configuration with the default options.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method for all the field names at once.
    #[inline]
    pub fn with_field_names(self, names: FieldNames) -> Self {
        Self { names, ..self }
    }

    /// Builder method for the reflectivity field name.
    #[inline]
    pub fn with_reflectivity<S: Into<String>>(mut self, name: S) -> Self {
        self.names.reflectivity = name.into();
        self
    }

    /// Builder method for the differential reflectivity field name.
    #[inline]
    pub fn with_differential_reflectivity<S: Into<String>>(mut self, name: S) -> Self {
        self.names.differential_reflectivity = name.into();
        self
    }

    /// Builder method for the correlation coefficient field name.
    #[inline]
    pub fn with_correlation_coefficient<S: Into<String>>(mut self, name: S) -> Self {
        self.names.correlation_coefficient = name.into();
        self
    }

    /// Builder method for the specific differential phase field name.
    #[inline]
    pub fn with_specific_differential_phase<S: Into<String>>(mut self, name: S) -> Self {
        self.names.specific_differential_phase = Some(name.into());
        self
    }

    /// Builder method for the linear depolarization ratio field name.
    #[inline]
    pub fn with_linear_depolarization_ratio<S: Into<String>>(mut self, name: S) -> Self {
        self.names.linear_depolarization_ratio = Some(name.into());
        self
    }

    /// Builder method for the differential phase field name.
    #[inline]
    pub fn with_differential_phase<S: Into<String>>(mut self, name: S) -> Self {
        self.names.differential_phase = Some(name.into());
        self
    }

    /// Builder method for the sounding.
    #[inline]
    pub fn with_sounding<T>(mut self, sounding: T) -> Self
    where
        Option<SoundingSource>: From<T>,
    {
        self.sounding = Option::from(sounding);
        self
    }

    make_setter!(
        /// Builder method for the radar band.
        => with_band, band, Band
    );
    make_setter!(
        /// Turn quality control on or off.
        => with_qc, qc, bool
    );
    make_setter!(
        /// Turn the hydrometeor classification on or off.
        => with_fhc, fhc, bool
    );
    make_setter!(
        /// Turn the rainfall retrieval on or off.
        => with_precip, precip, bool
    );
    make_setter!(
        /// Turn the drop size distribution retrieval on or off.
        => with_dsd, dsd, bool
    );
    make_setter!(
        /// Turn the liquid and ice mass retrieval on or off.
        => with_liquid_ice, liquid_ice, bool
    );
    make_setter!(
        /// Use winter retrievals. These are not implemented and make the classification and
        /// rainfall stages do nothing.
        => with_winter, winter, bool
    );
    make_setter!(
        /// Builder method for the classification scoring method.
        => with_fhc_method, fhc_method, FhcMethod
    );
    make_setter!(
        /// Consider temperature in the classification, if a sounding is available.
        => with_use_temp, use_temp, bool
    );
    make_setter!(
        /// Extra weighting on temperature in the classification.
        => with_fhc_t_factor, fhc_t_factor, f64
    );
    make_setter!(
        /// Builder method for the classification weights.
        => with_fhc_weights, fhc_weights, FhcWeights
    );
    make_setter!(
        /// Builder method for the rainfall method.
        => with_rain_method, rain_method, RainMethod
    );
    make_setter!(
        /// Also store ice fraction and difference reflectivity from the blended rainfall method.
        => with_ice_flag, ice_flag, bool
    );
    make_setter!(
        /// Threshold on the standard deviation of differential phase, used by the specific
        /// differential phase estimator and quality control.
        => with_thresh_sdp, thresh_sdp, f64
    );
    make_setter!(
        /// Maximum length in gates of a run of valid gates to be removed as a speckle.
        => with_speckle, speckle, usize
    );
    make_setter!(
        /// Builder method for the gate spacing used by the specific differential phase estimator.
        => with_gate_spacing, gate_spacing, Meters
    );
    make_setter!(
        /// Builder method for the differential phase filter window.
        => with_kdp_window, kdp_window, Km
    );
    make_setter!(
        /// Builder method for the specific differential phase estimator.
        => with_kdp_method, kdp_method, KdpMethod
    );
    make_setter!(
        /// Builder method for the bad data sentinel.
        => with_bad, bad, f64
    );

    /// Builder method for the insect filter reflectivity ranges and their differential
    /// reflectivity thresholds.
    #[inline]
    pub fn with_insect_filter(self, dz_range: Vec<(f64, f64)>, thresh_dr: Vec<f64>) -> Self {
        Self {
            dz_range,
            thresh_dr,
            ..self
        }
    }

    /// Builder method for the classification output field name.
    #[inline]
    pub fn with_name_fhc<S: Into<String>>(self, name: S) -> Self {
        Self {
            name_fhc: name.into(),
            ..self
        }
    }

    /// Builder method for the name of the field holding the standard deviation of differential
    /// phase.
    #[inline]
    pub fn with_name_sdp<S: Into<String>>(self, name: S) -> Self {
        Self {
            name_sdp: name.into(),
            ..self
        }
    }

    /// Check that all the options are usable.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RetrievalError::InvalidConfig(msg));

        if self.dz_range.len() != self.thresh_dr.len() {
            return invalid(format!(
                "{} insect filter reflectivity ranges but {} thresholds",
                self.dz_range.len(),
                self.thresh_dr.len()
            ));
        }
        if let Some(&(lo, hi)) = self.dz_range.iter().find(|(lo, hi)| !(lo < hi)) {
            return invalid(format!("empty insect filter range [{}, {})", lo, hi));
        }
        if self.speckle == 0 {
            return invalid("speckle length must be at least 1 gate".to_owned());
        }
        if !(self.gate_spacing.unpack() > 0.0) {
            return invalid(format!(
                "gate spacing must be positive, got {}",
                self.gate_spacing.unpack()
            ));
        }
        if !(self.kdp_window.unpack() > 0.0) {
            return invalid(format!(
                "kdp window must be positive, got {}",
                self.kdp_window.unpack()
            ));
        }
        if !self.bad.is_finite() {
            return invalid("bad data value must be finite".to_owned());
        }
        if !self.thresh_sdp.is_finite() || !self.fhc_t_factor.is_finite() {
            return invalid("thresholds and factors must be finite".to_owned());
        }

        Ok(())
    }

    /// Check that no two outputs share a name and that no output would overwrite a field the
    /// run reads.
    ///
    /// The specific differential phase products are only checked when they will be computed.
    pub fn check_output_names(&self, resolved: &ResolvedFields) -> Result<()> {
        let computed_kdp = [
            DerivedField::SpecificDifferentialPhase,
            DerivedField::FilteredDifferentialPhase,
            DerivedField::DifferentialPhaseStdDev,
        ];

        let mut outputs: HashMap<String, DerivedField> = HashMap::new();
        for fld in DerivedField::iter() {
            if !resolved.computes_kdp() && computed_kdp.contains(&fld) {
                continue;
            }

            let name = self.output_name(fld);
            if let Some(other) = outputs.insert(name.clone(), fld) {
                return Err(RetrievalError::InvalidConfig(format!(
                    "{:?} and {:?} would both be stored as `{}`",
                    other, fld, name
                )));
            }
        }

        if let Some(name) = resolved
            .input_names()
            .into_iter()
            .find(|name| outputs.contains_key(*name))
        {
            return Err(RetrievalError::InvalidConfig(format!(
                "output field `{}` would overwrite an input field",
                name
            )));
        }

        Ok(())
    }

    /// The name a derived field is stored under.
    pub fn output_name(&self, fld: DerivedField) -> String {
        match fld {
            DerivedField::HydrometeorId => self.name_fhc.clone(),
            DerivedField::DifferentialPhaseStdDev => self.name_sdp.clone(),
            DerivedField::SpecificDifferentialPhase => format!("KDP_{}", self.kdp_method),
            DerivedField::FilteredDifferentialPhase => format!("FDP_{}", self.kdp_method),
            other => other.default_name().to_owned(),
        }
    }

    /// Field names for each role.
    #[inline]
    pub fn field_names(&self) -> &FieldNames {
        &self.names
    }

    /// The sounding source, if any.
    #[inline]
    pub fn sounding(&self) -> Option<&SoundingSource> {
        self.sounding.as_ref()
    }

    /// Radar band.
    #[inline]
    pub fn band(&self) -> Band {
        self.band
    }

    /// Is quality control on?
    #[inline]
    pub fn qc(&self) -> bool {
        self.qc
    }

    /// Is the classification on?
    #[inline]
    pub fn fhc(&self) -> bool {
        self.fhc
    }

    /// Is the rainfall retrieval on?
    #[inline]
    pub fn precip(&self) -> bool {
        self.precip
    }

    /// Is the drop size distribution retrieval on?
    #[inline]
    pub fn dsd(&self) -> bool {
        self.dsd
    }

    /// Is the liquid/ice mass retrieval on?
    #[inline]
    pub fn liquid_ice(&self) -> bool {
        self.liquid_ice
    }

    /// Were winter retrievals requested?
    #[inline]
    pub fn winter(&self) -> bool {
        self.winter
    }

    /// Classification scoring method.
    #[inline]
    pub fn fhc_method(&self) -> FhcMethod {
        self.fhc_method
    }

    /// Was temperature requested for the classification?
    #[inline]
    pub fn use_temp(&self) -> bool {
        self.use_temp
    }

    /// Extra weight on temperature in the classification.
    #[inline]
    pub fn fhc_t_factor(&self) -> f64 {
        self.fhc_t_factor
    }

    /// Classification weights.
    #[inline]
    pub fn fhc_weights(&self) -> FhcWeights {
        self.fhc_weights
    }

    /// Rainfall method.
    #[inline]
    pub fn rain_method(&self) -> RainMethod {
        self.rain_method
    }

    /// Store ice fraction and difference reflectivity?
    #[inline]
    pub fn ice_flag(&self) -> bool {
        self.ice_flag
    }

    /// Threshold on the standard deviation of differential phase.
    #[inline]
    pub fn thresh_sdp(&self) -> f64 {
        self.thresh_sdp
    }

    /// Insect filter reflectivity ranges.
    #[inline]
    pub fn dz_range(&self) -> &[(f64, f64)] {
        &self.dz_range
    }

    /// Insect filter differential reflectivity thresholds.
    #[inline]
    pub fn thresh_dr(&self) -> &[f64] {
        &self.thresh_dr
    }

    /// Maximum speckle length in gates.
    #[inline]
    pub fn speckle(&self) -> usize {
        self.speckle
    }

    /// Gate spacing for the specific differential phase estimator.
    #[inline]
    pub fn gate_spacing(&self) -> Meters {
        self.gate_spacing
    }

    /// Differential phase filter window.
    #[inline]
    pub fn kdp_window(&self) -> Km {
        self.kdp_window
    }

    /// Specific differential phase estimator.
    #[inline]
    pub fn kdp_method(&self) -> KdpMethod {
        self.kdp_method
    }

    /// The bad data sentinel.
    #[inline]
    pub fn bad(&self) -> f64 {
        self.bad
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resolve::KdpSource;

    #[test]
    fn test_defaults() {
        let config = RetrievalConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.field_names().reflectivity, "DZ");
        assert_eq!(config.bad(), -32768.0);
        assert_eq!(config.speckle(), 4);
        assert!(!config.qc());
        assert!(config.fhc() && config.precip() && config.dsd() && config.liquid_ice());
        assert_eq!(config.rain_method(), RainMethod::Hidro);
    }

    #[test]
    fn test_output_names() {
        let config = RetrievalConfig::new().with_name_fhc("HID");
        assert_eq!(config.output_name(DerivedField::HydrometeorId), "HID");
        assert_eq!(
            config.output_name(DerivedField::SpecificDifferentialPhase),
            "KDP_CSU"
        );
        assert_eq!(
            config.output_name(DerivedField::FilteredDifferentialPhase),
            "FDP_CSU"
        );
        assert_eq!(
            config.output_name(DerivedField::DifferentialPhaseStdDev),
            "SDP_CSU"
        );
        assert_eq!(config.output_name(DerivedField::RainRate), "rain");
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("S".parse::<Band>().unwrap(), Band::S);
        assert_eq!("c".parse::<Band>().unwrap(), Band::C);
        assert_eq!("linear".parse::<FhcMethod>().unwrap(), FhcMethod::Linear);
        assert_eq!("CSU".parse::<KdpMethod>().unwrap(), KdpMethod::Csu);
        assert!("X".parse::<Band>().is_err());
    }

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!("hYbrid".parse::<FhcMethod>().unwrap(), FhcMethod::Hybrid);
        assert_eq!("LINEAR".parse::<FhcMethod>().unwrap(), FhcMethod::Linear);
        assert_eq!("Blended".parse::<RainMethod>().unwrap(), RainMethod::Blended);
        assert_eq!("HiDrO".parse::<RainMethod>().unwrap(), RainMethod::Hidro);
        assert_eq!("csu".parse::<KdpMethod>().unwrap(), KdpMethod::Csu);
        assert_eq!(" c ".parse::<Band>().unwrap(), Band::C);
        assert!("hybridx".parse::<FhcMethod>().is_err());

        for method in RainMethod::iter() {
            assert_eq!(method.to_string().parse::<RainMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_field_names_by_role() {
        let config = RetrievalConfig::new().with_differential_phase("PH");
        let names = config.field_names();
        assert_eq!(names.name(FieldRole::Reflectivity), Some("DZ"));
        assert_eq!(names.name(FieldRole::DifferentialPhase), Some("PH"));
        assert_eq!(names.name(FieldRole::SpecificDifferentialPhase), None);
    }

    #[test]
    fn test_invalid_options() {
        let mismatched = RetrievalConfig::new().with_insect_filter(vec![(0.0, 10.0)], vec![]);
        assert!(matches!(
            mismatched.validate(),
            Err(RetrievalError::InvalidConfig(_))
        ));

        assert!(RetrievalConfig::new().with_speckle(0).validate().is_err());
        assert!(RetrievalConfig::new()
            .with_gate_spacing(Meters(0.0))
            .validate()
            .is_err());
        assert!(RetrievalConfig::new()
            .with_bad(std::f64::NAN)
            .validate()
            .is_err());
    }

    fn resolved(kdp: KdpSource) -> ResolvedFields {
        ResolvedFields {
            reflectivity: "DZ".to_owned(),
            differential_reflectivity: "DR".to_owned(),
            correlation_coefficient: "RH".to_owned(),
            depolarization_ratio: Some("LD".to_owned()),
            kdp,
        }
    }

    fn computed() -> ResolvedFields {
        resolved(KdpSource::Compute {
            differential_phase: "DP".to_owned(),
        })
    }

    #[test]
    fn test_default_output_names_are_usable() {
        assert!(RetrievalConfig::new().check_output_names(&computed()).is_ok());
    }

    #[test]
    fn test_output_cannot_overwrite_input() {
        for name in &["DZ", "DR", "RH", "LD", "DP"] {
            let config = RetrievalConfig::new().with_name_fhc(*name);
            assert!(
                matches!(
                    config.check_output_names(&computed()),
                    Err(RetrievalError::InvalidConfig(_))
                ),
                "{} accepted",
                name
            );
        }

        let config = RetrievalConfig::new().with_name_sdp("KD");
        let kd = resolved(KdpSource::Present("KD".to_owned()));
        // Not computed, so nothing is stored under that name.
        assert!(config.check_output_names(&kd).is_ok());
        assert!(RetrievalConfig::new()
            .with_name_fhc("KD")
            .check_output_names(&kd)
            .is_err());
    }

    #[test]
    fn test_outputs_cannot_share_a_name() {
        let config = RetrievalConfig::new().with_name_fhc("rain");
        assert!(matches!(
            config.check_output_names(&computed()),
            Err(RetrievalError::InvalidConfig(_))
        ));

        // The phase noise name only matters when it is computed.
        let config = RetrievalConfig::new().with_name_sdp("D0");
        assert!(config.check_output_names(&computed()).is_err());
        assert!(config
            .check_output_names(&resolved(KdpSource::Present("KD".to_owned())))
            .is_ok());
    }
}
