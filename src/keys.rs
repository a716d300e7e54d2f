//! Enums used as keys for field roles, retrieval stages, and derived output fields.
use crate::field::FieldMeta;
use strum_macros::{Display, EnumIter};

/// The role a radar field plays in the retrievals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FieldRole {
    /// Reflectivity (dBZ), the base field every derived field inherits its mask from.
    #[strum(to_string = "reflectivity")]
    Reflectivity,
    /// Differential reflectivity (dB)
    #[strum(to_string = "differential reflectivity")]
    DifferentialReflectivity,
    /// Correlation coefficient
    #[strum(to_string = "correlation coefficient")]
    CorrelationCoefficient,
    /// Specific differential phase (deg/km)
    #[strum(to_string = "specific differential phase")]
    SpecificDifferentialPhase,
    /// Linear depolarization ratio (dB)
    #[strum(to_string = "linear depolarization ratio")]
    LinearDepolarizationRatio,
    /// Differential phase (deg)
    #[strum(to_string = "differential phase")]
    DifferentialPhase,
}

impl FieldRole {
    /// Whether a retrieval run is impossible without this field.
    pub fn is_mandatory(self) -> bool {
        matches!(
            self,
            FieldRole::Reflectivity
                | FieldRole::DifferentialReflectivity
                | FieldRole::CorrelationCoefficient
        )
    }
}

/// The stages of a retrieval run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Stage {
    /// Sounding ingestion and temperature interpolation.
    #[strum(to_string = "sounding")]
    Sounding,
    /// Insect, phase noise, and speckle filtering of reflectivity.
    #[strum(to_string = "quality control")]
    QualityControl,
    /// Specific differential phase estimation.
    #[strum(to_string = "specific differential phase")]
    SpecificDifferentialPhase,
    /// Hydrometeor identification.
    #[strum(to_string = "hydrometeor classification")]
    Classification,
    /// Rainfall rate.
    #[strum(to_string = "precipitation rate")]
    PrecipitationRate,
    /// Drop size distribution parameters.
    #[strum(to_string = "drop size distribution")]
    DropSizeDistribution,
    /// Liquid and ice water mass.
    #[strum(to_string = "liquid/ice mass")]
    LiquidIceMass,
}

/// Every field a retrieval run may add to a radar volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum DerivedField {
    /// Hydrometeor identification code, 1 through 10.
    HydrometeorId,
    /// Ice fraction from the blended rainfall algorithm.
    IceFraction,
    /// Difference reflectivity (dB)
    DifferenceReflectivity,
    /// Specific differential phase (deg/km)
    SpecificDifferentialPhase,
    /// Filtered differential phase (deg)
    FilteredDifferentialPhase,
    /// Standard deviation of differential phase (deg)
    DifferentialPhaseStdDev,
    /// Ice water mass (g/m^3)
    IceMass,
    /// Liquid water mass (g/m^3)
    LiquidMass,
    /// Rainfall rate (mm/h)
    RainRate,
    /// Rainfall method code, 1 through 5.
    RainMethod,
    /// Median volume diameter (mm)
    MedianVolumeDiameter,
    /// Normalized intercept parameter
    NormalizedIntercept,
    /// Shape parameter of the gamma drop size distribution
    Mu,
}

impl DerivedField {
    /// The name the field is stored under unless overridden in the configuration.
    ///
    /// The specific differential phase products carry the estimator's suffix, see
    /// `RetrievalConfig::output_name`.
    pub fn default_name(self) -> &'static str {
        use DerivedField::*;

        match self {
            HydrometeorId => "FH",
            IceFraction => "FI",
            DifferenceReflectivity => "ZDP",
            SpecificDifferentialPhase => "KDP_CSU",
            FilteredDifferentialPhase => "FDP_CSU",
            DifferentialPhaseStdDev => "SDP_CSU",
            IceMass => "MI",
            LiquidMass => "MW",
            RainRate => "rain",
            RainMethod => "method",
            MedianVolumeDiameter => "D0",
            NormalizedIntercept => "NW",
            Mu => "MU",
        }
    }

    /// Descriptive metadata attached to the field when it is committed.
    pub fn metadata(self) -> FieldMeta {
        use DerivedField::*;

        let (units, long_name, standard_name) = match self {
            HydrometeorId => ("unitless", "Hydrometeor ID", "Hydrometeor ID"),
            IceFraction => ("", "Ice Fraction", "Ice Fraction"),
            DifferenceReflectivity => ("dB", "Difference Reflectivity", "Difference Reflectivity"),
            SpecificDifferentialPhase => ("deg km-1", "Specific Differential Phase", "KDP"),
            FilteredDifferentialPhase => (
                "deg",
                "Filtered Differential Phase",
                "Filtered Differential Phase",
            ),
            DifferentialPhaseStdDev => (
                "deg",
                "Standard Deviation of Differential Phase",
                "Std Dev Differential Phase",
            ),
            IceMass => ("g m-3", "Ice Water Mass", "Ice Water Mass"),
            LiquidMass => ("g m-3", "Liquid Water Mass", "Liquid Water Mass"),
            RainRate => ("mm h-1", "Rainfall Rate", "Rainfall Rate"),
            RainMethod => ("", "Rainfall Method", "Rainfall Method"),
            MedianVolumeDiameter => ("mm", "Median Volume Diameter", "Median Volume Diameter"),
            NormalizedIntercept => (
                "mm-1 m-3",
                "Normalized Intercept Parameter",
                "Normalized Intercept Parameter",
            ),
            Mu => (" ", "Mu", "Mu"),
        };

        FieldMeta::new(units, long_name, standard_name)
    }
}
