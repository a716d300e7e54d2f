//! Category codes stored in the hydrometeor identification and rainfall method fields, with the
//! labels and colors conventionally used to display them.
//!
//! These are lookup tables for presentation only, nothing here is used by the retrievals.

use std::convert::From;
use strum_macros::{Display, EnumIter};

/// Hydrometeor identification codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Hydrometeor {
    // Zero is never produced by the classification, it marks gates with no category.
    #[strum(to_string = "Unclassified")]
    Unclassified = 0,
    #[strum(to_string = "Drizzle")]
    Drizzle = 1,
    #[strum(to_string = "Rain")]
    Rain = 2,
    #[strum(to_string = "Ice Crystals")]
    IceCrystals = 3,
    #[strum(to_string = "Aggregates")]
    Aggregates = 4,
    #[strum(to_string = "Wet Snow")]
    WetSnow = 5,
    #[strum(to_string = "Vertical Ice")]
    VerticalIce = 6,
    #[strum(to_string = "Low-Density Graupel")]
    LowDensityGraupel = 7,
    #[strum(to_string = "High-Density Graupel")]
    HighDensityGraupel = 8,
    #[strum(to_string = "Hail")]
    Hail = 9,
    #[strum(to_string = "Big Drops")]
    BigDrops = 10,
}

impl From<u8> for Hydrometeor {
    fn from(val: u8) -> Self {
        use Hydrometeor::*;

        match val {
            1 => Drizzle,
            2 => Rain,
            3 => IceCrystals,
            4 => Aggregates,
            5 => WetSnow,
            6 => VerticalIce,
            7 => LowDensityGraupel,
            8 => HighDensityGraupel,
            9 => Hail,
            10 => BigDrops,
            _ => Unclassified,
        }
    }
}

impl Hydrometeor {
    /// Category for a value read from a hydrometeor identification field.
    ///
    /// Values are rounded to the nearest code, anything that is not a code is unclassified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::Hydrometeor;
    ///
    /// assert_eq!(Hydrometeor::from_code(9.0), Hydrometeor::Hail);
    /// assert_eq!(Hydrometeor::from_code(-32768.0), Hydrometeor::Unclassified);
    /// assert_eq!(Hydrometeor::Hail.label(), "Hail");
    /// ```
    pub fn from_code(val: f64) -> Self {
        let val = val.round();
        if val >= 0.0 && val <= f64::from(std::u8::MAX) {
            Hydrometeor::from(val as u8)
        } else {
            Hydrometeor::Unclassified
        }
    }

    /// Short colorbar label.
    pub fn label(self) -> &'static str {
        use Hydrometeor::*;

        match self {
            Unclassified => "",
            Drizzle => "Drizzle",
            Rain => "Rain",
            IceCrystals => "Crystal",
            Aggregates => "Aggregate",
            WetSnow => "Wet Snow",
            VerticalIce => "Vert Ice",
            LowDensityGraupel => "LD Graup",
            HighDensityGraupel => "HD Graup",
            Hail => "Hail",
            BigDrops => "Big Drop",
        }
    }

    /// Display color, a CSS color name.
    pub fn color(self) -> &'static str {
        HID_COLORS[self as usize]
    }
}

/// Rainfall method codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum RainEstimator {
    #[strum(to_string = "None")]
    None = 0,
    #[strum(to_string = "R(Kdp, Zdr)")]
    KdpZdr = 1,
    #[strum(to_string = "R(Kdp)")]
    Kdp = 2,
    #[strum(to_string = "R(Z, Zdr)")]
    ZZdr = 3,
    #[strum(to_string = "R(Z)")]
    Z = 4,
    #[strum(to_string = "R(Zrain)")]
    ZRain = 5,
}

impl From<u8> for RainEstimator {
    fn from(val: u8) -> Self {
        use RainEstimator::*;

        match val {
            1 => KdpZdr,
            2 => Kdp,
            3 => ZZdr,
            4 => Z,
            5 => ZRain,
            _ => None,
        }
    }
}

impl RainEstimator {
    /// Estimator for a value read from a rainfall method field.
    pub fn from_code(val: f64) -> Self {
        let val = val.round();
        if val >= 0.0 && val <= f64::from(std::u8::MAX) {
            RainEstimator::from(val as u8)
        } else {
            RainEstimator::None
        }
    }

    /// Colorbar label, the same as the `Display` text except for `None`.
    pub fn label(self) -> &'static str {
        use RainEstimator::*;

        match self {
            None => "",
            KdpZdr => "R(Kdp, Zdr)",
            Kdp => "R(Kdp)",
            ZZdr => "R(Z, Zdr)",
            Z => "R(Z)",
            ZRain => "R(Zrain)",
        }
    }

    /// Display color, a CSS color name.
    pub fn color(self) -> &'static str {
        HID_COLORS[self as usize]
    }
}

/// Number of hydrometeor categories scored by the classification, codes 1 through 10.
pub const HID_CATEGORIES: usize = 10;

/// Colors for hydrometeor codes 0 through 10. The first six also color rainfall methods 0
/// through 5.
pub const HID_COLORS: [&str; 11] = [
    "White",
    "LightBlue",
    "MediumBlue",
    "DarkOrange",
    "LightPink",
    "Cyan",
    "DarkGray",
    "Lime",
    "Yellow",
    "Red",
    "Fuchsia",
];

/// Colorbar tick positions for a hydrometeor identification plot scaled 0 to 10, one per
/// category 1 through 10.
pub fn hid_colorbar_ticks() -> Vec<f64> {
    ticks(1.4, 10.0, 0.9)
}

/// Colorbar tick positions for a rainfall method plot scaled 0 to 5, one per method 1 through 5.
pub fn rain_method_colorbar_ticks() -> Vec<f64> {
    ticks(1.25, 5.0, 0.833)
}

fn ticks(start: f64, stop: f64, step: f64) -> Vec<f64> {
    (0u32..)
        .map(|i| start + step * f64::from(i))
        .take_while(|&tick| tick < stop)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_codes_round_trip() {
        for hid in Hydrometeor::iter() {
            assert_eq!(Hydrometeor::from(hid as u8), hid);
        }
        for est in RainEstimator::iter() {
            assert_eq!(RainEstimator::from(est as u8), est);
        }
        assert_eq!(Hydrometeor::from(42), Hydrometeor::Unclassified);
    }

    #[test]
    fn test_one_tick_per_category() {
        assert_eq!(
            hid_colorbar_ticks().len(),
            Hydrometeor::iter().count() - 1
        );
        assert_eq!(
            rain_method_colorbar_ticks().len(),
            RainEstimator::iter().count() - 1
        );
    }

    #[test]
    fn test_colors() {
        assert_eq!(Hydrometeor::Unclassified.color(), "White");
        assert_eq!(Hydrometeor::BigDrops.color(), "Fuchsia");
        assert_eq!(RainEstimator::ZRain.color(), "Cyan");
    }

    #[test]
    fn test_labels() {
        assert_eq!(Hydrometeor::IceCrystals.to_string(), "Ice Crystals");
        assert_eq!(Hydrometeor::IceCrystals.label(), "Crystal");
        assert_eq!(RainEstimator::KdpZdr.to_string(), RainEstimator::KdpZdr.label());
    }
}
