//! Data type and methods to store a temperature sounding for use in the retrievals.
//!
//! The retrievals only need temperature as a function of height. A `SoundingProfile` is always
//! normalized so that height strictly increases from one level to the next and no level is
//! missing a value, which makes it safe to interpolate to any height.

use crate::{
    error::{Result, RetrievalError},
    interpolation::linear_interpolate_clamped,
};
use chrono::NaiveDateTime;
use itertools::izip;
use metfor::{Celsius, Meters};
use optional::Optioned;
use std::path::{Path, PathBuf};

pub use self::uwyo::{parse_uwyo_text, UwyoSounding};

/// Where to get a sounding from.
#[derive(Clone, Debug, PartialEq)]
pub enum SoundingSource {
    /// A University of Wyoming text sounding file.
    File(PathBuf),
    /// Parallel height (MSL) and temperature profiles, missing values allowed.
    Profile {
        /// Height above mean sea level.
        height: Vec<Optioned<Meters>>,
        /// Temperature.
        temperature: Vec<Optioned<Celsius>>,
    },
}

impl SoundingSource {
    /// Create a source from a file path.
    #[inline]
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        SoundingSource::File(path.into())
    }

    /// Create a source from parallel height and temperature profiles.
    #[inline]
    pub fn profile(height: Vec<Optioned<Meters>>, temperature: Vec<Optioned<Celsius>>) -> Self {
        SoundingSource::Profile {
            height,
            temperature,
        }
    }
}

/// Minimum number of levels needed to interpolate.
const MIN_LEVELS: usize = 2;

/// A monotonic height-temperature profile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SoundingProfile {
    // Description of the source of the sounding.
    source: Option<String>,
    // Station identifier.
    station: Option<String>,
    // Valid time of sounding
    valid_time: Option<NaiveDateTime>,

    height: Vec<Meters>,
    temperature: Vec<Celsius>,
}

impl SoundingProfile {
    /// Normalize a pair of profiles so they can be used for interpolation.
    ///
    /// Levels are visited in their original order. A level is kept only if both its height and
    /// temperature are present and its height is strictly greater than the height of the last
    /// level that was kept. This drops missing data and any levels where the height decreases,
    /// such as data from a descending balloon, without reordering what is left.
    ///
    /// The profiles should be the same length, any extra levels on the longer one are ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::SoundingProfile;
    /// use metfor::{Celsius, Meters};
    /// use optional::{none, some};
    ///
    /// let height = vec![
    ///     some(Meters(100.0)),
    ///     some(Meters(500.0)),
    ///     some(Meters(400.0)),
    ///     some(Meters(900.0)),
    ///     none(),
    ///     some(Meters(1500.0)),
    /// ];
    /// let temperature = vec![
    ///     some(Celsius(25.0)),
    ///     some(Celsius(22.0)),
    ///     some(Celsius(23.0)),
    ///     none(),
    ///     some(Celsius(18.0)),
    ///     some(Celsius(15.0)),
    /// ];
    ///
    /// let snd = SoundingProfile::normalize(&height, &temperature);
    /// assert_eq!(snd.height_profile(), &[Meters(100.0), Meters(500.0), Meters(1500.0)]);
    /// assert_eq!(snd.temperature_profile(), &[Celsius(25.0), Celsius(22.0), Celsius(15.0)]);
    /// ```
    pub fn normalize(height: &[Optioned<Meters>], temperature: &[Optioned<Celsius>]) -> Self {
        debug_assert_eq!(height.len(), temperature.len());

        let (height, temperature) = izip!(height, temperature)
            .filter_map(|(h, t)| {
                if h.is_some() && t.is_some() {
                    Some((h.unpack(), t.unpack()))
                } else {
                    None
                }
            })
            .fold(
                (Vec::<Meters>::new(), Vec::<Celsius>::new()),
                |(mut hs, mut ts), (h, t)| {
                    // Only keep levels above the last one kept.
                    if hs.last().map(|&last| h > last).unwrap_or(true) {
                        hs.push(h);
                        ts.push(t);
                    }
                    (hs, ts)
                },
            );

        SoundingProfile {
            height,
            temperature,
            ..SoundingProfile::default()
        }
    }

    /// Validate and normalize a pair of profiles.
    ///
    /// Fails with `SoundingUnavailable` if the profiles have different lengths or fewer than two
    /// usable levels remain after normalization.
    pub fn from_levels(
        height: &[Optioned<Meters>],
        temperature: &[Optioned<Celsius>],
    ) -> Result<Self> {
        if height.len() != temperature.len() {
            return Err(RetrievalError::SoundingUnavailable(format!(
                "{} heights but {} temperatures",
                height.len(),
                temperature.len()
            )));
        }

        let snd = Self::normalize(height, temperature);
        if !snd.is_usable() {
            return Err(RetrievalError::SoundingUnavailable(format!(
                "only {} usable levels, need at least {}",
                snd.len(),
                MIN_LEVELS
            )));
        }

        Ok(snd)
    }

    /// Load and normalize a University of Wyoming text sounding.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            RetrievalError::SoundingUnavailable(format!("reading {}: {}", path.display(), err))
        })?;

        let UwyoSounding {
            station,
            valid_time,
            height,
            temperature,
        } = parse_uwyo_text(&text)?;

        let snd = Self::from_levels(&height, &temperature)?;

        Ok(SoundingProfile {
            source: Some(path.display().to_string()),
            station,
            valid_time,
            ..snd
        })
    }

    /// Build a profile from any supported source.
    pub fn from_source(src: &SoundingSource) -> Result<Self> {
        match src {
            SoundingSource::File(path) => Self::from_file(path),
            SoundingSource::Profile {
                height,
                temperature,
            } => Self::from_levels(height, temperature),
        }
    }

    /// Add a source description to this sounding.
    #[inline]
    pub fn with_source_description<S>(mut self, desc: S) -> Self
    where
        Option<String>: From<S>,
    {
        self.source = Option::from(desc);
        self
    }

    /// Retrieve a source description for this sounding.
    #[inline]
    pub fn source_description(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Station identifier, if the source provided one.
    #[inline]
    pub fn station(&self) -> Option<&str> {
        self.station.as_deref()
    }

    /// Valid time of the sounding, if the source provided one.
    #[inline]
    pub fn valid_time(&self) -> Option<NaiveDateTime> {
        self.valid_time
    }

    /// Heights above mean sea level, strictly increasing.
    #[inline]
    pub fn height_profile(&self) -> &[Meters] {
        &self.height
    }

    /// Temperatures, parallel to `height_profile`.
    #[inline]
    pub fn temperature_profile(&self) -> &[Celsius] {
        &self.temperature
    }

    /// Number of levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.height.len()
    }

    /// Are there no levels at all?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height.is_empty()
    }

    /// Are there enough levels to interpolate?
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.len() >= MIN_LEVELS
    }

    /// Temperature at a height.
    ///
    /// Heights below the lowest level or above the highest level get the temperature at that
    /// level. Returns none for a profile with no levels or a NaN height.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::SoundingProfile;
    /// use metfor::{Celsius, Meters};
    /// use optional::some;
    ///
    /// let snd = SoundingProfile::from_levels(
    ///     &[some(Meters(0.0)), some(Meters(1000.0))],
    ///     &[some(Celsius(20.0)), some(Celsius(10.0))],
    /// ).unwrap();
    ///
    /// assert_eq!(snd.temperature_at(Meters(500.0)).unpack(), Celsius(15.0));
    /// assert_eq!(snd.temperature_at(Meters(5000.0)).unpack(), Celsius(10.0));
    /// ```
    pub fn temperature_at(&self, height: Meters) -> Optioned<Celsius> {
        if self.is_empty() {
            return Optioned::default();
        }
        match linear_interpolate_clamped(&self.height, &self.temperature, height) {
            Some(t) => Optioned::from(t),
            None => Optioned::default(),
        }
    }
}

mod uwyo;
