//! Data type to store a polarimetric radar volume: scan geometry plus a directory of fields.
use crate::{
    error::{Result, RetrievalError},
    field::{derive_field, Field, FieldMeta},
};
use chrono::NaiveDateTime;
use metfor::{Meters, Quantity};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Where the gates of a volume are.
///
/// Every ray has an azimuth and elevation angle, every ray shares the same gate ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanGeometry {
    // Distance from the radar to the center of each gate.
    range: Vec<Meters>,
    // Degrees clockwise from north, one per ray.
    azimuth: Vec<f64>,
    // Degrees above the horizon, one per ray.
    elevation: Vec<f64>,
    // Height of the antenna above mean sea level.
    altitude: Meters,
    // Latitude and longitude of the site.
    location: Option<(f64, f64)>,
}

impl ScanGeometry {
    /// Create a new geometry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::ScanGeometry;
    /// use metfor::Meters;
    ///
    /// let range: Vec<Meters> = (0..100).map(|i| Meters(150.0 * i as f64)).collect();
    /// let geom = ScanGeometry::new(range, vec![0.0, 1.0, 2.0], vec![0.5; 3], Meters(200.0));
    /// assert_eq!(geom.shape(), (3, 100));
    /// ```
    #[inline]
    pub fn new(
        range: Vec<Meters>,
        azimuth: Vec<f64>,
        elevation: Vec<f64>,
        altitude: Meters,
    ) -> Self {
        ScanGeometry {
            range,
            azimuth,
            elevation,
            altitude,
            location: None,
        }
    }

    /// Builder method to add the site location.
    #[inline]
    pub fn with_lat_lon<T>(mut self, coords: T) -> Self
    where
        Option<(f64, f64)>: From<T>,
    {
        self.location = Option::from(coords);
        self
    }

    /// Gate ranges.
    #[inline]
    pub fn range(&self) -> &[Meters] {
        &self.range
    }

    /// Ray azimuths in degrees.
    #[inline]
    pub fn azimuth(&self) -> &[f64] {
        &self.azimuth
    }

    /// Ray elevations in degrees.
    #[inline]
    pub fn elevation(&self) -> &[f64] {
        &self.elevation
    }

    /// Antenna altitude above mean sea level.
    #[inline]
    pub fn altitude(&self) -> Meters {
        self.altitude
    }

    /// Latitude and longitude.
    #[inline]
    pub fn location(&self) -> Option<(f64, f64)> {
        self.location
    }

    /// Number of rays.
    #[inline]
    pub fn nrays(&self) -> usize {
        self.azimuth.len()
    }

    /// Number of gates along each ray.
    #[inline]
    pub fn ngates(&self) -> usize {
        self.range.len()
    }

    /// The (rays, gates) shape every field in the volume must have.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrays(), self.ngates())
    }

    /// Mean spacing between gate centers, if there are at least two gates.
    pub fn gate_spacing(&self) -> Option<Meters> {
        match (self.range.first(), self.range.last()) {
            (Some(&first), Some(&last)) if self.range.len() > 1 => {
                Some(Meters((last - first).unpack() / (self.range.len() - 1) as f64))
            }
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.azimuth.len() != self.elevation.len() {
            return Err(RetrievalError::InvalidInputObject(format!(
                "{} azimuth angles but {} elevation angles",
                self.azimuth.len(),
                self.elevation.len()
            )));
        }

        if self.azimuth.is_empty() || self.range.is_empty() {
            return Err(RetrievalError::InvalidInputObject(
                "scan geometry has no rays or no gates".to_owned(),
            ));
        }

        let all_finite = self
            .range
            .iter()
            .map(|r| r.unpack())
            .chain(self.azimuth.iter().copied())
            .chain(self.elevation.iter().copied())
            .chain(std::iter::once(self.altitude.unpack()))
            .all(f64::is_finite);
        if !all_finite {
            return Err(RetrievalError::InvalidInputObject(
                "scan geometry contains non-finite values".to_owned(),
            ));
        }

        Ok(())
    }
}

/// A radar volume, the geometry of the scan plus every field measured or derived on it.
///
/// Fields are looked up by name. A volume is handed to `DualPolRetrieval`, which adds the derived
/// fields to it and hands it back.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarVolume {
    geometry: ScanGeometry,
    fields: BTreeMap<String, Field>,
    valid_time: Option<NaiveDateTime>,
}

impl RadarVolume {
    /// Create a volume with no fields.
    #[inline]
    pub fn new(geometry: ScanGeometry) -> Self {
        RadarVolume {
            geometry,
            fields: BTreeMap::new(),
            valid_time: None,
        }
    }

    /// Builder method to add a field.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::{Field, RadarVolume, ScanGeometry};
    /// use metfor::Meters;
    /// use ndarray::Array2;
    ///
    /// let geom = ScanGeometry::new(vec![Meters(0.0), Meters(150.0)], vec![0.0], vec![0.5], Meters(0.0));
    /// let vol = RadarVolume::new(geom)
    ///     .with_field("DZ", Field::new(Array2::from_elem((1, 2), 30.0)))
    ///     .unwrap();
    /// assert!(vol.field("DZ").is_some());
    ///
    /// // Fields must match the shape of the scan.
    /// let bad = vol.with_field("DR", Field::new(Array2::zeros((2, 2))));
    /// assert!(bad.is_err());
    /// ```
    pub fn with_field<S: Into<String>>(mut self, name: S, field: Field) -> Result<Self> {
        self.insert_field(name, field)?;
        Ok(self)
    }

    /// Builder method for the valid time of the scan.
    #[inline]
    pub fn with_valid_time<T>(mut self, valid_time: T) -> Self
    where
        Option<NaiveDateTime>: From<T>,
    {
        self.valid_time = Option::from(valid_time);
        self
    }

    /// The scan geometry.
    #[inline]
    pub fn geometry(&self) -> &ScanGeometry {
        &self.geometry
    }

    /// Valid time of the scan.
    #[inline]
    pub fn valid_time(&self) -> Option<NaiveDateTime> {
        self.valid_time
    }

    /// The (rays, gates) shape of the volume.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.geometry.shape()
    }

    /// Look up a field by name.
    #[inline]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    #[inline]
    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// Is there a field by this name?
    #[inline]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names of all the fields, in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Add a field, replacing and returning any field already stored under that name.
    ///
    /// Fails if the field's data or mask does not match the shape of the scan.
    pub fn insert_field<S: Into<String>>(&mut self, name: S, field: Field) -> Result<Option<Field>> {
        let name = name.into();
        self.check_shape(&name, &field)?;
        Ok(self.fields.insert(name, field))
    }

    /// Remove a field from the volume.
    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        self.fields.remove(name)
    }

    /// Store the outputs of one stage as fields derived from the base field `base`.
    ///
    /// Every output is checked against the shape of the volume before any is stored, so either
    /// all of them are stored or none are. Existing fields with the same names are replaced.
    pub(crate) fn commit_derived(
        &mut self,
        base: &str,
        outputs: Vec<(String, Array2<f64>, FieldMeta)>,
        bad: f64,
    ) -> Result<()> {
        for (name, raw, _) in &outputs {
            let expected = self.shape();
            let found = raw.dim();
            if found != expected {
                return Err(RetrievalError::ShapeMismatch {
                    name: name.clone(),
                    expected,
                    found,
                });
            }
        }

        let base = self
            .field(base)
            .ok_or_else(|| {
                RetrievalError::InvalidInputObject(format!("no base field `{}` to derive from", base))
            })?
            .clone();

        for (name, raw, meta) in outputs {
            let fld = derive_field(&base, raw, meta, bad);
            self.fields.insert(name, fld);
        }

        Ok(())
    }

    /// Check the geometry and the shape of every field.
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        self.fields
            .iter()
            .try_for_each(|(name, field)| self.check_shape(name, field))
            .map_err(|err| RetrievalError::InvalidInputObject(err.to_string()))
    }

    fn check_shape(&self, name: &str, field: &Field) -> Result<()> {
        let expected = self.shape();

        let mask_shape = field.mask().map(|m| m.dim());
        for found in std::iter::once(field.shape()).chain(mask_shape) {
            if found != expected {
                return Err(RetrievalError::ShapeMismatch {
                    name: name.to_owned(),
                    expected,
                    found,
                });
            }
        }

        Ok(())
    }
}
