//! Data type for a single radar field and the rules for deriving new fields from it.
//!
//! A `Field` is a 2-D array indexed by (ray, gate) with an optional validity mask. Gates where
//! the mask is `true` hold no usable data. When a field is handed to an algorithm that knows
//! nothing about masks, the masked gates are replaced with a bad data sentinel, see
//! [`Field::filled`].
//!
//! Fields created by the retrievals never decide their own validity. They are built with
//! [`derive_field`], which copies the current mask and fill value of the base reflectivity field,
//! so no derived product is ever valid at a gate where the quality controlled reflectivity is
//! not.
use ndarray::{Array2, Zip};
use optional::Optioned;

/// Descriptive metadata for a field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMeta {
    /// Units, e.g. `dBZ`.
    pub units: String,
    /// Long descriptive name.
    pub long_name: String,
    /// Standard name.
    pub standard_name: String,
}

impl FieldMeta {
    /// Create a new set of metadata.
    pub fn new(units: &str, long_name: &str, standard_name: &str) -> Self {
        FieldMeta {
            units: units.to_owned(),
            long_name: long_name.to_owned(),
            standard_name: standard_name.to_owned(),
        }
    }
}

/// A (ray, gate) array of radar data with an optional mask.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    data: Array2<f64>,
    // `true` marks an invalid gate. `None` means every gate is valid.
    mask: Option<Array2<bool>>,
    fill_value: Optioned<f64>,
    meta: FieldMeta,
}

impl Field {
    /// Create a new field with no mask, no fill value, and empty metadata.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::Field;
    /// use ndarray::Array2;
    ///
    /// let fld = Field::new(Array2::from_elem((2, 3), 30.0));
    /// assert_eq!(fld.shape(), (2, 3));
    /// assert!(fld.mask().is_none());
    /// ```
    #[inline]
    pub fn new(data: Array2<f64>) -> Self {
        Field {
            data,
            mask: None,
            fill_value: Optioned::default(),
            meta: FieldMeta::default(),
        }
    }

    /// Builder method for the mask, `true` marks an invalid gate.
    ///
    /// The shape of the mask is checked when the field is added to a `RadarVolume`.
    #[inline]
    pub fn with_mask(mut self, mask: Array2<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Builder method for the fill value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::Field;
    /// use ndarray::Array2;
    /// use optional::none;
    ///
    /// let fld = Field::new(Array2::zeros((1, 1))).with_fill_value(-9999.0);
    /// assert_eq!(fld.fill_value().unpack(), -9999.0);
    ///
    /// let fld = fld.with_fill_value(none::<f64>());
    /// assert!(fld.fill_value().is_none());
    /// ```
    #[inline]
    pub fn with_fill_value<T>(mut self, fill_value: T) -> Self
    where
        Optioned<f64>: From<T>,
    {
        self.fill_value = Optioned::from(fill_value);
        self
    }

    /// Builder method for the metadata.
    #[inline]
    pub fn with_meta(mut self, meta: FieldMeta) -> Self {
        self.meta = meta;
        self
    }

    /// The raw data, including values at masked gates.
    #[inline]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// The mask, if there is one.
    #[inline]
    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.mask.as_ref()
    }

    /// The fill value used for masked gates when the field is written out.
    #[inline]
    pub fn fill_value(&self) -> Optioned<f64> {
        self.fill_value
    }

    /// Descriptive metadata.
    #[inline]
    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    /// The (rays, gates) shape of the data.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Is the gate at `idx` masked?
    #[inline]
    pub fn is_masked(&self, idx: (usize, usize)) -> bool {
        self.mask
            .as_ref()
            .and_then(|m| m.get(idx).copied())
            .unwrap_or(false)
    }

    /// The value at a gate, or none if the gate is masked or out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::Field;
    /// use ndarray::{arr2, Array2};
    ///
    /// let fld = Field::new(arr2(&[[1.0, 2.0]])).with_mask(arr2(&[[false, true]]));
    /// assert_eq!(fld.value((0, 0)).unpack(), 1.0);
    /// assert!(fld.value((0, 1)).is_none());
    /// assert!(fld.value((5, 5)).is_none());
    /// ```
    #[inline]
    pub fn value(&self, idx: (usize, usize)) -> Optioned<f64> {
        if self.is_masked(idx) {
            return Optioned::default();
        }
        Optioned::from(self.data.get(idx).copied())
    }

    /// Number of masked gates.
    pub fn masked_count(&self) -> usize {
        self.mask
            .as_ref()
            .map(|m| m.iter().filter(|&&masked| masked).count())
            .unwrap_or(0)
    }

    /// Copy the data into a plain array with `bad` substituted at every masked gate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dualpol_analysis::Field;
    /// use ndarray::arr2;
    ///
    /// let fld = Field::new(arr2(&[[1.0, 2.0, 3.0]]))
    ///     .with_mask(arr2(&[[false, true, false]]));
    /// assert_eq!(fld.filled(-32768.0), arr2(&[[1.0, -32768.0, 3.0]]));
    /// ```
    pub fn filled(&self, bad: f64) -> Array2<f64> {
        match self.mask {
            Some(ref mask) => Zip::from(&self.data)
                .and(mask)
                .map_collect(|&val, &masked| if masked { bad } else { val }),
            None => self.data.clone(),
        }
    }

    #[inline]
    pub(crate) fn set_mask(&mut self, mask: Array2<bool>) {
        self.mask = Some(mask);
    }
}

/// Build a derived field from the raw output of a retrieval algorithm.
///
/// The new field gets a verbatim copy of the base field's current mask (or no mask if the base
/// has none), the base field's fill value if it has one and `bad` otherwise, and `meta`. Later
/// changes to the base mask do not affect fields already derived from it.
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::{derive_field, Field, FieldMeta};
/// use ndarray::arr2;
///
/// let dz = Field::new(arr2(&[[30.0, 40.0]])).with_mask(arr2(&[[true, false]]));
/// let rain = derive_field(&dz, arr2(&[[2.5, 9.0]]), FieldMeta::default(), -32768.0);
///
/// assert_eq!(rain.mask(), dz.mask());
/// assert_eq!(rain.fill_value().unpack(), -32768.0);
/// ```
pub fn derive_field(base: &Field, raw: Array2<f64>, meta: FieldMeta, bad: f64) -> Field {
    let fill_value = base.fill_value.into_option().unwrap_or(bad);

    Field {
        data: raw,
        mask: base.mask.clone(),
        fill_value: Optioned::from(fill_value),
        meta,
    }
}
