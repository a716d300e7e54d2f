//! The retrieval engine, runs every stage on a radar volume in order.
use crate::{
    algorithms::{
        DsdInput, DsdOutput, FhcInput, MassInput, MassOutput, RainInput, RetrievalAlgorithms,
    },
    categories::HID_CATEGORIES,
    config::{RainMethod, RetrievalConfig},
    error::{Notice, Result, RetrievalError},
    field::Field,
    geometry::gate_heights,
    kdp::compute_kdp,
    keys::{DerivedField, FieldRole, Stage},
    qc::{apply_quality_control, QcReport},
    resolve::{resolve_fields, KdpSource, ResolvedFields},
    sounding::SoundingProfile,
    temperature::interpolate_temperature,
    volume::RadarVolume,
};
use log::{debug, info, warn};
use ndarray::{Array2, Array3, Axis};
use std::collections::HashSet;

/// Hydrometeor codes from per category scores of shape (categories, rays, gates).
///
/// The code at each gate is one more than the index of the highest score. Ties go to the lowest
/// index, and NaN scores never win unless every score is NaN, in which case the code is 1.
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::hydrometeor_codes;
/// use ndarray::Array3;
///
/// let mut scores = Array3::zeros((10, 1, 2));
/// scores[(8, 0, 0)] = 0.9;
/// scores[(1, 0, 1)] = 0.7;
/// scores[(4, 0, 1)] = 0.7;
///
/// let codes = hydrometeor_codes(&scores);
/// assert_eq!(codes[(0, 0)], 9.0);
/// assert_eq!(codes[(0, 1)], 2.0);
/// ```
pub fn hydrometeor_codes(scores: &Array3<f64>) -> Array2<f64> {
    scores.map_axis(Axis(0), |lane| {
        let (best, _) = lane
            .iter()
            .enumerate()
            .fold((0, std::f64::NAN), |(best, max), (i, &score)| {
                if score > max || (max.is_nan() && !score.is_nan()) {
                    (i, score)
                } else {
                    (best, max)
                }
            });
        (best + 1) as f64
    })
}

/// Polarimetric retrievals on a single radar volume.
///
/// The volume stays with the caller: the retrieval borrows it mutably for as long as it lives and
/// adds its derived fields to it. If construction fails the volume keeps every field that was
/// stored before the failure.
///
/// Construction runs every enabled stage: field resolution, specific differential phase (when it
/// has to be computed), sounding and temperature, quality control, then the hydrometeor
/// classification, rainfall, drop size distribution, and liquid/ice mass retrievals. Each
/// derived field is stored in the volume with the mask of the reflectivity field at the time it
/// was stored.
///
/// Problems that only affect one stage are recorded as [`Notice`]s and logged, the other stages
/// still run. Missing mandatory fields, an inconsistent volume or configuration, and algorithm
/// outputs of the wrong shape are errors.
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::{
///     doctest::{make_test_volume, FakeAlgorithms},
///     DualPolRetrieval, RetrievalConfig,
/// };
///
/// let mut vol = make_test_volume(4, 40);
/// let config = RetrievalConfig::new().with_differential_phase("DP");
/// let algs = FakeAlgorithms::default();
///
/// let retrieval = DualPolRetrieval::new(&mut vol, config, &algs).unwrap();
/// assert!(retrieval.sounding().is_none());
/// drop(retrieval);
///
/// for name in &["KDP_CSU", "FH", "rain", "method", "D0", "NW", "MU"] {
///     assert!(vol.has_field(name));
/// }
/// // No sounding, so no mass.
/// assert!(!vol.has_field("MW"));
/// ```
#[derive(Debug)]
pub struct DualPolRetrieval<'a> {
    volume: &'a mut RadarVolume,
    config: RetrievalConfig,
    resolved: ResolvedFields,
    kdp_name: String,

    sounding: Option<SoundingProfile>,
    // Meters above mean sea level
    gate_heights: Array2<f64>,
    // Celsius
    temperature: Option<Array2<f64>>,

    qc_report: Option<QcReport>,
    notices: Vec<Notice>,
    committed: HashSet<DerivedField>,
}

impl<'a> DualPolRetrieval<'a> {
    /// Run every enabled stage on `volume`.
    pub fn new<A: RetrievalAlgorithms + ?Sized>(
        volume: &'a mut RadarVolume,
        config: RetrievalConfig,
        algorithms: &A,
    ) -> Result<Self> {
        config.validate()?;
        volume.validate()?;

        let (resolved, notices) = resolve_fields(config.field_names(), volume)?;
        config.check_output_names(&resolved)?;
        for notice in &notices {
            warn!("{}", notice);
        }

        let mut committed = HashSet::new();
        let kdp_name = match resolved.kdp {
            KdpSource::Present(ref name) => name.clone(),
            KdpSource::Compute {
                ref differential_phase,
            } => {
                info!("running {}", Stage::SpecificDifferentialPhase);
                let name = compute_kdp(
                    volume,
                    &resolved.reflectivity,
                    differential_phase,
                    &config,
                    algorithms,
                )?;
                committed.extend(&[
                    DerivedField::SpecificDifferentialPhase,
                    DerivedField::FilteredDifferentialPhase,
                    DerivedField::DifferentialPhaseStdDev,
                ]);
                name
            }
        };

        let gate_heights = gate_heights(volume.geometry());

        let mut retrieval = DualPolRetrieval {
            volume,
            config,
            resolved,
            kdp_name,
            sounding: None,
            gate_heights,
            temperature: None,
            qc_report: None,
            notices,
            committed,
        };

        retrieval.load_sounding();

        if retrieval.config.qc() {
            retrieval.run_quality_control()?;
        }

        if retrieval.config.fhc() {
            let result = retrieval.run_classification(algorithms);
            retrieval.recover(Stage::Classification, result)?;
        }
        if retrieval.config.precip() {
            let result = retrieval.run_precipitation_rate(algorithms);
            retrieval.recover(Stage::PrecipitationRate, result)?;
        }
        if retrieval.config.dsd() {
            let result = retrieval.run_dsd(algorithms);
            retrieval.recover(Stage::DropSizeDistribution, result)?;
        }
        if retrieval.config.liquid_ice() {
            let result = retrieval.run_liquid_ice_mass(algorithms);
            retrieval.recover(Stage::LiquidIceMass, result)?;
        }

        Ok(retrieval)
    }

    /// The volume with every derived field added so far.
    #[inline]
    pub fn volume(&self) -> &RadarVolume {
        self.volume
    }

    /// The configuration of this run.
    #[inline]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Every recoverable problem encountered so far, in order.
    #[inline]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// The normalized sounding, if one was configured and usable.
    #[inline]
    pub fn sounding(&self) -> Option<&SoundingProfile> {
        self.sounding.as_ref()
    }

    /// Temperature (C) at every gate, if there is a usable sounding.
    #[inline]
    pub fn temperature(&self) -> Option<&Array2<f64>> {
        self.temperature.as_ref()
    }

    /// Height (m MSL) of every gate.
    #[inline]
    pub fn gate_heights(&self) -> &Array2<f64> {
        &self.gate_heights
    }

    /// The field names used by this run.
    #[inline]
    pub fn resolved_fields(&self) -> &ResolvedFields {
        &self.resolved
    }

    /// Name of the specific differential phase field used by the retrievals.
    #[inline]
    pub fn kdp_name(&self) -> &str {
        &self.kdp_name
    }

    /// Gate counts from quality control, if it ran.
    #[inline]
    pub fn qc_report(&self) -> Option<QcReport> {
        self.qc_report
    }

    /// Is temperature used in the hydrometeor classification?
    #[inline]
    pub fn uses_temperature(&self) -> bool {
        self.config.use_temp() && self.temperature.is_some()
    }

    /// Has this run stored `fld` in the volume?
    #[inline]
    pub fn has_committed(&self, fld: DerivedField) -> bool {
        self.committed.contains(&fld)
    }

    /// Run the hydrometeor classification, replacing any earlier output.
    ///
    /// With winter retrievals requested this does nothing and records a notice.
    pub fn run_classification<A: RetrievalAlgorithms + ?Sized>(
        &mut self,
        algorithms: &A,
    ) -> Result<()> {
        if self.winter_stub(Stage::Classification) {
            return Ok(());
        }
        info!("running {}", Stage::Classification);

        let scores = {
            let temperature = if self.config.use_temp() {
                self.temperature.as_ref()
            } else {
                None
            };

            let input = FhcInput {
                reflectivity: self.reflectivity()?,
                differential_reflectivity: self.differential_reflectivity()?,
                correlation_coefficient: self.input(
                    &self.resolved.correlation_coefficient,
                    FieldRole::CorrelationCoefficient,
                )?,
                specific_differential_phase: self.specific_differential_phase()?,
                depolarization_ratio: self
                    .resolved
                    .depolarization_ratio
                    .as_deref()
                    .map(|name| self.input(name, FieldRole::LinearDepolarizationRatio))
                    .transpose()?,
                temperature,
                band: self.config.band(),
                method: self.config.fhc_method(),
                weights: self.config.fhc_weights(),
                t_factor: self.config.fhc_t_factor(),
            };

            algorithms.hydrometeor_scores(&input)
        };

        let (categories, rays, gates) = scores.dim();
        if categories != HID_CATEGORIES {
            return Err(RetrievalError::InvalidInputObject(format!(
                "classification returned scores for {} categories, expected {}",
                categories, HID_CATEGORIES
            )));
        }

        let expected = self.volume.shape();
        if (rays, gates) != expected {
            return Err(RetrievalError::ShapeMismatch {
                name: self.config.output_name(DerivedField::HydrometeorId),
                expected,
                found: (rays, gates),
            });
        }

        let codes = hydrometeor_codes(&scores);
        self.commit(vec![(DerivedField::HydrometeorId, codes)])
    }

    /// Run the rainfall retrieval, replacing any earlier output.
    ///
    /// The `hidro` method needs a hydrometeor classification stored by this run and fails with
    /// `InvalidRetrievalDependency` otherwise, without calling the algorithm. With winter
    /// retrievals requested this does nothing and records a notice.
    pub fn run_precipitation_rate<A: RetrievalAlgorithms + ?Sized>(
        &mut self,
        algorithms: &A,
    ) -> Result<()> {
        if self.winter_stub(Stage::PrecipitationRate) {
            return Ok(());
        }

        let fhc_name = self.config.output_name(DerivedField::HydrometeorId);
        if self.config.rain_method() == RainMethod::Hidro
            && !self.has_committed(DerivedField::HydrometeorId)
        {
            return Err(missing_classification(&fhc_name));
        }

        info!(
            "running {} with the {} method",
            Stage::PrecipitationRate,
            self.config.rain_method()
        );

        let outputs = {
            let input = RainInput {
                reflectivity: self.reflectivity()?,
                differential_reflectivity: self.differential_reflectivity()?,
                specific_differential_phase: self.specific_differential_phase()?,
                band: self.config.band(),
            };

            match self.config.rain_method() {
                RainMethod::Hidro => {
                    let fhc = self
                        .volume
                        .field(&fhc_name)
                        .ok_or_else(|| missing_classification(&fhc_name))?;
                    let out = algorithms.hidro_rain(&input, fhc);
                    vec![
                        (DerivedField::RainRate, out.rate),
                        (DerivedField::RainMethod, out.method),
                    ]
                }
                RainMethod::Blended => {
                    let ice_flag = self.config.ice_flag();
                    let out = algorithms.blended_rain(&input, ice_flag);
                    let mut outputs = vec![
                        (DerivedField::RainRate, out.rate),
                        (DerivedField::RainMethod, out.method),
                    ];
                    if let (true, Some((zdp, fi))) = (ice_flag, out.ice) {
                        outputs.push((DerivedField::DifferenceReflectivity, zdp));
                        outputs.push((DerivedField::IceFraction, fi));
                    }
                    outputs
                }
            }
        };

        self.commit(outputs)
    }

    /// Run the drop size distribution retrieval, replacing any earlier output.
    pub fn run_dsd<A: RetrievalAlgorithms + ?Sized>(&mut self, algorithms: &A) -> Result<()> {
        info!("running {}", Stage::DropSizeDistribution);

        let DsdOutput { d0, nw, mu } = algorithms.drop_size_distribution(&DsdInput {
            reflectivity: self.reflectivity()?,
            differential_reflectivity: self.differential_reflectivity()?,
            specific_differential_phase: self.specific_differential_phase()?,
            band: self.config.band(),
        });

        self.commit(vec![
            (DerivedField::MedianVolumeDiameter, d0),
            (DerivedField::NormalizedIntercept, nw),
            (DerivedField::Mu, mu),
        ])
    }

    /// Run the liquid and ice mass retrieval, replacing any earlier output.
    ///
    /// Fails with `InvalidRetrievalDependency` if there is no temperature at each gate.
    pub fn run_liquid_ice_mass<A: RetrievalAlgorithms + ?Sized>(
        &mut self,
        algorithms: &A,
    ) -> Result<()> {
        let temperature =
            self.temperature
                .as_ref()
                .ok_or_else(|| RetrievalError::InvalidRetrievalDependency {
                    stage: Stage::LiquidIceMass,
                    requires: "a temperature sounding".to_owned(),
                })?;

        info!("running {}", Stage::LiquidIceMass);

        let height_km = &self.gate_heights / 1000.0;
        let MassOutput { liquid, ice } = algorithms.liquid_ice_mass(&MassInput {
            reflectivity: self.reflectivity()?,
            differential_reflectivity: self.differential_reflectivity()?,
            height_km: &height_km,
            temperature,
        });

        self.commit(vec![
            (DerivedField::LiquidMass, liquid),
            (DerivedField::IceMass, ice),
        ])
    }

    fn load_sounding(&mut self) {
        let src = match self.config.sounding() {
            Some(src) => src,
            None => return,
        };

        info!("loading {}", Stage::Sounding);
        match SoundingProfile::from_source(src) {
            Ok(snd) => {
                debug!(
                    "sounding has {} usable levels, station {:?}",
                    snd.len(),
                    snd.station()
                );
                self.temperature = interpolate_temperature(&snd, &self.gate_heights);
                self.sounding = Some(snd);
            }
            Err(error) => self.notice(Notice::StageFailed {
                stage: Stage::Sounding,
                error,
            }),
        }
    }

    fn run_quality_control(&mut self) -> Result<()> {
        info!("running {}", Stage::QualityControl);

        let report = apply_quality_control(
            &mut *self.volume,
            &self.resolved.reflectivity,
            &self.resolved.differential_reflectivity,
            &self.config,
        )?;

        match report {
            Some(report) => {
                debug!("{:?}", report);
                self.qc_report = Some(report);
            }
            None => {
                let missing = self
                    .config
                    .output_name(DerivedField::DifferentialPhaseStdDev);
                self.notice(Notice::QualityControlSkipped { missing });
            }
        }

        Ok(())
    }

    // Turn a failed dependency into a notice, any other error is passed on.
    fn recover(&mut self, stage: Stage, result: Result<()>) -> Result<()> {
        match result {
            Err(error @ RetrievalError::InvalidRetrievalDependency { .. }) => {
                self.notice(Notice::StageFailed { stage, error });
                Ok(())
            }
            other => other,
        }
    }

    fn winter_stub(&mut self, stage: Stage) -> bool {
        if self.config.winter() {
            self.notice(Notice::WinterNotEnabled(stage));
        }
        self.config.winter()
    }

    fn notice(&mut self, notice: Notice) {
        warn!("{}", notice);
        self.notices.push(notice);
    }

    fn commit(&mut self, outputs: Vec<(DerivedField, Array2<f64>)>) -> Result<()> {
        let kinds: Vec<DerivedField> = outputs.iter().map(|(fld, _)| *fld).collect();
        let outputs = outputs
            .into_iter()
            .map(|(fld, raw)| (self.config.output_name(fld), raw, fld.metadata()))
            .collect();

        self.volume
            .commit_derived(&self.resolved.reflectivity, outputs, self.config.bad())?;

        for fld in kinds {
            debug!("stored {}", self.config.output_name(fld));
            self.committed.insert(fld);
        }

        Ok(())
    }

    fn input(&self, name: &str, role: FieldRole) -> Result<&Field> {
        self.volume
            .field(name)
            .ok_or_else(|| RetrievalError::MissingRequiredField {
                role,
                name: Some(name.to_owned()),
            })
    }

    fn reflectivity(&self) -> Result<&Field> {
        self.input(&self.resolved.reflectivity, FieldRole::Reflectivity)
    }

    fn differential_reflectivity(&self) -> Result<&Field> {
        self.input(
            &self.resolved.differential_reflectivity,
            FieldRole::DifferentialReflectivity,
        )
    }

    fn specific_differential_phase(&self) -> Result<&Field> {
        self.input(&self.kdp_name, FieldRole::SpecificDifferentialPhase)
    }
}

fn missing_classification(name: &str) -> RetrievalError {
    RetrievalError::InvalidRetrievalDependency {
        stage: Stage::PrecipitationRate,
        requires: format!("the hydrometeor classification field `{}`", name),
    }
}
