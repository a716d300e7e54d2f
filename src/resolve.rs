//! Resolve configured field names against what is actually in a radar volume.
//!
//! Resolution happens once, before any stage runs. Each role is looked up in a fixed order and
//! the first rule in `RULES` matching the role and whether its field is present decides what
//! happens to it.
use crate::{
    config::FieldNames,
    error::{Notice, Result, RetrievalError},
    keys::FieldRole,
    volume::RadarVolume,
};

/// Where the specific differential phase comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KdpSource {
    /// A field already in the volume.
    Present(String),
    /// Compute it from this differential phase field.
    Compute {
        /// Name of the differential phase field.
        differential_phase: String,
    },
}

/// The field names a retrieval run will use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFields {
    /// Reflectivity, the base field for all derived fields.
    pub reflectivity: String,
    /// Differential reflectivity.
    pub differential_reflectivity: String,
    /// Correlation coefficient.
    pub correlation_coefficient: String,
    /// Linear depolarization ratio, if it is used.
    pub depolarization_ratio: Option<String>,
    /// Specific differential phase.
    pub kdp: KdpSource,
}

impl ResolvedFields {
    /// Does the specific differential phase need to be computed?
    #[inline]
    pub fn computes_kdp(&self) -> bool {
        matches!(self.kdp, KdpSource::Compute { .. })
    }

    /// Names of every volume field the run reads as input.
    pub fn input_names(&self) -> Vec<&str> {
        let kdp = match self.kdp {
            KdpSource::Present(ref name) => name,
            KdpSource::Compute {
                ref differential_phase,
            } => differential_phase,
        };

        let mut names = vec![
            self.reflectivity.as_str(),
            self.differential_reflectivity.as_str(),
            self.correlation_coefficient.as_str(),
            kdp.as_str(),
        ];
        names.extend(self.depolarization_ratio.as_deref());
        names
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Presence {
    Unnamed,
    Absent,
    Present,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Keep,
    Drop,
    Skip,
    Compute,
    Fail,
}

// (role, presence) => outcome. A `None` presence matches anything.
const RULES: &[(FieldRole, Option<Presence>, Outcome)] = &[
    (LDR, Some(Presence::Unnamed), Outcome::Skip),
    (LDR, Some(Presence::Absent), Outcome::Drop),
    (KDP, Some(Presence::Present), Outcome::Keep),
    (KDP, None, Outcome::Compute),
    (FieldRole::DifferentialPhase, Some(Presence::Present), Outcome::Keep),
    (FieldRole::Reflectivity, Some(Presence::Present), Outcome::Keep),
    (FieldRole::DifferentialReflectivity, Some(Presence::Present), Outcome::Keep),
    (FieldRole::CorrelationCoefficient, Some(Presence::Present), Outcome::Keep),
    (LDR, Some(Presence::Present), Outcome::Keep),
];

const LDR: FieldRole = FieldRole::LinearDepolarizationRatio;
const KDP: FieldRole = FieldRole::SpecificDifferentialPhase;

// Roles in the order they are resolved. Differential phase is only looked at when it is needed.
const ORDER: [FieldRole; 5] = [
    FieldRole::Reflectivity,
    FieldRole::DifferentialReflectivity,
    FieldRole::CorrelationCoefficient,
    FieldRole::LinearDepolarizationRatio,
    FieldRole::SpecificDifferentialPhase,
];

fn lookup(role: FieldRole, presence: Presence) -> Outcome {
    RULES
        .iter()
        .find(|(r, p, _)| *r == role && p.map(|p| p == presence).unwrap_or(true))
        .map(|&(_, _, outcome)| outcome)
        .unwrap_or(Outcome::Fail)
}

fn presence(names: &FieldNames, vol: &RadarVolume, role: FieldRole) -> Presence {
    match names.name(role) {
        None => Presence::Unnamed,
        Some(name) if vol.has_field(name) => Presence::Present,
        Some(_) => Presence::Absent,
    }
}

fn missing(names: &FieldNames, role: FieldRole) -> RetrievalError {
    RetrievalError::MissingRequiredField {
        role,
        name: names.name(role).map(str::to_owned),
    }
}

/// Decide which fields a run uses.
///
/// Fails with `MissingRequiredField` if reflectivity, differential reflectivity, or correlation
/// coefficient is missing, or if specific differential phase is not available and there is no
/// differential phase field to compute it from. A linear depolarization ratio that is named but
/// missing is dropped with a notice.
///
/// # Examples
///
/// ```rust
/// use dualpol_analysis::{doctest::make_test_volume, resolve_fields, FieldNames, KdpSource};
///
/// let vol = make_test_volume(2, 10);
/// let mut names = FieldNames::default();
/// names.differential_phase = Some("DP".to_owned());
///
/// let (resolved, notices) = resolve_fields(&names, &vol).unwrap();
/// assert_eq!(resolved.kdp, KdpSource::Compute { differential_phase: "DP".to_owned() });
/// assert_eq!(notices.len(), 1);
/// ```
pub fn resolve_fields(
    names: &FieldNames,
    vol: &RadarVolume,
) -> Result<(ResolvedFields, Vec<Notice>)> {
    let mut notices = vec![];
    let mut kept: Vec<(FieldRole, String)> = vec![];
    let mut kdp = None;

    for &role in ORDER.iter() {
        match lookup(role, presence(names, vol, role)) {
            Outcome::Keep => {
                if let Some(name) = names.name(role) {
                    kept.push((role, name.to_owned()));
                }
            }
            Outcome::Drop => {
                if let Some(name) = names.name(role) {
                    notices.push(Notice::OptionalFieldDropped {
                        role,
                        name: name.to_owned(),
                    });
                }
            }
            Outcome::Skip => {}
            Outcome::Compute => {
                let dp_role = FieldRole::DifferentialPhase;
                match lookup(dp_role, presence(names, vol, dp_role)) {
                    Outcome::Keep => {
                        let from = names.name(dp_role).map(str::to_owned).unwrap_or_default();
                        notices.push(Notice::SpecificDifferentialPhaseComputed {
                            from: from.clone(),
                        });
                        kdp = Some(KdpSource::Compute {
                            differential_phase: from,
                        });
                    }
                    _ => return Err(missing(names, role)),
                }
            }
            Outcome::Fail => return Err(missing(names, role)),
        }
    }

    let take = |role: FieldRole| {
        kept.iter()
            .find(|(r, _)| *r == role)
            .map(|(_, name)| name.clone())
    };

    let reflectivity =
        take(FieldRole::Reflectivity).ok_or_else(|| missing(names, FieldRole::Reflectivity))?;
    let differential_reflectivity = take(FieldRole::DifferentialReflectivity)
        .ok_or_else(|| missing(names, FieldRole::DifferentialReflectivity))?;
    let correlation_coefficient = take(FieldRole::CorrelationCoefficient)
        .ok_or_else(|| missing(names, FieldRole::CorrelationCoefficient))?;
    let depolarization_ratio = take(FieldRole::LinearDepolarizationRatio);
    let kdp = match take(FieldRole::SpecificDifferentialPhase) {
        Some(name) => KdpSource::Present(name),
        None => kdp.ok_or_else(|| missing(names, FieldRole::SpecificDifferentialPhase))?,
    };

    Ok((
        ResolvedFields {
            reflectivity,
            differential_reflectivity,
            correlation_coefficient,
            depolarization_ratio,
            kdp,
        },
        notices,
    ))
}
