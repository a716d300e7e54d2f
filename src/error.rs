//! Error and notice types for the dualpol-analysis crate.
use crate::keys::{FieldRole, Stage};
use std::fmt;

/// Error type for the crate.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RetrievalError {
    /// A mandatory field is absent from the volume, or cannot be derived from another field.
    #[error(
        "required {role} field {} is not available in the radar volume",
        .name.as_deref().unwrap_or("(unnamed)")
    )]
    MissingRequiredField {
        /// The role the field was meant to fill.
        role: FieldRole,
        /// The name it was looked up under, if one was configured.
        name: Option<String>,
    },

    /// A stage needs the output of another stage that has not been committed.
    #[error("the {stage} stage requires {requires}, which has not been computed")]
    InvalidRetrievalDependency {
        /// The stage that could not run.
        stage: Stage,
        /// Description of the missing input.
        requires: String,
    },

    /// The sounding is missing, unreadable, or has too few usable levels.
    #[error("sounding unavailable: {0}")]
    SoundingUnavailable(String),

    /// The radar volume is not internally consistent.
    #[error("invalid input object: {0}")]
    InvalidInputObject(String),

    /// A configuration option is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An array does not match the shape of the radar volume.
    #[error("field `{name}` has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Name of the offending field.
        name: String,
        /// The (rays, gates) shape of the volume.
        expected: (usize, usize),
        /// The shape that was supplied.
        found: (usize, usize),
    },
}

/// Shorthand for results.
pub type Result<T> = ::std::result::Result<T, RetrievalError>;

/// A recoverable condition encountered while running the retrievals.
///
/// Every notice is also logged at the `warn` level when it is recorded.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// An optional field was named in the configuration but is not in the volume.
    OptionalFieldDropped {
        /// Role of the dropped field.
        role: FieldRole,
        /// The name it was looked up under.
        name: String,
    },
    /// Specific differential phase was not available and is computed from differential phase.
    SpecificDifferentialPhaseComputed {
        /// Name of the differential phase field used.
        from: String,
    },
    /// Quality control was requested but the phase noise field does not exist.
    QualityControlSkipped {
        /// Name of the missing phase noise field.
        missing: String,
    },
    /// Winter retrievals are not implemented, the stage did nothing.
    WinterNotEnabled(Stage),
    /// A stage failed without affecting the others.
    StageFailed {
        /// The stage that failed.
        stage: Stage,
        /// Why.
        error: RetrievalError,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::OptionalFieldDropped { role, name } => {
                write!(f, "{} field `{}` not found, not using it", role, name)
            }
            Notice::SpecificDifferentialPhaseComputed { from } => write!(
                f,
                "specific differential phase not provided, calculating it from `{}`",
                from
            ),
            Notice::QualityControlSkipped { missing } => {
                write!(f, "cannot do quality control, no `{}` field", missing)
            }
            Notice::WinterNotEnabled(stage) => {
                write!(f, "winter {} not enabled yet, skipping", stage)
            }
            Notice::StageFailed { stage, error } => write!(f, "{} stage skipped: {}", stage, error),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = RetrievalError::MissingRequiredField {
            role: FieldRole::Reflectivity,
            name: Some("DZ".to_owned()),
        };
        assert_eq!(
            err.to_string(),
            "required reflectivity field DZ is not available in the radar volume"
        );

        let err = RetrievalError::MissingRequiredField {
            role: FieldRole::SpecificDifferentialPhase,
            name: None,
        };
        assert!(err.to_string().contains("(unnamed)"));
    }

    #[test]
    fn test_dependency_message() {
        let err = RetrievalError::InvalidRetrievalDependency {
            stage: Stage::PrecipitationRate,
            requires: "field `FH`".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "the precipitation rate stage requires field `FH`, which has not been computed"
        );
    }

    #[test]
    fn test_notice_display() {
        let notice = Notice::WinterNotEnabled(Stage::Classification);
        assert_eq!(
            notice.to_string(),
            "winter hydrometeor classification not enabled yet, skipping"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_impl<T: std::error::Error + Send + Sync>() {}
        assert_impl::<RetrievalError>();
    }
}
