use thiserror::Error;

use crate::{SegmentKind, VisualTier};

/// Configuration faults detected while wiring templates and tuning together.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The template list was empty.
    #[error("at least one segment template is required")]
    NoTemplates,
    /// The pool was asked to hold zero instances per kind.
    #[error("pool must hold at least one instance per kind")]
    ZeroInstances,
    /// Template kinds are not dense or not ordered by index.
    #[error("template at position {expected} declares kind {found}")]
    KindMismatch {
        /// Kind implied by the template's position.
        expected: SegmentKind,
        /// Kind the template declared.
        found: SegmentKind,
    },
    /// A non-zero hazard minimum applies to a tier with no hazard slots.
    #[error("kind {kind} has no hazard slots in the {tier:?} tier but {minimum} hazards are required")]
    MinimumWithoutHazards {
        /// Kind of the offending template.
        kind: SegmentKind,
        /// Visual tier whose resolved hazard array is empty.
        tier: VisualTier,
        /// Minimum that cannot be satisfied.
        minimum: u32,
    },
    /// A tuning value lies outside its valid range.
    #[error("tuning field `{field}` has invalid value {value}")]
    InvalidTuning {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
}
