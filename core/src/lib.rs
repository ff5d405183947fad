#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the corridor streaming engine.
//!
//! This crate defines the vocabulary that connects the segment pool, the pure
//! systems, and the run context. The pool owns [`SegmentContent`] values built
//! from [`SegmentTemplate`] layouts, systems mutate them only through transient
//! borrows, and every observable change is broadcast as an [`Event`] so that
//! audio or presentation collaborators can react without reaching into
//! component state.

use std::fmt;

use serde::{Deserialize, Serialize};

mod content;
mod error;

pub use content::{
    CollectibleGroup, ContentArrays, ContentLayout, ContentSource, SegmentContent,
    SegmentTemplate, SlotArray, SlotLayout, VariantLayouts,
};
pub use error::ConfigError;

/// Type index of a segment template. Kinds are dense, starting at zero.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SegmentKind(u32);

impl SegmentKind {
    /// Kind reserved for the deterministic first segment of every run.
    pub const SAFE_START: Self = Self(0);

    /// Creates a new segment kind from its numeric index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric index of the kind.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable handle of a single pooled segment instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u32);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Visual tier selecting which slot variant arrays a segment presents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualTier {
    /// Variant arrays used early in a run.
    Easy,
    /// Variant arrays used once the run score passes the medium threshold.
    Medium,
    /// Variant arrays used once the run score passes the hard threshold.
    Hard,
}

impl VisualTier {
    /// Every visual tier in ascending order.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Position of the tier within [`VisualTier::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }
}

/// Discrete difficulty bucket projected from the continuous performance score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DifficultyTier {
    /// Combined difficulty below the first cutoff.
    Easy,
    /// Second bucket.
    Medium,
    /// Third bucket.
    Hard,
    /// Fourth bucket.
    Insane,
    /// Combined difficulty at or above the last cutoff.
    Nightmare,
}

impl DifficultyTier {
    /// Every tier ordered from easiest to hardest.
    pub const ALL: [Self; 5] = [
        Self::Easy,
        Self::Medium,
        Self::Hard,
        Self::Insane,
        Self::Nightmare,
    ];

    /// Position of the tier within [`DifficultyTier::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
            Self::Insane => 3,
            Self::Nightmare => 4,
        }
    }
}

/// Spawn-probability bundle consumed by the content generator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnParameters {
    /// Probability that an individual hazard slot activates.
    pub hazard_probability: f32,
    /// Floor on the number of hazards a segment presents.
    pub min_hazards: u32,
    /// Probability that a collectible group activates.
    pub collectible_probability: f32,
    /// Probability that a bonus pickup activates.
    pub bonus_probability: f32,
    /// Probability of a special event, forwarded to collaborators untouched.
    pub event_probability: f32,
}

/// Inputs forwarded to the content generator for a single segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmContext {
    /// Current run score.
    pub score: u32,
    /// Best score recorded before the run started.
    pub high_score: u32,
    /// Adaptive spawn parameters, absent when no difficulty controller is wired.
    pub spawn: Option<SpawnParameters>,
}

impl ArmContext {
    /// Creates a score-only context without adaptive parameters.
    #[must_use]
    pub const fn new(score: u32, high_score: u32) -> Self {
        Self {
            score,
            high_score,
            spawn: None,
        }
    }

    /// Attaches adaptive spawn parameters to the context.
    #[must_use]
    pub const fn with_spawn(mut self, spawn: SpawnParameters) -> Self {
        self.spawn = Some(spawn);
        self
    }
}

/// Zero-argument player notifications consumed by the difficulty controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerEvent {
    /// The player picked up a collectible item.
    CollectiblePickup,
    /// The player collided with a hazard.
    HazardHit,
    /// The player narrowly avoided a hazard.
    NearMiss,
    /// The player cleared a segment without hitting a hazard.
    SegmentSurvived,
    /// The player picked up a bonus.
    BonusPickup,
}

/// Timed effects modelled as resumable tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Transient notice that hides itself after a delay.
    Notice,
    /// Two-phase flash fade.
    Flash,
    /// Temporary time-scale override.
    SlowMotion,
}

/// Signals broadcast to collaborators as the corridor changes.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A segment was positioned, armed, and activated at the window tail.
    SegmentActivated {
        /// Identifier of the activated instance.
        segment: SegmentId,
        /// Kind of the activated instance.
        kind: SegmentKind,
        /// World-space start offset along the travel axis.
        start: f32,
    },
    /// A segment left the window and returned to the pool.
    SegmentReleased {
        /// Identifier of the released instance.
        segment: SegmentId,
        /// Kind of the released instance.
        kind: SegmentKind,
    },
    /// A spawn was skipped because the pool had no idle instance of any kind.
    SpawnDeferred {
        /// Kind that was requested.
        requested: SegmentKind,
    },
    /// The pool handed out a different kind than the one requested.
    KindSubstituted {
        /// Kind that was requested.
        requested: SegmentKind,
        /// Kind that was supplied instead.
        supplied: SegmentKind,
    },
    /// A timed effect reached its terminal state.
    EffectFinished {
        /// Effect that finished.
        effect: EffectKind,
        /// Whether the effect was cut short by a replacement or cancellation.
        cancelled: bool,
    },
}
