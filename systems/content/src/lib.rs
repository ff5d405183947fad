#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Constrained-random content generation for corridor segments.
//!
//! Arming a segment runs four steps in a fixed order: visual tier selection,
//! hazard activation with a minimum-count backfill, collectible groups, and
//! bonus pickups. Every step is a pure function of the segment's slot state,
//! the run score, the best score, optional adaptive spawn parameters, and
//! uniform draws from a seeded generator.

use corridor_core::{
    ArmContext, CollectibleGroup, ConfigError, SegmentContent, SegmentTemplate, SlotArray,
    VisualTier,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

/// Aggregated tuning knobs for every generation step.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContentTuning {
    /// Score thresholds selecting the visual tier.
    pub visuals: VisualTuning,
    /// Score bounds separating the difficulty phases.
    pub phases: PhaseBounds,
    /// Hazard ramp parameters.
    pub hazards: HazardTuning,
    /// Collectible group probabilities.
    pub collectibles: CollectibleTuning,
    /// Bonus pickup probabilities.
    pub bonuses: BonusTuning,
    /// Weight of the adaptive spawn parameters when blended with the score
    /// ramp. Zero keeps the pure ramp, one hands control to the difficulty
    /// controller. The phase minimum is never lowered by the blend.
    pub adaptive_weight: f32,
}

impl Default for ContentTuning {
    fn default() -> Self {
        Self {
            visuals: VisualTuning::default(),
            phases: PhaseBounds::default(),
            hazards: HazardTuning::default(),
            collectibles: CollectibleTuning::default(),
            bonuses: BonusTuning::default(),
            adaptive_weight: 0.0,
        }
    }
}

impl ContentTuning {
    /// Rejects tuning that would break the ramp's assumptions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hazards.variation >= 0.0) {
            return Err(ConfigError::InvalidTuning {
                field: "hazards.variation",
                value: self.hazards.variation,
            });
        }
        if !(0.0..=1.0).contains(&self.adaptive_weight) {
            return Err(ConfigError::InvalidTuning {
                field: "adaptive_weight",
                value: self.adaptive_weight,
            });
        }
        let spans = [
            ("hazards.nightmare_span", self.hazards.nightmare_span),
            ("hazards.nightmare_minimum_step", self.hazards.nightmare_minimum_step),
            ("hazards.record_span", self.hazards.record_span),
            ("collectibles.reduction_span", self.collectibles.reduction_span),
            ("bonuses.reduction_span", self.bonuses.reduction_span),
        ];
        for (field, value) in spans {
            if !(value > 0.0) {
                return Err(ConfigError::InvalidTuning { field, value });
            }
        }
        let probabilities = [
            ("hazards.ceiling", self.hazards.ceiling),
            ("collectibles.floor", self.collectibles.floor),
            ("bonuses.floor", self.bonuses.floor),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidTuning { field, value });
            }
        }
        let bounds = self.phases.as_array();
        if !(bounds[0] > 0.0) {
            return Err(ConfigError::InvalidTuning {
                field: "phases.easy",
                value: bounds[0],
            });
        }
        for (index, pair) in bounds.windows(2).enumerate() {
            if !(pair[1] > pair[0]) {
                return Err(ConfigError::InvalidTuning {
                    field: PhaseBounds::FIELDS[index + 1],
                    value: pair[1],
                });
            }
        }
        Ok(())
    }
}

/// Score thresholds for the visual tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VisualTuning {
    /// Score at which the medium arrays are presented.
    pub medium_score: u32,
    /// Score at which the hard arrays are presented.
    pub hard_score: u32,
}

impl Default for VisualTuning {
    fn default() -> Self {
        Self {
            medium_score: 40,
            hard_score: 80,
        }
    }
}

/// Upper score bounds of the first four difficulty phases.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhaseBounds {
    /// End of the easy phase.
    pub easy: f32,
    /// End of the medium phase.
    pub medium: f32,
    /// End of the hard phase.
    pub hard: f32,
    /// End of the insane phase; everything beyond is nightmare.
    pub insane: f32,
}

impl Default for PhaseBounds {
    fn default() -> Self {
        Self {
            easy: 50.0,
            medium: 150.0,
            hard: 400.0,
            insane: 800.0,
        }
    }
}

impl PhaseBounds {
    const FIELDS: [&'static str; 4] = ["phases.easy", "phases.medium", "phases.hard", "phases.insane"];

    fn as_array(&self) -> [f32; 4] {
        [self.easy, self.medium, self.hard, self.insane]
    }

    /// Phase the provided score falls into.
    #[must_use]
    pub fn phase(&self, score: f32) -> Phase {
        self.as_array()
            .iter()
            .position(|bound| score < *bound)
            .map_or(Phase::Nightmare, |index| Phase::ALL[index])
    }
}

/// Difficulty phase of the score ramp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Gentle introduction.
    Easy,
    /// First ramp.
    Medium,
    /// Serious challenge.
    Hard,
    /// Near-maximum density.
    Insane,
    /// Endless scaling beyond the last bound.
    Nightmare,
}

impl Phase {
    /// Every phase in ascending order.
    pub const ALL: [Self; 5] = [
        Self::Easy,
        Self::Medium,
        Self::Hard,
        Self::Insane,
        Self::Nightmare,
    ];

    /// Position of the phase within [`Phase::ALL`].
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

/// Hazard ramp parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Probability at score zero.
    pub base_probability: f32,
    /// Half-width of the uniform jitter applied per slot.
    pub variation: f32,
    /// Probability reached at the end of each phase, nightmare being the
    /// starting value beyond the last bound.
    pub phase_probabilities: [f32; 5],
    /// Minimum hazard count within each phase.
    pub phase_minimums: [u32; 5],
    /// Score span over which the nightmare probability grows by its cap.
    pub nightmare_span: f32,
    /// Largest extra probability granted in the nightmare phase.
    pub nightmare_growth_cap: f32,
    /// Score step beyond the last bound that adds one more minimum hazard.
    pub nightmare_minimum_step: f32,
    /// Absolute probability ceiling.
    pub ceiling: f32,
    /// Score span beyond the best score that grants one record step.
    pub record_span: f32,
    /// Probability added per record span.
    pub record_step: f32,
    /// Largest probability bonus granted for beating the best score.
    pub record_cap: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            base_probability: 0.30,
            variation: 0.15,
            phase_probabilities: [0.35, 0.55, 0.75, 0.88, 0.95],
            phase_minimums: [0, 1, 2, 3, 4],
            nightmare_span: 500.0,
            nightmare_growth_cap: 0.07,
            nightmare_minimum_step: 200.0,
            ceiling: 0.98,
            record_span: 100.0,
            record_step: 0.05,
            record_cap: 0.15,
        }
    }
}

/// Hazard probability and minimum resolved for a score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardTarget {
    /// Phase the score falls into.
    pub phase: Phase,
    /// Per-slot activation probability before jitter.
    pub probability: f32,
    /// Number of hazards guaranteed by the backfill pass.
    pub minimum: u32,
}

impl HazardTuning {
    /// Resolves the ramp for the provided scores and hazard slot count.
    #[must_use]
    pub fn target(
        &self,
        bounds: &PhaseBounds,
        score: u32,
        high_score: u32,
        slots: usize,
    ) -> HazardTarget {
        let value = score as f32;
        let phase = bounds.phase(value);
        let ends = bounds.as_array();

        let (mut probability, minimum) = match phase {
            Phase::Nightmare => {
                let beyond = value - bounds.insane;
                let growth = (beyond / self.nightmare_span).min(self.nightmare_growth_cap);
                let probability =
                    (self.phase_probabilities[Phase::Nightmare.index()] + growth).min(self.ceiling);
                let extra = (beyond / self.nightmare_minimum_step).floor() as u32;
                let minimum = self.phase_minimums[Phase::Nightmare.index()]
                    .saturating_add(extra)
                    .min(slots.saturating_sub(1) as u32);
                (probability, minimum)
            }
            _ => {
                let index = phase.index();
                let (from, start) = if index == 0 {
                    (self.base_probability, 0.0)
                } else {
                    (self.phase_probabilities[index - 1], ends[index - 1])
                };
                let to = self.phase_probabilities[index];
                let t = (value - start) / (ends[index] - start);
                (lerp(from, to, t), self.phase_minimums[index])
            }
        };

        if high_score > 0 && score > high_score {
            let beyond = (score - high_score) as f32;
            let bonus = (beyond / self.record_span * self.record_step).min(self.record_cap);
            probability = (probability + bonus).min(self.ceiling);
        }

        HazardTarget {
            phase,
            probability,
            minimum,
        }
    }

    /// Largest minimum any phase may demand.
    fn demanded_minimum(&self) -> u32 {
        self.phase_minimums.iter().copied().max().unwrap_or(0)
    }
}

/// Collectible group probabilities.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollectibleTuning {
    /// Activation probability before the hard phase ends.
    pub probability: f32,
    /// Score span over which the reduction reaches its cap.
    pub reduction_span: f32,
    /// Largest reduction applied beyond the hard phase.
    pub reduction_cap: f32,
    /// Probability floor.
    pub floor: f32,
}

impl Default for CollectibleTuning {
    fn default() -> Self {
        Self {
            probability: 0.6,
            reduction_span: 1_000.0,
            reduction_cap: 0.25,
            floor: 0.35,
        }
    }
}

impl CollectibleTuning {
    /// Probability that a group activates at the provided score.
    #[must_use]
    pub fn probability(&self, bounds: &PhaseBounds, score: u32) -> f32 {
        reduced(
            self.probability,
            score as f32 - bounds.hard,
            self.reduction_span,
            self.reduction_cap,
            self.floor,
        )
    }
}

/// Bonus pickup probabilities.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BonusTuning {
    /// Score below which bonuses never appear.
    pub minimum_score: u32,
    /// Activation probability before the insane phase ends.
    pub probability: f32,
    /// Score span over which the reduction reaches its cap.
    pub reduction_span: f32,
    /// Largest reduction applied beyond the insane phase.
    pub reduction_cap: f32,
    /// Probability floor.
    pub floor: f32,
}

impl Default for BonusTuning {
    fn default() -> Self {
        Self {
            minimum_score: 200,
            probability: 0.15,
            reduction_span: 1_000.0,
            reduction_cap: 0.08,
            floor: 0.07,
        }
    }
}

impl BonusTuning {
    /// Probability that a bonus slot activates, `None` below the minimum score.
    #[must_use]
    pub fn probability(&self, bounds: &PhaseBounds, score: u32) -> Option<f32> {
        (score >= self.minimum_score).then(|| {
            reduced(
                self.probability,
                score as f32 - bounds.insane,
                self.reduction_span,
                self.reduction_cap,
                self.floor,
            )
        })
    }
}

fn reduced(probability: f32, beyond: f32, span: f32, cap: f32, floor: f32) -> f32 {
    if beyond > 0.0 {
        (probability - (beyond / span).min(cap)).max(floor)
    } else {
        probability
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Chooses the visual tier for the provided score.
#[must_use]
pub fn select_visual_tier(tuning: &VisualTuning, score: u32) -> VisualTier {
    if score < tuning.medium_score {
        VisualTier::Easy
    } else if score < tuning.hard_score {
        VisualTier::Medium
    } else {
        VisualTier::Hard
    }
}

/// Counts produced by [`activate_hazards`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HazardOutcome {
    /// Total active hazards after both passes.
    pub activated: usize,
    /// Hazards turned on by the minimum-guarantee pass.
    pub backfilled: usize,
}

/// Activates hazard slots in two passes.
///
/// The first pass activates each slot when a uniform draw falls below the
/// probability jittered by `±variation`. The second pass shuffles every slot
/// index and turns on inactive slots in that order until `minimum` is met or
/// the slots run out.
pub fn activate_hazards<R: Rng>(
    slots: &mut SlotArray,
    probability: f32,
    variation: f32,
    minimum: u32,
    rng: &mut R,
) -> HazardOutcome {
    let mut activated = 0;
    for index in 0..slots.len() {
        let chance = probability + rng.gen_range(-variation..=variation);
        let active = rng.gen::<f32>() < chance;
        slots.set_active(index, active);
        if active {
            activated += 1;
        }
    }

    let minimum = minimum as usize;
    if activated >= minimum {
        return HazardOutcome {
            activated,
            backfilled: 0,
        };
    }

    let mut indices: Vec<usize> = (0..slots.len()).collect();
    indices.shuffle(rng);
    let mut backfilled = 0;
    for index in indices {
        if activated >= minimum {
            break;
        }
        if !slots.is_active(index) {
            slots.set_active(index, true);
            activated += 1;
            backfilled += 1;
        }
    }

    HazardOutcome {
        activated,
        backfilled,
    }
}

/// Activates each collectible group with the provided probability.
///
/// Returns the number of active groups.
pub fn activate_collectibles<R: Rng>(
    groups: &mut [CollectibleGroup],
    probability: f32,
    rng: &mut R,
) -> usize {
    let mut activated = 0;
    for group in groups {
        if rng.gen::<f32>() < probability {
            group.activate();
            activated += 1;
        } else {
            group.deactivate();
        }
    }
    activated
}

/// Activates each bonus slot with the provided probability. A `None`
/// probability keeps every slot inactive without drawing.
pub fn activate_bonuses<R: Rng>(
    slots: &mut SlotArray,
    probability: Option<f32>,
    rng: &mut R,
) -> usize {
    let Some(probability) = probability else {
        slots.deactivate_all();
        return 0;
    };
    let mut activated = 0;
    for index in 0..slots.len() {
        let active = rng.gen::<f32>() < probability;
        slots.set_active(index, active);
        if active {
            activated += 1;
        }
    }
    activated
}

/// Rejects templates whose resolved hazard array is empty in a visual tier
/// while the ramp demands a nonzero minimum.
pub fn validate_templates(
    templates: &[SegmentTemplate],
    tuning: &ContentTuning,
) -> Result<(), ConfigError> {
    tuning.validate()?;
    let minimum = tuning.hazards.demanded_minimum();
    if minimum == 0 {
        return Ok(());
    }
    for template in templates {
        for tier in VisualTier::ALL {
            if template.layout.hazard_slots(tier) == 0 {
                return Err(ConfigError::MinimumWithoutHazards {
                    kind: template.kind,
                    tier,
                    minimum,
                });
            }
        }
    }
    Ok(())
}

/// Summary of a single arming pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmReport {
    /// Visual tier that was selected.
    pub visual_tier: VisualTier,
    /// Difficulty phase of the score.
    pub phase: Phase,
    /// Hazard probability after blending, before jitter.
    pub hazard_probability: f32,
    /// Minimum hazard count after blending.
    pub min_hazards: u32,
    /// Active hazards.
    pub hazards: usize,
    /// Hazards turned on by the backfill pass.
    pub backfilled: usize,
    /// Active collectible groups.
    pub collectibles: usize,
    /// Active bonus slots.
    pub bonuses: usize,
}

/// Seeded content generator.
#[derive(Debug)]
pub struct ContentGenerator {
    tuning: ContentTuning,
    rng: ChaCha8Rng,
}

impl ContentGenerator {
    /// Creates a generator seeded with the provided value.
    #[must_use]
    pub fn new(tuning: ContentTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Restarts the random stream from a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Tuning the generator was built with.
    #[must_use]
    pub fn tuning(&self) -> &ContentTuning {
        &self.tuning
    }

    /// Resets and re-populates the provided segment content.
    pub fn arm(&mut self, content: &mut SegmentContent, context: ArmContext) -> ArmReport {
        let tuning = &self.tuning;
        let visual_tier = select_visual_tier(&tuning.visuals, context.score);
        content.reset();
        content.select(visual_tier);

        let ramp = tuning.hazards.target(
            &tuning.phases,
            context.score,
            context.high_score,
            content.hazards().len(),
        );
        let mut hazard_probability = ramp.probability;
        let mut min_hazards = ramp.minimum;
        let mut collectible_probability = tuning
            .collectibles
            .probability(&tuning.phases, context.score);
        let mut bonus_probability = tuning.bonuses.probability(&tuning.phases, context.score);

        if let Some(spawn) = context.spawn {
            let weight = tuning.adaptive_weight;
            hazard_probability = blend(hazard_probability, spawn.hazard_probability, weight)
                .min(tuning.hazards.ceiling);
            min_hazards = (blend(min_hazards as f32, spawn.min_hazards as f32, weight).round()
                as u32)
                .max(ramp.minimum);
            collectible_probability = blend(
                collectible_probability,
                spawn.collectible_probability,
                weight,
            )
            .max(tuning.collectibles.floor);
            bonus_probability = bonus_probability.map(|probability| {
                blend(probability, spawn.bonus_probability, weight).max(tuning.bonuses.floor)
            });
        }

        let hazards = activate_hazards(
            content.hazards_mut(),
            hazard_probability,
            tuning.hazards.variation,
            min_hazards,
            &mut self.rng,
        );
        let collectibles = activate_collectibles(
            content.collectibles_mut(),
            collectible_probability,
            &mut self.rng,
        );
        let bonuses = activate_bonuses(content.bonuses_mut(), bonus_probability, &mut self.rng);

        let report = ArmReport {
            visual_tier,
            phase: ramp.phase,
            hazard_probability,
            min_hazards,
            hazards: hazards.activated,
            backfilled: hazards.backfilled,
            collectibles,
            bonuses,
        };
        tracing::debug!(
            score = context.score,
            tier = ?report.visual_tier,
            phase = ?report.phase,
            probability = report.hazard_probability,
            hazards = report.hazards,
            backfilled = report.backfilled,
            "armed segment"
        );
        report
    }
}

fn blend(ramp: f32, adaptive: f32, weight: f32) -> f32 {
    ramp + (adaptive - ramp) * weight
}
