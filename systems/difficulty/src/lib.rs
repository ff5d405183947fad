#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Closed-loop difficulty controller driven by a rolling performance signal.
//!
//! Player notifications nudge a continuous performance score in `[0, 1]`,
//! time slowly relaxes it toward neutral, and the discrete difficulty tier is
//! projected from it on demand together with the run's raw score.

use std::time::Duration;

use corridor_core::{ConfigError, DifficultyTier, PlayerEvent, SpawnParameters};
use serde::Deserialize;

const SAMPLE_CAPACITY: usize = 10;

/// Tuning knobs of the difficulty controller.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Score the controller starts from and relaxes toward.
    pub neutral_score: f32,
    /// Speed, per second, at which the score relaxes toward neutral.
    pub decay_rate: f32,
    /// Base boost of a collectible pickup.
    pub pickup_boost: f32,
    /// Extra boost per consecutive pickup.
    pub pickup_streak_step: f32,
    /// Largest extra boost granted by a pickup streak.
    pub pickup_streak_cap: f32,
    /// Penalty of a hazard hit.
    pub hit_penalty: f32,
    /// Boost of a near miss.
    pub near_miss_boost: f32,
    /// Boost of a cleared segment.
    pub survival_boost: f32,
    /// Boost of a bonus pickup.
    pub bonus_pickup_boost: f32,
    /// Seconds without a hit before the score starts drifting upward.
    pub survival_grace_secs: f32,
    /// Upward drift per second once the grace period has elapsed.
    pub survival_drift: f32,
    /// Seconds between rolling-window samples.
    pub sample_interval_secs: f32,
    /// Raw score at which the score factor saturates.
    pub raw_score_span: f32,
    /// Weight of the performance score in the combined difficulty.
    pub performance_weight: f32,
    /// Combined difficulty at which each tier above easy begins.
    pub tier_cutoffs: [f32; 4],
    /// Base spawn parameters of each tier.
    pub tiers: [SpawnParameters; 5],
    /// Performance below which the struggling adjustment applies.
    pub struggling_below: f32,
    /// Adjustment applied to struggling players.
    pub struggling: Adjustment,
    /// Performance above which the dominating adjustment applies.
    pub dominating_above: f32,
    /// Adjustment applied to dominating players.
    pub dominating: Adjustment,
    /// Freshness ratio below which the desperation adjustment applies.
    pub freshness_below: f32,
    /// Adjustment applied when freshness is low.
    pub low_freshness: Adjustment,
    /// Final range of the hazard probability.
    pub hazard_range: ProbabilityRange,
    /// Final range of the collectible probability.
    pub collectible_range: ProbabilityRange,
    /// Final range of the bonus probability.
    pub bonus_range: ProbabilityRange,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            neutral_score: 0.5,
            decay_rate: 0.02,
            pickup_boost: 0.03,
            pickup_streak_step: 0.005,
            pickup_streak_cap: 0.03,
            hit_penalty: 0.15,
            near_miss_boost: 0.02,
            survival_boost: 0.008,
            bonus_pickup_boost: 0.05,
            survival_grace_secs: 5.0,
            survival_drift: 0.005,
            sample_interval_secs: 3.0,
            raw_score_span: 500.0,
            performance_weight: 0.6,
            tier_cutoffs: [0.25, 0.45, 0.65, 0.85],
            tiers: [
                tier(0.25, 0, 0.85, 0.20, 0.25),
                tier(0.45, 1, 0.75, 0.18, 0.30),
                tier(0.60, 2, 0.65, 0.15, 0.35),
                tier(0.75, 3, 0.55, 0.12, 0.40),
                tier(0.88, 4, 0.45, 0.10, 0.45),
            ],
            struggling_below: 0.3,
            struggling: Adjustment::new(-0.15, 0.15, 0.08),
            dominating_above: 0.7,
            dominating: Adjustment::new(0.10, -0.05, 0.0),
            freshness_below: 0.3,
            low_freshness: Adjustment::new(-0.10, 0.20, 0.15),
            hazard_range: ProbabilityRange::new(0.10, 0.92),
            collectible_range: ProbabilityRange::new(0.35, 0.95),
            bonus_range: ProbabilityRange::new(0.08, 0.35),
        }
    }
}

const fn tier(
    hazard_probability: f32,
    min_hazards: u32,
    collectible_probability: f32,
    bonus_probability: f32,
    event_probability: f32,
) -> SpawnParameters {
    SpawnParameters {
        hazard_probability,
        min_hazards,
        collectible_probability,
        bonus_probability,
        event_probability,
    }
}

impl DifficultyTuning {
    /// Rejects tuning that would stall sampling or break the tier projection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_interval_secs > 0.0) {
            return Err(ConfigError::InvalidTuning {
                field: "sample_interval_secs",
                value: self.sample_interval_secs,
            });
        }
        if !(self.raw_score_span > 0.0) {
            return Err(ConfigError::InvalidTuning {
                field: "raw_score_span",
                value: self.raw_score_span,
            });
        }
        if !(0.0..=1.0).contains(&self.performance_weight) {
            return Err(ConfigError::InvalidTuning {
                field: "performance_weight",
                value: self.performance_weight,
            });
        }
        if !(self.decay_rate >= 0.0) {
            return Err(ConfigError::InvalidTuning {
                field: "decay_rate",
                value: self.decay_rate,
            });
        }
        if let Some(pair) = self
            .tier_cutoffs
            .windows(2)
            .find(|pair| !(pair[1] > pair[0]))
        {
            return Err(ConfigError::InvalidTuning {
                field: "tier_cutoffs",
                value: pair[1],
            });
        }
        Ok(())
    }
}

/// Additive change applied to a spawn parameter bundle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Adjustment {
    /// Change of the hazard probability.
    pub hazard: f32,
    /// Change of the collectible probability.
    pub collectible: f32,
    /// Change of the bonus probability.
    pub bonus: f32,
}

impl Adjustment {
    /// Creates a new adjustment.
    #[must_use]
    pub const fn new(hazard: f32, collectible: f32, bonus: f32) -> Self {
        Self {
            hazard,
            collectible,
            bonus,
        }
    }

    fn apply(&self, parameters: &mut SpawnParameters) {
        parameters.hazard_probability += self.hazard;
        parameters.collectible_probability += self.collectible;
        parameters.bonus_probability += self.bonus;
    }
}

/// Inclusive clamp applied to a probability.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ProbabilityRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl ProbabilityRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }
}

/// Observed player performance.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceState {
    score: f32,
    samples: [f32; SAMPLE_CAPACITY],
    next_sample: usize,
    recent_average: f32,
    sample_elapsed: f32,
    since_last_hit: f32,
    pickup_streak: u32,
    survival_streak: u32,
    longest_survival_streak: u32,
    pickups: u32,
    hits: u32,
    near_misses: u32,
}

impl PerformanceState {
    fn neutral(score: f32) -> Self {
        Self {
            score,
            samples: [score; SAMPLE_CAPACITY],
            next_sample: 0,
            recent_average: score,
            sample_elapsed: 0.0,
            since_last_hit: 0.0,
            pickup_streak: 0,
            survival_streak: 0,
            longest_survival_streak: 0,
            pickups: 0,
            hits: 0,
            near_misses: 0,
        }
    }

    /// Continuous performance score; zero is struggling, one is dominating.
    #[must_use]
    pub const fn score(&self) -> f32 {
        self.score
    }

    /// Average of the rolling sample window.
    #[must_use]
    pub const fn recent_average(&self) -> f32 {
        self.recent_average
    }

    /// Seconds since the last hazard hit.
    #[must_use]
    pub const fn since_last_hit(&self) -> f32 {
        self.since_last_hit
    }

    /// Consecutive collectible pickups without a hit.
    #[must_use]
    pub const fn pickup_streak(&self) -> u32 {
        self.pickup_streak
    }

    /// Consecutive segments cleared without a hit.
    #[must_use]
    pub const fn survival_streak(&self) -> u32 {
        self.survival_streak
    }

    /// Longest survival streak of the run.
    #[must_use]
    pub const fn longest_survival_streak(&self) -> u32 {
        self.longest_survival_streak
    }

    /// Collectible pickups recorded this run.
    #[must_use]
    pub const fn pickups(&self) -> u32 {
        self.pickups
    }

    /// Hazard hits recorded this run.
    #[must_use]
    pub const fn hits(&self) -> u32 {
        self.hits
    }

    /// Near misses recorded this run.
    #[must_use]
    pub const fn near_misses(&self) -> u32 {
        self.near_misses
    }

    fn adjust(&mut self, delta: f32) {
        self.score = (self.score + delta).clamp(0.0, 1.0);
    }

    fn push_sample(&mut self) {
        self.samples[self.next_sample] = self.score;
        self.next_sample = (self.next_sample + 1) % SAMPLE_CAPACITY;
        self.recent_average = self.samples.iter().sum::<f32>() / SAMPLE_CAPACITY as f32;
    }
}

/// Difficulty controller owning the performance state.
#[derive(Clone, Debug)]
pub struct Difficulty {
    tuning: DifficultyTuning,
    state: PerformanceState,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::new(DifficultyTuning::default())
    }
}

impl Difficulty {
    /// Creates a controller in the neutral state.
    #[must_use]
    pub fn new(tuning: DifficultyTuning) -> Self {
        let state = PerformanceState::neutral(tuning.neutral_score);
        Self { tuning, state }
    }

    /// Read-only view of the performance state.
    #[must_use]
    pub fn state(&self) -> &PerformanceState {
        &self.state
    }

    /// Tuning the controller was built with.
    #[must_use]
    pub fn tuning(&self) -> &DifficultyTuning {
        &self.tuning
    }

    /// Restores the neutral state for a new run.
    pub fn reset(&mut self) {
        self.state = PerformanceState::neutral(self.tuning.neutral_score);
    }

    /// Overrides the performance score, clamped to `[0, 1]`.
    pub fn seed_score(&mut self, score: f32) {
        self.state.score = score.clamp(0.0, 1.0);
    }

    /// Applies every provided player notification in order.
    pub fn handle(&mut self, events: &[PlayerEvent]) {
        for event in events {
            self.record(*event);
        }
    }

    /// Applies a single player notification.
    pub fn record(&mut self, event: PlayerEvent) {
        let tuning = &self.tuning;
        let state = &mut self.state;
        match event {
            PlayerEvent::CollectiblePickup => {
                state.pickups += 1;
                state.pickup_streak += 1;
                let streak = (state.pickup_streak as f32 * tuning.pickup_streak_step)
                    .min(tuning.pickup_streak_cap);
                state.adjust(tuning.pickup_boost + streak);
            }
            PlayerEvent::HazardHit => {
                state.hits += 1;
                state.since_last_hit = 0.0;
                state.pickup_streak = 0;
                state.survival_streak = 0;
                state.adjust(-tuning.hit_penalty);
                tracing::debug!(score = state.score, "hazard hit lowered performance");
            }
            PlayerEvent::NearMiss => {
                state.near_misses += 1;
                state.adjust(tuning.near_miss_boost);
            }
            PlayerEvent::SegmentSurvived => {
                state.survival_streak += 1;
                state.longest_survival_streak =
                    state.longest_survival_streak.max(state.survival_streak);
                state.adjust(tuning.survival_boost);
            }
            PlayerEvent::BonusPickup => state.adjust(tuning.bonus_pickup_boost),
        }
    }

    /// Advances the controller by the provided play time.
    pub fn tick(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        let tuning = &self.tuning;
        let state = &mut self.state;

        state.since_last_hit += seconds;
        if state.since_last_hit > tuning.survival_grace_secs {
            state.score = (state.score + tuning.survival_drift * seconds).min(1.0);
        }

        state.sample_elapsed += seconds;
        while state.sample_elapsed >= tuning.sample_interval_secs {
            state.sample_elapsed -= tuning.sample_interval_secs;
            state.push_sample();
        }

        let step = tuning.decay_rate * seconds;
        let gap = tuning.neutral_score - state.score;
        state.score += gap.clamp(-step, step);
    }

    /// Projects the discrete tier from performance and the raw run score.
    #[must_use]
    pub fn tier(&self, raw_score: u32) -> DifficultyTier {
        let factor = (raw_score as f32 / self.tuning.raw_score_span).clamp(0.0, 1.0);
        let weight = self.tuning.performance_weight;
        let combined = self.state.score * weight + factor * (1.0 - weight);
        self.tuning
            .tier_cutoffs
            .iter()
            .position(|cutoff| combined < *cutoff)
            .map_or(DifficultyTier::Nightmare, |index| DifficultyTier::ALL[index])
    }

    /// Spawn parameters for the current tier after performance and freshness
    /// adjustments. A missing freshness ratio skips its adjustment.
    #[must_use]
    pub fn spawn_parameters(&self, raw_score: u32, freshness: Option<f32>) -> SpawnParameters {
        let tuning = &self.tuning;
        let mut parameters = tuning.tiers[self.tier(raw_score).index()];

        if self.state.score < tuning.struggling_below {
            tuning.struggling.apply(&mut parameters);
        } else if self.state.score > tuning.dominating_above {
            tuning.dominating.apply(&mut parameters);
        }

        if freshness.map_or(false, |ratio| ratio < tuning.freshness_below) {
            tuning.low_freshness.apply(&mut parameters);
        }

        parameters.hazard_probability = tuning.hazard_range.clamp(parameters.hazard_probability);
        parameters.collectible_probability = tuning
            .collectible_range
            .clamp(parameters.collectible_probability);
        parameters.bonus_probability = tuning.bonus_range.clamp(parameters.bonus_probability);
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_neutral() {
        let difficulty = Difficulty::default();
        assert_eq!(difficulty.state().score(), 0.5);
        assert_eq!(difficulty.state().recent_average(), 0.5);
        assert_eq!(difficulty.tier(0), DifficultyTier::Medium);
    }

    #[test]
    fn pickup_streak_grows_boost_up_to_cap() {
        let mut difficulty = Difficulty::default();
        difficulty.seed_score(0.0);
        difficulty.record(PlayerEvent::CollectiblePickup);
        assert!((difficulty.state().score() - 0.035).abs() < 1e-6);

        for _ in 0..9 {
            difficulty.record(PlayerEvent::CollectiblePickup);
        }
        let before = difficulty.state().score();
        difficulty.record(PlayerEvent::CollectiblePickup);
        assert!((difficulty.state().score() - before - 0.06).abs() < 1e-5);
        assert_eq!(difficulty.state().pickup_streak(), 11);
    }

    #[test]
    fn survival_streak_tracks_longest_run() {
        let mut difficulty = Difficulty::default();
        difficulty.handle(&[
            PlayerEvent::SegmentSurvived,
            PlayerEvent::SegmentSurvived,
            PlayerEvent::SegmentSurvived,
            PlayerEvent::HazardHit,
            PlayerEvent::SegmentSurvived,
        ]);
        assert_eq!(difficulty.state().survival_streak(), 1);
        assert_eq!(difficulty.state().longest_survival_streak(), 3);
        assert_eq!(difficulty.state().hits(), 1);
    }

    #[test]
    fn validation_rejects_zero_interval() {
        let mut tuning = DifficultyTuning::default();
        tuning.sample_interval_secs = 0.0;
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::InvalidTuning {
                field: "sample_interval_secs",
                ..
            })
        ));
        assert!(DifficultyTuning::default().validate().is_ok());
    }
}
