#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Run context wiring the pool and the corridor systems together.
//!
//! A [`RunContext`] owns exactly one instance of every component and drives
//! them in a fixed order each tick. Hosts feed it the observer position, the
//! optional freshness ratio, and player notifications, and receive [`Event`]
//! signals in return.

use std::time::Duration;

use corridor_core::{
    ArmContext, ConfigError, Event, PlayerEvent, SegmentContent, SegmentId, SegmentTemplate,
};
use corridor_pool::{query, PoolConfig, SegmentPool};
use corridor_system_content::{validate_templates, ContentGenerator, ContentTuning};
use corridor_system_difficulty::{Difficulty, DifficultyTuning};
use corridor_system_effects::{EffectTuning, Effects};
use corridor_system_streaming::{StreamConfig, Streaming};
use serde::Deserialize;

/// Complete configuration of a run context.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Pool sizing and seed.
    pub pool: PoolConfig,
    /// Streaming window configuration.
    pub stream: StreamConfig,
    /// Content generation tuning.
    pub content: ContentTuning,
    /// Difficulty controller tuning.
    pub difficulty: DifficultyTuning,
    /// Timed effect tuning.
    pub effects: EffectTuning,
    /// Score awards.
    pub scoring: ScoringConfig,
}

/// Points awarded on top of the distance counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points per collectible pickup.
    pub collectible_points: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            collectible_points: 2,
        }
    }
}

/// Lifecycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Built but not started.
    Ready,
    /// Streaming and scoring.
    Running,
    /// Finished; only effects keep advancing.
    Over,
}

/// Per-tick inputs supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickInput {
    /// Observer position along the travel axis.
    pub observer_position: f32,
    /// Freshness ratio in `[0, 1]`, absent when no collaborator tracks it.
    pub freshness: Option<f32>,
}

/// Outcome of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Final run score.
    pub score: u32,
    /// Best score after the run.
    pub best_score: u32,
    /// Whether the run beat the previous best score.
    pub new_record: bool,
    /// Segments released behind the observer.
    pub segments_cleared: u32,
    /// Longest streak of segments cleared without a hit.
    pub longest_survival_streak: u32,
}

/// Owner of one pool and one instance of every corridor system.
#[derive(Debug)]
pub struct RunContext {
    pool: SegmentPool,
    streaming: Streaming,
    generator: ContentGenerator,
    difficulty: Difficulty,
    effects: Effects,
    scoring: ScoringConfig,
    state: RunState,
    pickup_points: u32,
    high_score: u32,
}

impl RunContext {
    /// Validates the configuration and templates and builds every component.
    pub fn new(
        config: RunConfig,
        templates: &[SegmentTemplate],
        high_score: u32,
    ) -> Result<Self, ConfigError> {
        validate_templates(templates, &config.content)?;
        config.difficulty.validate()?;

        let pool = SegmentPool::new(templates, config.pool)?;
        let streaming = Streaming::new(config.stream)?;
        let generator = ContentGenerator::new(config.content, query::session_seed(&pool));

        Ok(Self {
            pool,
            streaming,
            generator,
            difficulty: Difficulty::new(config.difficulty),
            effects: Effects::new(config.effects),
            scoring: config.scoring,
            state: RunState::Ready,
            pickup_points: 0,
            high_score,
        })
    }

    /// Starts a fresh run and preloads the corridor.
    ///
    /// Any previous run is discarded: the pool is reset and reseeded, the
    /// systems are reseeded from the new session seed, and running effects
    /// are cancelled.
    pub fn start(&mut self, out: &mut Vec<Event>) {
        self.pool.reset_all();
        let seed = query::session_seed(&self.pool);
        self.generator.reseed(seed);
        self.streaming.reseed(seed.rotate_left(32));
        self.difficulty.reset();
        self.effects.cancel_all(out);
        self.pickup_points = 0;
        self.streaming.begin_run(&mut self.pool, self.high_score);

        let spawn = self.difficulty.spawn_parameters(0, None);
        let generator = &mut self.generator;
        let mut arm = |content: &mut SegmentContent, context: ArmContext| {
            let _ = generator.arm(content, context.with_spawn(spawn));
        };
        self.streaming.preload(0, &mut self.pool, &mut arm, out);

        self.state = RunState::Running;
        tracing::info!(
            session_seed = seed,
            high_score = self.high_score,
            segments = self.streaming.window_len(),
            "run started"
        );
    }

    /// Advances the run by `dt` of unscaled time.
    ///
    /// Effects advance first on unscaled time; the difficulty controller then
    /// advances on time scaled by the current slow-motion factor, spawn
    /// parameters are recomputed, and the stream runs ensure-ahead followed by
    /// cleanup-behind.
    pub fn tick(&mut self, dt: Duration, input: TickInput, out: &mut Vec<Event>) {
        self.effects.tick(dt, out);
        if self.state != RunState::Running {
            return;
        }

        self.difficulty.tick(dt.mul_f32(self.effects.time_scale()));

        let score = self.score();
        let spawn = self.difficulty.spawn_parameters(score, input.freshness);
        let generator = &mut self.generator;
        let mut arm = |content: &mut SegmentContent, context: ArmContext| {
            let _ = generator.arm(content, context.with_spawn(spawn));
        };
        self.streaming
            .tick(input.observer_position, score, &mut self.pool, &mut arm, out);
    }

    /// Forwards a player notification. Ignored unless the run is active.
    pub fn record(&mut self, event: PlayerEvent) {
        if self.state != RunState::Running {
            return;
        }
        self.difficulty.record(event);
        if event == PlayerEvent::CollectiblePickup {
            self.pickup_points += self.scoring.collectible_points;
        }
    }

    /// Consumes one child item of a collectible group and records the pickup.
    ///
    /// Returns `false` when the run is not active or the item was not live.
    pub fn collect_item(&mut self, segment: SegmentId, group: usize, item: usize) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        let collected = self
            .pool
            .content_mut(segment)
            .map_or(false, |content| content.collect_item(group, item));
        if collected {
            self.record(PlayerEvent::CollectiblePickup);
        }
        collected
    }

    /// Ends the run, starts the closing effects, and caches a new best score.
    pub fn finish(&mut self, out: &mut Vec<Event>) -> RunSummary {
        let score = self.score();
        let new_record = self.state == RunState::Running && score > self.high_score;
        if self.state == RunState::Running {
            self.state = RunState::Over;
            let tuning = *self.effects.tuning();
            self.effects.flash(out);
            self.effects.slow_motion(
                tuning.crash_time_scale,
                Duration::from_secs_f32(tuning.crash_slow_motion_secs.max(0.0)),
                out,
            );
            if new_record {
                self.high_score = score;
                self.effects.show_notice(out);
            }
        }

        let summary = RunSummary {
            score,
            best_score: self.high_score,
            new_record,
            segments_cleared: self.streaming.segments_cleared(),
            longest_survival_streak: self.difficulty.state().longest_survival_streak(),
        };
        tracing::info!(
            score = summary.score,
            best = summary.best_score,
            new_record = summary.new_record,
            "run finished"
        );
        summary
    }

    /// Run score: segments cleared plus pickup points.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.streaming.segments_cleared() + self.pickup_points
    }

    /// Best score known to the context.
    #[must_use]
    pub const fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Read-only access to the pool.
    #[must_use]
    pub const fn pool(&self) -> &SegmentPool {
        &self.pool
    }

    /// Read-only access to the stream controller.
    #[must_use]
    pub const fn streaming(&self) -> &Streaming {
        &self.streaming
    }

    /// Read-only access to the difficulty controller.
    #[must_use]
    pub const fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    /// Read-only access to the timed effects.
    #[must_use]
    pub const fn effects(&self) -> &Effects {
        &self.effects
    }
}
