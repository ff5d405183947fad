#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Distance-windowed streaming of pooled corridor segments.
//!
//! The stream keeps an ordered window of active segments ahead of the
//! observer. Every tick first extends the window until the lookahead distance
//! is covered and then releases segments that fell behind the trailing
//! margin. Spawning never stalls: when the pool is exhausted the spawn is
//! deferred and retried on the next tick.

use std::collections::VecDeque;

use corridor_core::{ArmContext, ConfigError, Event, SegmentContent, SegmentId, SegmentKind};
use corridor_pool::{query, SegmentPool};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

mod history;

pub use history::{select_kind, RecentKinds, Selection};

/// Configuration of the streaming window.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Length of every segment along the travel axis.
    pub segment_length: f32,
    /// Backward shift applied to every spawn position.
    pub overlap: f32,
    /// Distance ahead of the observer that must stay covered.
    pub lookahead: f32,
    /// Distance behind the observer after which segments are released.
    pub trailing_margin: f32,
    /// Target number of segments in the window.
    pub window_size: u32,
    /// Whether the preload spawns two extra segments.
    pub preload_extra: bool,
    /// Cursor position at the start of every run.
    pub initial_offset: f32,
    /// Number of recent kinds excluded from selection.
    pub history_capacity: usize,
    /// Largest number of draws per kind selection.
    pub max_draws: u32,
    /// Seed of the kind-selection stream.
    pub seed: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            segment_length: 30.0,
            overlap: 0.5,
            lookahead: 240.0,
            trailing_margin: 50.0,
            window_size: 5,
            preload_extra: true,
            initial_offset: 0.0,
            history_capacity: 5,
            max_draws: 20,
            seed: 0xbb67_ae85_84ca_a73b,
        }
    }
}

impl StreamConfig {
    /// Rejects configurations that could never produce a contiguous window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.segment_length > 0.0) {
            return Err(ConfigError::InvalidTuning {
                field: "segment_length",
                value: self.segment_length,
            });
        }
        if !(self.overlap >= 0.0 && self.overlap < self.segment_length) {
            return Err(ConfigError::InvalidTuning {
                field: "overlap",
                value: self.overlap,
            });
        }
        if !(self.lookahead >= 0.0) {
            return Err(ConfigError::InvalidTuning {
                field: "lookahead",
                value: self.lookahead,
            });
        }
        if !(self.trailing_margin >= 0.0) {
            return Err(ConfigError::InvalidTuning {
                field: "trailing_margin",
                value: self.trailing_margin,
            });
        }
        if self.window_size == 0 {
            return Err(ConfigError::InvalidTuning {
                field: "window_size",
                value: 0.0,
            });
        }
        if self.max_draws == 0 {
            return Err(ConfigError::InvalidTuning {
                field: "max_draws",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Number of segments spawned by a preload.
    #[must_use]
    pub fn preload_count(&self) -> u32 {
        if self.preload_extra {
            self.window_size + 2
        } else {
            self.window_size
        }
    }
}

/// Segment currently part of the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowEntry {
    /// Pooled instance backing the entry.
    pub segment: SegmentId,
    /// Kind of the instance.
    pub kind: SegmentKind,
    /// World-space start offset.
    pub start: f32,
}

/// Stream controller owning the active window.
#[derive(Debug)]
pub struct Streaming {
    config: StreamConfig,
    rng: ChaCha8Rng,
    window: VecDeque<WindowEntry>,
    history: RecentKinds,
    cursor: f32,
    spawned: u32,
    segments_cleared: u32,
    high_score: u32,
}

impl Streaming {
    /// Creates an idle stream.
    pub fn new(config: StreamConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            window: VecDeque::with_capacity(config.preload_count() as usize),
            history: RecentKinds::new(config.history_capacity),
            cursor: config.initial_offset,
            spawned: 0,
            segments_cleared: 0,
            high_score: 0,
            config,
        })
    }

    /// Restarts the kind-selection stream from a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Prepares a new run: releases leftover entries, clears the window and
    /// history, rewinds the cursor, and caches the best score.
    pub fn begin_run(&mut self, pool: &mut SegmentPool, high_score: u32) {
        for entry in self.window.drain(..) {
            pool.release(entry.segment);
        }
        self.history.clear();
        self.cursor = self.config.initial_offset;
        self.spawned = 0;
        self.segments_cleared = 0;
        self.high_score = high_score;
    }

    /// Advances the stream for the observer's current position.
    ///
    /// An empty window is preloaded first. Ensure-ahead always runs before
    /// cleanup-behind.
    pub fn tick<F>(
        &mut self,
        observer: f32,
        score: u32,
        pool: &mut SegmentPool,
        arm: &mut F,
        out: &mut Vec<Event>,
    ) where
        F: FnMut(&mut SegmentContent, ArmContext),
    {
        if self.window.is_empty() {
            self.preload(score, pool, arm, out);
        }
        self.ensure_ahead(observer, score, pool, arm, out);
        self.cleanup_behind(observer, pool, out);
    }

    /// Spawns the preload batch; the first spawn of a run is the safe start
    /// kind.
    pub fn preload<F>(
        &mut self,
        score: u32,
        pool: &mut SegmentPool,
        arm: &mut F,
        out: &mut Vec<Event>,
    ) where
        F: FnMut(&mut SegmentContent, ArmContext),
    {
        for _ in 0..self.config.preload_count() {
            let kind = self.next_kind(pool);
            if self.spawn_segment(kind, score, pool, arm, out).is_none() {
                break;
            }
        }
    }

    /// Checks out, positions, arms, and activates one segment of the
    /// requested kind at the window tail.
    ///
    /// Returns `None` and emits [`Event::SpawnDeferred`] when the pool is
    /// exhausted.
    pub fn spawn_segment<F>(
        &mut self,
        kind: SegmentKind,
        score: u32,
        pool: &mut SegmentPool,
        arm: &mut F,
        out: &mut Vec<Event>,
    ) -> Option<SegmentId>
    where
        F: FnMut(&mut SegmentContent, ArmContext),
    {
        let Some(checkout) = pool.checkout(kind) else {
            tracing::warn!(requested = kind.get(), "segment pool exhausted, deferring spawn");
            out.push(Event::SpawnDeferred { requested: kind });
            return None;
        };
        if checkout.substituted() {
            out.push(Event::KindSubstituted {
                requested: checkout.requested,
                supplied: checkout.kind,
            });
        }

        let start = self.cursor - self.config.overlap;
        pool.position(checkout.segment, start);
        if let Some(content) = pool.content_mut(checkout.segment) {
            arm(content, ArmContext::new(score, self.high_score));
        }
        pool.activate(checkout.segment);

        self.window.push_back(WindowEntry {
            segment: checkout.segment,
            kind: checkout.kind,
            start,
        });
        self.cursor += self.config.segment_length;
        self.spawned += 1;
        self.history.record(kind);
        out.push(Event::SegmentActivated {
            segment: checkout.segment,
            kind: checkout.kind,
            start,
        });
        Some(checkout.segment)
    }

    /// Segments released behind the observer since the run began.
    #[must_use]
    pub const fn segments_cleared(&self) -> u32 {
        self.segments_cleared
    }

    /// Entries of the window from oldest to newest.
    pub fn window(&self) -> impl Iterator<Item = &WindowEntry> {
        self.window.iter()
    }

    /// Number of entries in the window.
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// End position of the newest entry.
    #[must_use]
    pub fn last_end(&self) -> Option<f32> {
        self.window
            .back()
            .map(|entry| entry.start + self.config.segment_length)
    }

    /// Position at which the next segment will be placed before the overlap
    /// shift.
    #[must_use]
    pub const fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Recently spawned kinds.
    #[must_use]
    pub fn history(&self) -> &RecentKinds {
        &self.history
    }

    /// Configuration of the stream.
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    fn ensure_ahead<F>(
        &mut self,
        observer: f32,
        score: u32,
        pool: &mut SegmentPool,
        arm: &mut F,
        out: &mut Vec<Event>,
    ) where
        F: FnMut(&mut SegmentContent, ArmContext),
    {
        while let Some(last_end) = self.last_end() {
            if observer + self.config.lookahead < last_end {
                break;
            }
            let kind = self.next_kind(pool);
            if self.spawn_segment(kind, score, pool, arm, out).is_none() {
                break;
            }
        }
    }

    fn cleanup_behind(&mut self, observer: f32, pool: &mut SegmentPool, out: &mut Vec<Event>) {
        let length = self.config.segment_length;
        while let Some(oldest) = self.window.front().copied() {
            if oldest.start + length >= observer - self.config.trailing_margin {
                break;
            }
            pool.release(oldest.segment);
            let _ = self.window.pop_front();
            self.segments_cleared += 1;
            out.push(Event::SegmentReleased {
                segment: oldest.segment,
                kind: oldest.kind,
            });
        }
    }

    fn next_kind(&mut self, pool: &SegmentPool) -> SegmentKind {
        if self.spawned == 0 {
            return SegmentKind::SAFE_START;
        }
        let selection = select_kind(
            &mut self.rng,
            query::kind_count(pool),
            &self.history,
            self.config.max_draws,
        );
        if selection.fallback {
            tracing::debug!(
                kind = selection.kind.get(),
                "kind selection hit its draw cap"
            );
        }
        selection.kind
    }
}
