//! Headless host that drives a [`RunContext`] with a scripted player.

use std::time::Duration;

use corridor_core::{EffectKind, Event, PlayerEvent, SegmentContent, SegmentId};
use corridor_pool::query;
use corridor_runtime::{RunContext, RunSummary, TickInput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FRAME: Duration = Duration::from_millis(20);
const HIT_FACTOR: f32 = 0.25;
const NEAR_MISS_CHANCE: f32 = 0.4;
const MAX_SETTLE_FRAMES: u32 = 500;

/// Freshness resource drained over time and replenished by pickups.
///
/// A bonus pickup raises a shield for a fixed time instead of restoring
/// freshness; picking up another bonus restarts it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FreshnessMeter {
    value: f32,
    shield: Option<ShieldTask>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ShieldTask {
    remaining: f32,
}

impl FreshnessMeter {
    const MAX: f32 = 100.0;
    const DRAIN_PER_SEC: f32 = 3.0;
    const HIT_COST: f32 = 20.0;
    const PICKUP_GAIN: f32 = 8.0;
    const SHIELD_SECS: f32 = 6.0;
    const SHIELD_DRAIN_FACTOR: f32 = 0.3;
    const SHIELD_HIT_FACTOR: f32 = 0.25;

    pub(crate) fn full() -> Self {
        Self {
            value: Self::MAX,
            shield: None,
        }
    }

    /// Drains freshness over `seconds` of scaled time and advances the shield.
    pub(crate) fn drain(&mut self, seconds: f32) {
        let shielded = self
            .shield
            .map_or(0.0, |task| task.remaining.min(seconds));
        let effective = shielded * Self::SHIELD_DRAIN_FACTOR + (seconds - shielded);
        self.adjust(-Self::DRAIN_PER_SEC * effective);

        if let Some(task) = self.shield.as_mut() {
            task.remaining -= seconds;
            if task.remaining <= 0.0 {
                self.shield = None;
            }
        }
    }

    pub(crate) fn apply(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::HazardHit => {
                let factor = if self.shielded() {
                    Self::SHIELD_HIT_FACTOR
                } else {
                    1.0
                };
                self.adjust(-Self::HIT_COST * factor);
            }
            PlayerEvent::CollectiblePickup => self.adjust(Self::PICKUP_GAIN),
            PlayerEvent::BonusPickup => {
                self.shield = Some(ShieldTask {
                    remaining: Self::SHIELD_SECS,
                });
            }
            PlayerEvent::NearMiss | PlayerEvent::SegmentSurvived => {}
        }
    }

    pub(crate) fn shielded(&self) -> bool {
        self.shield.is_some()
    }

    pub(crate) fn ratio(&self) -> f32 {
        self.value / Self::MAX
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.value <= 0.0
    }

    fn adjust(&mut self, delta: f32) {
        self.value = (self.value + delta).clamp(0.0, Self::MAX);
    }
}

/// Scripted player behaviour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlayerProfile {
    /// Probability in `[0, 1]` of handling an obstacle or pickup well.
    pub(crate) skill: f32,
    /// Travel speed in world units per second.
    pub(crate) speed: f32,
    /// Seed of the player's decision stream.
    pub(crate) seed: u64,
}

/// Why the simulated run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EndReason {
    TimeLimit,
    Exhausted,
}

/// Tally of everything observed during a simulated run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tally {
    pub(crate) activated: u32,
    pub(crate) released: u32,
    pub(crate) deferred: u32,
    pub(crate) substituted: u32,
    pub(crate) effects_finished: u32,
    pub(crate) hits: u32,
    pub(crate) near_misses: u32,
    pub(crate) pickups: u32,
    pub(crate) bonuses: u32,
}

impl Tally {
    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::SegmentActivated { .. } => self.activated += 1,
                Event::SegmentReleased { .. } => self.released += 1,
                Event::SpawnDeferred { .. } => self.deferred += 1,
                Event::KindSubstituted { .. } => self.substituted += 1,
                Event::EffectFinished { .. } => self.effects_finished += 1,
            }
        }
    }

    fn count(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::HazardHit => self.hits += 1,
            PlayerEvent::NearMiss => self.near_misses += 1,
            PlayerEvent::CollectiblePickup => self.pickups += 1,
            PlayerEvent::BonusPickup => self.bonuses += 1,
            PlayerEvent::SegmentSurvived => {}
        }
    }
}

/// Result of a simulated run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Report {
    pub(crate) summary: RunSummary,
    pub(crate) end: EndReason,
    pub(crate) elapsed: Duration,
    pub(crate) distance: f32,
    pub(crate) tally: Tally,
}

/// Plays one run until `limit` of unscaled time passes or freshness runs out.
pub(crate) fn run(context: &mut RunContext, profile: PlayerProfile, limit: Duration) -> Report {
    let mut rng = ChaCha8Rng::seed_from_u64(profile.seed);
    let mut freshness = FreshnessMeter::full();
    let mut tally = Tally::default();
    let mut events = Vec::new();
    let mut observer = 0.0_f32;
    let mut evaluated_through = f32::NEG_INFINITY;
    let mut elapsed = Duration::ZERO;

    context.start(&mut events);
    tally.observe(&events);
    events.clear();

    let end = loop {
        if freshness.is_empty() {
            break EndReason::Exhausted;
        }
        if elapsed >= limit {
            break EndReason::TimeLimit;
        }

        let scaled = FRAME.as_secs_f32() * context.effects().time_scale();
        observer += profile.speed * scaled;
        freshness.drain(scaled);
        elapsed += FRAME;

        let length = context.streaming().config().segment_length;
        let mut plays = Vec::new();
        for entry in context.streaming().window() {
            let segment_end = entry.start + length;
            if segment_end > observer || segment_end <= evaluated_through {
                continue;
            }
            evaluated_through = segment_end;
            if let Some(instance) = query::instance(context.pool(), entry.segment) {
                plays.push(play_segment(
                    entry.segment,
                    instance.content(),
                    profile.skill,
                    &mut rng,
                ));
            }
        }
        for play in plays {
            for (group, item) in play.pickups {
                if context.collect_item(play.segment, group, item) {
                    freshness.apply(PlayerEvent::CollectiblePickup);
                    tally.count(PlayerEvent::CollectiblePickup);
                }
            }
            for event in play.events {
                freshness.apply(event);
                tally.count(event);
                context.record(event);
            }
        }

        let input = TickInput {
            observer_position: observer,
            freshness: Some(freshness.ratio()),
        };
        context.tick(FRAME, input, &mut events);
        tally.observe(&events);
        events.clear();
    };

    let summary = context.finish(&mut events);
    tally.observe(&events);
    events.clear();

    let settle = TickInput {
        observer_position: observer,
        freshness: None,
    };
    for _ in 0..MAX_SETTLE_FRAMES {
        if !running_effects(context) {
            break;
        }
        context.tick(FRAME, settle, &mut events);
        tally.observe(&events);
        events.clear();
    }

    tracing::debug!(?end, distance = observer, "simulation ended");
    Report {
        summary,
        end,
        elapsed,
        distance: observer,
        tally,
    }
}

fn running_effects(context: &RunContext) -> bool {
    [EffectKind::Notice, EffectKind::Flash, EffectKind::SlowMotion]
        .into_iter()
        .any(|effect| context.effects().is_running(effect))
}

/// Player reactions to one segment the observer has passed.
struct SegmentPlay {
    segment: SegmentId,
    pickups: Vec<(usize, usize)>,
    events: Vec<PlayerEvent>,
}

fn play_segment(
    segment: SegmentId,
    content: &SegmentContent,
    skill: f32,
    rng: &mut ChaCha8Rng,
) -> SegmentPlay {
    let skill = skill.clamp(0.0, 1.0);
    let mut events = Vec::new();
    let mut hit = false;
    for _ in content.hazards().iter().filter(|active| *active) {
        if rng.gen::<f32>() < (1.0 - skill) * HIT_FACTOR {
            hit = true;
            events.push(PlayerEvent::HazardHit);
        } else if rng.gen::<f32>() < NEAR_MISS_CHANCE {
            events.push(PlayerEvent::NearMiss);
        }
    }

    let mut pickups = Vec::new();
    for (index, group) in content.collectibles().iter().enumerate() {
        if !group.is_active() {
            continue;
        }
        for item in 0..group.item_count() {
            if rng.gen::<f32>() < skill {
                pickups.push((index, item));
            }
        }
    }

    for _ in 0..content.bonuses().active_count() {
        if rng.gen::<f32>() < skill {
            events.push(PlayerEvent::BonusPickup);
        }
    }

    if !hit {
        events.push(PlayerEvent::SegmentSurvived);
    }
    SegmentPlay {
        segment,
        pickups,
        events,
    }
}
