use std::time::Duration;

use corridor_core::{DifficultyTier, PlayerEvent};
use corridor_system_difficulty::{Difficulty, DifficultyTuning};
use proptest::prelude::*;

fn close(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < 1e-5
}

#[test]
fn repeated_hits_floor_score_and_reset_streaks() {
    let mut difficulty = Difficulty::default();
    difficulty.handle(&[
        PlayerEvent::CollectiblePickup,
        PlayerEvent::CollectiblePickup,
    ]);
    assert_eq!(difficulty.state().pickup_streak(), 2);

    difficulty.seed_score(0.5);
    for _ in 0..4 {
        difficulty.record(PlayerEvent::HazardHit);
    }

    assert_eq!(difficulty.state().score(), 0.0);
    assert_eq!(difficulty.state().pickup_streak(), 0);
    assert_eq!(difficulty.state().survival_streak(), 0);
    assert_eq!(difficulty.state().since_last_hit(), 0.0);
}

#[test]
fn four_hits_cost_sixty_hundredths() {
    let mut difficulty = Difficulty::default();
    difficulty.seed_score(0.9);
    for _ in 0..4 {
        difficulty.record(PlayerEvent::HazardHit);
    }

    assert!(close(difficulty.state().score(), 0.3));
    assert_eq!(difficulty.state().hits(), 4);
    assert_eq!(difficulty.state().pickup_streak(), 0);
}

#[test]
fn rolling_average_converges_to_held_score() {
    let tuning = DifficultyTuning {
        decay_rate: 0.0,
        survival_drift: 0.0,
        ..DifficultyTuning::default()
    };
    let mut difficulty = Difficulty::new(tuning);
    difficulty.seed_score(0.8);

    let mut previous = difficulty.state().recent_average();
    for _ in 0..30 {
        difficulty.tick(Duration::from_secs(1));
        let average = difficulty.state().recent_average();
        assert!(average >= previous - 1e-6, "average must climb toward 0.8");
        previous = average;
    }

    assert!(close(difficulty.state().recent_average(), 0.8));
}

#[test]
fn sampling_carries_remainder_between_ticks() {
    let tuning = DifficultyTuning {
        decay_rate: 0.0,
        survival_drift: 0.0,
        ..DifficultyTuning::default()
    };
    let mut difficulty = Difficulty::new(tuning);
    difficulty.seed_score(1.0);

    difficulty.tick(Duration::from_millis(2_000));
    assert_eq!(difficulty.state().recent_average(), 0.5);

    difficulty.tick(Duration::from_millis(2_000));
    assert!(close(difficulty.state().recent_average(), 0.55));

    difficulty.tick(Duration::from_millis(2_000));
    assert!(close(difficulty.state().recent_average(), 0.6));
}

#[test]
fn score_relaxes_toward_neutral() {
    let tuning = DifficultyTuning {
        survival_drift: 0.0,
        ..DifficultyTuning::default()
    };
    let mut difficulty = Difficulty::new(tuning);
    difficulty.seed_score(0.9);
    difficulty.tick(Duration::from_secs(5));
    assert!(close(difficulty.state().score(), 0.8));

    difficulty.tick(Duration::from_secs(100));
    assert!(close(difficulty.state().score(), 0.5));
}

#[test]
fn survival_drift_starts_after_grace_period() {
    let tuning = DifficultyTuning {
        decay_rate: 0.0,
        ..DifficultyTuning::default()
    };
    let mut difficulty = Difficulty::new(tuning);

    difficulty.tick(Duration::from_secs(5));
    assert_eq!(difficulty.state().score(), 0.5);

    difficulty.tick(Duration::from_secs(2));
    assert!(close(difficulty.state().score(), 0.51));
}

#[test]
fn tier_combines_performance_and_raw_score() {
    let mut difficulty = Difficulty::default();
    difficulty.seed_score(0.0);
    assert_eq!(difficulty.tier(0), DifficultyTier::Easy);
    assert_eq!(difficulty.tier(500), DifficultyTier::Medium);

    difficulty.seed_score(1.0);
    assert_eq!(difficulty.tier(0), DifficultyTier::Hard);
    assert_eq!(difficulty.tier(250), DifficultyTier::Insane);
    assert_eq!(difficulty.tier(10_000), DifficultyTier::Nightmare);
}

#[test]
fn struggling_players_receive_relief() {
    let mut difficulty = Difficulty::default();
    difficulty.seed_score(0.2);

    let parameters = difficulty.spawn_parameters(0, None);
    assert!(close(parameters.hazard_probability, 0.10));
    assert!(close(parameters.collectible_probability, 0.95));
    assert!(close(parameters.bonus_probability, 0.28));
    assert_eq!(parameters.min_hazards, 0);

    let desperate = difficulty.spawn_parameters(0, Some(0.1));
    assert!(close(desperate.hazard_probability, 0.10));
    assert!(close(desperate.bonus_probability, 0.35));
}

#[test]
fn dominating_players_are_pushed_harder() {
    let mut difficulty = Difficulty::default();
    difficulty.seed_score(0.9);

    let parameters = difficulty.spawn_parameters(500, None);
    assert_eq!(difficulty.tier(500), DifficultyTier::Nightmare);
    assert!(close(parameters.hazard_probability, 0.92));
    assert!(close(parameters.collectible_probability, 0.40));
    assert!(close(parameters.bonus_probability, 0.10));
    assert!(close(parameters.event_probability, 0.45));
    assert_eq!(parameters.min_hazards, 4);
}

#[test]
fn missing_or_healthy_freshness_changes_nothing() {
    let difficulty = Difficulty::default();
    assert_eq!(
        difficulty.spawn_parameters(120, None),
        difficulty.spawn_parameters(120, Some(0.8))
    );
}

#[test]
fn reset_restores_neutral_state() {
    let mut difficulty = Difficulty::default();
    difficulty.handle(&[PlayerEvent::HazardHit, PlayerEvent::NearMiss]);
    difficulty.tick(Duration::from_secs(7));
    difficulty.reset();

    let fresh = Difficulty::default();
    assert_eq!(difficulty.state(), fresh.state());
}

proptest! {
    #[test]
    fn difficulty_is_monotonic_in_raw_score(
        performance in 0.0f32..=1.0,
        low in 0u32..2_000,
        delta in 0u32..2_000,
        freshness in proptest::option::of(0.0f32..=1.0),
    ) {
        let mut difficulty = Difficulty::default();
        difficulty.seed_score(performance);
        let high = low + delta;

        prop_assert!(difficulty.tier(low) <= difficulty.tier(high));
        let easier = difficulty.spawn_parameters(low, freshness);
        let harder = difficulty.spawn_parameters(high, freshness);
        prop_assert!(easier.hazard_probability <= harder.hazard_probability);
        prop_assert!(easier.min_hazards <= harder.min_hazards);
    }

    #[test]
    fn score_stays_in_unit_interval(events in proptest::collection::vec(0u8..5, 0..200)) {
        let mut difficulty = Difficulty::default();
        for event in events {
            let event = match event {
                0 => PlayerEvent::CollectiblePickup,
                1 => PlayerEvent::HazardHit,
                2 => PlayerEvent::NearMiss,
                3 => PlayerEvent::SegmentSurvived,
                _ => PlayerEvent::BonusPickup,
            };
            difficulty.record(event);
            difficulty.tick(Duration::from_millis(250));
            let score = difficulty.state().score();
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
