use std::time::Duration;

use corridor_core::{
    ConfigError, ContentLayout, EffectKind, Event, PlayerEvent, SegmentId, SegmentKind,
    SegmentTemplate, SlotLayout, VariantLayouts,
};
use corridor_pool::query;
use corridor_runtime::{RunConfig, RunContext, RunState, TickInput};

const FRAME: Duration = Duration::from_millis(50);

fn templates(count: u32) -> Vec<SegmentTemplate> {
    (0..count)
        .map(|kind| {
            SegmentTemplate::new(
                SegmentKind::new(kind),
                ContentLayout {
                    base: SlotLayout::new(5, vec![4, 4]),
                    bonuses: 1,
                    variants: VariantLayouts {
                        hard: SlotLayout::new(6, Vec::new()),
                        ..VariantLayouts::default()
                    },
                },
            )
        })
        .collect()
}

fn input(observer_position: f32) -> TickInput {
    TickInput {
        observer_position,
        freshness: Some(1.0),
    }
}

fn run_for(context: &mut RunContext, frames: u32, speed: f32, events: &mut Vec<Event>) {
    for frame in 0..frames {
        let observer = frame as f32 * speed * FRAME.as_secs_f32();
        context.tick(FRAME, input(observer), events);
    }
}

#[test]
fn start_preloads_with_safe_start_segment() {
    let mut context = RunContext::new(RunConfig::default(), &templates(8), 0).expect("context");
    assert_eq!(context.state(), RunState::Ready);

    let mut events = Vec::new();
    context.start(&mut events);

    assert_eq!(context.state(), RunState::Running);
    assert_eq!(context.streaming().window_len(), 7);
    assert!(matches!(
        events.first(),
        Some(Event::SegmentActivated {
            kind: SegmentKind::SAFE_START,
            ..
        })
    ));
}

#[test]
fn score_counts_cleared_segments_and_pickups() {
    let mut context = RunContext::new(RunConfig::default(), &templates(8), 0).expect("context");
    let mut events = Vec::new();
    context.record(PlayerEvent::CollectiblePickup);
    assert_eq!(context.score(), 0, "notifications before start are ignored");

    context.start(&mut events);
    context.record(PlayerEvent::CollectiblePickup);
    context.record(PlayerEvent::CollectiblePickup);
    assert_eq!(context.score(), 4);

    let mut previous = context.score();
    for frame in 0..400 {
        context.tick(FRAME, input(frame as f32 * 1.5), &mut events);
        assert!(context.score() >= previous, "score is monotonic");
        previous = context.score();
    }
    assert_eq!(
        context.score(),
        context.streaming().segments_cleared() + 4
    );
    assert!(context.streaming().segments_cleared() > 0);
}

#[test]
fn finishing_with_a_record_shows_notice_and_caches_best() {
    let mut context = RunContext::new(RunConfig::default(), &templates(8), 3).expect("context");
    let mut events = Vec::new();
    context.start(&mut events);
    run_for(&mut context, 200, 30.0, &mut events);
    assert!(context.score() > 3);

    events.clear();
    let summary = context.finish(&mut events);
    assert!(summary.new_record);
    assert_eq!(summary.best_score, summary.score);
    assert_eq!(context.high_score(), summary.score);
    assert_eq!(context.state(), RunState::Over);
    assert!(context.effects().notice_visible());
    assert!(context.effects().is_running(EffectKind::Flash));
    assert!((context.effects().time_scale() - 0.3).abs() < 1e-6);

    events.clear();
    for _ in 0..20 {
        context.tick(FRAME, input(10_000.0), &mut events);
    }
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::EffectFinished { .. })));
    assert_eq!(context.effects().time_scale(), 1.0);
    assert_eq!(context.effects().flash_alpha(), 0.0);
}

#[test]
fn finishing_below_best_keeps_previous_record() {
    let mut context =
        RunContext::new(RunConfig::default(), &templates(8), 10_000).expect("context");
    let mut events = Vec::new();
    context.start(&mut events);
    run_for(&mut context, 20, 30.0, &mut events);

    let summary = context.finish(&mut events);
    assert!(!summary.new_record);
    assert_eq!(summary.best_score, 10_000);
    assert!(!context.effects().notice_visible());
}

#[test]
fn restarting_resets_score_and_window() {
    let mut context = RunContext::new(RunConfig::default(), &templates(8), 0).expect("context");
    let mut events = Vec::new();
    context.start(&mut events);
    let first_seed = query::session_seed(context.pool());
    run_for(&mut context, 200, 30.0, &mut events);
    let _ = context.finish(&mut events);

    events.clear();
    context.start(&mut events);
    assert_eq!(context.score(), 0);
    assert_eq!(context.streaming().segments_cleared(), 0);
    assert_ne!(query::session_seed(context.pool()), first_seed);
    assert_eq!(context.difficulty().state().score(), 0.5);
    assert_eq!(context.effects().time_scale(), 1.0);
    let first = context.streaming().window().next().copied().expect("entry");
    assert_eq!(first.kind, SegmentKind::SAFE_START);
}

#[test]
fn identical_contexts_replay_identically() {
    let replay = || {
        let mut context =
            RunContext::new(RunConfig::default(), &templates(8), 40).expect("context");
        let mut events = Vec::new();
        context.start(&mut events);
        for frame in 0..300u32 {
            if frame % 7 == 0 {
                context.record(PlayerEvent::CollectiblePickup);
            }
            if frame % 50 == 0 {
                context.record(PlayerEvent::HazardHit);
            }
            let observer = frame as f32 * 1.2;
            context.tick(FRAME, input(observer), &mut events);
        }
        let summary = context.finish(&mut events);
        (events, summary)
    };
    assert_eq!(replay(), replay());
}

#[test]
fn struggling_players_never_drop_below_the_phase_minimum() {
    for weight in [0.0, 0.5, 1.0] {
        let mut config = RunConfig::default();
        config.content.adaptive_weight = weight;
        let mut context = RunContext::new(config, &templates(8), 0).expect("context");
        let mut events = Vec::new();
        context.start(&mut events);

        for _ in 0..100 {
            context.record(PlayerEvent::CollectiblePickup);
        }
        for _ in 0..10 {
            context.record(PlayerEvent::HazardHit);
        }
        assert_eq!(context.difficulty().state().score(), 0.0);
        assert_eq!(context.score(), 200, "score sits in the hard phase");

        let mut checked = 0;
        for frame in 0..200u32 {
            events.clear();
            context.tick(FRAME, input(frame as f32 * 1.5), &mut events);
            assert!(context.score() < 400);
            for event in &events {
                if let Event::SegmentActivated { segment, .. } = event {
                    let instance = query::instance(context.pool(), *segment).expect("instance");
                    assert!(
                        instance.content().hazards().active_count() >= 2,
                        "weight {weight} armed fewer hazards than the phase minimum"
                    );
                    checked += 1;
                }
            }
        }
        assert!(checked > 0);
    }
}

#[test]
fn collected_items_score_once() {
    let mut context = RunContext::new(RunConfig::default(), &templates(8), 0).expect("context");
    let mut events = Vec::new();
    assert!(!context.collect_item(SegmentId::new(0), 0, 0), "ignored before start");
    context.start(&mut events);

    let (segment, group) = context
        .streaming()
        .window()
        .find_map(|entry| {
            let instance = query::instance(context.pool(), entry.segment)?;
            instance
                .content()
                .collectibles()
                .iter()
                .position(|group| group.is_active())
                .map(|group| (entry.segment, group))
        })
        .expect("an active collectible group in the preloaded window");

    assert!(context.collect_item(segment, group, 0));
    assert!(!context.collect_item(segment, group, 0), "items are consumed once");
    assert_eq!(context.score(), 2);
    assert_eq!(context.difficulty().state().pickups(), 1);

    let instance = query::instance(context.pool(), segment).expect("instance");
    assert_eq!(instance.content().collectibles()[group].active_items(), 3);
}

#[test]
fn invalid_templates_are_fatal() {
    assert_eq!(
        RunContext::new(RunConfig::default(), &[], 0).unwrap_err(),
        ConfigError::NoTemplates
    );

    let mut templates = templates(2);
    templates[1].layout.base.hazards = 0;
    assert!(matches!(
        RunContext::new(RunConfig::default(), &templates, 0),
        Err(ConfigError::MinimumWithoutHazards { .. })
    ));
}

#[test]
fn config_loads_partially_from_toml() {
    let config: RunConfig = toml::from_str(
        r#"
            [pool]
            instances_per_kind = 4

            [stream]
            lookahead = 180.0

            [scoring]
            collectible_points = 5
        "#,
    )
    .expect("config parses");

    assert_eq!(config.pool.instances_per_kind(), 4);
    assert_eq!(config.stream.lookahead, 180.0);
    assert_eq!(config.stream.segment_length, 30.0);
    assert_eq!(config.scoring.collectible_points, 5);
    assert_eq!(config.content, RunConfig::default().content);
}
