use std::time::Duration;

use corridor_core::{EffectKind, Event};
use corridor_system_effects::Effects;

fn close(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < 1e-4
}

#[test]
fn notice_hides_after_delay() {
    let mut effects = Effects::default();
    let mut events = Vec::new();
    effects.show_notice(&mut events);
    assert!(effects.notice_visible());

    effects.tick(Duration::from_millis(2_900), &mut events);
    assert!(effects.notice_visible());

    effects.tick(Duration::from_millis(200), &mut events);
    assert!(!effects.notice_visible());
    assert_eq!(
        events,
        vec![Event::EffectFinished {
            effect: EffectKind::Notice,
            cancelled: false,
        }]
    );
}

#[test]
fn flash_fades_in_then_out() {
    let mut effects = Effects::default();
    let mut events = Vec::new();
    effects.flash(&mut events);

    effects.tick(Duration::from_millis(125), &mut events);
    assert!(close(effects.flash_alpha(), 0.3));

    effects.tick(Duration::from_millis(125), &mut events);
    assert!(close(effects.flash_alpha(), 0.6));

    effects.tick(Duration::from_millis(250), &mut events);
    assert!(close(effects.flash_alpha(), 0.3));
    assert!(effects.is_running(EffectKind::Flash));

    effects.tick(Duration::from_millis(250), &mut events);
    assert_eq!(effects.flash_alpha(), 0.0);
    assert!(!effects.is_running(EffectKind::Flash));
    assert_eq!(events.len(), 1);
}

#[test]
fn flash_carries_fade_in_overshoot_into_fade_out() {
    let mut effects = Effects::default();
    let mut events = Vec::new();
    effects.flash(&mut events);

    effects.tick(Duration::from_millis(350), &mut events);
    assert!(close(effects.flash_alpha(), 0.48));

    effects.tick(Duration::from_millis(300), &mut events);
    assert!(close(effects.flash_alpha(), 0.12));

    effects.tick(Duration::from_millis(150), &mut events);
    assert_eq!(effects.flash_alpha(), 0.0);
    assert!(!effects.is_running(EffectKind::Flash));
    assert_eq!(events.len(), 1);
}

#[test]
fn slow_motion_restores_previous_scale() {
    let mut effects = Effects::default();
    let mut events = Vec::new();
    effects.slow_motion(0.3, Duration::from_millis(500), &mut events);
    assert!(close(effects.time_scale(), 0.3));

    effects.tick(Duration::from_millis(250), &mut events);
    assert!(close(effects.time_scale(), 0.3));

    effects.tick(Duration::from_millis(250), &mut events);
    assert_eq!(effects.time_scale(), 1.0);
}

#[test]
fn restarting_cancels_running_task_first() {
    let mut effects = Effects::default();
    let mut events = Vec::new();
    effects.slow_motion(0.5, Duration::from_secs(2), &mut events);
    effects.slow_motion(0.2, Duration::from_secs(1), &mut events);

    assert_eq!(
        events,
        vec![Event::EffectFinished {
            effect: EffectKind::SlowMotion,
            cancelled: true,
        }]
    );
    assert!(close(effects.time_scale(), 0.2));

    effects.tick(Duration::from_secs(1), &mut events);
    assert_eq!(effects.time_scale(), 1.0, "restores the scale before both tasks");
}

#[test]
fn cancel_all_leaves_terminal_state() {
    let mut effects = Effects::default();
    let mut events = Vec::new();
    effects.show_notice(&mut events);
    effects.flash(&mut events);
    effects.slow_motion(0.4, Duration::from_secs(3), &mut events);
    effects.tick(Duration::from_millis(100), &mut events);
    assert!(effects.flash_alpha() > 0.0);

    effects.cancel_all(&mut events);

    assert!(!effects.notice_visible());
    assert_eq!(effects.flash_alpha(), 0.0);
    assert_eq!(effects.time_scale(), 1.0);
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::EffectFinished { cancelled: true, .. })));

    effects.cancel_all(&mut events);
    assert_eq!(events.len(), 3, "cancelling idle effects emits nothing");
}
