#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timed presentation effects modelled as resumable tasks.
//!
//! Each effect keeps its own elapsed time and phase and is re-entered by
//! [`Effects::tick`]. Starting an effect that is already running, or calling
//! [`Effects::cancel_all`], first drives the owned state to its terminal value
//! so nothing is ever left half-faded.

use std::time::Duration;

use corridor_core::{EffectKind, Event};
use serde::Deserialize;

/// Durations and magnitudes of the timed effects.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EffectTuning {
    /// Seconds a notice stays visible.
    pub notice_secs: f32,
    /// Seconds of the flash fade-out; the fade-in takes half as long.
    pub flash_secs: f32,
    /// Alpha reached at the end of the fade-in.
    pub flash_peak_alpha: f32,
    /// Time scale applied when a run ends.
    pub crash_time_scale: f32,
    /// Unscaled seconds the crash slow motion lasts.
    pub crash_slow_motion_secs: f32,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            notice_secs: 3.0,
            flash_secs: 0.5,
            flash_peak_alpha: 0.6,
            crash_time_scale: 0.3,
            crash_slow_motion_secs: 0.7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct NoticeTask {
    elapsed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlashPhase {
    FadeIn,
    FadeOut,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FlashTask {
    phase: FlashPhase,
    elapsed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SlowMotionTask {
    elapsed: f32,
    duration: f32,
    restore: f32,
}

/// Owner of every running effect and of the state they drive.
#[derive(Clone, Debug)]
pub struct Effects {
    tuning: EffectTuning,
    notice: Option<NoticeTask>,
    notice_visible: bool,
    flash: Option<FlashTask>,
    flash_alpha: f32,
    slow_motion: Option<SlowMotionTask>,
    time_scale: f32,
}

impl Default for Effects {
    fn default() -> Self {
        Self::new(EffectTuning::default())
    }
}

impl Effects {
    /// Creates an idle effects owner at normal time scale.
    #[must_use]
    pub fn new(tuning: EffectTuning) -> Self {
        Self {
            tuning,
            notice: None,
            notice_visible: false,
            flash: None,
            flash_alpha: 0.0,
            slow_motion: None,
            time_scale: 1.0,
        }
    }

    /// Shows the notice, restarting its timer if it is already visible.
    pub fn show_notice(&mut self, out: &mut Vec<Event>) {
        self.finish_notice(true, out);
        self.notice_visible = true;
        self.notice = Some(NoticeTask { elapsed: 0.0 });
    }

    /// Starts the two-phase flash fade.
    pub fn flash(&mut self, out: &mut Vec<Event>) {
        self.finish_flash(true, out);
        self.flash = Some(FlashTask {
            phase: FlashPhase::FadeIn,
            elapsed: 0.0,
        });
    }

    /// Overrides the time scale for `duration` of unscaled time, then restores
    /// the scale that was active when the effect started.
    pub fn slow_motion(&mut self, factor: f32, duration: Duration, out: &mut Vec<Event>) {
        self.finish_slow_motion(true, out);
        self.slow_motion = Some(SlowMotionTask {
            elapsed: 0.0,
            duration: duration.as_secs_f32(),
            restore: self.time_scale,
        });
        self.time_scale = factor.max(0.0);
    }

    /// Advances every running effect by unscaled time.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();

        if let Some(task) = self.notice.as_mut() {
            task.elapsed += seconds;
            if task.elapsed >= self.tuning.notice_secs {
                self.finish_notice(false, out);
            }
        }

        if let Some(task) = self.flash.as_mut() {
            task.elapsed += seconds;
            let peak = self.tuning.flash_peak_alpha;
            let half = self.tuning.flash_secs * 0.5;
            if task.phase == FlashPhase::FadeIn {
                if task.elapsed < half {
                    self.flash_alpha = peak * progress(task.elapsed, half);
                } else {
                    task.phase = FlashPhase::FadeOut;
                    task.elapsed -= half;
                }
            }
            if task.phase == FlashPhase::FadeOut {
                let duration = self.tuning.flash_secs;
                self.flash_alpha = peak * (1.0 - progress(task.elapsed, duration));
                if task.elapsed >= duration {
                    self.finish_flash(false, out);
                }
            }
        }

        if let Some(task) = self.slow_motion.as_mut() {
            task.elapsed += seconds;
            if task.elapsed >= task.duration {
                self.finish_slow_motion(false, out);
            }
        }
    }

    /// Cancels every running effect, leaving its state terminal.
    pub fn cancel_all(&mut self, out: &mut Vec<Event>) {
        self.finish_notice(true, out);
        self.finish_flash(true, out);
        self.finish_slow_motion(true, out);
    }

    /// Tuning the effects were built with.
    #[must_use]
    pub const fn tuning(&self) -> &EffectTuning {
        &self.tuning
    }

    /// Reports whether the provided effect is running.
    #[must_use]
    pub fn is_running(&self, effect: EffectKind) -> bool {
        match effect {
            EffectKind::Notice => self.notice.is_some(),
            EffectKind::Flash => self.flash.is_some(),
            EffectKind::SlowMotion => self.slow_motion.is_some(),
        }
    }

    /// Whether the notice is currently shown.
    #[must_use]
    pub const fn notice_visible(&self) -> bool {
        self.notice_visible
    }

    /// Current flash overlay alpha.
    #[must_use]
    pub const fn flash_alpha(&self) -> f32 {
        self.flash_alpha
    }

    /// Multiplier applied to gameplay time.
    #[must_use]
    pub const fn time_scale(&self) -> f32 {
        self.time_scale
    }

    fn finish_notice(&mut self, cancelled: bool, out: &mut Vec<Event>) {
        if self.notice.take().is_some() {
            self.notice_visible = false;
            finished(EffectKind::Notice, cancelled, out);
        }
    }

    fn finish_flash(&mut self, cancelled: bool, out: &mut Vec<Event>) {
        if self.flash.take().is_some() {
            self.flash_alpha = 0.0;
            finished(EffectKind::Flash, cancelled, out);
        }
    }

    fn finish_slow_motion(&mut self, cancelled: bool, out: &mut Vec<Event>) {
        if let Some(task) = self.slow_motion.take() {
            self.time_scale = task.restore;
            finished(EffectKind::SlowMotion, cancelled, out);
        }
    }
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration > 0.0 {
        (elapsed / duration).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

fn finished(effect: EffectKind, cancelled: bool, out: &mut Vec<Event>) {
    tracing::trace!(?effect, cancelled, "effect finished");
    out.push(Event::EffectFinished { effect, cancelled });
}
