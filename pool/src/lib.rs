#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-capacity pool of reusable corridor segments.
//!
//! Every instance is created once when the pool is built and recycled for the
//! pool's whole lifetime. Callers check instances out, position and arm them,
//! activate them, and eventually release them back. Instances are stored
//! contiguously by kind so that scans naturally proceed in kind order.

use corridor_core::{ConfigError, SegmentContent, SegmentId, SegmentKind, SegmentTemplate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

const DEFAULT_INSTANCES_PER_KIND: u32 = 3;
const DEFAULT_SEED: u64 = 0x6a09_e667_f3bc_c908;

/// Configuration describing how many instances the pool holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    instances_per_kind: u32,
    seed: u64,
}

impl PoolConfig {
    /// Creates a new configuration.
    #[must_use]
    pub const fn new(instances_per_kind: u32, seed: u64) -> Self {
        Self {
            instances_per_kind,
            seed,
        }
    }

    /// Number of idle copies pre-instantiated per kind.
    #[must_use]
    pub const fn instances_per_kind(&self) -> u32 {
        self.instances_per_kind
    }

    /// Seed of the stream that derives per-session seeds.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INSTANCES_PER_KIND, DEFAULT_SEED)
    }
}

/// Lifecycle state of a pooled instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceState {
    /// Available for checkout.
    Idle,
    /// Handed out and awaiting activation.
    CheckedOut,
    /// Part of the visible corridor.
    Active,
}

/// Live copy of a segment template.
#[derive(Clone, Debug)]
pub struct SegmentInstance {
    id: SegmentId,
    kind: SegmentKind,
    start: f32,
    state: InstanceState,
    content: SegmentContent,
}

impl SegmentInstance {
    /// Identifier of the instance.
    #[must_use]
    pub const fn id(&self) -> SegmentId {
        self.id
    }

    /// Kind of the template the instance was built from.
    #[must_use]
    pub const fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// World-space start offset assigned by the last positioning.
    #[must_use]
    pub const fn start(&self) -> f32 {
        self.start
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> InstanceState {
        self.state
    }

    /// Read-only view of the slot activation state.
    #[must_use]
    pub const fn content(&self) -> &SegmentContent {
        &self.content
    }
}

/// Instance handed out by [`SegmentPool::checkout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkout {
    /// Identifier of the checked-out instance.
    pub segment: SegmentId,
    /// Kind that was requested.
    pub requested: SegmentKind,
    /// Kind that was supplied.
    pub kind: SegmentKind,
}

impl Checkout {
    /// Reports whether the pool substituted another kind for the requested one.
    #[must_use]
    pub fn substituted(&self) -> bool {
        self.requested != self.kind
    }
}

/// Fixed-capacity pool of segment instances.
#[derive(Debug)]
pub struct SegmentPool {
    instances: Vec<SegmentInstance>,
    kind_count: u32,
    instances_per_kind: u32,
    rng: ChaCha8Rng,
    session_seed: u64,
}

impl SegmentPool {
    /// Pre-instantiates `instances_per_kind` idle copies of every template.
    ///
    /// Templates must be supplied in kind order with dense kinds starting at
    /// zero.
    pub fn new(templates: &[SegmentTemplate], config: PoolConfig) -> Result<Self, ConfigError> {
        if templates.is_empty() {
            return Err(ConfigError::NoTemplates);
        }
        if config.instances_per_kind == 0 {
            return Err(ConfigError::ZeroInstances);
        }

        let mut instances =
            Vec::with_capacity(templates.len() * config.instances_per_kind as usize);
        for (position, template) in templates.iter().enumerate() {
            let expected = SegmentKind::new(position as u32);
            if template.kind != expected {
                return Err(ConfigError::KindMismatch {
                    expected,
                    found: template.kind,
                });
            }
            for _ in 0..config.instances_per_kind {
                instances.push(SegmentInstance {
                    id: SegmentId::new(instances.len() as u32),
                    kind: template.kind,
                    start: 0.0,
                    state: InstanceState::Idle,
                    content: SegmentContent::from_layout(&template.layout),
                });
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let session_seed = rng.gen();

        Ok(Self {
            instances,
            kind_count: templates.len() as u32,
            instances_per_kind: config.instances_per_kind,
            rng,
            session_seed,
        })
    }

    /// Checks out an idle instance, preferring the requested kind.
    ///
    /// When every instance of the requested kind is busy the first idle
    /// instance of any other kind is supplied instead. Returns `None` only when
    /// the whole pool is exhausted.
    pub fn checkout(&mut self, kind: SegmentKind) -> Option<Checkout> {
        let index = self
            .instances
            .iter()
            .position(|instance| instance.kind == kind && instance.state == InstanceState::Idle)
            .or_else(|| {
                self.instances
                    .iter()
                    .position(|instance| instance.state == InstanceState::Idle)
            })?;

        let instance = &mut self.instances[index];
        instance.state = InstanceState::CheckedOut;
        let checkout = Checkout {
            segment: instance.id,
            requested: kind,
            kind: instance.kind,
        };
        if checkout.substituted() {
            tracing::debug!(
                requested = kind.get(),
                supplied = checkout.kind.get(),
                "segment kind exhausted, substituting"
            );
        }
        Some(checkout)
    }

    /// Places an instance at the provided world-space start offset.
    pub fn position(&mut self, segment: SegmentId, start: f32) {
        if let Some(instance) = self.instance_mut(segment) {
            instance.start = start;
        }
    }

    /// Mutable access to the slot state of a checked-out or active instance.
    pub fn content_mut(&mut self, segment: SegmentId) -> Option<&mut SegmentContent> {
        self.instance_mut(segment)
            .filter(|instance| instance.state != InstanceState::Idle)
            .map(|instance| &mut instance.content)
    }

    /// Marks a checked-out instance as part of the visible corridor.
    pub fn activate(&mut self, segment: SegmentId) {
        if let Some(instance) = self.instance_mut(segment) {
            if instance.state == InstanceState::CheckedOut {
                instance.state = InstanceState::Active;
            }
        }
    }

    /// Returns an instance to the idle set. Releasing an idle or unknown
    /// instance has no effect.
    pub fn release(&mut self, segment: SegmentId) {
        if let Some(instance) = self.instance_mut(segment) {
            instance.state = InstanceState::Idle;
        }
    }

    /// Force-idles every instance and draws a fresh session seed.
    pub fn reset_all(&mut self) {
        for instance in &mut self.instances {
            instance.state = InstanceState::Idle;
        }
        self.session_seed = self.rng.gen();
    }

    fn instance_mut(&mut self, segment: SegmentId) -> Option<&mut SegmentInstance> {
        self.instances.get_mut(segment.get() as usize)
    }
}

/// Read-only queries over the pool.
pub mod query {
    use corridor_core::{SegmentId, SegmentKind};

    use super::{InstanceState, SegmentInstance, SegmentPool};

    /// Looks up an instance by identifier.
    #[must_use]
    pub fn instance(pool: &SegmentPool, segment: SegmentId) -> Option<&SegmentInstance> {
        pool.instances.get(segment.get() as usize)
    }

    /// Iterates over every instance in kind order.
    pub fn instances(pool: &SegmentPool) -> impl Iterator<Item = &SegmentInstance> {
        pool.instances.iter()
    }

    /// Number of idle instances of the provided kind.
    #[must_use]
    pub fn idle_count(pool: &SegmentPool, kind: SegmentKind) -> usize {
        count(pool, kind, |state| state == InstanceState::Idle)
    }

    /// Number of checked-out or active instances of the provided kind.
    #[must_use]
    pub fn checked_out_count(pool: &SegmentPool, kind: SegmentKind) -> usize {
        count(pool, kind, |state| state != InstanceState::Idle)
    }

    /// Number of distinct template kinds.
    #[must_use]
    pub fn kind_count(pool: &SegmentPool) -> u32 {
        pool.kind_count
    }

    /// Number of instances created per kind.
    #[must_use]
    pub fn instances_per_kind(pool: &SegmentPool) -> u32 {
        pool.instances_per_kind
    }

    /// Seed of the current session, refreshed by every reset.
    #[must_use]
    pub fn session_seed(pool: &SegmentPool) -> u64 {
        pool.session_seed
    }

    fn count(pool: &SegmentPool, kind: SegmentKind, filter: impl Fn(InstanceState) -> bool) -> usize {
        pool.instances
            .iter()
            .filter(|instance| instance.kind == kind && filter(instance.state))
            .count()
    }
}
