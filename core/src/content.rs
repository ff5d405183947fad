//! Segment content layouts and their runtime activation state.

use serde::{Deserialize, Serialize};

use crate::{SegmentKind, VisualTier};

/// Immutable description of a segment type as loaded at pool initialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTemplate {
    /// Type index of the template.
    pub kind: SegmentKind,
    /// Slots contained in every instance of the template.
    #[serde(flatten)]
    pub layout: ContentLayout,
}

impl SegmentTemplate {
    /// Creates a template from its kind and content layout.
    #[must_use]
    pub fn new(kind: SegmentKind, layout: ContentLayout) -> Self {
        Self { kind, layout }
    }
}

/// Slot counts of a single array family (hazards plus collectible groups).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotLayout {
    /// Number of hazard slots.
    pub hazards: u32,
    /// Number of child items in each collectible group.
    pub collectible_groups: Vec<u32>,
}

impl SlotLayout {
    /// Creates a slot layout from hazard and collectible group counts.
    #[must_use]
    pub fn new(hazards: u32, collectible_groups: Vec<u32>) -> Self {
        Self {
            hazards,
            collectible_groups,
        }
    }
}

/// Per-visual-tier alternates of the base slot arrays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantLayouts {
    /// Arrays presented in the easy visual tier.
    pub easy: SlotLayout,
    /// Arrays presented in the medium visual tier.
    pub medium: SlotLayout,
    /// Arrays presented in the hard visual tier.
    pub hard: SlotLayout,
}

impl VariantLayouts {
    /// Returns the layout associated with the provided tier.
    #[must_use]
    pub fn get(&self, tier: VisualTier) -> &SlotLayout {
        match tier {
            VisualTier::Easy => &self.easy,
            VisualTier::Medium => &self.medium,
            VisualTier::Hard => &self.hard,
        }
    }
}

/// Complete slot description of a segment template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLayout {
    /// Arrays used whenever a tier variant is empty.
    pub base: SlotLayout,
    /// Number of bonus pickup slots.
    pub bonuses: u32,
    /// Tier-specific alternates.
    pub variants: VariantLayouts,
}

impl ContentLayout {
    /// Number of hazard slots presented in the provided visual tier after the
    /// base fallback is applied.
    #[must_use]
    pub fn hazard_slots(&self, tier: VisualTier) -> u32 {
        let variant = self.variants.get(tier).hazards;
        if variant > 0 {
            variant
        } else {
            self.base.hazards
        }
    }
}

/// Activation flags of a flat slot array.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotArray {
    active: Vec<bool>,
}

impl SlotArray {
    /// Creates an array of `len` inactive slots.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            active: vec![false; len],
        }
    }

    /// Number of slots in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Reports whether the array contains no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Reports whether the slot at `index` is active. Out-of-range slots are inactive.
    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    /// Sets the activation flag of the slot at `index`; out-of-range indices are ignored.
    pub fn set_active(&mut self, index: usize, active: bool) {
        if let Some(slot) = self.active.get_mut(index) {
            *slot = active;
        }
    }

    /// Number of active slots.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|active| **active).count()
    }

    /// Deactivates every slot.
    pub fn deactivate_all(&mut self) {
        self.active.iter_mut().for_each(|slot| *slot = false);
    }

    /// Iterator over the activation flags in slot order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.active.iter().copied()
    }
}

/// A group of collectible items gated as a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectibleGroup {
    active: bool,
    items: Vec<bool>,
}

impl CollectibleGroup {
    /// Creates an inactive group holding `items` inactive children.
    #[must_use]
    pub fn with_items(items: usize) -> Self {
        Self {
            active: false,
            items: vec![false; items],
        }
    }

    /// Reports whether the group itself is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activates the group and every child item.
    pub fn activate(&mut self) {
        self.active = true;
        self.items.iter_mut().for_each(|item| *item = true);
    }

    /// Deactivates the group and every child item.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.items.iter_mut().for_each(|item| *item = false);
    }

    /// Number of child items in the group.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of child items still active.
    #[must_use]
    pub fn active_items(&self) -> usize {
        self.items.iter().filter(|item| **item).count()
    }

    /// Deactivates a single child item after it has been picked up.
    ///
    /// Returns `true` when an active item was consumed.
    pub fn collect(&mut self, item: usize) -> bool {
        if !self.active {
            return false;
        }
        match self.items.get_mut(item) {
            Some(slot) if *slot => {
                *slot = false;
                true
            }
            _ => false,
        }
    }
}

/// Hazard and collectible arrays of one family (base or a tier variant).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentArrays {
    hazards: SlotArray,
    collectibles: Vec<CollectibleGroup>,
}

impl ContentArrays {
    fn from_layout(layout: &SlotLayout) -> Self {
        Self {
            hazards: SlotArray::with_len(layout.hazards as usize),
            collectibles: layout
                .collectible_groups
                .iter()
                .map(|items| CollectibleGroup::with_items(*items as usize))
                .collect(),
        }
    }

    /// Hazard slots of the family.
    #[must_use]
    pub fn hazards(&self) -> &SlotArray {
        &self.hazards
    }

    /// Collectible groups of the family.
    #[must_use]
    pub fn collectibles(&self) -> &[CollectibleGroup] {
        &self.collectibles
    }

    fn deactivate_all(&mut self) {
        self.hazards.deactivate_all();
        self.collectibles
            .iter_mut()
            .for_each(CollectibleGroup::deactivate);
    }
}

/// Identifies which array family currently backs a slot category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentSource {
    /// The template's base arrays.
    Base,
    /// The tier-specific alternate arrays.
    Variant(VisualTier),
}

/// Runtime activation state of a pooled segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentContent {
    base: ContentArrays,
    variants: [ContentArrays; 3],
    bonuses: SlotArray,
    hazard_source: ContentSource,
    collectible_source: ContentSource,
}

impl SegmentContent {
    /// Builds fully inactive content for the provided layout.
    #[must_use]
    pub fn from_layout(layout: &ContentLayout) -> Self {
        Self {
            base: ContentArrays::from_layout(&layout.base),
            variants: VisualTier::ALL
                .map(|tier| ContentArrays::from_layout(layout.variants.get(tier))),
            bonuses: SlotArray::with_len(layout.bonuses as usize),
            hazard_source: ContentSource::Base,
            collectible_source: ContentSource::Base,
        }
    }

    /// Deactivates every slot in every family and points both categories at
    /// the base arrays. Calling it repeatedly has no further effect.
    pub fn reset(&mut self) {
        self.base.deactivate_all();
        self.variants
            .iter_mut()
            .for_each(ContentArrays::deactivate_all);
        self.bonuses.deactivate_all();
        self.hazard_source = ContentSource::Base;
        self.collectible_source = ContentSource::Base;
    }

    /// Selects the tier's hazard and collectible arrays, falling back to the
    /// base arrays independently for each category whose variant is empty.
    pub fn select(&mut self, tier: VisualTier) {
        let variant = &self.variants[tier.index()];
        self.hazard_source = if variant.hazards.is_empty() {
            ContentSource::Base
        } else {
            ContentSource::Variant(tier)
        };
        self.collectible_source = if variant.collectibles.is_empty() {
            ContentSource::Base
        } else {
            ContentSource::Variant(tier)
        };
    }

    /// Family currently backing the hazard slots.
    #[must_use]
    pub const fn hazard_source(&self) -> ContentSource {
        self.hazard_source
    }

    /// Family currently backing the collectible groups.
    #[must_use]
    pub const fn collectible_source(&self) -> ContentSource {
        self.collectible_source
    }

    /// Selected hazard slots.
    #[must_use]
    pub fn hazards(&self) -> &SlotArray {
        &self.family(self.hazard_source).hazards
    }

    /// Mutable access to the selected hazard slots.
    pub fn hazards_mut(&mut self) -> &mut SlotArray {
        let source = self.hazard_source;
        &mut self.family_mut(source).hazards
    }

    /// Selected collectible groups.
    #[must_use]
    pub fn collectibles(&self) -> &[CollectibleGroup] {
        &self.family(self.collectible_source).collectibles
    }

    /// Mutable access to the selected collectible groups.
    pub fn collectibles_mut(&mut self) -> &mut [CollectibleGroup] {
        let source = self.collectible_source;
        &mut self.family_mut(source).collectibles
    }

    /// Bonus pickup slots.
    #[must_use]
    pub fn bonuses(&self) -> &SlotArray {
        &self.bonuses
    }

    /// Mutable access to the bonus pickup slots.
    pub fn bonuses_mut(&mut self) -> &mut SlotArray {
        &mut self.bonuses
    }

    /// Arrays of the requested family regardless of the current selection.
    #[must_use]
    pub fn family(&self, source: ContentSource) -> &ContentArrays {
        match source {
            ContentSource::Base => &self.base,
            ContentSource::Variant(tier) => &self.variants[tier.index()],
        }
    }

    /// Consumes one child item of a selected collectible group.
    pub fn collect_item(&mut self, group: usize, item: usize) -> bool {
        self.collectibles_mut()
            .get_mut(group)
            .map_or(false, |group| group.collect(item))
    }

    fn family_mut(&mut self, source: ContentSource) -> &mut ContentArrays {
        match source {
            ContentSource::Base => &mut self.base,
            ContentSource::Variant(tier) => &mut self.variants[tier.index()],
        }
    }
}
