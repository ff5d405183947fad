use std::collections::VecDeque;

use corridor_core::SegmentKind;
use rand::Rng;

/// Bounded FIFO of recently spawned kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentKinds {
    kinds: VecDeque<SegmentKind>,
    capacity: usize,
}

impl RecentKinds {
    /// Creates an empty history holding at most `capacity` kinds.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            kinds: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends a kind, evicting the oldest entry once capacity is exceeded.
    pub fn record(&mut self, kind: SegmentKind) {
        self.kinds.push_back(kind);
        while self.kinds.len() > self.capacity {
            let _ = self.kinds.pop_front();
        }
    }

    /// Reports whether the kind was spawned recently.
    #[must_use]
    pub fn contains(&self, kind: SegmentKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Forgets every recorded kind.
    pub fn clear(&mut self) {
        self.kinds.clear();
    }

    /// Number of recorded kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Reports whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Recorded kinds from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = SegmentKind> + '_ {
        self.kinds.iter().copied()
    }
}

/// Outcome of a kind draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Accepted kind.
    pub kind: SegmentKind,
    /// Whether the draw cap was hit and a recent kind accepted anyway.
    pub fallback: bool,
}

/// Draws a kind uniformly, redrawing while it appears in the history.
///
/// At most `max_draws` draws are made; the last one is accepted regardless.
/// `kind_count` must be non-zero.
pub fn select_kind<R: Rng>(
    rng: &mut R,
    kind_count: u32,
    history: &RecentKinds,
    max_draws: u32,
) -> Selection {
    let mut draws = 0;
    loop {
        let kind = SegmentKind::new(rng.gen_range(0..kind_count));
        draws += 1;
        if !history.contains(kind) {
            return Selection {
                kind,
                fallback: false,
            };
        }
        if draws >= max_draws {
            return Selection {
                kind,
                fallback: true,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn history_evicts_oldest() {
        let mut history = RecentKinds::new(3);
        for kind in 0..5 {
            history.record(SegmentKind::new(kind));
        }
        let kinds: Vec<u32> = history.iter().map(|kind| kind.get()).collect();
        assert_eq!(kinds, vec![2, 3, 4]);
        assert!(!history.contains(SegmentKind::new(1)));
    }

    #[test]
    fn single_kind_falls_back_after_cap() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut history = RecentKinds::new(5);
        history.record(SegmentKind::new(0));
        let selection = select_kind(&mut rng, 1, &history, 20);
        assert_eq!(selection.kind, SegmentKind::new(0));
        assert!(selection.fallback);
    }
}
