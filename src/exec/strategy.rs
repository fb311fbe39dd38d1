//! 冲突消解策略：从就绪组映射中至多选出一个组。
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::net::ReadyGroups;

/// Conflict resolution seam of the engine.
///
/// Given the ready-group mapping of the current step (first-seen order),
/// a strategy returns the key of exactly one group, or `None` for no
/// firing. Implementations must pick from the supplied mapping only.
pub trait SelectionStrategy {
    fn select(&mut self, ready: &ReadyGroups) -> Option<String>;
}

/// Picks the first ready group in discovery order. Fully reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deterministic;

impl SelectionStrategy for Deterministic {
    fn select(&mut self, ready: &ReadyGroups) -> Option<String> {
        ready.keys().next().cloned()
    }
}

/// Picks one ready group uniformly at random.
///
/// Uses a seedable [`StdRng`] so runs reproduce across platforms; one
/// uniform draw per step is the engine's only source of non-determinism.
#[derive(Debug, Clone)]
pub struct Stochastic {
    rng: StdRng,
}

impl Stochastic {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl SelectionStrategy for Stochastic {
    fn select(&mut self, ready: &ReadyGroups) -> Option<String> {
        if ready.is_empty() {
            return None;
        }
        let picked = self.rng.random_range(0..ready.len());
        ready.get_index(picked).map(|(key, _)| key.clone())
    }
}
