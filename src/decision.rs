//! Player decision seam.
//!
//! The session itself only takes an offer index; choosers exist so drivers
//! (CLI simulation, scripted tests, a future UI) can plug in a strategy
//! without the engine knowing who is asking.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::catalog::SymbolDefinition;

/// Picks one symbol from an offer. Implementations must return an index
/// into `offer`; out-of-range values are clamped by the caller.
pub trait SymbolChooser {
    fn choose(&mut self, offer: &[&SymbolDefinition]) -> usize;
}

/// Always takes the first offered symbol. The safe default for tests and
/// auto-resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstChoice;

impl SymbolChooser for FirstChoice {
    fn choose(&mut self, _offer: &[&SymbolDefinition]) -> usize {
        0
    }
}

/// Uniformly random pick with its own seeded generator, so simulation
/// choices do not perturb the session's RNG stream.
#[derive(Debug)]
pub struct RandomChoice {
    rng: StdRng,
}

impl RandomChoice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SymbolChooser for RandomChoice {
    fn choose(&mut self, offer: &[&SymbolDefinition]) -> usize {
        if offer.is_empty() {
            0
        } else {
            self.rng.random_range(0..offer.len())
        }
    }
}

/// Replays a fixed list of indices, then falls back to the first option.
/// Used by scripted integration tests.
#[derive(Debug, Default)]
pub struct ScriptedChoices {
    queue: std::collections::VecDeque<usize>,
}

impl ScriptedChoices {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            queue: indices.into_iter().collect(),
        }
    }
}

impl SymbolChooser for ScriptedChoices {
    fn choose(&mut self, _offer: &[&SymbolDefinition]) -> usize {
        self.queue.pop_front().unwrap_or(0)
    }
}
