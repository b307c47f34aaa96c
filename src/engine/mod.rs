//! The effect engine: symbol effect resolver, bond resolver, and the
//! settlement pass that orchestrates them over one reveal batch.
//!
//! The engine follows one discipline throughout: *resolve against a frozen
//! batch, mutate the live store*. The reveal batch is snapshotted before
//! resolution begins; effects then mutate the live pool freely (spawning,
//! destroying, converting) without invalidating iteration.

pub mod bonds;
pub mod settle;
pub mod state;
pub mod symbol_effects;

pub use bonds::{BondProgress, BondRuntime, bond_is_active};
pub use settle::{CellSettlement, SettleOutcome, settle_batch};
pub use state::{EngineState, GlobalBuff, NextRoundBonus, RoundStartCheck, RoundStartEntry};

use rand::rngs::StdRng;

use crate::catalog::Catalog;
use crate::events::SettleEvent;
use crate::ids::{InstanceId, SymbolKey};
use crate::pool::Pool;
use crate::round::Tuning;

/// One revealed cell in a frozen batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub cell: usize,
    /// The buried symbol at snapshot time; `None` for an empty cell.
    pub symbol: Option<(InstanceId, SymbolKey)>,
}

/// The snapshot of one mining action's revealed cells, taken before any
/// effect runs. Effects that mutate the pool never change the batch, so
/// batch-scoped conditions ("was a vampire also mined this turn?") are
/// order-independent by construction.
#[derive(Debug, Clone, Default)]
pub struct RevealBatch {
    entries: Vec<BatchEntry>,
}

impl RevealBatch {
    pub fn from_entries(entries: Vec<BatchEntry>) -> Self {
        Self { entries }
    }

    /// Snapshot the given cells against the current pool, in reveal order.
    pub fn capture(board: &crate::board::Board, pool: &Pool, revealed: &[usize]) -> Self {
        let entries = revealed
            .iter()
            .map(|&cell| BatchEntry {
                cell,
                symbol: board
                    .cell(cell)
                    .symbol
                    .and_then(|id| pool.get(id).map(|e| (id, e.key.clone()))),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn contains_key(&self, key: &SymbolKey) -> bool {
        self.entries
            .iter()
            .any(|e| e.symbol.as_ref().is_some_and(|(_, k)| k == key))
    }

    /// Revealed symbols matching the filter, optionally skipping one
    /// instance (a symbol never matches itself as its own victim).
    pub fn matching(
        &self,
        catalog: &Catalog,
        filter: &crate::effect::SymbolFilter,
        exclude: Option<InstanceId>,
    ) -> Vec<(InstanceId, SymbolKey)> {
        self.entries
            .iter()
            .filter_map(|e| e.symbol.clone())
            .filter(|(id, _)| Some(*id) != exclude)
            .filter(|(_, key)| catalog.get(key).is_some_and(|def| filter.matches(def)))
            .collect()
    }

    /// Whether the cell at `idx` was revealed in this batch.
    pub fn contains_cell(&self, idx: usize) -> bool {
        self.entries.iter().any(|e| e.cell == idx)
    }

    /// The key revealed at a given cell, if any.
    pub fn key_at_cell(&self, idx: usize) -> Option<&SymbolKey> {
        self.entries
            .iter()
            .find(|e| e.cell == idx)
            .and_then(|e| e.symbol.as_ref().map(|(_, k)| k))
    }
}

/// Borrowed context threaded through the resolvers for one settlement.
pub struct ResolveCtx<'a> {
    pub catalog: &'a Catalog,
    pub tuning: &'a Tuning,
    pub pool: &'a mut Pool,
    pub state: &'a mut EngineState,
    pub bonds: &'a mut BondRuntime,
    pub rng: &'a mut StdRng,
    pub events: &'a mut Vec<SettleEvent>,
}
