//! Resume snapshots: the persistence boundary.
//!
//! A snapshot captures everything needed to resume a session: pool keys,
//! board cells, round state, engine registries, and bond progress. It
//! defines no file format of its own; with the `serialization` feature the
//! whole structure serializes through serde and the surrounding app decides
//! where it lives.
//!
//! Instance ids are process-local and are not persisted: restore allocates
//! fresh instances and rebinds board cells to them by key.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::board::Board;
use crate::catalog::Catalog;
use crate::engine::bonds::BondProgress;
use crate::engine::state::EngineState;
use crate::engine::BondRuntime;
use crate::game_loop::{GameSession, Phase};
use crate::ids::{BondId, SymbolKey};
use crate::pool::Pool;
use crate::round::{BestScore, RoundState, Tuning};

/// One board cell as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct CellSnapshot {
    pub covered: bool,
    pub symbol: Option<SymbolKey>,
    pub special: bool,
}

/// A resumable capture of a live session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct GameSnapshot {
    pub pool: Vec<SymbolKey>,
    pub board: Vec<CellSnapshot>,
    pub round: RoundState,
    pub engine: EngineState,
    pub bond_progress: HashMap<BondId, BondProgress>,
    /// Pending offer; empty when captured mid-round.
    pub offer: Vec<SymbolKey>,
    pub best: BestScore,
    pub peak_coins: i64,
}

impl GameSnapshot {
    /// Capture a live (non-terminal) session.
    pub fn capture(session: &GameSession) -> Self {
        Self {
            pool: session.pool().keys(),
            board: session
                .board()
                .cells()
                .iter()
                .map(|cell| CellSnapshot {
                    covered: cell.covered,
                    symbol: cell
                        .symbol
                        .and_then(|id| session.pool().get(id))
                        .map(|entry| entry.key.clone()),
                    special: cell.special,
                })
                .collect(),
            round: session.round_state().clone(),
            engine: session.engine.clone(),
            bond_progress: session.bonds_rt.progress_map().clone(),
            offer: session.offer.clone(),
            best: session.best_score().clone(),
            peak_coins: session.peak_coins,
        }
    }

    /// Rebuild a session from this snapshot. The RNG stream is not part of
    /// the capture; the caller supplies a fresh seed.
    pub fn restore(&self, catalog: Catalog, tuning: Tuning, seed: u64) -> GameSession {
        let mut pool = Pool::new();
        // Fresh instances per key, then rebind board cells to them.
        let mut by_key: HashMap<SymbolKey, Vec<crate::ids::InstanceId>> = HashMap::new();
        for key in &self.pool {
            let id = pool.add(key.clone());
            by_key.entry(key.clone()).or_default().push(id);
        }

        let mut board = Board::new();
        for (idx, cell) in self.board.iter().enumerate().take(crate::board::BOARD_SIZE) {
            let symbol = cell
                .symbol
                .as_ref()
                .and_then(|key| by_key.get_mut(key))
                .and_then(|ids| ids.pop());
            board.restore_cell(idx, cell.covered, symbol, cell.special);
        }

        let phase = if self.offer.is_empty() {
            Phase::Spinning
        } else {
            Phase::SelectingSymbol
        };

        GameSession::from_snapshot_parts(
            catalog,
            tuning,
            pool,
            board,
            self.round.clone(),
            self.engine.clone(),
            BondRuntime::restore_progress(self.bond_progress.clone()),
            StdRng::seed_from_u64(seed),
            phase,
            self.offer.clone(),
            self.best.clone(),
            self.peak_coins,
        )
    }
}
