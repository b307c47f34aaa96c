//! The 5x5 mining board.
//!
//! The board is regenerated (all cells re-covered, symbols re-drawn from the
//! current pool) at the start of each selection phase, and again mid-spin
//! when a dice roll asks for more cells than remain covered. Cells hold
//! non-owning `InstanceId` references into the pool.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::Catalog;
use crate::ids::InstanceId;
use crate::pool::Pool;

pub const BOARD_COLS: usize = 5;
pub const BOARD_ROWS: usize = 5;
pub const BOARD_SIZE: usize = BOARD_COLS * BOARD_ROWS;

/// One board cell.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    /// Still covered by ore (not yet mined this generation).
    pub covered: bool,
    /// The pool instance buried here, if any.
    pub symbol: Option<InstanceId>,
    /// Special-flagged cell; an active bond may multiply its earnings.
    pub special: bool,
}

#[derive(Debug, Clone)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty, fully mined-out board. The first regeneration fills it.
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::default(); BOARD_SIZE],
        }
    }

    pub fn cell(&self, idx: usize) -> &Cell {
        &self.cells[idx]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn covered_count(&self) -> usize {
        self.cells.iter().filter(|c| c.covered).count()
    }

    /// Re-cover every cell and bury a fresh random subset of the pool.
    ///
    /// Only minable symbols are eligible, unique-per-board symbols are
    /// placed at most once, and at most `BOARD_SIZE` instances fit. A pool
    /// smaller than the board leaves the remaining cells empty (still worth
    /// the empty-cell reward when mined).
    pub fn regenerate(
        &mut self,
        pool: &Pool,
        catalog: &Catalog,
        special_cells: usize,
        rng: &mut impl Rng,
    ) {
        let mut eligible: Vec<&crate::pool::SymbolInstance> = pool
            .iter()
            .filter(|e| catalog.get(&e.key).is_none_or(|def| def.minable))
            .collect();
        eligible.shuffle(rng);

        let mut placed: Vec<InstanceId> = Vec::new();
        let mut seen_unique: Vec<&crate::ids::SymbolKey> = Vec::new();
        for entry in eligible {
            if placed.len() == BOARD_SIZE {
                break;
            }
            if let Some(def) = catalog.get(&entry.key)
                && def.unique_per_board
            {
                if seen_unique.contains(&&entry.key) {
                    continue;
                }
                seen_unique.push(&entry.key);
            }
            placed.push(entry.id);
        }

        let mut indices: Vec<usize> = (0..BOARD_SIZE).collect();
        indices.shuffle(rng);

        for cell in &mut self.cells {
            *cell = Cell {
                covered: true,
                symbol: None,
                special: false,
            };
        }
        for (slot, id) in indices.iter().zip(placed) {
            self.cells[*slot].symbol = Some(id);
        }
        for slot in indices.iter().rev().take(special_cells.min(BOARD_SIZE)) {
            self.cells[*slot].special = true;
        }
    }

    /// Uncover up to `count` random covered cells, returning their indices
    /// in reveal order. Returns fewer than requested when the board runs
    /// out; the caller carries the remainder across a regeneration.
    pub fn mine_random(&mut self, count: usize, rng: &mut impl Rng) -> Vec<usize> {
        let mut covered: Vec<usize> = (0..BOARD_SIZE).filter(|&i| self.cells[i].covered).collect();
        covered.shuffle(rng);
        covered.truncate(count);
        for &idx in &covered {
            self.cells[idx].covered = false;
        }
        covered
    }

    /// Rebuild one cell from persisted state.
    pub(crate) fn restore_cell(
        &mut self,
        idx: usize,
        covered: bool,
        symbol: Option<InstanceId>,
        special: bool,
    ) {
        if idx < BOARD_SIZE {
            self.cells[idx] = Cell {
                covered,
                symbol,
                special,
            };
        }
    }

    /// Test-only precise placement.
    #[cfg(test)]
    pub(crate) fn place(
        &mut self,
        idx: usize,
        symbol: Option<InstanceId>,
        covered: bool,
        special: bool,
    ) {
        self.cells[idx] = Cell {
            covered,
            symbol,
            special,
        };
    }

    /// 4-connected neighbors of a cell index.
    pub fn neighbors(idx: usize) -> impl Iterator<Item = usize> {
        let row = idx / BOARD_COLS;
        let col = idx % BOARD_COLS;
        [
            (row > 0).then(|| idx - BOARD_COLS),
            (row + 1 < BOARD_ROWS).then(|| idx + BOARD_COLS),
            (col > 0).then(|| idx - 1),
            (col + 1 < BOARD_COLS).then(|| idx + 1),
        ]
        .into_iter()
        .flatten()
    }
}
