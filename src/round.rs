//! Round-level progression state: coins, rent schedule, dice, round
//! counter, and the best-score records kept across games.

use crate::catalog::Catalog;
use crate::ids::SymbolKey;
use crate::pool::Pool;

/// Numeric knobs the original game kept in config tables. Injectable for
/// tests; `Default` matches the shipped balance.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Dice-roll/mining turns per rent cycle.
    pub spins_per_round: u32,
    /// Paying rent at the end of this round wins the game.
    pub final_round: u32,
    pub starting_coins: i64,
    pub starting_dice: u32,
    /// Symbols the pool starts with.
    pub starting_symbols: Vec<SymbolKey>,
    /// Reward for mining a cell with nothing buried in it.
    pub empty_cell_value: i64,
    /// Bonus per 4-connected same-type neighbor mined in the same batch.
    pub adjacency_bonus: i64,
    /// Special-flagged cells per board regeneration.
    pub special_cells: usize,
    /// Rent curve coefficients; see [`Tuning::rent_for_round`].
    pub rent_base: i64,
    pub rent_slope: i64,
    pub rent_curve: i64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            spins_per_round: 3,
            final_round: 30,
            starting_coins: 15,
            starting_dice: 1,
            starting_symbols: vec![
                SymbolKey::new("miner"),
                SymbolKey::new("miner"),
                SymbolKey::new("coal_chunk"),
            ],
            empty_cell_value: 1,
            adjacency_bonus: 2,
            special_cells: 2,
            rent_base: 10,
            rent_slope: 12,
            rent_curve: 3,
        }
    }
}

impl Tuning {
    /// Rent due at the end of the given round. Strictly increasing in the
    /// round number so pressure always escalates.
    pub fn rent_for_round(&self, round: u32) -> i64 {
        let n = (round.saturating_sub(1)) as i64;
        self.rent_base + self.rent_slope * n + self.rent_curve * n * n
    }
}

/// Mutable per-game progression state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundState {
    /// Current round, starting at 1.
    pub round: u32,
    /// Spins left before the rent check.
    pub spins_remaining: u32,
    /// Rent due at this round's checkpoint.
    pub rent: i64,
    /// Base dice rolled per spin.
    pub dice_count: u32,
    /// May go transiently negative during a resolution; only the rent
    /// comparison decides game over.
    pub coins: i64,
}

impl RoundState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            round: 1,
            spins_remaining: tuning.spins_per_round,
            rent: tuning.rent_for_round(1),
            dice_count: tuning.starting_dice,
            coins: tuning.starting_coins,
        }
    }

    /// Advance to the next round: reset spins and recompute rent.
    pub fn advance_round(&mut self, tuning: &Tuning) {
        self.round += 1;
        self.spins_remaining = tuning.spins_per_round;
        self.rent = tuning.rent_for_round(self.round);
    }

    /// Spins already used this round.
    pub fn spins_used(&self, tuning: &Tuning) -> u32 {
        tuning.spins_per_round.saturating_sub(self.spins_remaining)
    }
}

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum GameOutcome {
    /// Paid the final round's rent.
    Victory { rounds: u32, coins: i64 },
    /// Could not pay rent (or a failed check ended the run).
    Defeat { round: u32, rent_due: i64, coins: i64 },
}

impl GameOutcome {
    pub fn is_victory(&self) -> bool {
        matches!(self, GameOutcome::Victory { .. })
    }
}

/// Best-score records, updated at game over. Round reached ranks first,
/// tiebroken by within-round progress; the coin high score is independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct BestScore {
    pub best_round: u32,
    pub best_round_spins_used: u32,
    pub best_coins: i64,
}

impl BestScore {
    pub fn record(&mut self, round: u32, spins_used: u32, coins: i64) {
        if round > self.best_round || (round == self.best_round && spins_used > self.best_round_spins_used) {
            self.best_round = round;
            self.best_round_spins_used = spins_used;
        }
        if coins > self.best_coins {
            self.best_coins = coins;
        }
    }
}

/// Face set of a standard die.
pub const STANDARD_DICE_FACES: [u8; 6] = [1, 2, 3, 4, 5, 6];

/// The dice face set for the next spin, derived fresh from the pool.
///
/// Symbols may carry an upgraded face set; among the standard faces and all
/// owned candidates, the set with the highest minimum face wins.
pub fn dice_faces(pool: &Pool, catalog: &Catalog) -> Vec<u8> {
    let mut best: Vec<u8> = STANDARD_DICE_FACES.to_vec();
    let mut best_min = *best.iter().min().unwrap_or(&1);
    for entry in pool.iter() {
        if let Some(def) = catalog.get(&entry.key)
            && let Some(faces) = &def.dice_faces
            && let Some(&min) = faces.iter().min()
            && min > best_min
        {
            best = faces.clone();
            best_min = min;
        }
    }
    best
}
