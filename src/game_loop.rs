//! The round/settlement state machine.
//!
//! Drives `SelectingSymbol -> Spinning -> Mining -> Settling -> RentCheck ->
//! {RoundStart | GameOver}`. Mining and settling run synchronously inside
//! [`GameSession::spin`]: a presenting layer stages the emitted events with
//! delays, a headless caller ignores the pacing entirely, and the commit
//! order is identical either way. Because every step commits before `spin`
//! returns, there is never in-flight work to flush on an early exit.
//!
//! A dice roll that asks for more cells than remain covered settles the
//! current board first, regenerates, and carries the remainder into the
//! fresh board; the total number of mined cells always equals the roll.

use std::collections::HashSet;
use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::board::Board;
use crate::catalog::{Catalog, SymbolDefinition};
use crate::decision::SymbolChooser;
use crate::engine::settle::{CellSettlement, settle_batch};
use crate::engine::state::EngineState;
use crate::engine::{BondRuntime, ResolveCtx, bonds};
use crate::events::SettleEvent;
use crate::ids::SymbolKey;
use crate::pool::Pool;
use crate::round::{BestScore, GameOutcome, RoundState, Tuning, dice_faces};

// ============================================================================
// Phases and errors
// ============================================================================

/// The externally visible state-machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a pick from the current symbol offer.
    SelectingSymbol,
    /// Waiting for a dice roll; mining and settlement run inside it.
    Spinning,
    /// Terminal; see [`GameSession::outcome`].
    GameOver,
}

/// API misuse errors. Game outcomes are never errors; the only way a step
/// can fail is calling it in the wrong phase or with a bad index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    WrongPhase { expected: Phase, actual: Phase },
    BadChoice { index: usize, offered: usize },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::WrongPhase { expected, actual } => {
                write!(f, "expected phase {expected:?}, session is in {actual:?}")
            }
            StepError::BadChoice { index, offered } => {
                write!(f, "choice index {index} out of range ({offered} offered)")
            }
        }
    }
}

impl std::error::Error for StepError {}

/// Everything one spin did, for the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct SpinReport {
    pub rolls: Vec<u8>,
    /// Cells mined by this roll, after dig doubling.
    pub reveal_target: u32,
    pub dig_doubled: bool,
    /// Per-cell commits across every board generation of this spin.
    pub settlements: Vec<CellSettlement>,
    /// Net coin change from settlement (excluding rent).
    pub coin_delta: i64,
    pub rent_paid: Option<i64>,
    pub round_advanced: bool,
    /// Set when this spin ended the game.
    pub outcome: Option<GameOutcome>,
    /// Ordered event log for this spin.
    pub events: Vec<SettleEvent>,
}

// ============================================================================
// Session
// ============================================================================

/// One game from first offer to game over. Owns every moving part; the
/// only inputs are the chosen offer index and the spin trigger.
#[derive(Debug)]
pub struct GameSession {
    pub(crate) catalog: Catalog,
    pub(crate) tuning: Tuning,
    pub(crate) pool: Pool,
    pub(crate) board: Board,
    pub(crate) round: RoundState,
    pub(crate) engine: EngineState,
    pub(crate) bonds_rt: BondRuntime,
    pub(crate) rng: StdRng,
    pub(crate) phase: Phase,
    outcome: Option<GameOutcome>,
    pub(crate) offer: Vec<SymbolKey>,
    pub(crate) best: BestScore,
    /// Highest coin count seen this run, for the high-score record.
    pub(crate) peak_coins: i64,
    log: Vec<SettleEvent>,
}

impl GameSession {
    pub fn new(catalog: Catalog, tuning: Tuning, seed: u64) -> Self {
        let mut pool = Pool::new();
        for key in &tuning.starting_symbols {
            if catalog.contains(key) {
                pool.add(key.clone());
            } else {
                log::warn!("starting symbol '{key}' not in catalog; skipped");
            }
        }
        let round = RoundState::new(&tuning);
        let peak_coins = round.coins;
        let mut session = Self {
            catalog,
            tuning,
            pool,
            board: Board::new(),
            round,
            engine: EngineState::new(),
            bonds_rt: BondRuntime::default(),
            rng: StdRng::seed_from_u64(seed),
            phase: Phase::SelectingSymbol,
            outcome: None,
            offer: Vec::new(),
            best: BestScore::default(),
            peak_coins,
            log: Vec::new(),
        };
        session.make_offer();
        session
    }

    /// Reassemble a session from snapshot parts; see `snapshot`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_snapshot_parts(
        catalog: Catalog,
        tuning: Tuning,
        pool: Pool,
        board: Board,
        round: RoundState,
        engine: EngineState,
        bonds_rt: BondRuntime,
        rng: StdRng,
        phase: Phase,
        offer: Vec<SymbolKey>,
        best: BestScore,
        peak_coins: i64,
    ) -> Self {
        Self {
            catalog,
            tuning,
            pool,
            board,
            round,
            engine,
            bonds_rt,
            rng,
            phase,
            outcome: None,
            offer,
            best,
            peak_coins,
            log: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    pub fn round_state(&self) -> &RoundState {
        &self.round
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn best_score(&self) -> &BestScore {
        &self.best
    }

    /// The full ordered settlement log since game start.
    pub fn events(&self) -> &[SettleEvent] {
        &self.log
    }

    /// The current symbol offer, empty outside `SelectingSymbol`.
    pub fn offer(&self) -> Vec<&SymbolDefinition> {
        self.offer
            .iter()
            .filter_map(|key| self.catalog.get(key))
            .collect()
    }

    // ------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------

    /// Pick a symbol from the offer; the board regenerates and the session
    /// moves to `Spinning`.
    pub fn choose_symbol(&mut self, index: usize) -> Result<SymbolKey, StepError> {
        self.expect_phase(Phase::SelectingSymbol)?;
        let Some(key) = self.offer.get(index).cloned() else {
            return Err(StepError::BadChoice {
                index,
                offered: self.offer.len(),
            });
        };
        self.pool.add(key.clone());
        self.begin_spin_phase();
        Ok(key)
    }

    /// Decline the offer (or proceed when the catalog had nothing to
    /// offer); the board still regenerates for the new round.
    pub fn skip_selection(&mut self) -> Result<(), StepError> {
        self.expect_phase(Phase::SelectingSymbol)?;
        self.begin_spin_phase();
        Ok(())
    }

    fn begin_spin_phase(&mut self) {
        self.offer.clear();
        self.board.regenerate(
            &self.pool,
            &self.catalog,
            self.tuning.special_cells,
            &mut self.rng,
        );
        self.bonds_rt
            .sync(&self.catalog, &self.pool, self.round.round);
        self.phase = Phase::Spinning;
    }

    /// Roll the dice, mine, settle, and run the rent check when the
    /// round's spins are exhausted.
    pub fn spin(&mut self) -> Result<SpinReport, StepError> {
        self.expect_phase(Phase::Spinning)?;
        let mut report = SpinReport::default();

        // Dice: base count plus one-spin bonuses plus active bond dice,
        // over the pool-dependent face set.
        let faces = dice_faces(&self.pool, &self.catalog);
        let dice_n = self.round.dice_count
            + self.engine.take_temp_dice_bonus()
            + bonds::bonus_dice(&self.catalog, &self.pool);
        report.rolls = (0..dice_n)
            .map(|_| faces.choose(&mut self.rng).copied().unwrap_or(1))
            .collect();
        let mut reveal_target: u32 = report.rolls.iter().map(|&f| f as u32).sum();
        report.dig_doubled = self.engine.take_double_dig();
        if report.dig_doubled {
            reveal_target *= 2;
        }
        report.reveal_target = reveal_target;
        report.events.push(SettleEvent::DiceRolled {
            rolls: report.rolls.clone(),
            total: reveal_target,
            doubled: report.dig_doubled,
        });

        // Mine with carry-over: settle the current board before the next
        // generation is created and mined with the remainder.
        let coins_before = self.round.coins;
        let mut remaining = reveal_target as usize;
        while remaining > 0 {
            if self.board.covered_count() == 0 {
                self.board.regenerate(
                    &self.pool,
                    &self.catalog,
                    self.tuning.special_cells,
                    &mut self.rng,
                );
                report.events.push(SettleEvent::BoardRegenerated);
            }
            let mined = self.board.mine_random(remaining, &mut self.rng);
            remaining -= mined.len();

            let round_no = self.round.round;
            let mut ctx = ResolveCtx {
                catalog: &self.catalog,
                tuning: &self.tuning,
                pool: &mut self.pool,
                state: &mut self.engine,
                bonds: &mut self.bonds_rt,
                rng: &mut self.rng,
                events: &mut report.events,
            };
            let settled = settle_batch(&mut ctx, &self.board, &mined, round_no);
            self.round.coins += settled.total;
            report.settlements.extend(settled.cells);
        }
        report.coin_delta = self.round.coins - coins_before;
        self.peak_coins = self.peak_coins.max(self.round.coins);

        self.round.spins_remaining -= 1;
        if self.round.spins_remaining == 0 {
            self.rent_check(&mut report);
        }

        self.log.extend(report.events.iter().cloned());
        report.outcome = self.outcome.clone();
        Ok(report)
    }

    /// Drive the session to its end with a chooser, bounded by `max_steps`
    /// spins/choices. Returns the outcome, or `None` if the bound was hit.
    pub fn run_to_completion(
        &mut self,
        chooser: &mut dyn SymbolChooser,
        max_steps: usize,
    ) -> Option<GameOutcome> {
        for _ in 0..max_steps {
            match self.phase {
                Phase::SelectingSymbol => {
                    if self.offer.is_empty() {
                        let _ = self.skip_selection();
                    } else {
                        let offer = self.offer();
                        let index = chooser.choose(&offer).min(offer.len() - 1);
                        let _ = self.choose_symbol(index);
                    }
                }
                Phase::Spinning => {
                    let _ = self.spin();
                }
                Phase::GameOver => return self.outcome.clone(),
            }
        }
        self.outcome.clone()
    }

    // ------------------------------------------------------------------
    // Rent check and round start
    // ------------------------------------------------------------------

    fn rent_check(&mut self, report: &mut SpinReport) {
        if self.round.coins < self.round.rent {
            let outcome = GameOutcome::Defeat {
                round: self.round.round,
                rent_due: self.round.rent,
                coins: self.round.coins,
            };
            self.end_game(outcome, &mut report.events);
            return;
        }

        self.round.coins -= self.round.rent;
        report.rent_paid = Some(self.round.rent);
        report.events.push(SettleEvent::RentPaid {
            amount: self.round.rent,
        });

        if self.round.round >= self.tuning.final_round {
            let outcome = GameOutcome::Victory {
                rounds: self.round.round,
                coins: self.round.coins,
            };
            self.end_game(outcome, &mut report.events);
            return;
        }

        self.round.advance_round(&self.tuning);
        report.round_advanced = true;
        report.events.push(SettleEvent::RoundAdvanced {
            round: self.round.round,
            rent: self.round.rent,
        });

        let force_end = self.run_round_start(&mut report.events);
        if force_end {
            let outcome = GameOutcome::Defeat {
                round: self.round.round,
                rent_due: self.round.rent,
                coins: self.round.coins,
            };
            self.end_game(outcome, &mut report.events);
            return;
        }

        self.make_offer();
        self.phase = Phase::SelectingSymbol;
    }

    /// Round-start processing, in fixed order: deferred bonuses, buff and
    /// penalty countdowns, checks, bond round ticks, then the per-round
    /// state reset. Returns true when something force-ends the run.
    fn run_round_start(&mut self, events: &mut Vec<SettleEvent>) -> bool {
        // Deferred bonuses apply and purge, exactly once each.
        for (key, pending) in self.engine.take_next_round_bonuses() {
            self.round.coins += pending.bonus;
            events.push(SettleEvent::DeferredApplied {
                symbol: key.clone(),
                bonus: pending.bonus,
            });
            if pending.eliminate_self && self.pool.remove_first(&key) {
                events.push(SettleEvent::Eliminated {
                    symbol: key,
                    count: 1,
                });
            }
        }

        // Buff/penalty countdowns. Entries whose originating symbol has
        // left the pool are dropped without firing.
        tick_round_start_map(
            &mut self.engine.round_start_buffs,
            &self.pool,
            &mut self.round.coins,
            events,
        );
        tick_round_start_map(
            &mut self.engine.round_start_penalties,
            &self.pool,
            &mut self.round.coins,
            events,
        );

        let mut force_end = false;

        // Checks come due after their countdown.
        let mut check_keys: Vec<SymbolKey> =
            self.engine.round_start_checks.keys().cloned().collect();
        check_keys.sort();
        for key in check_keys {
            if !self.pool.contains(&key) {
                self.engine.round_start_checks.remove(&key);
                continue;
            }
            let Some(check) = self.engine.round_start_checks.get_mut(&key) else {
                continue;
            };
            if self.pool.contains(&check.required) {
                // Satisfied early; the curse lifts.
                self.engine.round_start_checks.remove(&key);
                continue;
            }
            check.rounds_elapsed += 1;
            if check.rounds_elapsed >= check.rounds_total {
                let penalty = check.penalty_on_fail;
                let ends = check.ends_game_on_fail;
                self.round.coins -= penalty;
                events.push(SettleEvent::CheckFailed {
                    symbol: key.clone(),
                    penalty,
                });
                force_end |= ends;
                self.engine.round_start_checks.remove(&key);
            }
        }

        // Bond round ticks: spawns, trickles, blessing countdowns.
        let round_no = self.round.round;
        let mut ctx = ResolveCtx {
            catalog: &self.catalog,
            tuning: &self.tuning,
            pool: &mut self.pool,
            state: &mut self.engine,
            bonds: &mut self.bonds_rt,
            rng: &mut self.rng,
            events,
        };
        let tick = BondRuntime::round_tick(&mut ctx, round_no);
        self.round.coins += tick.coins;
        force_end |= tick.ends_game;

        self.peak_coins = self.peak_coins.max(self.round.coins);
        self.engine.reset_round_state();
        force_end
    }

    fn end_game(&mut self, outcome: GameOutcome, events: &mut Vec<SettleEvent>) {
        self.best.record(
            self.round.round,
            self.round.spins_used(&self.tuning),
            self.peak_coins,
        );
        events.push(SettleEvent::GameEnded {
            outcome: outcome.clone(),
        });
        self.outcome = Some(outcome);
        self.phase = Phase::GameOver;
    }

    fn make_offer(&mut self) {
        let extra = self.engine.take_extra_symbol_choices();
        let offer = self
            .catalog
            .offer_choices(&mut self.rng, &HashSet::new(), extra);
        self.offer = offer.into_iter().map(|def| def.key.clone()).collect();
        if self.offer.is_empty() {
            log::warn!("catalog offered no symbols; selection will be skipped");
        }
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), StepError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(StepError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }
}

/// Tick one round-start countdown registry: skip-and-drop entries whose
/// originating symbol is gone, apply the delta, remove completed entries.
fn tick_round_start_map(
    map: &mut std::collections::HashMap<SymbolKey, crate::engine::state::RoundStartEntry>,
    pool: &Pool,
    coins: &mut i64,
    events: &mut Vec<SettleEvent>,
) {
    let mut keys: Vec<SymbolKey> = map.keys().cloned().collect();
    keys.sort();
    for key in keys {
        if !pool.contains(&key) {
            map.remove(&key);
            continue;
        }
        let Some(entry) = map.get_mut(&key) else {
            continue;
        };
        entry.rounds_elapsed += 1;
        let delta = entry.delta_per_round;
        let done = entry.rounds_elapsed >= entry.rounds_total;
        *coins += delta;
        events.push(SettleEvent::RoundStartDelta {
            symbol: key.clone(),
            delta,
        });
        if done {
            map.remove(&key);
        }
    }
}
