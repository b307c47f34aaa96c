//! Cross-call engine state: the registries that survive between symbol
//! resolutions within a round and the discipline for resetting them.
//!
//! Three lifetimes coexist here:
//! - session-scoped: global buffs marked persistent (cleared only by
//!   `reset_all`),
//! - round-scoped: diminishing-value counters, non-persistent buffs, and
//!   leftovers of the single-round flags (cleared by `reset_round_state`),
//! - resolution-scoped: the eliminated counter and the once-only fired set
//!   (cleared by `begin_resolution`).
//!
//! The consumable flags (`double dig`, `double reward`, dice/choice
//! bonuses, next-round bonuses) clear themselves at the moment of
//! consumption, so the round reset only catches entries that never got the
//! chance to fire.

use std::collections::{HashMap, HashSet};

use crate::catalog::SymbolDefinition;
use crate::effect::BuffTarget;
use crate::ids::SymbolKey;

/// A standing pool-wide modifier registered by a symbol effect, keyed by
/// the originating symbol in [`EngineState::global_buffs`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalBuff {
    pub target: BuffTarget,
    pub value_bonus: i64,
    pub multiplier: f64,
    /// Non-persistent buffs are filtered out at the next round start.
    pub persistent: bool,
}

/// A registered round-start buff or penalty with its own countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundStartEntry {
    /// Coin delta applied on each tick; negative for penalties.
    pub delta_per_round: i64,
    pub rounds_total: u32,
    pub rounds_elapsed: u32,
}

/// A registered round-start check: after the countdown, `required` must be
/// in the pool or the penalty lands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundStartCheck {
    pub required: SymbolKey,
    pub rounds_total: u32,
    pub rounds_elapsed: u32,
    pub penalty_on_fail: i64,
    pub ends_game_on_fail: bool,
}

/// A bonus applied at the next round start, consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct NextRoundBonus {
    pub bonus: i64,
    /// Remove one instance of the originating symbol when applied.
    pub eliminate_self: bool,
}

/// The engine's mutable cross-call state. Created once per game session.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineState {
    /// Standing modifiers, keyed by the originating symbol's key.
    pub global_buffs: HashMap<SymbolKey, GlobalBuff>,
    /// Round-start buffs, keyed by the originating symbol's key.
    pub round_start_buffs: HashMap<SymbolKey, RoundStartEntry>,
    /// Round-start penalties, keyed by the originating symbol's key.
    pub round_start_penalties: HashMap<SymbolKey, RoundStartEntry>,
    /// Round-start checks, keyed by the originating symbol's key.
    pub round_start_checks: HashMap<SymbolKey, RoundStartCheck>,
    /// Deferred bonuses for the next round start, keyed by origin.
    pub next_round_bonuses: HashMap<SymbolKey, NextRoundBonus>,
    /// Extra dice on the next spin only.
    pub temp_dice_bonus: u32,
    /// Double the next settled batch total.
    pub should_double_next_reward: bool,
    /// Double the next dice roll's reveal count.
    pub should_double_dig_count: bool,
    /// Extra choices in the next symbol offer.
    pub extra_symbol_choices: u32,
    /// Symbols removed so far in the current mining resolution.
    pub eliminated_this_resolution: u32,
    /// Per-key resolution counters for diminishing-value effects.
    diminish_counters: HashMap<SymbolKey, u32>,
    /// Once-only effect keys that already fired in this reveal batch.
    fired_once_only: HashSet<SymbolKey>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Reset points
    // ------------------------------------------------------------------

    /// Start of a mining resolution: zero the elimination counter and the
    /// once-only fired set.
    pub fn begin_resolution(&mut self) {
        self.eliminated_this_resolution = 0;
        self.fired_once_only.clear();
    }

    /// Round boundary: clear per-round-only state. Registries with their
    /// own countdowns and persistent buffs survive.
    pub fn reset_round_state(&mut self) {
        self.diminish_counters.clear();
        self.eliminated_this_resolution = 0;
        self.fired_once_only.clear();
        self.temp_dice_bonus = 0;
        self.should_double_next_reward = false;
        self.should_double_dig_count = false;
        self.global_buffs.retain(|_, buff| buff.persistent);
    }

    /// Full wipe; only on new game.
    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    // ------------------------------------------------------------------
    // Exactly-once consumption
    // ------------------------------------------------------------------

    /// Consume the double-dig flag. True at most once per set.
    pub fn take_double_dig(&mut self) -> bool {
        std::mem::take(&mut self.should_double_dig_count)
    }

    /// Consume the double-reward flag. True at most once per set.
    pub fn take_double_reward(&mut self) -> bool {
        std::mem::take(&mut self.should_double_next_reward)
    }

    /// Consume the spin's temporary dice bonus.
    pub fn take_temp_dice_bonus(&mut self) -> u32 {
        std::mem::take(&mut self.temp_dice_bonus)
    }

    /// Consume the pending extra offer choices.
    pub fn take_extra_symbol_choices(&mut self) -> u32 {
        std::mem::take(&mut self.extra_symbol_choices)
    }

    /// Drain the deferred bonuses for application at round start.
    pub fn take_next_round_bonuses(&mut self) -> Vec<(SymbolKey, NextRoundBonus)> {
        let mut drained: Vec<(SymbolKey, NextRoundBonus)> =
            self.next_round_bonuses.drain().collect();
        drained.sort_by(|a, b| a.0.cmp(&b.0));
        drained
    }

    // ------------------------------------------------------------------
    // Once-only gating
    // ------------------------------------------------------------------

    /// First call per resolution for a key returns true; later calls false.
    pub fn claim_once_only(&mut self, key: &SymbolKey) -> bool {
        self.fired_once_only.insert(key.clone())
    }

    // ------------------------------------------------------------------
    // Diminishing-value counters
    // ------------------------------------------------------------------

    /// Reward for the next resolution of `key`, then bump its counter.
    pub fn diminish_next(&mut self, key: &SymbolKey, initial: i64, decrement: i64, min: i64) -> i64 {
        let uses = self.diminish_counters.entry(key.clone()).or_insert(0);
        let reward = (initial - decrement * (*uses as i64)).max(min);
        *uses += 1;
        reward
    }

    // ------------------------------------------------------------------
    // Buff queries (recomputed fresh each settlement)
    // ------------------------------------------------------------------

    /// Summed flat value bonus applying to `def`.
    pub fn value_bonus_for(&self, def: &SymbolDefinition) -> i64 {
        self.global_buffs
            .values()
            .filter(|b| b.target.covers(def))
            .map(|b| b.value_bonus)
            .sum()
    }

    /// Product of targeted (non-`All`) multipliers applying to `def`.
    pub fn multiplier_for(&self, def: &SymbolDefinition) -> f64 {
        self.global_buffs
            .values()
            .filter(|b| !matches!(b.target, BuffTarget::All) && b.target.covers(def))
            .map(|b| b.multiplier)
            .product()
    }

    /// Product of `All`-target multipliers, applied once to the batch total.
    pub fn batch_multiplier(&self) -> f64 {
        self.global_buffs
            .values()
            .filter(|b| matches!(b.target, BuffTarget::All))
            .map(|b| b.multiplier)
            .product()
    }
}
