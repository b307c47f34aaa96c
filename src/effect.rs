//! Effect vocabulary for symbols and bonds.
//!
//! Effects are data: each symbol definition carries one `EffectKind` variant
//! with its parameters, and the resolver in `engine::symbol_effects`
//! interprets it against the live pool and engine state when the symbol is
//! revealed. Bonds carry a `BondEffect` the same way.
//!
//! The parameter bags of the original config become variant fields here, so
//! adding a new archetype is a compiler-checked change instead of a
//! stringly-typed lookup.

use crate::catalog::{Rarity, SymbolDefinition};
use crate::ids::SymbolKey;

// ============================================================================
// Shared filter / target vocabulary
// ============================================================================

/// Selects symbols either by exact key or by type tag.
///
/// Used by counting, elimination and conversion effects. Tag matching is
/// non-exclusive: a symbol matches `Tag` if the tag appears anywhere in its
/// tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "snake_case"))]
pub enum SymbolFilter {
    /// Exact stable-key match.
    Key(SymbolKey),
    /// Any symbol carrying this type tag.
    Tag(String),
}

impl SymbolFilter {
    pub fn key(key: impl Into<SymbolKey>) -> Self {
        Self::Key(key.into())
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    /// Whether `def` matches this filter.
    pub fn matches(&self, def: &SymbolDefinition) -> bool {
        match self {
            SymbolFilter::Key(key) => def.key == *key,
            SymbolFilter::Tag(tag) => def.type_tags.contains(tag.as_str()),
        }
    }
}

/// Where a conditional effect looks for its trigger symbol.
///
/// "Present in this reveal batch" and "present in the live pool" are distinct
/// conditions and must not be conflated: a hunter that rewards on a vampire
/// *mined this turn* checks the batch, while a foreman that rewards while a
/// miner is *owned* checks the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "snake_case"))]
pub enum TriggerScope {
    /// The trigger must have been revealed in the same mining batch.
    RevealBatch,
    /// The trigger must currently be in the pool.
    Pool,
}

/// What a spawn effect produces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "snake_case"))]
pub enum SpawnSource {
    /// A fixed symbol by key.
    Key(SymbolKey),
    /// A weighted draw among catalog symbols carrying this tag.
    RandomTag(String),
    /// A uniform draw from an explicit list of keys.
    FromList(Vec<SymbolKey>),
    /// A weighted draw among catalog symbols of this rarity.
    WeightedRarity(Rarity),
}

/// What a conversion effect turns its victims into.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "snake_case"))]
pub enum ConvertInto {
    /// A weighted draw among catalog symbols carrying this tag.
    Tag(String),
    /// A weighted draw among catalog symbols of this rarity.
    Rarity(Rarity),
}

/// Which symbols a global buff applies to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "snake_case"))]
pub enum BuffTarget {
    /// Every settled cell; the multiplier component applies to the batch
    /// total instead of per cell.
    All,
    /// Symbols carrying this tag.
    Tag(String),
    /// An explicit key set.
    Keys(Vec<SymbolKey>),
}

impl BuffTarget {
    /// Whether `def` is covered by this target. `All` covers everything.
    pub fn covers(&self, def: &SymbolDefinition) -> bool {
        match self {
            BuffTarget::All => true,
            BuffTarget::Tag(tag) => def.type_tags.contains(tag.as_str()),
            BuffTarget::Keys(keys) => keys.contains(&def.key),
        }
    }
}

// ============================================================================
// Symbol effects
// ============================================================================

/// The effect a symbol performs when it is revealed by mining.
///
/// One variant per semantic family. The resolver dispatches on the variant
/// and returns a coin delta plus pool mutations; unknown or malformed
/// parameterizations degrade to `None` at the loader boundary so the engine
/// itself never sees them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(tag = "kind", rename_all = "snake_case"))]
pub enum EffectKind {
    /// No effect beyond the base value.
    None,

    /// A flat coin bonus on top of the base value.
    FlatCoins { amount: i64 },

    /// Reward if the trigger symbol is present in the given scope.
    ///
    /// Batch-scoped checks run against the whole reveal batch, not the
    /// prefix settled so far, so trigger order within a batch never matters.
    ConditionalBonus {
        trigger: SymbolKey,
        scope: TriggerScope,
        bonus: i64,
    },

    /// Reward per pool member matching the filter.
    CountBonus {
        filter: SymbolFilter,
        per_unit: i64,
        /// Exclude this very instance from the count.
        exclude_self: bool,
    },

    /// Reward per symbol eliminated earlier in this same mining resolution.
    EliminatedCountBonus { per_unit: i64 },

    /// Remove matching symbols revealed in this batch from the pool,
    /// rewarding per removal. The resolving symbol itself is never a victim.
    EliminateRevealed { filter: SymbolFilter, reward_per: i64 },

    /// Remove every matching symbol from the pool, rewarding per removal.
    PurgePool { filter: SymbolFilter, reward_per: i64 },

    /// If the trigger is present in the given scope, this symbol removes
    /// itself from the pool and grants a reward.
    ConditionalSelfEliminate {
        trigger: SymbolKey,
        scope: TriggerScope,
        reward: i64,
    },

    /// Append freshly drawn instances to the pool, optionally consuming the
    /// spawner.
    Spawn {
        source: SpawnSource,
        count: u32,
        eliminate_self: bool,
    },

    /// Replace up to `count` pool members matching the filter with freshly
    /// drawn symbols of the target shape. The resolving instance is exempt.
    Convert {
        filter: SymbolFilter,
        into: ConvertInto,
        count: u32,
    },

    /// Register a bonus applied at the next round-start, consumed exactly
    /// once.
    DeferredBonus { bonus: i64, eliminate_self: bool },

    /// Grant a coin bonus on each of the next `rounds` round-start ticks.
    RoundStartBuff { bonus_per_round: i64, rounds: u32 },

    /// Deduct coins on each of the next `rounds` round-start ticks.
    RoundStartPenalty { penalty_per_round: i64, rounds: u32 },

    /// After `rounds` round-start ticks, check that `required` is in the
    /// pool; on failure apply the penalty and optionally end the game.
    /// Satisfying the check early removes it.
    RoundStartCheck {
        required: SymbolKey,
        rounds: u32,
        penalty_on_fail: i64,
        ends_game_on_fail: bool,
    },

    /// Register a standing pool-wide modifier. Persistent buffs survive
    /// round boundaries; non-persistent ones are cleared at the next round
    /// start.
    GlobalBuff {
        target: BuffTarget,
        value_bonus: i64,
        multiplier: f64,
        persistent: bool,
    },

    /// Reward that shrinks by `decrement` on each successive resolution of
    /// this symbol key, floored at `min`. The per-key counter resets at
    /// round boundaries.
    DiminishingValue { initial: i64, decrement: i64, min: i64 },

    /// Double the next settled batch total, consumed exactly once.
    DoubleNextReward,

    /// Double the next dice roll's reveal count, consumed exactly once.
    DoubleDigCount,

    /// Extra dice on the next spin only.
    BonusDice { count: u32 },

    /// Extra choices in the next symbol offer, consumed with that offer.
    ExtraSymbolChoices { count: u32 },

    /// Coin gamble: `chance_pct` percent chance of `win`, otherwise `lose`.
    Gamble { chance_pct: u32, win: i64, lose: i64 },
}

impl EffectKind {
    /// Whether this effect does anything when revealed.
    pub fn is_none(&self) -> bool {
        matches!(self, EffectKind::None)
    }
}

impl Default for EffectKind {
    fn default() -> Self {
        EffectKind::None
    }
}

// ============================================================================
// Bond activation and effects
// ============================================================================

/// The condition under which a bond is active.
///
/// Activation is pure: it is evaluated fresh against the current pool on
/// every query, never cached on the definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "snake_case"))]
pub enum BondActivation {
    /// Every required key has at least one live instance in the pool.
    FixedIdSet { required: Vec<SymbolKey> },
    /// At least `threshold` *distinct* symbol keys carrying `tag` are in the
    /// pool. Copies of the same key count once.
    TypeCount { tag: String, threshold: usize },
}

/// The standing effect an active bond grants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BondEffect {
    /// Flat value bonus to matching cells, recomputed fresh each settlement
    /// so it never compounds into stored base values.
    FlatValueBonus { filter: SymbolFilter, bonus: i64 },

    /// Multiplies matching cells' earnings during settlement.
    ValueMultiplier { filter: SymbolFilter, multiplier: f64 },

    /// Multiplies the earnings of special-flagged cells.
    SpecialCellMultiplier { multiplier: f64 },

    /// Coins per matching symbol revealed, paid on every mining resolution.
    PerRevealCoins { filter: SymbolFilter, per_unit: i64 },

    /// Every `every_n_mines`-th mining resolution, converts one pool member
    /// carrying `from_tag` into `into`.
    InfectConvert {
        from_tag: String,
        into: SymbolKey,
        every_n_mines: u32,
    },

    /// Spawns symbols at each round start while active.
    RoundStartSpawn { key: SymbolKey, count: u32 },

    /// Coin trickle at each round start while active.
    RoundStartCoins { amount: i64 },

    /// Flat reward on each of `rounds` consecutive round starts after
    /// activation; when exhausted, optionally force-ends the game. Losing
    /// the activation condition fully resets the countdown.
    TimedBlessing {
        coins_per_round: i64,
        rounds: u32,
        then_ends_game: bool,
    },

    /// Extra dice on every spin while active.
    BonusDice { count: u32 },
}
