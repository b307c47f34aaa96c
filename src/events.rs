//! Settlement event log: the presentation boundary.
//!
//! The engine emits these in commit order; a UI layer renders and localizes
//! them. Events carry codes and data, never pre-localized strings.

use crate::ids::{BondId, SymbolKey};
use crate::round::GameOutcome;

/// One entry in the ordered settlement log.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(tag = "event", rename_all = "snake_case"))]
pub enum SettleEvent {
    DiceRolled {
        rolls: Vec<u8>,
        total: u32,
        doubled: bool,
    },
    BoardRegenerated,
    /// One cell committed, in reveal order. This is the
    /// `(cell, symbol?, earnings)` animation sequence.
    CellSettled {
        cell: usize,
        symbol: Option<SymbolKey>,
        earnings: i64,
    },
    /// A symbol's own effect resolved for this coin delta.
    SymbolResolved { symbol: SymbolKey, delta: i64 },
    Spawned { symbol: SymbolKey, count: u32 },
    Eliminated { symbol: SymbolKey, count: u32 },
    Converted { from: SymbolKey, into: SymbolKey },
    DeferredRegistered { symbol: SymbolKey, bonus: i64 },
    DeferredApplied { symbol: SymbolKey, bonus: i64 },
    /// A registered round-start buff or penalty ticked.
    RoundStartDelta { symbol: SymbolKey, delta: i64 },
    /// A round-start check came due and failed.
    CheckFailed { symbol: SymbolKey, penalty: i64 },
    /// A bond paid or charged coins.
    BondTriggered { bond: BondId, delta: i64 },
    BondInfected {
        bond: BondId,
        from: SymbolKey,
        into: SymbolKey,
    },
    BondSpawned { bond: BondId, symbol: SymbolKey, count: u32 },
    /// A timed blessing ran out of rounds.
    BlessingExpired { bond: BondId },
    /// An all-target multiplier scaled the batch total.
    BatchMultiplied { multiplier: f64 },
    /// The consumed-once double-reward flag fired.
    RewardDoubled,
    RentPaid { amount: i64 },
    RoundAdvanced { round: u32, rent: i64 },
    GameEnded { outcome: GameOutcome },
}
