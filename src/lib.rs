//! paydirt - rules engine for a slot-mining roguelike.
//!
//! The loop: pick a symbol from a weighted offer, roll dice, mine cells on
//! a 5x5 board, resolve symbol and bond effects, pay escalating rent,
//! repeat for up to thirty rounds. This crate is the headless engine:
//! catalog, pool, board, effect resolution, and the round state machine.
//! Rendering, audio, and persistence are consumers of its data.

pub mod board;
pub mod catalog;
pub mod decision;
pub mod effect;
pub mod engine;
pub mod events;
pub mod game_loop;
pub mod ids;
pub mod pool;
pub mod round;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use board::{BOARD_COLS, BOARD_ROWS, BOARD_SIZE, Board, Cell};
pub use catalog::{BondDefinition, Catalog, Rarity, SymbolDefinition, definitions};
pub use decision::{FirstChoice, RandomChoice, ScriptedChoices, SymbolChooser};
pub use effect::{
    BondActivation, BondEffect, BuffTarget, ConvertInto, EffectKind, SpawnSource, SymbolFilter,
    TriggerScope,
};
pub use engine::{
    BondProgress, BondRuntime, CellSettlement, EngineState, RevealBatch, SettleOutcome,
};
pub use events::SettleEvent;
pub use game_loop::{GameSession, Phase, SpinReport, StepError};
pub use ids::{BondId, InstanceId, SymbolKey};
pub use pool::{Pool, SymbolInstance};
pub use round::{BestScore, GameOutcome, RoundState, Tuning};
pub use snapshot::{CellSnapshot, GameSnapshot};
