//! Settlement of one reveal batch.
//!
//! Fixed resolution order: cells commit one at a time in reveal order
//! (base value, adjacency, special-cell multiplier), then the symbol
//! effect resolver runs over the frozen batch, then the per-mine bond
//! effects, then all-target global multipliers, then the consumed-once
//! reward doubling. A headless caller runs this in one call; an animating
//! caller stages the emitted events with delays. Either way the commit
//! order is identical.

use crate::board::Board;
use crate::catalog::SymbolDefinition;
use crate::engine::symbol_effects::resolve_symbol;
use crate::engine::{BondRuntime, ResolveCtx, RevealBatch, bonds};
use crate::events::SettleEvent;
use crate::ids::SymbolKey;

/// One committed cell of the settlement sequence, for animation.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSettlement {
    pub cell: usize,
    pub symbol: Option<SymbolKey>,
    pub earnings: i64,
}

/// The result of settling one reveal batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettleOutcome {
    /// Total coin delta, after every modifier.
    pub total: i64,
    /// Per-cell commits in reveal order.
    pub cells: Vec<CellSettlement>,
}

fn scale(value: i64, multiplier: f64) -> i64 {
    if multiplier == 1.0 {
        value
    } else {
        (value as f64 * multiplier).round() as i64
    }
}

/// Whether two definitions share any type tag ("same-type" for adjacency).
fn shares_tag(a: &SymbolDefinition, b: &SymbolDefinition) -> bool {
    a.type_tags.intersection(&b.type_tags).next().is_some()
}

/// Settle the given revealed cells against the current pool and board.
pub fn settle_batch(
    ctx: &mut ResolveCtx<'_>,
    board: &Board,
    revealed: &[usize],
    current_round: u32,
) -> SettleOutcome {
    let batch = RevealBatch::capture(board, ctx.pool, revealed);
    ctx.state.begin_resolution();

    let mut outcome = SettleOutcome::default();

    // Cells commit one at a time; adjacency looks only at cells mined in
    // this same batch, in both directions.
    for entry in batch.entries() {
        let earnings = match &entry.symbol {
            Some((_, key)) => match ctx.catalog.get(key) {
                Some(def) => {
                    let mut earnings = def.base_value
                        + ctx.state.value_bonus_for(def)
                        + bonds::flat_bonus_for(ctx.catalog, ctx.pool, def);
                    for neighbor in Board::neighbors(entry.cell) {
                        if let Some(neighbor_key) = batch.key_at_cell(neighbor)
                            && let Some(neighbor_def) = ctx.catalog.get(neighbor_key)
                            && shares_tag(def, neighbor_def)
                        {
                            earnings += ctx.tuning.adjacency_bonus;
                        }
                    }
                    let multiplier = ctx.state.multiplier_for(def)
                        * bonds::multiplier_for(ctx.catalog, ctx.pool, def);
                    earnings = scale(earnings, multiplier);
                    if board.cell(entry.cell).special {
                        earnings =
                            scale(earnings, bonds::special_multiplier(ctx.catalog, ctx.pool));
                    }
                    earnings
                }
                None => {
                    log::warn!("cell {} holds unknown symbol '{key}'; settling for 0", entry.cell);
                    0
                }
            },
            None => ctx.tuning.empty_cell_value,
        };

        outcome.total += earnings;
        let symbol = entry.symbol.as_ref().map(|(_, key)| key.clone());
        ctx.events.push(SettleEvent::CellSettled {
            cell: entry.cell,
            symbol: symbol.clone(),
            earnings,
        });
        outcome.cells.push(CellSettlement {
            cell: entry.cell,
            symbol,
            earnings,
        });
    }

    // Symbol effects run against the frozen batch, mutating the live pool.
    for entry in batch.entries() {
        if let Some((instance, key)) = &entry.symbol {
            let delta = resolve_symbol(ctx, &batch, *instance, key);
            if delta != 0 {
                ctx.events.push(SettleEvent::SymbolResolved {
                    symbol: key.clone(),
                    delta,
                });
            }
            outcome.total += delta;
        }
    }

    outcome.total += BondRuntime::mine_tick(ctx, &batch, current_round);

    let batch_multiplier = ctx.state.batch_multiplier();
    if batch_multiplier != 1.0 {
        outcome.total = scale(outcome.total, batch_multiplier);
        ctx.events.push(SettleEvent::BatchMultiplied {
            multiplier: batch_multiplier,
        });
    }

    if ctx.state.take_double_reward() {
        outcome.total *= 2;
        ctx.events.push(SettleEvent::RewardDoubled);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BondDefinition, Catalog, Rarity, SymbolDefinition};
    use crate::effect::{BondActivation, BondEffect, BuffTarget, SymbolFilter};
    use crate::engine::state::{EngineState, GlobalBuff};
    use crate::ids::InstanceId;
    use crate::pool::Pool;
    use crate::round::Tuning;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Bed {
        catalog: Catalog,
        tuning: Tuning,
        pool: Pool,
        state: EngineState,
        bonds: BondRuntime,
        rng: StdRng,
        events: Vec<SettleEvent>,
        board: Board,
    }

    impl Bed {
        fn new(symbols: Vec<SymbolDefinition>, bonds: Vec<BondDefinition>) -> Self {
            Self {
                catalog: Catalog::new(symbols, bonds),
                tuning: Tuning::default(),
                pool: Pool::new(),
                state: EngineState::new(),
                bonds: BondRuntime::default(),
                rng: StdRng::seed_from_u64(9),
                events: Vec::new(),
                board: Board::new(),
            }
        }

        fn settle(&mut self, revealed: &[usize]) -> SettleOutcome {
            let mut ctx = ResolveCtx {
                catalog: &self.catalog,
                tuning: &self.tuning,
                pool: &mut self.pool,
                state: &mut self.state,
                bonds: &mut self.bonds,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            settle_batch(&mut ctx, &self.board, revealed, 1)
        }

        /// Bury an instance of `key` at a cell.
        fn bury(&mut self, cell: usize, key: &str) -> InstanceId {
            let id = self.pool.add(crate::ids::SymbolKey::new(key));
            self.board.place(cell, Some(id), false, false);
            id
        }
    }

    fn ore(key: &str, value: i64) -> SymbolDefinition {
        SymbolDefinition::new(key, key, value, Rarity::Common, 10).with_tags(&["material", "ore"])
    }

    #[test]
    fn test_adjacency_counts_same_batch_neighbors_both_ways() {
        let mut bed = Bed::new(
            vec![ore("iron_ore", 4), ore("coal_chunk", 1)],
            Vec::new(),
        );
        // Center cell 12 and its upper neighbor 7 share the "ore" tag;
        // corner cell 0 has no mined same-type neighbor.
        bed.bury(12, "iron_ore");
        bed.bury(7, "coal_chunk");
        bed.bury(0, "iron_ore");

        let outcome = bed.settle(&[12, 7, 0]);
        let by_cell = |c: usize| {
            outcome
                .cells
                .iter()
                .find(|s| s.cell == c)
                .unwrap()
                .earnings
        };
        assert_eq!(by_cell(12), 4 + 2);
        assert_eq!(by_cell(7), 1 + 2);
        assert_eq!(by_cell(0), 4);
    }

    #[test]
    fn test_adjacency_ignores_unmined_neighbors() {
        let mut bed = Bed::new(vec![ore("iron_ore", 4)], Vec::new());
        bed.bury(12, "iron_ore");
        // Cell 7 holds a same-type symbol but is NOT part of the batch.
        bed.bury(7, "iron_ore");

        let outcome = bed.settle(&[12]);
        assert_eq!(outcome.cells[0].earnings, 4);
    }

    #[test]
    fn test_empty_cell_pays_flat_value() {
        let mut bed = Bed::new(Vec::new(), Vec::new());
        bed.board.place(3, None, false, false);
        let outcome = bed.settle(&[3]);
        assert_eq!(outcome.total, bed.tuning.empty_cell_value);
    }

    #[test]
    fn test_special_cell_multiplier_from_bond() {
        let mut bed = Bed::new(
            vec![ore("iron_ore", 4), ore("coal_chunk", 1), ore("copper_nugget", 3)],
            vec![BondDefinition::new(
                1,
                "deep_seam",
                "brown",
                BondActivation::TypeCount {
                    tag: "ore".into(),
                    threshold: 3,
                },
                BondEffect::SpecialCellMultiplier { multiplier: 2.0 },
            )],
        );
        bed.pool.add(crate::ids::SymbolKey::new("coal_chunk"));
        bed.pool.add(crate::ids::SymbolKey::new("copper_nugget"));
        let id = bed.pool.add(crate::ids::SymbolKey::new("iron_ore"));
        bed.board.place(4, Some(id), false, true);

        let outcome = bed.settle(&[4]);
        assert_eq!(outcome.total, 8);
    }

    #[test]
    fn test_global_value_bonus_and_batch_multiplier_order() {
        let mut bed = Bed::new(vec![ore("iron_ore", 4)], Vec::new());
        bed.state.global_buffs.insert(
            crate::ids::SymbolKey::new("union_banner"),
            GlobalBuff {
                target: BuffTarget::Tag("ore".into()),
                value_bonus: 3,
                multiplier: 1.0,
                persistent: true,
            },
        );
        bed.state.global_buffs.insert(
            crate::ids::SymbolKey::new("lucky_charm"),
            GlobalBuff {
                target: BuffTarget::All,
                value_bonus: 0,
                multiplier: 2.0,
                persistent: false,
            },
        );
        bed.bury(12, "iron_ore");

        let outcome = bed.settle(&[12]);
        // Cell: (4 + 3); batch total then doubled by the All-target buff.
        assert_eq!(outcome.cells[0].earnings, 7);
        assert_eq!(outcome.total, 14);
    }

    #[test]
    fn test_double_reward_consumed_exactly_once() {
        let mut bed = Bed::new(vec![ore("iron_ore", 4)], Vec::new());
        bed.state.should_double_next_reward = true;
        bed.bury(12, "iron_ore");
        let outcome = bed.settle(&[12]);
        assert_eq!(outcome.total, 8);

        // Next settlement is back to normal.
        bed.bury(13, "iron_ore");
        let outcome = bed.settle(&[13]);
        assert_eq!(outcome.total, 4);
    }

    #[test]
    fn test_bond_flat_bonus_not_compounded_into_base() {
        let mut bed = Bed::new(
            vec![
                SymbolDefinition::new("miner", "Miner", 2, Rarity::Common, 10).with_tag("human"),
                SymbolDefinition::new("foreman", "Foreman", 3, Rarity::Rare, 10).with_tag("human"),
            ],
            vec![BondDefinition::new(
                2,
                "union",
                "gold",
                BondActivation::FixedIdSet {
                    required: vec![
                        crate::ids::SymbolKey::new("miner"),
                        crate::ids::SymbolKey::new("foreman"),
                    ],
                },
                BondEffect::FlatValueBonus {
                    filter: SymbolFilter::tag("human"),
                    bonus: 2,
                },
            )],
        );
        bed.pool.add(crate::ids::SymbolKey::new("foreman"));
        bed.bury(6, "miner");
        assert_eq!(bed.settle(&[6]).total, 4);

        // Settling again must yield the same bonus, not an accumulated one.
        bed.board.place(6, None, true, false);
        bed.bury(6, "miner");
        assert_eq!(bed.settle(&[6]).total, 4);
    }
}
