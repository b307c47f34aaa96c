//! The bond (synergy) resolver.
//!
//! Activation is a pure query over the current pool, re-evaluated every
//! time bonds are needed; there is no cached "is active" bit to go stale.
//! Cross-round state (blessing countdowns, infection cadence) lives in
//! [`BondRuntime`], keyed by bond id, and is erased the moment a bond's
//! activation lapses: the state machine re-derives from the pool, it does
//! not trust memory.

use std::collections::HashMap;

use crate::catalog::{BondDefinition, Catalog, SymbolDefinition};
use crate::effect::{BondActivation, BondEffect};
use crate::engine::{ResolveCtx, RevealBatch};
use crate::events::SettleEvent;
use crate::ids::BondId;
use crate::pool::Pool;

/// Whether a bond's activation condition currently holds.
pub fn bond_is_active(bond: &BondDefinition, pool: &Pool, catalog: &Catalog) -> bool {
    match &bond.activation {
        BondActivation::FixedIdSet { required } => required.iter().all(|key| pool.contains(key)),
        BondActivation::TypeCount { tag, threshold } => {
            pool.distinct_keys_with_tag(catalog, tag).len() >= *threshold
        }
    }
}

/// Currently active bonds, in definition order.
pub fn active_bonds<'c>(
    catalog: &'c Catalog,
    pool: &Pool,
) -> impl Iterator<Item = &'c BondDefinition> {
    catalog
        .bonds()
        .iter()
        .filter(move |bond| bond_is_active(bond, pool, catalog))
}

/// Persistent per-bond state while its activation holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct BondProgress {
    /// Round on which activation was first detected.
    pub activation_round: u32,
    /// Round-start ticks granted so far (timed bonds).
    pub rounds_elapsed: u32,
    /// Mining resolutions seen while active (infection cadence).
    pub mine_ticks: u32,
    /// A timed bond that has run its course stops granting.
    pub expired: bool,
}

/// Outcome of the bond round-start tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BondRoundTick {
    pub coins: i64,
    /// An exhausted blessing force-ends the run.
    pub ends_game: bool,
}

/// Runtime state for all bonds. Definitions stay immutable; everything
/// mutable lives here.
#[derive(Debug, Clone, Default)]
pub struct BondRuntime {
    progress: HashMap<BondId, BondProgress>,
}

impl BondRuntime {
    pub fn progress(&self, id: BondId) -> Option<&BondProgress> {
        self.progress.get(&id)
    }

    pub(crate) fn progress_map(&self) -> &HashMap<BondId, BondProgress> {
        &self.progress
    }

    pub(crate) fn restore_progress(map: HashMap<BondId, BondProgress>) -> Self {
        Self { progress: map }
    }

    /// Reconcile runtime state with current activation: newly active bonds
    /// get a fresh progress entry stamped with the current round; bonds
    /// whose condition lapsed lose their state entirely (countdowns restart
    /// from zero on re-activation, they are never paused).
    pub fn sync(&mut self, catalog: &Catalog, pool: &Pool, current_round: u32) {
        let mut active: Vec<BondId> = Vec::new();
        for bond in active_bonds(catalog, pool) {
            active.push(bond.id);
            self.progress.entry(bond.id).or_insert(BondProgress {
                activation_round: current_round,
                ..BondProgress::default()
            });
        }
        self.progress.retain(|id, _| active.contains(id));
    }

    /// Per-mining-resolution bond effects: reveal payouts and infection.
    /// Returns the coin delta.
    pub fn mine_tick(ctx: &mut ResolveCtx<'_>, batch: &RevealBatch, current_round: u32) -> i64 {
        ctx.bonds.sync(ctx.catalog, ctx.pool, current_round);
        let bonds: Vec<BondDefinition> = active_bonds(ctx.catalog, ctx.pool).cloned().collect();
        let mut delta = 0;
        for bond in bonds {
            let ticks = {
                let progress = ctx.bonds.progress.entry(bond.id).or_default();
                progress.mine_ticks += 1;
                progress.mine_ticks
            };
            match &bond.effect {
                BondEffect::PerRevealCoins { filter, per_unit } => {
                    let count = batch.matching(ctx.catalog, filter, None).len() as i64;
                    if count > 0 {
                        delta += per_unit * count;
                        ctx.events.push(SettleEvent::BondTriggered {
                            bond: bond.id,
                            delta: per_unit * count,
                        });
                    }
                }
                BondEffect::InfectConvert {
                    from_tag,
                    into,
                    every_n_mines,
                } => {
                    let cadence = (*every_n_mines).max(1);
                    if ticks % cadence != 0 {
                        continue;
                    }
                    if !ctx.catalog.contains(into) {
                        log::warn!("infection target '{into}' not in catalog; skipping");
                        continue;
                    }
                    let victim = ctx.pool.remove_first_matching(
                        ctx.catalog,
                        &crate::effect::SymbolFilter::tag(from_tag.as_str()),
                        None,
                    );
                    if let Some(victim) = victim {
                        ctx.pool.add(into.clone());
                        ctx.events.push(SettleEvent::BondInfected {
                            bond: bond.id,
                            from: victim.key,
                            into: into.clone(),
                        });
                    }
                }
                _ => {}
            }
        }
        delta
    }

    /// Round-start bond effects: spawns, trickles, blessing countdowns.
    pub fn round_tick(ctx: &mut ResolveCtx<'_>, current_round: u32) -> BondRoundTick {
        ctx.bonds.sync(ctx.catalog, ctx.pool, current_round);
        let bonds: Vec<BondDefinition> = active_bonds(ctx.catalog, ctx.pool).cloned().collect();
        let mut tick = BondRoundTick::default();
        for bond in bonds {
            match &bond.effect {
                BondEffect::RoundStartSpawn { key, count } => {
                    if !ctx.catalog.contains(key) {
                        log::warn!("bond spawn target '{key}' not in catalog; skipping");
                        continue;
                    }
                    for _ in 0..*count {
                        ctx.pool.add(key.clone());
                    }
                    ctx.events.push(SettleEvent::BondSpawned {
                        bond: bond.id,
                        symbol: key.clone(),
                        count: *count,
                    });
                }
                BondEffect::RoundStartCoins { amount } => {
                    tick.coins += amount;
                    ctx.events.push(SettleEvent::BondTriggered {
                        bond: bond.id,
                        delta: *amount,
                    });
                }
                BondEffect::TimedBlessing {
                    coins_per_round,
                    rounds,
                    then_ends_game,
                } => {
                    let progress = ctx.bonds.progress.entry(bond.id).or_default();
                    if progress.expired {
                        continue;
                    }
                    progress.rounds_elapsed += 1;
                    tick.coins += coins_per_round;
                    ctx.events.push(SettleEvent::BondTriggered {
                        bond: bond.id,
                        delta: *coins_per_round,
                    });
                    if progress.rounds_elapsed >= *rounds {
                        progress.expired = true;
                        tick.ends_game |= then_ends_game;
                        ctx.events.push(SettleEvent::BlessingExpired { bond: bond.id });
                    }
                }
                _ => {}
            }
        }
        tick
    }
}

// ============================================================================
// Settlement-time modifiers
// ============================================================================
//
// These are recomputed fresh on every settlement from the live pool; a
// bond's flat bonus is never folded into a symbol's stored base value, so
// nothing compounds across rounds and a symbol's own effect can never
// double-apply with its bond.

/// Summed flat value bonus active bonds grant to `def`.
pub fn flat_bonus_for(catalog: &Catalog, pool: &Pool, def: &SymbolDefinition) -> i64 {
    active_bonds(catalog, pool)
        .filter_map(|bond| match &bond.effect {
            BondEffect::FlatValueBonus { filter, bonus } if filter.matches(def) => Some(*bonus),
            _ => None,
        })
        .sum()
}

/// Product of active bond multipliers applying to `def`.
pub fn multiplier_for(catalog: &Catalog, pool: &Pool, def: &SymbolDefinition) -> f64 {
    active_bonds(catalog, pool)
        .filter_map(|bond| match &bond.effect {
            BondEffect::ValueMultiplier { filter, multiplier } if filter.matches(def) => {
                Some(*multiplier)
            }
            _ => None,
        })
        .product()
}

/// Product of active special-cell multipliers.
pub fn special_multiplier(catalog: &Catalog, pool: &Pool) -> f64 {
    active_bonds(catalog, pool)
        .filter_map(|bond| match &bond.effect {
            BondEffect::SpecialCellMultiplier { multiplier } => Some(*multiplier),
            _ => None,
        })
        .product()
}

/// Extra dice granted by active bonds.
pub fn bonus_dice(catalog: &Catalog, pool: &Pool) -> u32 {
    active_bonds(catalog, pool)
        .filter_map(|bond| match &bond.effect {
            BondEffect::BonusDice { count } => Some(*count),
            _ => None,
        })
        .sum()
}
