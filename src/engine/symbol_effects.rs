//! The symbol effect resolver: interprets one revealed symbol's
//! `EffectKind` against the live pool and engine state.
//!
//! Each revealed symbol resolves independently, in queue order, against the
//! *current* (possibly already mutated) pool. Conditions that look at the
//! reveal batch use the frozen snapshot. Lookup misses and degenerate
//! parameters resolve to a no-op with a warning; resolution never fails and
//! never blocks the round.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::effect::{ConvertInto, EffectKind, SpawnSource, SymbolFilter, TriggerScope};
use crate::engine::state::{GlobalBuff, NextRoundBonus, RoundStartCheck, RoundStartEntry};
use crate::engine::{ResolveCtx, RevealBatch};
use crate::events::SettleEvent;
use crate::ids::{InstanceId, SymbolKey};

/// Resolve one revealed symbol's effect. Returns the coin delta; pool and
/// engine-state mutations are applied directly.
pub fn resolve_symbol(
    ctx: &mut ResolveCtx<'_>,
    batch: &RevealBatch,
    instance: InstanceId,
    key: &SymbolKey,
) -> i64 {
    let Some(def) = ctx.catalog.get(key).cloned() else {
        log::warn!("revealed symbol '{key}' has no catalog entry; no effect");
        return 0;
    };
    if def.effect.is_none() {
        return 0;
    }
    if def.once_only && !ctx.state.claim_once_only(key) {
        // First qualifying occurrence already fired this batch.
        return 0;
    }

    match def.effect.clone() {
        EffectKind::None => 0,

        EffectKind::FlatCoins { amount } => amount,

        EffectKind::ConditionalBonus {
            trigger,
            scope,
            bonus,
        } => {
            if trigger_met(ctx, batch, &trigger, scope) {
                bonus
            } else {
                0
            }
        }

        EffectKind::CountBonus {
            filter,
            per_unit,
            exclude_self,
        } => {
            let exclude = exclude_self.then_some(instance);
            let count = ctx.pool.count_matching(ctx.catalog, &filter, exclude);
            per_unit * count as i64
        }

        EffectKind::EliminatedCountBonus { per_unit } => {
            per_unit * ctx.state.eliminated_this_resolution as i64
        }

        EffectKind::EliminateRevealed { filter, reward_per } => {
            let victims = batch.matching(ctx.catalog, &filter, Some(instance));
            let mut removed = 0;
            for (victim, victim_key) in victims {
                // A victim may already be gone, consumed earlier this tick.
                if ctx.pool.remove_instance(victim).is_some() {
                    removed += 1;
                    ctx.state.eliminated_this_resolution += 1;
                    ctx.events.push(SettleEvent::Eliminated {
                        symbol: victim_key,
                        count: 1,
                    });
                }
            }
            reward_per * removed
        }

        EffectKind::PurgePool { filter, reward_per } => {
            let removed =
                ctx.pool
                    .remove_all_matching(ctx.catalog, &filter, Some(instance)) as i64;
            if removed > 0 {
                ctx.state.eliminated_this_resolution += removed as u32;
                ctx.events.push(SettleEvent::Eliminated {
                    symbol: filter_label(&filter),
                    count: removed as u32,
                });
            }
            reward_per * removed
        }

        EffectKind::ConditionalSelfEliminate {
            trigger,
            scope,
            reward,
        } => {
            if trigger_met(ctx, batch, &trigger, scope)
                && ctx.pool.remove_instance(instance).is_some()
            {
                ctx.state.eliminated_this_resolution += 1;
                ctx.events.push(SettleEvent::Eliminated {
                    symbol: key.clone(),
                    count: 1,
                });
                reward
            } else {
                0
            }
        }

        EffectKind::Spawn {
            source,
            count,
            eliminate_self,
        } => {
            for _ in 0..count {
                if let Some(spawn_key) = draw_spawn(ctx, &source) {
                    ctx.pool.add(spawn_key.clone());
                    ctx.events.push(SettleEvent::Spawned {
                        symbol: spawn_key,
                        count: 1,
                    });
                }
            }
            if eliminate_self && ctx.pool.remove_instance(instance).is_some() {
                ctx.state.eliminated_this_resolution += 1;
                ctx.events.push(SettleEvent::Eliminated {
                    symbol: key.clone(),
                    count: 1,
                });
            }
            0
        }

        EffectKind::Convert {
            filter,
            into,
            count,
        } => {
            for _ in 0..count {
                let Some(replacement) = draw_convert(ctx, &into) else {
                    log::warn!("no drawable conversion target for {into:?}; skipping");
                    break;
                };
                let Some(victim) =
                    ctx.pool
                        .remove_first_matching(ctx.catalog, &filter, Some(instance))
                else {
                    break;
                };
                ctx.pool.add(replacement.clone());
                ctx.events.push(SettleEvent::Converted {
                    from: victim.key,
                    into: replacement,
                });
            }
            0
        }

        EffectKind::DeferredBonus {
            bonus,
            eliminate_self,
        } => {
            let entry = ctx
                .state
                .next_round_bonuses
                .entry(key.clone())
                .or_insert(NextRoundBonus {
                    bonus: 0,
                    eliminate_self: false,
                });
            entry.bonus += bonus;
            entry.eliminate_self |= eliminate_self;
            ctx.events.push(SettleEvent::DeferredRegistered {
                symbol: key.clone(),
                bonus,
            });
            0
        }

        EffectKind::RoundStartBuff {
            bonus_per_round,
            rounds,
        } => {
            ctx.state.round_start_buffs.insert(
                key.clone(),
                RoundStartEntry {
                    delta_per_round: bonus_per_round,
                    rounds_total: rounds,
                    rounds_elapsed: 0,
                },
            );
            0
        }

        EffectKind::RoundStartPenalty {
            penalty_per_round,
            rounds,
        } => {
            ctx.state.round_start_penalties.insert(
                key.clone(),
                RoundStartEntry {
                    delta_per_round: -penalty_per_round.abs(),
                    rounds_total: rounds,
                    rounds_elapsed: 0,
                },
            );
            0
        }

        EffectKind::RoundStartCheck {
            required,
            rounds,
            penalty_on_fail,
            ends_game_on_fail,
        } => {
            ctx.state.round_start_checks.insert(
                key.clone(),
                RoundStartCheck {
                    required,
                    rounds_total: rounds,
                    rounds_elapsed: 0,
                    penalty_on_fail,
                    ends_game_on_fail,
                },
            );
            0
        }

        EffectKind::GlobalBuff {
            target,
            value_bonus,
            multiplier,
            persistent,
        } => {
            ctx.state.global_buffs.insert(
                key.clone(),
                GlobalBuff {
                    target,
                    value_bonus,
                    multiplier,
                    persistent,
                },
            );
            0
        }

        EffectKind::DiminishingValue {
            initial,
            decrement,
            min,
        } => ctx.state.diminish_next(key, initial, decrement, min),

        EffectKind::DoubleNextReward => {
            ctx.state.should_double_next_reward = true;
            0
        }

        EffectKind::DoubleDigCount => {
            ctx.state.should_double_dig_count = true;
            0
        }

        EffectKind::BonusDice { count } => {
            ctx.state.temp_dice_bonus += count;
            0
        }

        EffectKind::ExtraSymbolChoices { count } => {
            ctx.state.extra_symbol_choices += count;
            0
        }

        EffectKind::Gamble {
            chance_pct,
            win,
            lose,
        } => {
            let chance = chance_pct.min(100);
            if ctx.rng.random_range(0..100) < chance {
                win
            } else {
                -lose.abs()
            }
        }
    }
}

/// Whether the trigger symbol is present in the requested scope.
fn trigger_met(
    ctx: &ResolveCtx<'_>,
    batch: &RevealBatch,
    trigger: &SymbolKey,
    scope: TriggerScope,
) -> bool {
    match scope {
        TriggerScope::RevealBatch => batch.contains_key(trigger),
        TriggerScope::Pool => ctx.pool.contains(trigger),
    }
}

/// Pick the spawned key for a spawn source. `None` (with a warning) when
/// the source cannot produce anything.
fn draw_spawn(ctx: &mut ResolveCtx<'_>, source: &SpawnSource) -> Option<SymbolKey> {
    match source {
        SpawnSource::Key(key) => {
            if ctx.catalog.contains(key) {
                Some(key.clone())
            } else {
                log::warn!("spawn target '{key}' not in catalog; skipping");
                None
            }
        }
        SpawnSource::RandomTag(tag) => {
            let drawn = ctx
                .catalog
                .weighted_draw_where(ctx.rng, |def| def.has_tag(tag))
                .map(|def| def.key.clone());
            if drawn.is_none() {
                log::warn!("no drawable symbol with tag '{tag}'; skipping spawn");
            }
            drawn
        }
        SpawnSource::FromList(keys) => {
            let present: Vec<&SymbolKey> =
                keys.iter().filter(|k| ctx.catalog.contains(k)).collect();
            if present.len() < keys.len() {
                log::warn!("spawn list references unknown symbols; drawing from the rest");
            }
            present.choose(ctx.rng).map(|k| (*k).clone())
        }
        SpawnSource::WeightedRarity(rarity) => {
            let drawn = ctx
                .catalog
                .weighted_draw_where(ctx.rng, |def| def.rarity == *rarity)
                .map(|def| def.key.clone());
            if drawn.is_none() {
                log::warn!("no drawable symbol of rarity {rarity:?}; skipping spawn");
            }
            drawn
        }
    }
}

/// Pick the replacement key for a conversion target.
fn draw_convert(ctx: &mut ResolveCtx<'_>, into: &ConvertInto) -> Option<SymbolKey> {
    match into {
        ConvertInto::Tag(tag) => ctx
            .catalog
            .weighted_draw_where(ctx.rng, |def| def.has_tag(tag))
            .map(|def| def.key.clone()),
        ConvertInto::Rarity(rarity) => ctx
            .catalog
            .weighted_draw_where(ctx.rng, |def| def.rarity == *rarity)
            .map(|def| def.key.clone()),
    }
}

/// Event label for a filter-wide elimination.
fn filter_label(filter: &SymbolFilter) -> SymbolKey {
    match filter {
        SymbolFilter::Key(key) => key.clone(),
        SymbolFilter::Tag(tag) => SymbolKey::new(tag.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Rarity, SymbolDefinition};
    use crate::engine::state::EngineState;
    use crate::engine::{BondRuntime, ResolveCtx};
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
    }

    impl Bed {
        fn new(symbols: Vec<SymbolDefinition>) -> Self {
            Self {
                catalog: Catalog::new(symbols, Vec::new()),
                tuning: Tuning::default(),
                pool: Pool::new(),
                state: EngineState::new(),
                bonds: BondRuntime::default(),
                rng: StdRng::seed_from_u64(42),
                events: Vec::new(),
            }
        }

        fn ctx(&mut self) -> ResolveCtx<'_> {
            ResolveCtx {
                catalog: &self.catalog,
                tuning: &self.tuning,
                pool: &mut self.pool,
                state: &mut self.state,
                bonds: &mut self.bonds,
                rng: &mut self.rng,
                events: &mut self.events,
            }
        }
    }

    /// Batch over pool instances; cell indices are irrelevant to symbol
    /// resolution.
    fn batch_of(bed: &Bed, instances: &[InstanceId]) -> RevealBatch {
        RevealBatch::from_entries(
            instances
                .iter()
                .enumerate()
                .map(|(i, id)| crate::engine::BatchEntry {
                    cell: i,
                    symbol: bed.pool.get(*id).map(|e| (*id, e.key.clone())),
                })
                .collect(),
        )
    }

    fn defs() -> Vec<SymbolDefinition> {
        vec![
            SymbolDefinition::new("miner", "Miner", 2, Rarity::Common, 100)
                .with_tags(&["human", "worker"]),
            SymbolDefinition::new("vampire", "Vampire", 6, Rarity::Rare, 10).with_tag("undead"),
            SymbolDefinition::new("hunter", "Hunter", 3, Rarity::Rare, 10)
                .with_tag("human")
                .with_effect(EffectKind::ConditionalBonus {
                    trigger: SymbolKey::new("vampire"),
                    scope: TriggerScope::RevealBatch,
                    bonus: 25,
                }),
            SymbolDefinition::new("foreman", "Foreman", 3, Rarity::Rare, 10)
                .with_tag("human")
                .with_effect(EffectKind::ConditionalBonus {
                    trigger: SymbolKey::new("miner"),
                    scope: TriggerScope::Pool,
                    bonus: 6,
                }),
            SymbolDefinition::new("overseer", "Overseer", 2, Rarity::Rare, 10)
                .with_tag("human")
                .with_effect(EffectKind::CountBonus {
                    filter: SymbolFilter::tag("human"),
                    per_unit: 3,
                    exclude_self: true,
                }),
            SymbolDefinition::new("smelter", "Smelter", 1, Rarity::Rare, 10)
                .with_tag("tool")
                .with_effect(EffectKind::EliminateRevealed {
                    filter: SymbolFilter::key("iron_ore"),
                    reward_per: 12,
                }),
            SymbolDefinition::new("iron_ore", "Iron Ore", 4, Rarity::Common, 50)
                .with_tags(&["material", "ore"]),
            SymbolDefinition::new("goose", "Goose", 2, Rarity::Rare, 10)
                .with_tag("animal")
                .with_effect(EffectKind::Spawn {
                    source: SpawnSource::Key(SymbolKey::new("golden_egg")),
                    count: 1,
                    eliminate_self: false,
                }),
            SymbolDefinition::new("golden_egg", "Golden Egg", 10, Rarity::Epic, 0)
                .with_tags(&["material", "ore"]),
            SymbolDefinition::new("scavenger", "Scavenger", 1, Rarity::Rare, 10)
                .with_tag("human")
                .with_effect(EffectKind::EliminatedCountBonus { per_unit: 5 }),
        ]
    }

    #[test]
    fn test_conditional_bonus_scopes_are_distinct() {
        let mut bed = Bed::new(defs());
        let hunter = bed.pool.add(SymbolKey::new("hunter"));
        let foreman = bed.pool.add(SymbolKey::new("foreman"));
        // Vampire in the pool but NOT in the batch; miner in the pool.
        bed.pool.add(SymbolKey::new("vampire"));
        bed.pool.add(SymbolKey::new("miner"));

        let batch = batch_of(&bed, &[hunter, foreman]);
        let mut ctx = bed.ctx();
        // Hunter needs the vampire mined this turn: not satisfied.
        assert_eq!(
            resolve_symbol(&mut ctx, &batch, hunter, &SymbolKey::new("hunter")),
            0
        );
        // Foreman needs a miner owned: satisfied.
        assert_eq!(
            resolve_symbol(&mut ctx, &batch, foreman, &SymbolKey::new("foreman")),
            6
        );
    }

    #[test]
    fn test_conditional_bonus_batch_scope_fires() {
        let mut bed = Bed::new(defs());
        let hunter = bed.pool.add(SymbolKey::new("hunter"));
        let vampire = bed.pool.add(SymbolKey::new("vampire"));

        let batch = batch_of(&bed, &[hunter, vampire]);
        let mut ctx = bed.ctx();
        assert_eq!(
            resolve_symbol(&mut ctx, &batch, hunter, &SymbolKey::new("hunter")),
            25
        );
    }

    #[test]
    fn test_count_bonus_excludes_self() {
        let mut bed = Bed::new(defs());
        let overseer = bed.pool.add(SymbolKey::new("overseer"));
        bed.pool.add(SymbolKey::new("miner"));
        bed.pool.add(SymbolKey::new("hunter"));

        let batch = batch_of(&bed, &[overseer]);
        let mut ctx = bed.ctx();
        // Two other humans; the overseer itself is excluded.
        assert_eq!(
            resolve_symbol(&mut ctx, &batch, overseer, &SymbolKey::new("overseer")),
            6
        );
    }

    #[test]
    fn test_eliminate_revealed_rewards_and_counts() {
        let mut bed = Bed::new(defs());
        let smelter = bed.pool.add(SymbolKey::new("smelter"));
        let ore_a = bed.pool.add(SymbolKey::new("iron_ore"));
        let ore_b = bed.pool.add(SymbolKey::new("iron_ore"));
        // A third ore stays in the pool, unrevealed: must survive.
        bed.pool.add(SymbolKey::new("iron_ore"));

        let batch = batch_of(&bed, &[smelter, ore_a, ore_b]);
        let mut ctx = bed.ctx();
        let delta = resolve_symbol(&mut ctx, &batch, smelter, &SymbolKey::new("smelter"));
        assert_eq!(delta, 24);
        assert_eq!(bed.state.eliminated_this_resolution, 2);
        assert_eq!(bed.pool.count_key(&SymbolKey::new("iron_ore")), 1);
    }

    #[test]
    fn test_eliminated_count_feeds_scavenger() {
        let mut bed = Bed::new(defs());
        let smelter = bed.pool.add(SymbolKey::new("smelter"));
        let ore = bed.pool.add(SymbolKey::new("iron_ore"));
        let scavenger = bed.pool.add(SymbolKey::new("scavenger"));

        let batch = batch_of(&bed, &[smelter, ore, scavenger]);
        let mut ctx = bed.ctx();
        resolve_symbol(&mut ctx, &batch, smelter, &SymbolKey::new("smelter"));
        // One elimination so far this resolution.
        assert_eq!(
            resolve_symbol(&mut ctx, &batch, scavenger, &SymbolKey::new("scavenger")),
            5
        );
    }

    #[test]
    fn test_spawn_appends_to_pool() {
        let mut bed = Bed::new(defs());
        let goose = bed.pool.add(SymbolKey::new("goose"));

        let batch = batch_of(&bed, &[goose]);
        let mut ctx = bed.ctx();
        resolve_symbol(&mut ctx, &batch, goose, &SymbolKey::new("goose"));
        assert!(bed.pool.contains(&SymbolKey::new("golden_egg")));
        assert!(bed.pool.contains_instance(goose));
    }

    #[test]
    fn test_spawn_unknown_key_is_noop() {
        let mut defs = defs();
        defs.push(
            SymbolDefinition::new("broken", "Broken", 1, Rarity::Common, 1).with_effect(
                EffectKind::Spawn {
                    source: SpawnSource::Key(SymbolKey::new("does_not_exist")),
                    count: 1,
                    eliminate_self: false,
                },
            ),
        );
        let mut bed = Bed::new(defs);
        let broken = bed.pool.add(SymbolKey::new("broken"));
        let batch = batch_of(&bed, &[broken]);
        let mut ctx = bed.ctx();
        assert_eq!(
            resolve_symbol(&mut ctx, &batch, broken, &SymbolKey::new("broken")),
            0
        );
        assert_eq!(bed.pool.len(), 1);
    }

    #[test]
    fn test_deferred_bonus_accumulates() {
        let mut defs = defs();
        defs.push(
            SymbolDefinition::new("capsule", "Capsule", 0, Rarity::Rare, 1).with_effect(
                EffectKind::DeferredBonus {
                    bonus: 25,
                    eliminate_self: true,
                },
            ),
        );
        let mut bed = Bed::new(defs);
        let a = bed.pool.add(SymbolKey::new("capsule"));
        let b = bed.pool.add(SymbolKey::new("capsule"));

        let batch = batch_of(&bed, &[a, b]);
        let mut ctx = bed.ctx();
        resolve_symbol(&mut ctx, &batch, a, &SymbolKey::new("capsule"));
        resolve_symbol(&mut ctx, &batch, b, &SymbolKey::new("capsule"));

        let pending = &bed.state.next_round_bonuses[&SymbolKey::new("capsule")];
        assert_eq!(pending.bonus, 50);
        assert!(pending.eliminate_self);
    }

    #[test]
    fn test_once_only_first_occurrence_wins() {
        let mut defs = defs();
        defs.push(
            SymbolDefinition::new("bell", "Bell", 0, Rarity::Rare, 1)
                .once_only()
                .with_effect(EffectKind::FlatCoins { amount: 10 }),
        );
        let mut bed = Bed::new(defs);
        let a = bed.pool.add(SymbolKey::new("bell"));
        let b = bed.pool.add(SymbolKey::new("bell"));

        let batch = batch_of(&bed, &[a, b]);
        let mut ctx = bed.ctx();
        ctx.state.begin_resolution();
        assert_eq!(resolve_symbol(&mut ctx, &batch, a, &SymbolKey::new("bell")), 10);
        assert_eq!(resolve_symbol(&mut ctx, &batch, b, &SymbolKey::new("bell")), 0);
    }

    #[test]
    fn test_gamble_is_bounded() {
        let mut defs = defs();
        defs.push(
            SymbolDefinition::new("gambler", "Gambler", 0, Rarity::Rare, 1).with_effect(
                EffectKind::Gamble {
                    chance_pct: 40,
                    win: 30,
                    lose: 10,
                },
            ),
        );
        let mut bed = Bed::new(defs);
        let gambler = bed.pool.add(SymbolKey::new("gambler"));
        let batch = batch_of(&bed, &[gambler]);
        let mut ctx = bed.ctx();
        for _ in 0..50 {
            let delta = resolve_symbol(&mut ctx, &batch, gambler, &SymbolKey::new("gambler"));
            assert!(delta == 30 || delta == -10);
        }
    }
}
