//! Built-in symbol and bond roster.
//!
//! Definitions are written in Rust rather than loaded from config so the
//! effect parameters get compile-time checking; the JSON loader exists for
//! external balancing experiments and mods.

use crate::catalog::{BondDefinition, Catalog, Rarity, SymbolDefinition};
use crate::effect::{
    BondActivation, BondEffect, BuffTarget, ConvertInto, EffectKind, SpawnSource, SymbolFilter,
    TriggerScope,
};
use crate::ids::SymbolKey;

/// The shipped catalog.
pub fn builtin() -> Catalog {
    let mut symbols = Vec::new();
    symbols.extend(materials());
    symbols.extend(workers());
    symbols.extend(creatures());
    symbols.extend(tools_and_relics());
    Catalog::new(symbols, bonds())
}

fn key(k: &str) -> SymbolKey {
    SymbolKey::new(k)
}

fn materials() -> Vec<SymbolDefinition> {
    vec![
        SymbolDefinition::new("coal_chunk", "Coal Chunk", 1, Rarity::Common, 120)
            .with_tags(&["material", "ore"]),
        SymbolDefinition::new("copper_nugget", "Copper Nugget", 3, Rarity::Common, 90)
            .with_tags(&["material", "ore"]),
        SymbolDefinition::new("iron_ore", "Iron Ore", 4, Rarity::Common, 80)
            .with_tags(&["material", "ore"]),
        SymbolDefinition::new("gold_nugget", "Gold Nugget", 7, Rarity::Rare, 40)
            .with_tags(&["material", "ore"]),
        SymbolDefinition::new("golden_egg", "Golden Egg", 10, Rarity::Epic, 6)
            .with_tags(&["material", "ore"]),
        SymbolDefinition::new("sapphire", "Sapphire", 10, Rarity::Rare, 25)
            .with_tags(&["material", "gem"]),
        SymbolDefinition::new("ruby", "Ruby", 15, Rarity::Epic, 12)
            .with_tags(&["material", "gem"]),
        // Pays out big, but the seam thins with every strike this round.
        SymbolDefinition::new("motherlode", "Motherlode", 0, Rarity::Legendary, 4)
            .with_tags(&["material", "ore"])
            .with_effect(EffectKind::DiminishingValue {
                initial: 60,
                decrement: 15,
                min: 15,
            }),
    ]
}

fn workers() -> Vec<SymbolDefinition> {
    vec![
        SymbolDefinition::new("miner", "Miner", 2, Rarity::Common, 110)
            .with_tags(&["human", "worker"]),
        SymbolDefinition::new("foreman", "Foreman", 3, Rarity::Rare, 35)
            .with_tags(&["human", "worker"])
            .with_effect(EffectKind::ConditionalBonus {
                trigger: key("miner"),
                scope: TriggerScope::Pool,
                bonus: 6,
            }),
        SymbolDefinition::new("overseer", "Overseer", 2, Rarity::Rare, 30)
            .with_tag("human")
            .with_effect(EffectKind::CountBonus {
                filter: SymbolFilter::tag("human"),
                per_unit: 3,
                exclude_self: true,
            }),
        SymbolDefinition::new("collector", "Collector", 2, Rarity::Rare, 30)
            .with_tag("human")
            .with_effect(EffectKind::CountBonus {
                filter: SymbolFilter::key("gold_nugget"),
                per_unit: 4,
                exclude_self: false,
            }),
        SymbolDefinition::new("prospector", "Prospector", 2, Rarity::Rare, 35)
            .with_tags(&["human", "worker"])
            .with_effect(EffectKind::Spawn {
                source: SpawnSource::RandomTag("ore".into()),
                count: 1,
                eliminate_self: false,
            }),
        SymbolDefinition::new("hunter", "Hunter", 3, Rarity::Rare, 30)
            .with_tag("human")
            .with_effect(EffectKind::ConditionalBonus {
                trigger: key("vampire"),
                scope: TriggerScope::RevealBatch,
                bonus: 25,
            }),
        SymbolDefinition::new("scavenger", "Scavenger", 1, Rarity::Common, 45)
            .with_tag("human")
            .with_effect(EffectKind::EliminatedCountBonus { per_unit: 5 }),
        SymbolDefinition::new("exterminator", "Exterminator", 2, Rarity::Rare, 25)
            .with_tag("human")
            .with_effect(EffectKind::PurgePool {
                filter: SymbolFilter::tag("pest"),
                reward_per: 8,
            }),
        SymbolDefinition::new("alchemist", "Alchemist", 2, Rarity::Epic, 15)
            .with_tag("human")
            .with_effect(EffectKind::Convert {
                filter: SymbolFilter::key("coal_chunk"),
                into: ConvertInto::Tag("gem".into()),
                count: 1,
            }),
        SymbolDefinition::new("priest", "Priest", 3, Rarity::Rare, 25)
            .with_tag("human")
            .with_effect(EffectKind::ConditionalBonus {
                trigger: key("vampire"),
                scope: TriggerScope::Pool,
                bonus: 8,
            }),
        SymbolDefinition::new("recruiter", "Recruiter", 2, Rarity::Rare, 20)
            .with_tag("human")
            .with_effect(EffectKind::ExtraSymbolChoices { count: 1 }),
        SymbolDefinition::new("goblin_gambler", "Goblin Gambler", 1, Rarity::Rare, 25)
            .with_tags(&["goblin", "human"])
            .with_effect(EffectKind::Gamble {
                chance_pct: 40,
                win: 30,
                lose: 10,
            }),
        SymbolDefinition::new("goblin_foreman", "Goblin Foreman", 3, Rarity::Epic, 12)
            .with_tags(&["goblin", "human"])
            .with_dice_faces(vec![2, 3, 4, 5, 6, 7]),
        SymbolDefinition::new("goblin_digger", "Goblin Digger", 2, Rarity::Rare, 25)
            .with_tags(&["goblin", "human", "worker"]),
    ]
}

fn creatures() -> Vec<SymbolDefinition> {
    vec![
        SymbolDefinition::new("mule", "Mule", 2, Rarity::Common, 60).with_tag("animal"),
        SymbolDefinition::new("goose", "Goose", 2, Rarity::Rare, 20)
            .with_tag("animal")
            .with_effect(EffectKind::Spawn {
                source: SpawnSource::Key(key("golden_egg")),
                count: 1,
                eliminate_self: false,
            }),
        SymbolDefinition::new("omen_crow", "Omen Crow", 1, Rarity::Rare, 18)
            .with_tag("animal")
            .with_effect(EffectKind::DoubleNextReward),
        SymbolDefinition::new("rat", "Rat", 0, Rarity::Common, 30)
            .with_tags(&["animal", "pest"])
            .with_effect(EffectKind::RoundStartPenalty {
                penalty_per_round: 2,
                rounds: 3,
            }),
        SymbolDefinition::new("rat_nest", "Rat Nest", 0, Rarity::Rare, 15)
            .with_tags(&["structure", "pest"])
            .with_effect(EffectKind::Spawn {
                source: SpawnSource::Key(key("rat")),
                count: 1,
                eliminate_self: false,
            }),
        SymbolDefinition::new("vampire", "Vampire", 6, Rarity::Epic, 15)
            .with_tag("undead")
            .with_effect(EffectKind::ConditionalSelfEliminate {
                trigger: key("hunter"),
                scope: TriggerScope::RevealBatch,
                reward: 20,
            }),
    ]
}

fn tools_and_relics() -> Vec<SymbolDefinition> {
    vec![
        SymbolDefinition::new("pickaxe", "Pickaxe", 4, Rarity::Common, 70).with_tag("tool"),
        SymbolDefinition::new("lantern", "Lantern", 3, Rarity::Common, 60)
            .with_tag("tool")
            .with_effect(EffectKind::FlatCoins { amount: 2 }),
        SymbolDefinition::new("smelter", "Smelter", 1, Rarity::Rare, 25)
            .with_tags(&["tool", "structure"])
            .with_effect(EffectKind::EliminateRevealed {
                filter: SymbolFilter::key("iron_ore"),
                reward_per: 12,
            }),
        SymbolDefinition::new("dynamite", "Dynamite", 1, Rarity::Rare, 20)
            .with_tag("tool")
            .with_effect(EffectKind::DoubleDigCount),
        SymbolDefinition::new("drill_rig", "Drill Rig", 2, Rarity::Epic, 12)
            .with_tags(&["tool", "structure"])
            .with_effect(EffectKind::BonusDice { count: 1 }),
        SymbolDefinition::new("gem_polish", "Gem Polish", 1, Rarity::Rare, 18)
            .with_tag("tool")
            .with_effect(EffectKind::GlobalBuff {
                target: BuffTarget::Tag("gem".into()),
                value_bonus: 0,
                multiplier: 1.5,
                persistent: true,
            }),
        SymbolDefinition::new("supply_crate", "Supply Crate", 0, Rarity::Rare, 25)
            .with_tag("container")
            .unique_per_board()
            .with_effect(EffectKind::Spawn {
                source: SpawnSource::FromList(vec![key("pickaxe"), key("lantern"), key("dynamite")]),
                count: 1,
                eliminate_self: true,
            }),
        SymbolDefinition::new("mystery_geode", "Mystery Geode", 0, Rarity::Rare, 20)
            .with_tag("container")
            .with_effect(EffectKind::Spawn {
                source: SpawnSource::WeightedRarity(Rarity::Rare),
                count: 1,
                eliminate_self: true,
            }),
        SymbolDefinition::new("time_capsule", "Time Capsule", 0, Rarity::Rare, 18)
            .with_tag("container")
            .with_effect(EffectKind::DeferredBonus {
                bonus: 25,
                eliminate_self: true,
            }),
        SymbolDefinition::new("water_wheel", "Water Wheel", 1, Rarity::Rare, 18)
            .with_tag("structure")
            .with_effect(EffectKind::RoundStartBuff {
                bonus_per_round: 4,
                rounds: 5,
            }),
        SymbolDefinition::new("union_banner", "Union Banner", 1, Rarity::Epic, 12)
            .with_tag("structure")
            .with_effect(EffectKind::GlobalBuff {
                target: BuffTarget::Tag("human".into()),
                value_bonus: 2,
                multiplier: 1.0,
                persistent: true,
            }),
        SymbolDefinition::new("lucky_charm", "Lucky Charm", 1, Rarity::Epic, 10)
            .with_tag("relic")
            .with_effect(EffectKind::GlobalBuff {
                target: BuffTarget::All,
                value_bonus: 0,
                multiplier: 1.25,
                persistent: false,
            }),
        // High value up front; find a priest in time or pay dearly.
        SymbolDefinition::new("cursed_idol", "Cursed Idol", 20, Rarity::Legendary, 6)
            .with_tag("relic")
            .with_effect(EffectKind::RoundStartCheck {
                required: key("priest"),
                rounds: 3,
                penalty_on_fail: 40,
                ends_game_on_fail: false,
            }),
        SymbolDefinition::new("mine_deed", "Mine Deed", 0, Rarity::Epic, 10)
            .with_tag("deed")
            .pool_only(),
    ]
}

fn bonds() -> Vec<BondDefinition> {
    vec![
        BondDefinition::new(
            1,
            "bond_miners_union",
            "gold",
            BondActivation::FixedIdSet {
                required: vec![key("miner"), key("foreman")],
            },
            BondEffect::FlatValueBonus {
                filter: SymbolFilter::tag("human"),
                bonus: 2,
            },
        ),
        BondDefinition::new(
            2,
            "bond_gem_market",
            "purple",
            BondActivation::TypeCount {
                tag: "gem".into(),
                threshold: 2,
            },
            BondEffect::ValueMultiplier {
                filter: SymbolFilter::tag("gem"),
                multiplier: 1.5,
            },
        ),
        BondDefinition::new(
            3,
            "bond_deep_seam",
            "brown",
            BondActivation::TypeCount {
                tag: "ore".into(),
                threshold: 3,
            },
            BondEffect::SpecialCellMultiplier { multiplier: 2.0 },
        ),
        BondDefinition::new(
            4,
            "bond_hunting_party",
            "red",
            BondActivation::FixedIdSet {
                required: vec![key("hunter"), key("vampire")],
            },
            BondEffect::PerRevealCoins {
                filter: SymbolFilter::key("vampire"),
                per_unit: 10,
            },
        ),
        BondDefinition::new(
            5,
            "bond_rat_plague",
            "green",
            BondActivation::TypeCount {
                tag: "pest".into(),
                threshold: 2,
            },
            BondEffect::InfectConvert {
                from_tag: "worker".into(),
                into: key("rat"),
                every_n_mines: 2,
            },
        ),
        BondDefinition::new(
            6,
            "bond_temple_restored",
            "white",
            BondActivation::FixedIdSet {
                required: vec![key("priest"), key("cursed_idol")],
            },
            BondEffect::RoundStartCoins { amount: 15 },
        ),
        BondDefinition::new(
            7,
            "bond_golden_blessing",
            "gold",
            BondActivation::FixedIdSet {
                required: vec![key("goose"), key("golden_egg")],
            },
            BondEffect::TimedBlessing {
                coins_per_round: 25,
                rounds: 5,
                then_ends_game: true,
            },
        ),
        BondDefinition::new(
            8,
            "bond_goblin_crew",
            "green",
            BondActivation::TypeCount {
                tag: "goblin".into(),
                threshold: 2,
            },
            BondEffect::BonusDice { count: 1 },
        ),
        BondDefinition::new(
            9,
            "bond_supply_line",
            "blue",
            BondActivation::FixedIdSet {
                required: vec![key("mule"), key("supply_crate")],
            },
            BondEffect::RoundStartSpawn {
                key: key("coal_chunk"),
                count: 1,
            },
        ),
        BondDefinition::new(
            10,
            "bond_workshop",
            "gray",
            BondActivation::TypeCount {
                tag: "tool".into(),
                threshold: 3,
            },
            BondEffect::FlatValueBonus {
                filter: SymbolFilter::tag("tool"),
                bonus: 3,
            },
        ),
        BondDefinition::new(
            11,
            "bond_menagerie",
            "orange",
            BondActivation::TypeCount {
                tag: "animal".into(),
                threshold: 3,
            },
            BondEffect::PerRevealCoins {
                filter: SymbolFilter::tag("animal"),
                per_unit: 4,
            },
        ),
        BondDefinition::new(
            12,
            "bond_land_rights",
            "gold",
            BondActivation::FixedIdSet {
                required: vec![key("mine_deed")],
            },
            BondEffect::ValueMultiplier {
                filter: SymbolFilter::tag("ore"),
                multiplier: 1.25,
            },
        ),
        BondDefinition::new(
            13,
            "bond_night_shift",
            "blue",
            BondActivation::FixedIdSet {
                required: vec![key("lantern"), key("miner")],
            },
            BondEffect::RoundStartCoins { amount: 5 },
        ),
        BondDefinition::new(
            14,
            "bond_alchemy_lab",
            "purple",
            BondActivation::FixedIdSet {
                required: vec![key("alchemist"), key("ruby")],
            },
            BondEffect::RoundStartSpawn {
                key: key("sapphire"),
                count: 1,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_well_formed() {
        let catalog = builtin();
        assert!(catalog.symbol_count() > 30);
        assert_eq!(catalog.bonds().len(), 14);
    }

    #[test]
    fn test_builtin_references_resolve() {
        let catalog = builtin();
        // Every key referenced by an effect or bond must exist.
        for def in catalog.symbols() {
            for referenced in referenced_keys(&def.effect) {
                assert!(
                    catalog.contains(&referenced),
                    "{} references missing '{referenced}'",
                    def.key
                );
            }
        }
        for bond in catalog.bonds() {
            if let BondActivation::FixedIdSet { required } = &bond.activation {
                for key in required {
                    assert!(catalog.contains(key), "bond references missing '{key}'");
                }
            }
        }
    }

    fn referenced_keys(effect: &EffectKind) -> Vec<SymbolKey> {
        match effect {
            EffectKind::ConditionalBonus { trigger, .. }
            | EffectKind::ConditionalSelfEliminate { trigger, .. } => vec![trigger.clone()],
            EffectKind::RoundStartCheck { required, .. } => vec![required.clone()],
            EffectKind::Spawn {
                source: SpawnSource::Key(key),
                ..
            } => vec![key.clone()],
            EffectKind::Spawn {
                source: SpawnSource::FromList(keys),
                ..
            } => keys.clone(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_starting_symbols_exist() {
        let catalog = builtin();
        for key in &crate::round::Tuning::default().starting_symbols {
            assert!(catalog.contains(key));
        }
    }
}
