//! Fail-soft JSON catalog loading.
//!
//! The game must never crash on bad config: malformed rows are skipped with
//! a warning, an unknown effect degrades to no effect, and an unreadable
//! document yields an empty list. All of that happens here, at the
//! boundary; the engine only ever sees well-formed definitions.

use serde::Deserialize;

use crate::catalog::{BondDefinition, Catalog, Rarity, SymbolDefinition};
use crate::effect::{BondActivation, BondEffect, EffectKind};

#[derive(Debug, Deserialize)]
struct SymbolRow {
    key: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    base_value: i64,
    rarity: Rarity,
    #[serde(default)]
    type_tags: Vec<String>,
    weight: u32,
    #[serde(default = "default_true")]
    minable: bool,
    #[serde(default)]
    unique_per_board: bool,
    #[serde(default)]
    once_only: bool,
    #[serde(default)]
    dice_faces: Option<Vec<u8>>,
    #[serde(default)]
    effect: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct BondRow {
    id: u32,
    display_key: String,
    #[serde(default)]
    card_color: Option<String>,
    activation: serde_json::Value,
    effect: serde_json::Value,
}

/// Parse a JSON array of symbol rows, skipping anything malformed.
pub fn load_symbols(json: &str) -> Vec<SymbolDefinition> {
    let rows: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(rows) => rows,
        Err(err) => {
            log::warn!("symbol config unreadable: {err}");
            return Vec::new();
        }
    };

    let mut definitions = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let row: SymbolRow = match serde_json::from_value(row) {
            Ok(row) => row,
            Err(err) => {
                log::warn!("symbol row {idx} skipped: {err}");
                continue;
            }
        };

        let effect = match row.effect {
            None => EffectKind::None,
            Some(value) => match serde_json::from_value::<EffectKind>(value) {
                Ok(effect) => effect,
                Err(err) => {
                    // Unknown or malformed effects degrade to no effect so
                    // the symbol still plays as a plain value tile.
                    log::warn!("symbol '{}' has unusable effect ({err}); using none", row.key);
                    EffectKind::None
                }
            },
        };

        let mut def = SymbolDefinition::new(
            row.key.as_str(),
            row.display_name.unwrap_or_else(|| row.key.clone()),
            row.base_value,
            row.rarity,
            row.weight,
        )
        .with_effect(effect);
        if let Some(icon) = row.icon {
            def = def.with_icon(icon);
        }
        for tag in row.type_tags {
            def = def.with_tag(tag);
        }
        def.minable = row.minable;
        def.unique_per_board = row.unique_per_board;
        def.once_only = row.once_only;
        def.dice_faces = row.dice_faces;
        definitions.push(def);
    }
    definitions
}

/// Parse a JSON array of bond rows, skipping anything malformed. A bond
/// without a usable activation or effect is meaningless and is dropped
/// whole.
pub fn load_bonds(json: &str) -> Vec<BondDefinition> {
    let rows: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(rows) => rows,
        Err(err) => {
            log::warn!("bond config unreadable: {err}");
            return Vec::new();
        }
    };

    let mut definitions = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let row: BondRow = match serde_json::from_value(row) {
            Ok(row) => row,
            Err(err) => {
                log::warn!("bond row {idx} skipped: {err}");
                continue;
            }
        };
        let activation: BondActivation = match serde_json::from_value(row.activation) {
            Ok(activation) => activation,
            Err(err) => {
                log::warn!("bond '{}' skipped, bad activation: {err}", row.display_key);
                continue;
            }
        };
        let effect: BondEffect = match serde_json::from_value(row.effect) {
            Ok(effect) => effect,
            Err(err) => {
                log::warn!("bond '{}' skipped, bad effect: {err}", row.display_key);
                continue;
            }
        };
        definitions.push(BondDefinition::new(
            row.id,
            row.display_key,
            row.card_color.unwrap_or_else(|| "gray".to_string()),
            activation,
            effect,
        ));
    }
    definitions
}

/// Load a catalog from two JSON documents.
pub fn load_catalog(symbols_json: &str, bonds_json: &str) -> Catalog {
    Catalog::new(load_symbols(symbols_json), load_bonds(bonds_json))
}

/// Load a catalog from files, falling back to empty lists on I/O errors.
pub fn load_catalog_from_files(
    symbols_path: &std::path::Path,
    bonds_path: &std::path::Path,
) -> Catalog {
    let read = |path: &std::path::Path| match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("cannot read {}: {err}", path.display());
            "[]".to_string()
        }
    };
    load_catalog(&read(symbols_path), &read(bonds_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{SymbolFilter, TriggerScope};
    use crate::ids::SymbolKey;

    #[test]
    fn test_load_symbols_happy_path() {
        let json = r#"[
            {
                "key": "miner",
                "display_name": "Miner",
                "base_value": 2,
                "rarity": "common",
                "type_tags": ["human", "worker"],
                "weight": 110
            },
            {
                "key": "hunter",
                "base_value": 3,
                "rarity": "rare",
                "weight": 30,
                "effect": {
                    "kind": "conditional_bonus",
                    "trigger": "vampire",
                    "scope": "reveal_batch",
                    "bonus": 25
                }
            }
        ]"#;
        let defs = load_symbols(json);
        assert_eq!(defs.len(), 2);
        assert!(defs[0].has_tag("human"));
        assert!(defs[0].minable);
        assert_eq!(
            defs[1].effect,
            EffectKind::ConditionalBonus {
                trigger: SymbolKey::new("vampire"),
                scope: TriggerScope::RevealBatch,
                bonus: 25,
            }
        );
        // Display name defaults to the key.
        assert_eq!(defs[1].display_name, "hunter");
    }

    #[test]
    fn test_malformed_row_is_skipped_not_fatal() {
        let json = r#"[
            {"key": "ok", "rarity": "common", "weight": 10},
            {"rarity": "common", "weight": 10},
            {"key": "also_ok", "rarity": "rare", "weight": 5}
        ]"#;
        let defs = load_symbols(json);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].key.as_str(), "ok");
        assert_eq!(defs[1].key.as_str(), "also_ok");
    }

    #[test]
    fn test_unknown_effect_kind_degrades_to_none() {
        let json = r#"[
            {
                "key": "weird",
                "rarity": "common",
                "weight": 10,
                "effect": {"kind": "summon_dragon", "power": 9000}
            }
        ]"#;
        let defs = load_symbols(json);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].effect, EffectKind::None);
    }

    #[test]
    fn test_unreadable_document_yields_empty() {
        assert!(load_symbols("not json at all").is_empty());
        assert!(load_bonds("{\"also\": \"wrong shape\"}").is_empty());
    }

    #[test]
    fn test_load_bonds() {
        let json = r#"[
            {
                "id": 1,
                "display_key": "bond_miners_union",
                "card_color": "gold",
                "activation": {"fixed_id_set": {"required": ["miner", "foreman"]}},
                "effect": {"kind": "flat_value_bonus", "filter": {"key": "miner"}, "bonus": 2}
            },
            {
                "id": 2,
                "display_key": "bond_broken",
                "activation": {"what": true},
                "effect": {"kind": "round_start_coins", "amount": 5}
            }
        ]"#;
        let bonds = load_bonds(json);
        assert_eq!(bonds.len(), 1);
        assert_eq!(
            bonds[0].effect,
            BondEffect::FlatValueBonus {
                filter: SymbolFilter::key("miner"),
                bonus: 2,
            }
        );
    }
}
