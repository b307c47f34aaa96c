//! Symbol and bond catalog.
//!
//! Immutable definitions loaded once at startup, either from the built-in
//! roster in `definitions` or from JSON config via `loader`. The catalog
//! also owns the weighted-draw primitives used for symbol offers and spawn
//! effects.
//!
//! Definitions are data; all gameplay interpretation lives in `engine`.

pub mod definitions;
#[cfg(feature = "serialization")]
pub mod loader;

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::effect::{BondActivation, BondEffect, EffectKind};
use crate::ids::{BondId, SymbolKey};

// ============================================================================
// Definitions
// ============================================================================

/// Draw rarity of a symbol. Affects offer weighting and rarity-targeted
/// spawn/convert effects; carries no rules weight of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "snake_case"))]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Immutable definition of one symbol.
///
/// `minable` and `unique_per_board` replace the original's name blacklists:
/// pool-only symbols simply never reach the board, and at most one instance
/// of a unique-per-board symbol is placed per regeneration.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDefinition {
    /// Stable identifier; unique within the catalog.
    pub key: SymbolKey,
    /// Display name. Presentation only; never used for matching.
    pub display_name: String,
    /// Icon resource name for the presentation layer.
    pub icon: String,
    /// Coins earned when this symbol is revealed, before modifiers.
    pub base_value: i64,
    pub rarity: Rarity,
    /// Non-exclusive classification labels ("human", "ore", "tool", ...).
    pub type_tags: BTreeSet<String>,
    /// Relative draw probability; zero means never offered or spawned by
    /// weighted draws.
    pub weight: u32,
    /// Whether this symbol may be placed on the board at all.
    pub minable: bool,
    /// At most one instance is placed per board regeneration.
    pub unique_per_board: bool,
    /// The effect fires at most once per reveal batch across all copies;
    /// the first qualifying occurrence wins.
    pub once_only: bool,
    /// If set, owning this symbol offers this dice face set; the candidate
    /// set with the highest minimum face wins for the spin.
    pub dice_faces: Option<Vec<u8>>,
    pub effect: EffectKind,
}

impl SymbolDefinition {
    pub fn new(
        key: impl Into<SymbolKey>,
        display_name: impl Into<String>,
        base_value: i64,
        rarity: Rarity,
        weight: u32,
    ) -> Self {
        let key = key.into();
        Self {
            icon: key.as_str().to_string(),
            key,
            display_name: display_name.into(),
            base_value,
            rarity,
            type_tags: BTreeSet::new(),
            weight,
            minable: true,
            unique_per_board: false,
            once_only: false,
            dice_faces: None,
            effect: EffectKind::None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tags.insert(tag.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        for tag in tags {
            self.type_tags.insert((*tag).to_string());
        }
        self
    }

    pub fn with_effect(mut self, effect: EffectKind) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn pool_only(mut self) -> Self {
        self.minable = false;
        self
    }

    pub fn unique_per_board(mut self) -> Self {
        self.unique_per_board = true;
        self
    }

    pub fn once_only(mut self) -> Self {
        self.once_only = true;
        self
    }

    pub fn with_dice_faces(mut self, faces: Vec<u8>) -> Self {
        self.dice_faces = Some(faces);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.type_tags.contains(tag)
    }
}

/// Immutable definition of one bond (synergy).
#[derive(Debug, Clone, PartialEq)]
pub struct BondDefinition {
    pub id: BondId,
    /// Localization key for the presentation layer.
    pub display_key: String,
    /// Card color shown in the bond list UI.
    pub card_color: String,
    pub activation: BondActivation,
    pub effect: BondEffect,
}

impl BondDefinition {
    pub fn new(
        id: u32,
        display_key: impl Into<String>,
        card_color: impl Into<String>,
        activation: BondActivation,
        effect: BondEffect,
    ) -> Self {
        Self {
            id: BondId(id),
            display_key: display_key.into(),
            card_color: card_color.into(),
            activation,
            effect,
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// The loaded symbol and bond definitions.
///
/// Symbols keep their load order for deterministic iteration; lookups are
/// by stable key.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    symbols: HashMap<SymbolKey, SymbolDefinition>,
    order: Vec<SymbolKey>,
    bonds: Vec<BondDefinition>,
}

impl Catalog {
    /// Build a catalog from definition lists. Duplicate symbol keys and
    /// duplicate bond ids are skipped with a warning; the first wins.
    pub fn new(symbols: Vec<SymbolDefinition>, bonds: Vec<BondDefinition>) -> Self {
        let mut catalog = Catalog::default();
        for def in symbols {
            if catalog.symbols.contains_key(&def.key) {
                log::warn!("duplicate symbol key '{}' skipped", def.key);
                continue;
            }
            catalog.order.push(def.key.clone());
            catalog.symbols.insert(def.key.clone(), def);
        }
        for bond in bonds {
            if catalog.bonds.iter().any(|b| b.id == bond.id) {
                log::warn!("duplicate bond id {:?} skipped", bond.id);
                continue;
            }
            catalog.bonds.push(bond);
        }
        catalog
    }

    pub fn get(&self, key: &SymbolKey) -> Option<&SymbolDefinition> {
        self.symbols.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&SymbolDefinition> {
        self.symbols.get(key)
    }

    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.symbols.contains_key(key)
    }

    /// All symbol definitions in load order.
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolDefinition> {
        self.order.iter().filter_map(|key| self.symbols.get(key))
    }

    pub fn bonds(&self) -> &[BondDefinition] {
        &self.bonds
    }

    pub fn symbol_count(&self) -> usize {
        self.order.len()
    }

    // ------------------------------------------------------------------
    // Weighted draws
    // ------------------------------------------------------------------

    /// Draw one symbol proportionally to `weight`, skipping excluded keys
    /// and zero-weight entries. `None` only when no candidate remains.
    pub fn weighted_draw(
        &self,
        rng: &mut impl Rng,
        excluding: &HashSet<SymbolKey>,
    ) -> Option<&SymbolDefinition> {
        self.weighted_draw_where(rng, |def| !excluding.contains(&def.key))
    }

    /// Weighted draw over the catalog symbols satisfying `pred`.
    pub fn weighted_draw_where(
        &self,
        rng: &mut impl Rng,
        pred: impl Fn(&SymbolDefinition) -> bool,
    ) -> Option<&SymbolDefinition> {
        let candidates: Vec<&SymbolDefinition> = self
            .symbols()
            .filter(|def| def.weight > 0 && pred(def))
            .collect();
        candidates
            .choose_weighted(rng, |def| def.weight)
            .ok()
            .copied()
    }

    /// The symbol-choice offer: `3 + extra` distinct symbols drawn by
    /// weight. If fewer distinct candidates exist, the offer is padded with
    /// whatever remains; it never blocks on a short catalog.
    pub fn offer_choices(
        &self,
        rng: &mut impl Rng,
        excluding: &HashSet<SymbolKey>,
        extra: u32,
    ) -> Vec<&SymbolDefinition> {
        let want = 3 + extra as usize;
        let mut taken: HashSet<SymbolKey> = excluding.clone();
        let mut offer = Vec::with_capacity(want);
        while offer.len() < want {
            match self.weighted_draw(rng, &taken) {
                Some(def) => {
                    taken.insert(def.key.clone());
                    offer.push(def);
                }
                None => break,
            }
        }
        offer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_catalog() -> Catalog {
        Catalog::new(
            vec![
                SymbolDefinition::new("miner", "Miner", 2, Rarity::Common, 100),
                SymbolDefinition::new("ruby", "Ruby", 15, Rarity::Epic, 5),
                SymbolDefinition::new("ghost", "Ghost", 1, Rarity::Common, 0),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_duplicate_keys_first_wins() {
        let catalog = Catalog::new(
            vec![
                SymbolDefinition::new("miner", "Miner", 2, Rarity::Common, 100),
                SymbolDefinition::new("miner", "Impostor", 9, Rarity::Epic, 1),
            ],
            Vec::new(),
        );
        assert_eq!(catalog.symbol_count(), 1);
        assert_eq!(catalog.get_str("miner").unwrap().display_name, "Miner");
    }

    #[test]
    fn test_weighted_draw_skips_zero_weight() {
        let catalog = small_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let drawn = catalog.weighted_draw(&mut rng, &HashSet::new()).unwrap();
            assert_ne!(drawn.key.as_str(), "ghost");
        }
    }

    #[test]
    fn test_weighted_draw_respects_exclusions() {
        let catalog = small_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let mut excluding = HashSet::new();
        excluding.insert(SymbolKey::new("miner"));
        for _ in 0..50 {
            let drawn = catalog.weighted_draw(&mut rng, &excluding).unwrap();
            assert_eq!(drawn.key.as_str(), "ruby");
        }
        excluding.insert(SymbolKey::new("ruby"));
        assert!(catalog.weighted_draw(&mut rng, &excluding).is_none());
    }

    #[test]
    fn test_offer_is_distinct() {
        let catalog = definitions::builtin();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let offer = catalog.offer_choices(&mut rng, &HashSet::new(), 0);
            assert_eq!(offer.len(), 3);
            let keys: HashSet<&SymbolKey> = offer.iter().map(|d| &d.key).collect();
            assert_eq!(keys.len(), 3);
        }
    }

    #[test]
    fn test_offer_pads_short_catalog() {
        let catalog = small_catalog();
        let mut rng = StdRng::seed_from_u64(3);
        // Only two drawable symbols exist; the offer returns both rather
        // than blocking.
        let offer = catalog.offer_choices(&mut rng, &HashSet::new(), 0);
        assert_eq!(offer.len(), 2);
    }

    #[test]
    fn test_offer_extra_choices() {
        let catalog = definitions::builtin();
        let mut rng = StdRng::seed_from_u64(5);
        let offer = catalog.offer_choices(&mut rng, &HashSet::new(), 2);
        assert_eq!(offer.len(), 5);
    }
}
