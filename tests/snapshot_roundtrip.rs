//! Snapshot serialization round-trips (requires the `serialization`
//! feature, which is on by default).

use paydirt::catalog::definitions;
use paydirt::snapshot::GameSnapshot;
use paydirt::{EffectKind, GameSession, SymbolFilter, SymbolKey, TriggerScope, Tuning};

#[test]
fn snapshot_survives_json_round_trip() {
    let catalog = definitions::builtin();
    let mut session = GameSession::new(catalog.clone(), Tuning::default(), 11);
    session.choose_symbol(0).unwrap();
    session.spin().unwrap();

    let snapshot = GameSnapshot::capture(&session);
    let json = serde_json::to_string(&snapshot).unwrap();
    let decoded: GameSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, snapshot);

    let restored = decoded.restore(catalog, Tuning::default(), 12);
    assert_eq!(restored.round_state(), session.round_state());
    assert_eq!(restored.pool().keys(), session.pool().keys());
}

#[test]
fn restored_session_finishes_a_game() {
    let catalog = definitions::builtin();
    let mut session = GameSession::new(catalog.clone(), Tuning::default(), 31);
    session.choose_symbol(0).unwrap();
    session.spin().unwrap();

    let snapshot = GameSnapshot::capture(&session);
    let mut restored = snapshot.restore(catalog, Tuning::default(), 32);
    let mut chooser = paydirt::FirstChoice;
    assert!(restored.run_to_completion(&mut chooser, 5_000).is_some());
}

#[test]
fn effect_kind_json_shape_is_stable() {
    let effect = EffectKind::ConditionalBonus {
        trigger: SymbolKey::new("vampire"),
        scope: TriggerScope::RevealBatch,
        bonus: 25,
    };
    let json = serde_json::to_value(&effect).unwrap();
    assert_eq!(json["kind"], "conditional_bonus");
    assert_eq!(json["trigger"], "vampire");
    assert_eq!(json["scope"], "reveal_batch");

    let back: EffectKind = serde_json::from_value(json).unwrap();
    assert_eq!(back, effect);
}

#[test]
fn filter_json_shapes() {
    let by_key = serde_json::to_value(SymbolFilter::key("miner")).unwrap();
    assert_eq!(by_key["key"], "miner");
    let by_tag = serde_json::to_value(SymbolFilter::tag("human")).unwrap();
    assert_eq!(by_tag["tag"], "human");
}
