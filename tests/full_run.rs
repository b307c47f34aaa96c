//! End-to-end runs through the public API only.

use paydirt::catalog::definitions;
use paydirt::decision::{FirstChoice, RandomChoice};
use paydirt::{GameOutcome, GameSession, Phase, SettleEvent, StepError, Tuning};

#[test]
fn seeded_games_terminate_and_record_scores() {
    for seed in 0..40 {
        let mut session = GameSession::new(definitions::builtin(), Tuning::default(), seed);
        let mut chooser = RandomChoice::new(seed);
        let outcome = session.run_to_completion(&mut chooser, 5_000);
        assert!(outcome.is_some(), "seed {seed} did not terminate");
        assert_eq!(session.phase(), Phase::GameOver);

        let best = session.best_score();
        match outcome.unwrap() {
            GameOutcome::Victory { rounds, .. } => assert_eq!(best.best_round, rounds),
            GameOutcome::Defeat { round, .. } => assert_eq!(best.best_round, round),
        }
    }
}

#[test]
fn spin_before_choosing_is_rejected() {
    let mut session = GameSession::new(definitions::builtin(), Tuning::default(), 1);
    match session.spin() {
        Err(StepError::WrongPhase { expected, actual }) => {
            assert_eq!(expected, Phase::Spinning);
            assert_eq!(actual, Phase::SelectingSymbol);
        }
        other => panic!("expected WrongPhase, got {other:?}"),
    }
}

#[test]
fn skip_selection_still_plays_the_round() {
    let mut session = GameSession::new(definitions::builtin(), Tuning::default(), 2);
    session.skip_selection().unwrap();
    assert_eq!(session.phase(), Phase::Spinning);
    let report = session.spin().unwrap();
    assert!(!report.rolls.is_empty());
    assert_eq!(report.settlements.len() as u32, report.reveal_target);
}

#[test]
fn spin_reports_are_internally_consistent() {
    let mut session = GameSession::new(definitions::builtin(), Tuning::default(), 3);
    session.choose_symbol(0).unwrap();
    for _ in 0..50 {
        match session.phase() {
            Phase::Spinning => {
                let report = session.spin().unwrap();
                // The roll always mines exactly what it asked for.
                assert_eq!(report.settlements.len() as u32, report.reveal_target);
                let rolled: u32 = report.rolls.iter().map(|&f| f as u32).sum();
                if report.dig_doubled {
                    assert_eq!(report.reveal_target, rolled * 2);
                } else {
                    assert_eq!(report.reveal_target, rolled);
                }
            }
            Phase::SelectingSymbol => {
                session.choose_symbol(0).unwrap();
            }
            Phase::GameOver => break,
        }
    }
}

#[test]
fn terminal_sessions_reject_further_steps() {
    let tuning = Tuning {
        rent_base: 100_000,
        ..Tuning::default()
    };
    let mut session = GameSession::new(definitions::builtin(), tuning, 4);
    let mut chooser = FirstChoice;
    let outcome = session.run_to_completion(&mut chooser, 100);
    assert!(matches!(outcome, Some(GameOutcome::Defeat { .. })));

    assert!(session.spin().is_err());
    assert!(session.choose_symbol(0).is_err());
    assert!(session.skip_selection().is_err());
}

#[test]
fn event_log_carries_the_settlement_sequence() {
    let mut session = GameSession::new(definitions::builtin(), Tuning::default(), 5);
    session.choose_symbol(0).unwrap();
    let report = session.spin().unwrap();

    // Every settled cell appears as a CellSettled event, in order.
    let cell_events: Vec<(usize, i64)> = report
        .events
        .iter()
        .filter_map(|event| match event {
            SettleEvent::CellSettled { cell, earnings, .. } => Some((*cell, *earnings)),
            _ => None,
        })
        .collect();
    let from_settlements: Vec<(usize, i64)> = report
        .settlements
        .iter()
        .map(|s| (s.cell, s.earnings))
        .collect();
    assert_eq!(cell_events, from_settlements);
    // The session log retains the same events.
    assert!(session.events().len() >= report.events.len());
}
