//! Property tests for windows, escalation, debt, context tiers, and bets.

use ncl_core::market::{bet_wins, multiplier_for};
use ncl_core::recorder::{escalate, window_for};
use ncl_core::{
    BetStatus, ConsequenceBetMarket, ConsequenceLedger, ConsequenceRecorder, ContextBuilder, House,
    ImpactClassifier, ImpactVector, NarrativeDebtEngine, ResolutionWindow,
};
use proptest::prelude::*;

/// Reads the severity (1-5) from the first character of the choice text.
struct SeverityFromText;

impl ImpactClassifier for SeverityFromText {
    fn classify(&self, text: &str, _houses: &[House]) -> ImpactVector {
        match text.chars().next() {
            Some('5') => ImpactVector::new(-1.0, 1.0, 1.0, 1.0, 1.0),
            Some('4') => ImpactVector::new(-1.0, 0.0, 1.0, 0.5, 0.0),
            Some('3') => ImpactVector::new(-1.0, 0.0, 0.0, 1.0, 0.0),
            Some('2') => ImpactVector::new(-1.0, 0.0, 0.0, 0.0, 0.0),
            _ => ImpactVector::default(),
        }
    }
}

fn ledger_from(entries: &[(u32, u8)]) -> ConsequenceLedger {
    let mut ledger =
        ConsequenceLedger::new("prop").with_recorder(ConsequenceRecorder::new(SeverityFromText));
    for (i, (origin, severity)) in entries.iter().enumerate() {
        ledger
            .record_from_choice(*origin, &format!("c{i}"), &severity.to_string(), &[], None)
            .unwrap();
    }
    ledger
}

fn entries() -> impl Strategy<Value = Vec<(u32, u8)>> {
    prop::collection::vec((1u32..30, 1u8..=5), 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn window_matches_severity(origin in 0u32..10_000, severity in 1u8..=5) {
        let w = window_for(origin, severity).unwrap();
        prop_assert_eq!(w.min_chapter, origin + 2 * u32::from(severity));
        prop_assert_eq!(w.max_chapter, origin + 5 * u32::from(severity));
        prop_assert!(w.min_chapter > origin);
    }

    #[test]
    fn recorded_severity_matches_classifier(origin in 1u32..100, severity in 1u8..=5) {
        let ledger = ledger_from(&[(origin, severity)]);
        let c = &ledger.all()[0];
        prop_assert_eq!(c.severity, severity);
        prop_assert_eq!(c.window, window_for(origin, severity).unwrap());
    }

    #[test]
    fn escalation_raises_severity_by_one_capped(
        severity in 1u8..=5,
        origin in 1u32..50,
        ahead in 0u32..150,
    ) {
        let current = origin + ahead;
        let ledger = ledger_from(&[(origin, severity)]);
        let c = &ledger.all()[0];
        let e = escalate(c, "test", current).unwrap();
        prop_assert_eq!(e.severity, (severity + 1).min(5));
        prop_assert!(e.severity >= c.severity);
        prop_assert_eq!(e.window.min_chapter, current + 1);
        prop_assert_eq!(e.window.max_chapter, current + 1 + 2 * u32::from(e.severity));
        prop_assert!(e.window.min_chapter > e.chapter_origin);
    }

    #[test]
    fn escalation_before_origin_is_rejected(
        severity in 1u8..=5,
        origin in 2u32..50,
        behind in 1u32..50,
    ) {
        let ledger = ledger_from(&[(origin, severity)]);
        let current = origin.saturating_sub(behind);
        prop_assert!(escalate(&ledger.all()[0], "test", current).is_err());
    }

    #[test]
    fn adding_an_overdue_consequence_never_lowers_debt(
        base in entries(),
        extra_severity in 1u8..=5,
        chapter in 40u32..80,
    ) {
        let engine = NarrativeDebtEngine::default();
        let mut without = ledger_from(&base);
        let before = engine.score_and_escalate(&mut without, chapter).unwrap().total_debt;

        let mut with_entries = base.clone();
        with_entries.push((1, extra_severity));
        let mut with = ledger_from(&with_entries);
        let after = engine.score_and_escalate(&mut with, chapter).unwrap().total_debt;

        prop_assert!(after >= before);
    }

    #[test]
    fn crisis_flag_tracks_threshold(base in entries(), chapter in 1u32..60) {
        let mut ledger = ledger_from(&base);
        let report = NarrativeDebtEngine::default().score_and_escalate(&mut ledger, chapter).unwrap();
        prop_assert_eq!(report.is_crisis, report.total_debt >= 25.0);
    }

    #[test]
    fn must_resolve_only_in_crisis(base in entries(), chapter in 1u32..60) {
        let mut ledger = ledger_from(&base);
        let ctx = ContextBuilder::default().build_chapter_context(&mut ledger, chapter).unwrap();
        if ctx.is_crisis {
            prop_assert!(ctx.must_resolve.len() <= 2);
            prop_assert!(ctx.must_resolve.iter().all(|c| c.severity >= 4));
        } else {
            prop_assert!(ctx.must_resolve.is_empty());
        }
        prop_assert!(ctx.should_address.len() <= 3);
        prop_assert!(ctx.may_reference.len() <= 5);
    }

    #[test]
    fn multiplier_depends_only_on_distance(min in 1u32..100, len in 0u32..30, predicted in 0u32..200) {
        let w = ResolutionWindow::new(min, min + len);
        let m = multiplier_for(w.distance_outside(predicted));
        let expected = if w.contains(predicted) {
            8.0
        } else if predicted + 1 == w.min_chapter || predicted == w.max_chapter + 1 {
            4.0
        } else if predicted + 2 == w.min_chapter || predicted == w.max_chapter + 2 {
            2.0
        } else {
            1.5
        };
        prop_assert_eq!(m, expected);
    }

    #[test]
    fn settlement_wins_within_one_chapter(
        predicted in 2u32..40,
        actual in 2u32..40,
        amount in 1u32..1_000,
    ) {
        let mut ledger = ledger_from(&[(1, 1)]);
        let id = ledger.all()[0].id;
        let market = ConsequenceBetMarket;
        market.open_market(&mut ledger, id).unwrap();
        let bet = market.place_bet(&mut ledger, id, "p", predicted, f64::from(amount)).unwrap();
        ledger.resolve(id, actual, "done").unwrap();
        let s = market.settle_bets(&mut ledger, id, actual).unwrap();

        let settled = &ledger.get(id).unwrap().bets[0];
        if bet_wins(predicted, actual) {
            prop_assert!(predicted.abs_diff(actual) <= 1);
            prop_assert_eq!(settled.status, BetStatus::Won);
            prop_assert!((s.total_payout - f64::from(amount) * bet.multiplier).abs() < 1e-9);
        } else {
            prop_assert_eq!(settled.status, BetStatus::Lost);
            prop_assert_eq!(s.total_payout, 0.0);
        }
    }
}
