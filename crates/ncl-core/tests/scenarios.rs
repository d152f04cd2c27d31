//! End-to-end scenarios through the orchestration surface.

use ncl_core::{
    BetStatus, ChapterResolved, ConsequenceRecorder, ConsequenceStatus, House, ImpactClassifier,
    ImpactVector, InMemoryStore, JsonFileStore, LedgerConfig, LedgerStore, NarrativeLedger,
    NclError, ResolutionWindow,
};

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

fn story() -> NarrativeLedger<InMemoryStore> {
    NarrativeLedger::open_with_recorder(
        InMemoryStore::new(),
        "saga",
        LedgerConfig::default(),
        ConsequenceRecorder::new(SeverityFromText),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// resolution and settlement
// ---------------------------------------------------------------------------

#[test]
fn bet_inside_window_pays_eight_times() {
    let mut nl = story();
    let outcome = nl
        .on_chapter_resolved(ChapterResolved::new(
            3,
            "c3-b",
            "4: the envoy is imprisoned",
            vec![House::Valdris, House::Korvath],
        ))
        .unwrap();
    let id = outcome.consequence.id;
    assert_eq!(outcome.consequence.severity, 4);
    assert_eq!(outcome.consequence.window, ResolutionWindow::new(11, 23));

    let bet = nl.place_bet(id, "marisol", 14, 50.0).unwrap();
    assert_eq!(bet.multiplier, 8.0);

    let settlement = nl
        .resolve_consequence(id, 15, "The envoy is ransomed back")
        .unwrap();
    assert_eq!(settlement.won, vec![bet.id]);
    assert!(settlement.lost.is_empty());
    assert!((settlement.total_payout - 400.0).abs() < 1e-9);

    let c = nl.ledger().get(id).unwrap();
    assert_eq!(c.narrative_debt, 0.0);
    assert_eq!(c.status, ConsequenceStatus::Resolved);
    assert_eq!(c.bets[0].status, BetStatus::Won);
    assert_eq!(c.bets[0].payout, Some(400.0));

    let report = nl.score_and_escalate(16).unwrap();
    assert!(report.debt_of(id).is_none());
    assert!(nl.ledger().active_by_origin(16).iter().all(|c| c.id != id));
}

#[test]
fn resolved_consequence_is_frozen() {
    let mut nl = story();
    let id = nl
        .on_chapter_resolved(ChapterResolved::new(1, "c1", "2: a slight", vec![]))
        .unwrap()
        .consequence
        .id;
    nl.resolve_consequence(id, 4, "apology accepted").unwrap();

    let again = nl.resolve_consequence(id, 5, "again").unwrap_err();
    assert!(matches!(again, NclError::AlreadyResolved(_)));
    assert!(nl.place_bet(id, "x", 6, 1.0).unwrap_err().is_invalid_state());
    assert!(nl.open_market(id).unwrap_err().is_invalid_state());
    assert_eq!(nl.ledger().get(id).unwrap().actual_resolution_chapter, Some(4));
}

#[test]
fn settlement_retry_after_interrupted_resolution() {
    let mut nl = story();
    let id = nl
        .on_chapter_resolved(ChapterResolved::new(1, "c1", "1: a rumour", vec![]))
        .unwrap()
        .consequence
        .id;
    nl.place_bet(id, "ana", 5, 10.0).unwrap();
    nl.place_bet(id, "ben", 3, 10.0).unwrap();

    // Simulate a crash after resolve but before settle by reloading the
    // persisted state and resolving on the bare ledger only.
    let mut store = nl.into_store();
    let mut state = store.load("saga").unwrap().unwrap();
    {
        let c = &mut state.consequences[0];
        c.status = ConsequenceStatus::Resolved;
        c.actual_resolution_chapter = Some(5);
        c.narrative_debt = 0.0;
    }
    store.save(&state).unwrap();

    let mut nl = NarrativeLedger::open(store, "saga", LedgerConfig::default()).unwrap();
    let first = nl.settle_pending(id).unwrap();
    assert_eq!(first.won.len(), 1);
    assert_eq!(first.lost.len(), 1);
    assert!((first.total_payout - 80.0).abs() < 1e-9);

    let second = nl.settle_pending(id).unwrap();
    assert!(second.won.is_empty() && second.lost.is_empty());
    assert_eq!(second.total_payout, 0.0);
}

// ---------------------------------------------------------------------------
// escalation
// ---------------------------------------------------------------------------

#[test]
fn neglected_consequence_escalates_exactly_once() {
    let mut nl = story();
    let id = nl
        .on_chapter_resolved(ChapterResolved::new(2, "c2", "3: the mill burns", vec![]))
        .unwrap()
        .consequence
        .id;
    assert_eq!(nl.ledger().get(id).unwrap().window, ResolutionWindow::new(8, 17));

    let report = nl.score_and_escalate(25).unwrap();
    assert_eq!(report.escalated, vec![id]);
    let c = nl.ledger().get(id).unwrap();
    assert_eq!(c.severity, 4);
    assert_eq!(c.status, ConsequenceStatus::Escalated);
    assert_eq!(c.window, ResolutionWindow::new(26, 34));
    assert!(c.description.contains("expected resolution window passed"));

    let same_chapter = nl.score_and_escalate(25).unwrap();
    assert!(same_chapter.escalated.is_empty());

    let next_chapter = nl.score_and_escalate(26).unwrap();
    assert!(next_chapter.escalated.is_empty());
    let c = nl.ledger().get(id).unwrap();
    assert_eq!(c.severity, 4);
    assert_eq!(c.escalation_count, 1);
}

#[test]
fn context_request_triggers_pending_escalation() {
    let mut nl = story();
    let id = nl
        .on_chapter_resolved(ChapterResolved::new(1, "c1", "5: the king is slain", vec![House::Valdris]))
        .unwrap()
        .consequence
        .id;
    // severity 5 from chapter 1: window [11, 26]
    let ctx = nl.get_chapter_context(30).unwrap();
    assert_eq!(nl.ledger().get(id).unwrap().status, ConsequenceStatus::Escalated);
    // (5 + 0) * 1.8 after re-anchoring
    assert!((ctx.debt_score - 9.0).abs() < 1e-9);
    assert!(ctx.prompt_block.contains("[ESCALATED: expected resolution window passed]"));
    assert!(ctx.prompt_block.contains("HOUSE UNDER PRESSURE: Valdris (debt 9.0)"));
}

// ---------------------------------------------------------------------------
// crisis
// ---------------------------------------------------------------------------

#[test]
fn crisis_forces_must_resolve_tier() {
    let mut nl = story();
    for (i, sev) in ["5", "5", "5", "5", "4"].iter().enumerate() {
        nl.on_chapter_resolved(ChapterResolved::new(1, format!("c{i}"), *sev, vec![]))
            .unwrap();
    }
    // 4 * 5 + 4 = 24: one short of crisis
    let calm = nl.get_chapter_context(2).unwrap();
    assert!(!calm.is_crisis);
    assert!(calm.must_resolve.is_empty());

    nl.on_chapter_resolved(ChapterResolved::new(2, "c5", "1", vec![]))
        .unwrap();
    let ctx = nl.get_chapter_context(3).unwrap();
    assert!((ctx.debt_score - 25.0).abs() < 1e-9);
    assert!(ctx.is_crisis);
    assert_eq!(ctx.must_resolve.len(), 2);
    assert!(ctx.must_resolve.iter().all(|c| c.severity == 5));
    assert!(ctx.prompt_block.starts_with("=== NARRATIVE DEBT: 25.0 CRISIS ==="));
}

#[test]
fn chapter_near_clock_limit_is_rejected_without_persisting() {
    let mut nl = story();
    let err = nl
        .on_chapter_resolved(ChapterResolved::new(u32::MAX - 1, "r", "x", vec![]))
        .unwrap_err();
    assert!(matches!(err, NclError::InvalidInput(_)));
    assert!(nl.ledger().is_empty());
    assert!(nl.store().is_empty());
}

// ---------------------------------------------------------------------------
// persistence
// ---------------------------------------------------------------------------

#[test]
fn json_store_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let id = {
        let mut nl = NarrativeLedger::open(
            JsonFileStore::new(dir.path()),
            "book-one",
            LedgerConfig::default(),
        )
        .unwrap();
        let id = nl
            .on_chapter_resolved(ChapterResolved::new(
                1,
                "c1-a",
                "Betray the pact with Ashmere",
                vec![House::Ashmere, House::Thornwick],
            ))
            .unwrap()
            .consequence
            .id;
        nl.place_bet(id, "ana", 4, 12.5).unwrap();
        id
    };

    let nl = NarrativeLedger::open(
        JsonFileStore::new(dir.path()),
        "book-one",
        LedgerConfig::default(),
    )
    .unwrap();
    let c = nl.ledger().get(id).unwrap();
    assert_eq!(c.houses_affected, vec![House::Ashmere, House::Thornwick]);
    assert_eq!(c.bets.len(), 1);
    assert_eq!(c.bets[0].bettor, "ana");
}
