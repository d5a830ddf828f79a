#![allow(non_snake_case)]
use chrono::TimeDelta;
use lootcase::{
    EngineConfig,
    FreeCaseStatus,
    Rejection,
    test_helpers::*,
};

const WINDOW_MS: u64 = 300_000;

#[test]
fn free_case_status__ready_for_a_new_profile() {
    let ctx = TestContext::new();
    // given
    let session = ctx.scripted_session([0.1, 0.0]);

    // when
    let status = session.free_case_status();

    // then
    assert_eq!(status, FreeCaseStatus {
        ready: true,
        remaining_ms: 0,
    });
}

#[test]
fn open_case__free_claim_costs_nothing_and_starts_the_window() {
    let ctx = TestContext::new().with_balance(0);
    // given
    let mut session = ctx.scripted_session([0.1, 0.0]);

    // when
    let receipt = session.open_case(FREE_CASE, 1).unwrap();

    // then
    assert_eq!(receipt.cost, 0);
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(session.ledger().balance, 0);
    assert_eq!(session.ledger().total_opened, 1);
    assert_eq!(session.free_case_status(), FreeCaseStatus {
        ready: false,
        remaining_ms: WINDOW_MS,
    });
}

#[test]
fn open_case__free_claim_ignores_the_requested_count() {
    let ctx = TestContext::new();
    // given
    let mut session = ctx.scripted_session([0.1, 0.0]);

    // when
    let receipt = session.open_case(FREE_CASE, 5).unwrap();

    // then
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(session.ledger().total_opened, 1);
}

#[test]
fn open_case__free_claim_is_rejected_while_cooling() {
    let ctx = TestContext::new();
    let clock = ctx.clock();
    // given
    let mut session = ctx.scripted_session([0.1, 0.0]);
    session.open_case(FREE_CASE, 1).unwrap();
    clock.advance(TimeDelta::seconds(299));
    let before = session.snapshot();

    // when
    let result = session.open_case(FREE_CASE, 1);

    // then
    assert_eq!(result, Err(Rejection::CooldownActive { remaining_ms: 1000 }));
    assert_eq!(session.snapshot(), before);
}

#[test]
fn open_case__free_claim_accepted_once_window_passes() {
    let ctx = TestContext::new();
    let clock = ctx.clock();
    // given
    let mut session = ctx.scripted_session([0.1, 0.0]);
    session.open_case(FREE_CASE, 1).unwrap();
    clock.advance(TimeDelta::seconds(300));
    assert!(session.free_case_status().ready);

    // when
    session.open_case(FREE_CASE, 1).unwrap();

    // then
    assert_eq!(session.ledger().total_opened, 2);
    assert_eq!(session.free_case_status().remaining_ms, WINDOW_MS);
}

#[test]
fn open_case__paid_cases_ignore_the_free_cooldown() {
    let ctx = TestContext::new();
    // given
    let mut session = ctx.scripted_session([0.1, 0.0]);
    session.open_case(FREE_CASE, 1).unwrap();

    // when
    let receipt = session.open_case(FIXTURE_CASE, 1);

    // then
    assert!(receipt.is_ok());
    assert!(!session.free_case_status().ready);
}

#[test]
fn free_case_status__cooldown_survives_a_snapshot_round_trip() {
    let ctx = TestContext::new();
    let clock = ctx.clock();
    // given
    let mut session = ctx.scripted_session([0.1, 0.0]);
    session.open_case(FREE_CASE, 1).unwrap();
    clock.advance(TimeDelta::seconds(120));
    let snapshot = session.snapshot();

    // when
    let restored = lootcase::Session::restore(
        fixture_catalog(),
        ctx.config(),
        snapshot,
        lootcase::ScriptedDraws::new([0.0]),
        ctx.clock(),
    )
    .unwrap();

    // then
    assert_eq!(restored.free_case_status().remaining_ms, 180_000);
}

#[test]
fn open_case__unbounded_cooldown_blocks_every_later_claim() {
    let config = EngineConfig {
        free_case_cooldown_secs: u64::MAX,
        ..EngineConfig::default().instant()
    };
    let ctx = TestContext::new().with_config(config);
    let clock = ctx.clock();
    // given
    let mut session = ctx.scripted_session([0.1, 0.0]);
    session.open_case(FREE_CASE, 1).unwrap();
    clock.advance(TimeDelta::days(10_000));

    // when
    let result = session.open_case(FREE_CASE, 1);

    // then
    assert!(matches!(result, Err(Rejection::CooldownActive { .. })));
    assert!(!session.free_case_status().ready);
}

#[test]
fn free_case_status__clock_set_back_waits_at_most_one_window() {
    let ctx = TestContext::new();
    let clock = ctx.clock();
    // given
    let mut session = ctx.scripted_session([0.1, 0.0]);
    session.open_case(FREE_CASE, 1).unwrap();

    // when
    clock.set(start_time() - TimeDelta::hours(1));

    // then
    assert_eq!(session.free_case_status().remaining_ms, WINDOW_MS);
}
