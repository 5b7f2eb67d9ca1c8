//! End-to-end commit / reveal / verify through the game processor

use fairplay::{
    games::{GameOutcome, GameParams, ReelCount, RiskLevel, ServerSeed},
    verify, verify_strict, FairPlayConfig, FairPlayError, GameProcessor, InMemoryGameStore,
    InMemoryWallet, Resolution,
};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn processor() -> GameProcessor {
    GameProcessor::new(
        FairPlayConfig::default(),
        Arc::new(InMemoryWallet::with_balance("alice", dec!(1000))),
        Arc::new(InMemoryGameStore::new()),
    )
}

#[test]
fn test_instant_games_verify_after_reveal() {
    let processor = processor();
    for params in [
        GameParams::Dice { guess: 2 },
        GameParams::Plinko { rows: 14, risk: RiskLevel::High },
        GameParams::Slots { reels: ReelCount::Three },
        GameParams::Slots { reels: ReelCount::Five },
    ] {
        let resolution = processor
            .play("alice", params, dec!(1), Some("lucky".to_string()))
            .unwrap();
        assert_eq!(resolution.seeds.client_seed, "lucky");
        assert_eq!(resolution.server_seed.commitment(), resolution.seeds.server_seed_hash);
        assert!(verify(
            &resolution.server_seed,
            &resolution.seeds.server_seed_hash,
            &resolution.seeds.client_seed,
            resolution.seeds.nonce,
            Some(&resolution.params),
            &resolution.outcome,
        ));
    }
}

#[test]
fn test_commitment_published_before_play_matches_reveal() {
    let processor = processor();
    let info = processor
        .begin_game("alice", GameParams::Mines { mine_count: 4 }, dec!(5), None)
        .unwrap();
    let resolution = processor.resolve(info.game_id, Resolution::Cashout).unwrap();

    assert_eq!(info.seeds, resolution.seeds);
    assert_eq!(resolution.server_seed.commitment(), info.seeds.server_seed_hash);
    assert!(processor.verify(
        &info.seeds.server_seed_hash,
        &resolution.server_seed,
        &info.seeds.client_seed,
        info.seeds.nonce,
        Some(&info.params),
        &resolution.outcome,
    ));
}

#[test]
fn test_any_changed_input_fails_verification() {
    let processor = processor();
    let info = processor
        .begin_game("alice", GameParams::Mines { mine_count: 10 }, dec!(1), Some("client".to_string()))
        .unwrap();
    let resolution = processor.resolve(info.game_id, Resolution::Cashout).unwrap();
    let seed = &resolution.server_seed;
    let commitment = &info.seeds.server_seed_hash;
    let outcome = &resolution.outcome;
    let params = Some(&info.params);
    let nonce = info.seeds.nonce;

    assert!(verify(seed, commitment, "client", nonce, params, outcome));

    let other_seed = ServerSeed::new(format!("{}0", seed.as_str()));
    assert!(!verify(&other_seed, commitment, "client", nonce, params, outcome));
    assert!(!verify(&other_seed, &other_seed.commitment(), "client", nonce, params, outcome));
    assert!(!verify(seed, commitment, "client2", nonce, params, outcome));
    assert!(!verify(seed, commitment, "client", nonce + 1, params, outcome));
    assert!(!verify(seed, commitment, "client", nonce, Some(&GameParams::Mines { mine_count: 9 }), outcome));
    assert!(!verify(seed, commitment, "client", nonce, None, outcome));
}

#[test]
fn test_rewritten_dice_guess_fails_verification() {
    let processor = processor();
    let lost = (0..50)
        .map(|_| processor.play("alice", GameParams::Dice { guess: 4 }, dec!(1), None).unwrap())
        .find(|r| matches!(&r.outcome, GameOutcome::Dice(d) if !d.won))
        .expect("a losing roll");
    let GameOutcome::Dice(mut forged) = lost.outcome.clone() else {
        panic!("dice expected");
    };
    // claim the guess was the rolled face
    forged.guess = forged.roll;
    forged.won = true;
    forged.multiplier = dec!(5.82);

    let err = verify_strict(
        &lost.server_seed,
        &lost.seeds.server_seed_hash,
        &lost.seeds.client_seed,
        lost.seeds.nonce,
        Some(&lost.params),
        &GameOutcome::Dice(forged),
    )
    .unwrap_err();
    match err {
        FairPlayError::VerificationMismatch { field, .. } => assert_eq!(field, "guess"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_tampered_outcome_names_the_field() {
    let processor = processor();
    let resolution = processor
        .play(
            "alice",
            GameParams::Plinko { rows: 16, risk: RiskLevel::Medium },
            dec!(1),
            None,
        )
        .unwrap();
    let GameOutcome::Plinko(mut forged) = resolution.outcome.clone() else {
        panic!("plinko expected");
    };
    forged.multiplier += dec!(1);

    let err = verify_strict(
        &resolution.server_seed,
        &resolution.seeds.server_seed_hash,
        &resolution.seeds.client_seed,
        resolution.seeds.nonce,
        Some(&resolution.params),
        &GameOutcome::Plinko(forged),
    )
    .unwrap_err();
    match err {
        FairPlayError::VerificationMismatch { field, .. } => assert_eq!(field, "multiplier"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_report_only_after_finish() {
    let processor = processor();
    let info = processor
        .begin_game("alice", GameParams::Mines { mine_count: 3 }, dec!(1), None)
        .unwrap();

    assert!(matches!(
        processor.verification_report(info.game_id),
        Err(FairPlayError::IllegalState(_))
    ));
    // the stored record of a running game carries no secret
    let stored = processor.history("alice", 1).unwrap();
    assert!(stored[0].server_seed.is_none());
    assert!(stored[0].outcome.is_none());

    processor.resolve(info.game_id, Resolution::ForcedLoss).unwrap();
    let report = processor.verification_report(info.game_id).unwrap();
    assert!(report.valid);
    assert_eq!(report.recomputed_hash, report.server_seed_hash);
    assert_eq!(report.settlement.payout, dec!(0));
}
