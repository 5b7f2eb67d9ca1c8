//! Game lifecycles against the in-memory wallet and store

use fairplay::{
    games::{mines, GameOutcome, GameParams, RiskLevel},
    FairPlayConfig, FairPlayError, GameProcessor, GameStatus, InMemoryGameStore, InMemoryWallet,
    GameStore, Resolution, ValidationError, Wallet,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

struct Harness {
    processor: GameProcessor,
    wallet: InMemoryWallet,
    store: InMemoryGameStore,
}

fn harness(balance: Decimal) -> Harness {
    let wallet = InMemoryWallet::with_balance("alice", balance);
    let store = InMemoryGameStore::new();
    let processor = GameProcessor::new(
        FairPlayConfig::default(),
        Arc::new(wallet.clone()),
        Arc::new(store.clone()),
    );
    Harness {
        processor,
        wallet,
        store,
    }
}

impl Harness {
    fn store_record(&self, game_id: uuid::Uuid) -> fairplay::GameRecord {
        self.store.load(game_id).unwrap().unwrap()
    }
}

fn begin_mines(h: &Harness, mine_count: u8) -> uuid::Uuid {
    h.processor
        .begin_game("alice", GameParams::Mines { mine_count }, dec!(1), None)
        .unwrap()
        .game_id
}

#[test]
fn test_dice_balance_accounting() {
    let h = harness(dec!(100));
    let mut expected = dec!(100);
    for _ in 0..30 {
        let resolution = h
            .processor
            .play("alice", GameParams::Dice { guess: 6 }, dec!(2), None)
            .unwrap();
        expected = expected - dec!(2) + resolution.payout;
        let GameOutcome::Dice(dice) = &resolution.outcome else {
            panic!("dice expected");
        };
        if dice.won {
            assert_eq!(resolution.payout, dec!(11.64));
        } else {
            assert_eq!(resolution.payout, dec!(0));
        }
    }
    assert_eq!(h.wallet.balance("alice"), expected);
    assert_eq!(h.store.len(), 30);
    assert!(h
        .processor
        .history("alice", 100)
        .unwrap()
        .iter()
        .all(|r| r.status.is_finished()));
}

#[test]
fn test_mines_session_until_mine_or_cashout() {
    let h = harness(dec!(100));
    let game_id = begin_mines(&h, 3);
    assert_eq!(h.wallet.balance("alice"), dec!(99));
    assert_eq!(h.processor.active_games(), 1);

    // walk the grid in order; stop at the first mine or after four safe cells
    let mut safe_opened = 0;
    let mut finished = None;
    for cell in 0..mines::TOTAL_CELLS {
        let (row, col) = mines::cell_coords(cell);
        let step = h.processor.reveal_step(game_id, row, col).unwrap();
        match step.reveal {
            mines::CellReveal::Mine { .. } => {
                assert_eq!(step.multiplier, dec!(0));
                finished = step.resolution;
                break;
            }
            mines::CellReveal::Safe { multiplier, .. } => {
                safe_opened += 1;
                assert_eq!(multiplier, mines::multiplier(3, safe_opened));
                if safe_opened == 4 {
                    break;
                }
            }
        }
    }

    let resolution = match finished {
        Some(resolution) => {
            assert_eq!(resolution.payout, dec!(0));
            assert_eq!(h.wallet.balance("alice"), dec!(99));
            resolution
        }
        None => {
            let resolution = h.processor.resolve(game_id, Resolution::Cashout).unwrap();
            // 25/22 * 24/21 * 23/20 * 22/19 = 1.7298...
            assert_eq!(resolution.final_multiplier, dec!(1.73));
            assert_eq!(h.wallet.balance("alice"), dec!(100.73));
            resolution
        }
    };

    assert_eq!(h.processor.active_games(), 0);
    assert!(matches!(
        h.processor.reveal_step(game_id, 4, 4),
        Err(FairPlayError::IllegalState(_))
    ));
    let record = h.store_record(resolution.game_id);
    assert!(record.status.is_finished());
    assert!(record.server_seed.is_some());
}

#[test]
fn test_cashout_without_reveals_returns_stake() {
    let h = harness(dec!(10));
    let info = h
        .processor
        .begin_game("alice", GameParams::Mines { mine_count: 20 }, dec!(10), None)
        .unwrap();
    let resolution = h.processor.resolve(info.game_id, Resolution::Cashout).unwrap();
    assert_eq!(resolution.final_multiplier, dec!(1));
    assert_eq!(h.wallet.balance("alice"), dec!(10));
    assert_eq!(h.store_record(info.game_id).status, GameStatus::Won);
}

#[test]
fn test_rejections_leave_balance_untouched() {
    let h = harness(dec!(5));

    let err = h
        .processor
        .play("alice", GameParams::Dice { guess: 7 }, dec!(1), None)
        .unwrap_err();
    assert!(matches!(err, FairPlayError::Validation(ValidationError::DiceFace(7))));

    let err = h
        .processor
        .play("alice", GameParams::Plinko { rows: 16, risk: RiskLevel::Low }, dec!(6), None)
        .unwrap_err();
    assert!(matches!(err, FairPlayError::InsufficientFunds { .. }));

    let err = h
        .processor
        .play("alice", GameParams::Dice { guess: 1 }, dec!(0.001), None)
        .unwrap_err();
    assert!(matches!(err, FairPlayError::Validation(ValidationError::BetOutOfRange { .. })));

    assert!(h
        .processor
        .play("alice", GameParams::Mines { mine_count: 3 }, dec!(1), None)
        .is_err());

    assert_eq!(h.wallet.balance("alice"), dec!(5));
    assert!(h.store.is_empty());
}

#[test]
fn test_unknown_game_is_not_found() {
    let h = harness(dec!(5));
    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        h.processor.resolve(missing, Resolution::Cashout),
        Err(FairPlayError::NotFound(_))
    ));
    assert!(matches!(h.processor.game_info(missing), Err(FairPlayError::NotFound(_))));
}
