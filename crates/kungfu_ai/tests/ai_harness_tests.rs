//! AI harness tests
//!
//! Whole games between controllers, driven through the service layer so
//! AI decisions pass the same gate as client moves.

use std::collections::BTreeMap;

use kungfu_ai::{ai_for, DummyAi, KungFuAi};
use kungfu_engine::types::{BoardKind, GameStatus, PlayerNum, Speed};
use kungfu_engine::{GameEvent, GameService};

struct GameResult {
    winner: u8,
    ticks: i64,
    moves_made: usize,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn run_ai_game(
    service: &GameService,
    speed: Speed,
    bot_one: &str,
    bot_two: &str,
    max_ticks: i64,
) -> GameResult {
    let players: BTreeMap<PlayerNum, String> = BTreeMap::from([
        (1, format!("bot:{bot_one}")),
        (2, format!("bot:{bot_two}")),
    ]);
    let (game_id, keys) = service
        .create_game(speed, BoardKind::Standard, players)
        .unwrap();
    assert!(keys.is_empty(), "all-bot game issues no player keys");
    assert!(service.attach_ai(&game_id, 1, ai_for(bot_one, speed)));
    assert!(service.attach_ai(&game_id, 2, ai_for(bot_two, speed)));

    // All-bot games start on creation.
    assert_eq!(
        service.game_state(&game_id).unwrap().status,
        GameStatus::Playing
    );

    let mut moves_made = 0;
    let mut ticks = 0;
    loop {
        let (events, finished) = service.tick(&game_id).unwrap();
        ticks += 1;
        moves_made += events
            .iter()
            .filter(|e| matches!(e, GameEvent::MoveStarted { .. }))
            .count();
        if finished || ticks >= max_ticks {
            break;
        }
    }

    let state = service.game_state(&game_id).unwrap();
    GameResult {
        winner: state.winner.unwrap_or(u8::MAX),
        ticks,
        moves_made,
    }
}

#[test]
fn pipeline_ai_beats_or_draws_the_clock() {
    init_tracing();
    let service = GameService::new();
    let result = run_ai_game(&service, Speed::Lightning, "novice", "dummy", 30_000);

    assert!(result.moves_made > 0, "both sides must actually play");
    assert!(
        result.winner != u8::MAX,
        "game must terminate (win or inactivity draw) within {} ticks",
        result.ticks
    );
}

#[test]
fn controllers_are_usable_as_trait_objects() {
    let _boxed: Vec<Box<dyn kungfu_engine::AiPlayer>> = vec![
        Box::new(KungFuAi::new(1, Speed::Standard)),
        Box::new(DummyAi::new(Speed::Standard)),
    ];
}
