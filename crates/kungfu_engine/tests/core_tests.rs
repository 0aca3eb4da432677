//! Engine invariant tests
//!
//! Properties that must hold for every game, every tick, every legal call
//! sequence: unique busy state per piece, monotone clocks, event
//! causality, and the enumeration/validation agreement.

use std::collections::{BTreeMap, HashSet};

use kungfu_engine::engine::{
    apply_move, create_game, legal_moves, set_player_ready, tick, validate_move,
};
use kungfu_engine::moves::{is_piece_moving, is_piece_on_cooldown};
use kungfu_engine::types::{BoardKind, GameStatus, PlayerNum, Speed};
use kungfu_engine::{GameEvent, GameState};

fn players() -> BTreeMap<PlayerNum, String> {
    BTreeMap::from([(1, "u:one".to_string()), (2, "u:two".to_string())])
}

fn started() -> GameState {
    let mut state =
        create_game(Speed::Lightning, players(), BoardKind::Standard, None).unwrap();
    set_player_ready(&mut state, 1);
    set_player_ready(&mut state, 2);
    state
}

/// Deterministic pseudo-random walk: both sides issue whatever legal move
/// hashes lowest, every few ticks, for a while. Exercises captures,
/// cooldowns and blocking without fixing a script.
fn churn(state: &mut GameState, rounds: usize) -> Vec<GameEvent> {
    let mut all_events = Vec::new();
    for round in 0..rounds {
        if state.status != GameStatus::Playing {
            break;
        }
        for player in [1u8, 2u8] {
            let mut moves = legal_moves(state, player);
            moves.sort();
            if let Some((piece_id, to_row, to_col)) =
                moves.into_iter().nth(round % 3)
            {
                if let Ok(mv) = validate_move(state, player, &piece_id, to_row, to_col) {
                    all_events.extend(apply_move(state, mv));
                }
            }
        }
        for _ in 0..4 {
            all_events.extend(tick(state));
        }
    }
    all_events
}

#[test]
fn no_piece_is_moving_and_cooling_at_once() {
    let mut state = started();
    for _ in 0..120 {
        if state.status != GameStatus::Playing {
            break;
        }
        churn(&mut state, 1);

        let moving: HashSet<&str> = state
            .active_moves
            .iter()
            .map(|m| m.piece_id.as_str())
            .collect();
        // No two active moves share a piece.
        assert_eq!(moving.len(), state.active_moves.len());

        let cooling: HashSet<&str> = state
            .cooldowns
            .iter()
            .filter(|c| c.is_active(state.current_tick))
            .map(|c| c.piece_id.as_str())
            .collect();
        assert_eq!(
            cooling.len(),
            state
                .cooldowns
                .iter()
                .filter(|c| c.is_active(state.current_tick))
                .count()
        );
        assert!(moving.is_disjoint(&cooling), "piece both moving and cooling");
    }
}

#[test]
fn clocks_are_monotone_and_bounded() {
    let mut state = started();
    let mut last_tick = state.current_tick;
    for _ in 0..60 {
        if state.status != GameStatus::Playing {
            break;
        }
        churn(&mut state, 1);
        assert!(state.current_tick > last_tick);
        last_tick = state.current_tick;
        assert!(state.last_move_tick <= state.current_tick);
        assert!(state.last_capture_tick <= state.current_tick);
    }
}

#[test]
fn captured_pieces_never_move_again() {
    let mut state = started();
    let events = churn(&mut state, 400);

    let mut captured_at: BTreeMap<String, usize> = BTreeMap::new();
    for (i, event) in events.iter().enumerate() {
        match event {
            GameEvent::Capture {
                captured_piece_id, ..
            } => {
                captured_at.entry(captured_piece_id.clone()).or_insert(i);
            }
            GameEvent::MoveStarted { piece_id, .. }
            | GameEvent::MoveCompleted { piece_id, .. }
            | GameEvent::CooldownStarted { piece_id, .. } => {
                if let Some(&at) = captured_at.get(piece_id) {
                    assert!(
                        i < at,
                        "captured piece {piece_id} appeared in a later lifecycle event"
                    );
                }
            }
            _ => {}
        }
    }

    for (piece_id, _) in captured_at {
        assert!(state.board.piece(&piece_id).unwrap().captured);
    }
}

#[test]
fn every_completion_has_a_preceding_start() {
    let mut state = started();
    let events = churn(&mut state, 300);

    let mut started_ids: HashSet<String> = HashSet::new();
    for event in &events {
        match event {
            GameEvent::MoveStarted { piece_id, .. } => {
                started_ids.insert(piece_id.clone());
            }
            GameEvent::MoveCompleted { piece_id, .. } => {
                assert!(
                    started_ids.contains(piece_id),
                    "completion without a start for {piece_id}"
                );
            }
            _ => {}
        }
    }
}

#[test]
fn pieces_stay_on_valid_squares() {
    let mut state = started();
    churn(&mut state, 300);
    for piece in state.board.pieces() {
        if piece.captured {
            continue;
        }
        let (row, col) = piece.grid_position();
        assert!(
            state.board.is_valid_square(row, col),
            "piece {} rests on invalid square ({row}, {col})",
            piece.id
        );
    }
}

#[test]
fn enumeration_and_validation_agree() {
    let mut state = started();
    for _ in 0..40 {
        if state.status != GameStatus::Playing {
            break;
        }
        churn(&mut state, 1);
        for player in [1u8, 2u8] {
            for (piece_id, to_row, to_col) in legal_moves(&state, player) {
                assert!(
                    validate_move(&state, player, &piece_id, to_row, to_col).is_ok(),
                    "enumerated move failed validation: {piece_id} -> ({to_row},{to_col})"
                );
            }
        }
    }
}

#[test]
fn busy_state_matches_helpers() {
    let mut state = started();
    let mv = validate_move(&state, 1, "P:1:6:4", 4, 4).unwrap();
    apply_move(&mut state, mv);
    tick(&mut state);

    assert!(is_piece_moving("P:1:6:4", &state.active_moves));
    assert!(!is_piece_on_cooldown(
        "P:1:6:4",
        &state.cooldowns,
        state.current_tick
    ));

    let total = 2 * state.config().ticks_per_square + 1;
    for _ in 0..total {
        tick(&mut state);
    }
    assert!(!is_piece_moving("P:1:6:4", &state.active_moves));
    assert!(is_piece_on_cooldown(
        "P:1:6:4",
        &state.cooldowns,
        state.current_tick
    ));
}
