//! The tick simulator and its event stream.
//!
//! All functions mutate the given `GameState` in place and return the
//! events the mutation produced. A tick is an atomic unit: no request may
//! interleave with one, which is what makes the `start_tick = current_tick
//! + 1` convention deterministic (see the service layer for the locking
//! discipline).

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use crate::board::Board;
use crate::collision::detect_collisions;
use crate::constants::{GAME_ID_ALPHABET, GAME_ID_LENGTH};
use crate::error::{GameSetupError, MoveError};
use crate::move_gen::orientation::{orientation, Axis};
use crate::move_gen::{check_castling, compute_move_path, should_promote_pawn};
use crate::moves::{is_piece_moving, is_piece_on_cooldown, Cooldown, Move, PathPoint};
use crate::setup::render_board_string;
use crate::state::{GameState, ReplayMove};
use crate::types::{BoardKind, GameStatus, PieceKind, PlayerNum, Speed, Tick, WinReason};

/// Everything that can happen during a game, tagged with the tick on which
/// it happened. Emission order within one tick: captures, then move
/// completions with their cooldown starts and promotions, then cooldown
/// expirations, then termination.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted {
        tick: Tick,
        players: BTreeMap<PlayerNum, String>,
    },
    MoveStarted {
        tick: Tick,
        piece_id: String,
        path: Vec<PathPoint>,
    },
    MoveCompleted {
        tick: Tick,
        piece_id: String,
        row: i32,
        col: i32,
    },
    Capture {
        tick: Tick,
        /// Empty for mutual destruction.
        capturing_piece_id: String,
        captured_piece_id: String,
        row: f64,
        col: f64,
    },
    CooldownStarted {
        tick: Tick,
        piece_id: String,
        duration: Tick,
    },
    CooldownEnded {
        tick: Tick,
        piece_id: String,
    },
    Promotion {
        tick: Tick,
        piece_id: String,
        new_kind: PieceKind,
    },
    GameOver {
        tick: Tick,
        winner: PlayerNum,
    },
    Draw {
        tick: Tick,
    },
}

/// Generate a short opaque game id from the confusable-free alphabet.
pub fn new_game_id() -> String {
    let mut rng = rand::rng();
    (0..GAME_ID_LENGTH)
        .map(|_| GAME_ID_ALPHABET[rng.random_range(0..GAME_ID_ALPHABET.len())] as char)
        .collect()
}

/// Create a game with the stock layout for the board variant.
pub fn create_game(
    speed: Speed,
    players: BTreeMap<PlayerNum, String>,
    board_kind: BoardKind,
    game_id: Option<String>,
) -> Result<GameState, GameSetupError> {
    let board = match board_kind {
        BoardKind::Standard => {
            if players.len() != 2 {
                return Err(GameSetupError::StandardPlayerCount(players.len()));
            }
            Board::standard()
        }
        BoardKind::FourPlayer => {
            if !(2..=4).contains(&players.len()) {
                return Err(GameSetupError::FourPlayerCount(players.len()));
            }
            Board::four_player()
        }
    };

    Ok(GameState::new(
        game_id.unwrap_or_else(new_game_id),
        board,
        speed,
        players,
    ))
}

/// Create a game from a custom board (campaign levels, tests). The layout
/// is recorded so replays can reconstruct it.
pub fn create_game_from_board(
    speed: Speed,
    players: BTreeMap<PlayerNum, String>,
    board: Board,
    game_id: Option<String>,
) -> GameState {
    let initial = render_board_string(&board);
    let mut state = GameState::new(
        game_id.unwrap_or_else(new_game_id),
        board,
        speed,
        players,
    );
    state.initial_board = Some(initial);
    state
}

/// Mark a player ready. The game starts when every seat is ready; bot
/// seats are always ready.
pub fn set_player_ready(state: &mut GameState, player: PlayerNum) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if state.status != GameStatus::Waiting || !state.players.contains_key(&player) {
        return events;
    }

    state.ready_players.insert(player);
    for (&seat, id) in &state.players {
        if id.starts_with("bot:") {
            state.ready_players.insert(seat);
        }
    }

    let all_ready = state
        .players
        .keys()
        .all(|p| state.ready_players.contains(p));

    if all_ready && state.players.len() >= 2 {
        state.status = GameStatus::Playing;
        state.started_at = Some(chrono::Utc::now());
        state.current_tick = 0;
        state.last_move_tick = 0;
        state.last_capture_tick = 0;
        events.push(GameEvent::GameStarted {
            tick: 0,
            players: state.players.clone(),
        });
    }

    events
}

/// Validate a proposed move and produce the `Move` that would execute it,
/// scheduled for the next tick. Castling is recognised first; the rook's
/// move rides along as `extra_move`.
pub fn validate_move(
    state: &GameState,
    player: PlayerNum,
    piece_id: &str,
    to_row: i32,
    to_col: i32,
) -> Result<Move, MoveError> {
    match state.status {
        GameStatus::Finished => return Err(MoveError::GameOver),
        GameStatus::Waiting => return Err(MoveError::GameNotStarted),
        GameStatus::Playing => {}
    }

    // Eliminated players (king captured) cannot move.
    if state.board.king(player).is_none() {
        debug!(player, "move rejected: player is eliminated");
        return Err(MoveError::InvalidMove);
    }

    let piece = state.board.piece(piece_id).ok_or(MoveError::PieceNotFound)?;
    if piece.player != player {
        return Err(MoveError::NotYourPiece);
    }
    if piece.captured {
        return Err(MoveError::PieceCaptured);
    }
    if is_piece_moving(piece_id, &state.active_moves) {
        debug!(piece = piece_id, "move rejected: already in flight");
        return Err(MoveError::InvalidMove);
    }
    if is_piece_on_cooldown(piece_id, &state.cooldowns, state.current_tick) {
        debug!(piece = piece_id, "move rejected: on cooldown");
        return Err(MoveError::InvalidMove);
    }

    if let Some(mut king_move) = check_castling(
        piece,
        &state.board,
        to_row,
        to_col,
        &state.active_moves,
        &state.cooldowns,
        state.current_tick,
    ) {
        // The one-tick delay absorbs transport latency and makes
        // identical-tick issuance from separate clients deterministic.
        king_move.start_tick = state.current_tick + 1;
        if let Some(rook_move) = king_move.extra_move.as_deref_mut() {
            rook_move.start_tick = state.current_tick + 1;
        }
        return Ok(king_move);
    }

    let path = compute_move_path(
        piece,
        &state.board,
        to_row,
        to_col,
        &state.active_moves,
        state.current_tick,
        state.config(),
    )
    .ok_or(MoveError::InvalidMove)?;

    Ok(Move::new(piece_id, path, state.current_tick + 1))
}

/// Attach a validated move to the active set and record it for replay.
pub fn apply_move(state: &mut GameState, mv: Move) -> Vec<GameEvent> {
    let mut events = Vec::new();

    state.last_move_tick = state.current_tick;
    record_replay_move(state, &mv);
    events.push(GameEvent::MoveStarted {
        tick: state.current_tick,
        piece_id: mv.piece_id.clone(),
        path: mv.path.to_vec(),
    });

    if let Some(extra) = mv.extra_move.as_deref() {
        record_replay_move(state, extra);
        events.push(GameEvent::MoveStarted {
            tick: state.current_tick,
            piece_id: extra.piece_id.clone(),
            path: extra.path.to_vec(),
        });
        state.active_moves.push(extra.clone());
    }

    state.active_moves.push(mv);
    events
}

fn record_replay_move(state: &mut GameState, mv: &Move) {
    let Some(piece) = state.board.piece(&mv.piece_id) else {
        return;
    };
    let (to_row, to_col) = mv.destination();
    state.replay_moves.push(ReplayMove {
        tick: state.current_tick,
        piece_id: mv.piece_id.clone(),
        to_row,
        to_col,
        player: piece.player,
    });
}

/// Advance the game by one tick: collisions, move completion, promotion,
/// cooldown expiry, then the termination check.
pub fn tick(state: &mut GameState) -> Vec<GameEvent> {
    if state.status != GameStatus::Playing {
        return Vec::new();
    }

    let mut events = Vec::new();
    state.current_tick += 1;
    let config = state.config();
    let now = state.current_tick;

    // 1. Collisions.
    let captures = detect_collisions(
        &state.board,
        &state.active_moves,
        now,
        config.ticks_per_square,
    );
    for capture in captures {
        let Some(piece) = state.board.piece_mut(&capture.captured_piece_id) else {
            continue;
        };
        piece.captured = true;
        state.last_capture_tick = now;

        // Drop the captured piece's move; if it was a king mid-castle,
        // its rook's parallel move dies with it.
        let mut doomed = vec![capture.captured_piece_id.clone()];
        if let Some(mv) = crate::moves::find_move(&capture.captured_piece_id, &state.active_moves)
        {
            if let Some(extra) = mv.extra_move.as_deref() {
                doomed.push(extra.piece_id.clone());
            }
        }
        state
            .active_moves
            .retain(|m| !doomed.contains(&m.piece_id));
        state
            .cooldowns
            .retain(|c| c.piece_id != capture.captured_piece_id);

        events.push(GameEvent::Capture {
            tick: now,
            capturing_piece_id: capture.capturing_piece_id,
            captured_piece_id: capture.captured_piece_id,
            row: capture.position.0,
            col: capture.position.1,
        });
    }

    // 2. Move completion (and 3. promotion).
    let completed: Vec<Move> = state
        .active_moves
        .iter()
        .filter(|m| now - m.start_tick >= m.total_ticks(config.ticks_per_square))
        .cloned()
        .collect();

    for mv in &completed {
        let cooldown_ticks = config.cooldown_ticks;
        let mut promoted = false;
        let (end_row, end_col) = mv.destination();

        if let Some(piece) = state.board.piece(&mv.piece_id) {
            if !piece.captured {
                promoted = should_promote_pawn(piece, &state.board, end_row, end_col);
            }
        }

        if let Some(piece) = state.board.piece_mut(&mv.piece_id) {
            if !piece.captured {
                piece.row = end_row as f64;
                piece.col = end_col as f64;
                piece.moved = true;
                if promoted {
                    piece.kind = PieceKind::Queen;
                }

                state.cooldowns.push(Cooldown::new(
                    mv.piece_id.clone(),
                    now,
                    cooldown_ticks,
                ));
                events.push(GameEvent::MoveCompleted {
                    tick: now,
                    piece_id: mv.piece_id.clone(),
                    row: end_row,
                    col: end_col,
                });
                events.push(GameEvent::CooldownStarted {
                    tick: now,
                    piece_id: mv.piece_id.clone(),
                    duration: cooldown_ticks,
                });
                if promoted {
                    events.push(GameEvent::Promotion {
                        tick: now,
                        piece_id: mv.piece_id.clone(),
                        new_kind: PieceKind::Queen,
                    });
                }
            }
        }

        state.active_moves.retain(|m| m.piece_id != mv.piece_id);
    }

    // 4. Expired cooldowns.
    for cd in &state.cooldowns {
        if !cd.is_active(now) {
            events.push(GameEvent::CooldownEnded {
                tick: now,
                piece_id: cd.piece_id.clone(),
            });
        }
    }
    state.cooldowns.retain(|c| c.is_active(now));

    // 5. Termination.
    if let Some((winner, reason)) = check_winner(state) {
        state.status = GameStatus::Finished;
        state.finished_at = Some(chrono::Utc::now());
        state.winner = Some(winner);
        state.win_reason = Some(reason);

        if winner == 0 {
            events.push(GameEvent::Draw { tick: now });
        } else {
            events.push(GameEvent::GameOver { tick: now, winner });
        }
    }

    events
}

/// Whether the game has ended: `(0, Draw)` for a draw, `(seat, reason)`
/// for a win, `None` while the game is ongoing.
pub fn check_winner(state: &GameState) -> Option<(PlayerNum, WinReason)> {
    let config = state.config();

    let players_with_king: Vec<PlayerNum> = state
        .players
        .keys()
        .copied()
        .filter(|&p| state.board.king(p).is_some())
        .collect();

    match players_with_king.len() {
        0 => return Some((0, WinReason::Draw)),
        1 => return Some((players_with_king[0], WinReason::KingCaptured)),
        _ => {}
    }

    if state.current_tick < config.min_draw_ticks {
        return None;
    }

    let ticks_since_move = state.current_tick - state.last_move_tick;
    let ticks_since_capture = state.current_tick - state.last_capture_tick;
    if ticks_since_move >= config.draw_no_move_ticks
        && ticks_since_capture >= config.draw_no_capture_ticks
    {
        return Some((0, WinReason::Draw));
    }

    None
}

/// All legal `(piece_id, to_row, to_col)` moves for a player.
///
/// Per-piece candidate generation keeps this cheap: only geometrically
/// reachable targets are produced, then each runs through full validation.
pub fn legal_moves(state: &GameState, player: PlayerNum) -> Vec<(String, i32, i32)> {
    let mut moves = Vec::new();

    if state.board.king(player).is_none() {
        return moves;
    }

    let piece_ids: Vec<String> = state
        .board
        .player_pieces(player)
        .filter(|p| !is_piece_moving(&p.id, &state.active_moves))
        .filter(|p| !is_piece_on_cooldown(&p.id, &state.cooldowns, state.current_tick))
        .map(|p| p.id.clone())
        .collect();

    for piece_id in piece_ids {
        let Some(piece) = state.board.piece(&piece_id) else {
            continue;
        };
        for (to_row, to_col) in piece_candidates(piece, &state.board, &state.active_moves) {
            if validate_move(state, player, &piece_id, to_row, to_col).is_ok() {
                moves.push((piece_id.clone(), to_row, to_col));
            }
        }
    }

    moves
}

/// Geometrically reachable destination squares for a piece, before full
/// validation. Shared with the AI for escape analysis.
pub fn piece_candidates(
    piece: &crate::board::Piece,
    board: &Board,
    active_moves: &[Move],
) -> Vec<(i32, i32)> {
    let (from_row, from_col) = piece.grid_position();

    match piece.kind {
        PieceKind::Pawn => pawn_candidates(piece, board, from_row, from_col),
        PieceKind::Knight => crate::move_gen::knight::KNIGHT_OFFSETS
            .iter()
            .map(|&(dr, dc)| (from_row + dr, from_col + dc))
            .filter(|&(r, c)| board.is_valid_square(r, c))
            .collect(),
        PieceKind::Bishop => slider_candidates(
            board,
            from_row,
            from_col,
            &crate::move_gen::sliding::BISHOP_DIRS,
            active_moves,
        ),
        PieceKind::Rook => slider_candidates(
            board,
            from_row,
            from_col,
            &crate::move_gen::sliding::ROOK_DIRS,
            active_moves,
        ),
        PieceKind::Queen => slider_candidates(
            board,
            from_row,
            from_col,
            &crate::move_gen::sliding::QUEEN_DIRS,
            active_moves,
        ),
        PieceKind::King => king_candidates(piece, board, from_row, from_col),
    }
}

fn pawn_candidates(
    piece: &crate::board::Piece,
    board: &Board,
    from_row: i32,
    from_col: i32,
) -> Vec<(i32, i32)> {
    let mut candidates = Vec::new();

    match board.kind {
        BoardKind::Standard => {
            let direction = if piece.player == 1 { -1 } else { 1 };
            let home_row = if piece.player == 1 { 6 } else { 1 };

            let r = from_row + direction;
            if board.is_valid_square(r, from_col) {
                candidates.push((r, from_col));
            }
            if from_row == home_row {
                let r2 = from_row + 2 * direction;
                if board.is_valid_square(r2, from_col) {
                    candidates.push((r2, from_col));
                }
            }
            for dc in [-1, 1] {
                let (dr, c) = (from_row + direction, from_col + dc);
                if !board.is_valid_square(dr, c) {
                    continue;
                }
                match board.piece_at(dr, c) {
                    Some(occupant) if occupant.player != piece.player => {
                        candidates.push((dr, c));
                    }
                    None => {
                        // Single-ply en-passant adjacency: an enemy pawn
                        // sitting beside us keeps the diagonal in the
                        // candidate set; full validation has the last word.
                        if let Some(adj) = board.piece_at(from_row, c) {
                            if adj.player != piece.player && adj.kind == PieceKind::Pawn {
                                candidates.push((dr, c));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        BoardKind::FourPlayer => {
            let Some(orient) = orientation(piece.player) else {
                return candidates;
            };
            let (fwd_r, fwd_c) = orient.forward;

            let (r1, c1) = (from_row + fwd_r, from_col + fwd_c);
            if board.is_valid_square(r1, c1) {
                candidates.push((r1, c1));
            }

            let at_home = match orient.axis {
                Axis::Col => from_col == orient.pawn_home_axis,
                Axis::Row => from_row == orient.pawn_home_axis,
            };
            if at_home {
                let (r2, c2) = (from_row + 2 * fwd_r, from_col + 2 * fwd_c);
                if board.is_valid_square(r2, c2) {
                    candidates.push((r2, c2));
                }
            }

            for lateral in [-1, 1] {
                let (r, c) = match orient.axis {
                    Axis::Col => (from_row + lateral, from_col + fwd_c),
                    Axis::Row => (from_row + fwd_r, from_col + lateral),
                };
                if !board.is_valid_square(r, c) {
                    continue;
                }
                if let Some(occupant) = board.piece_at(r, c) {
                    if occupant.player != piece.player {
                        candidates.push((r, c));
                    }
                }
            }
        }
    }

    candidates
}

/// Ray-cast up to and including the first stationary occupant; moving
/// pieces are treated as vacated.
fn slider_candidates(
    board: &Board,
    from_row: i32,
    from_col: i32,
    directions: &[(i32, i32)],
    active_moves: &[Move],
) -> Vec<(i32, i32)> {
    let mut candidates = Vec::new();
    for &(dr, dc) in directions {
        let (mut r, mut c) = (from_row + dr, from_col + dc);
        while board.is_valid_square(r, c) {
            candidates.push((r, c));
            if let Some(occupant) = board.piece_at(r, c) {
                if !is_piece_moving(&occupant.id, active_moves) {
                    break;
                }
            }
            r += dr;
            c += dc;
        }
    }
    candidates
}

fn king_candidates(
    piece: &crate::board::Piece,
    board: &Board,
    from_row: i32,
    from_col: i32,
) -> Vec<(i32, i32)> {
    let mut candidates = Vec::new();
    for dr in -1..=1 {
        for dc in -1..=1 {
            if dr == 0 && dc == 0 {
                continue;
            }
            let (r, c) = (from_row + dr, from_col + dc);
            if board.is_valid_square(r, c) {
                candidates.push((r, c));
            }
        }
    }

    if !piece.moved {
        let horizontal = match board.kind {
            BoardKind::Standard => true,
            BoardKind::FourPlayer => {
                matches!(orientation(piece.player), Some(o) if o.axis == Axis::Row)
            }
        };
        if horizontal {
            for dc in [-2, 2] {
                if board.is_valid_square(from_row, from_col + dc) {
                    candidates.push((from_row, from_col + dc));
                }
            }
        } else {
            for dr in [-2, 2] {
                if board.is_valid_square(from_row + dr, from_col) {
                    candidates.push((from_row + dr, from_col));
                }
            }
        }
    }

    candidates
}
