//! Tactical analysis of candidate moves.
//!
//! Everything here prices cooldown vulnerability: whether a capture
//! target can dodge before we land, how exposed we are once we arrive,
//! which enemies we threaten afterwards, and whether we can punish an
//! enemy attacker during its landing cooldown.

use kungfu_engine::constants::TICK_RATE_HZ;
use kungfu_engine::types::{PieceKind, Tick};

use crate::arrival::ArrivalData;
use crate::move_gen::{travel_ticks, CandidateMove};
use crate::piece_value;
use crate::state::{AiState, PieceStatus};

/// Raw material value of a capture; 0 for non-captures. Recapture risk
/// is priced separately by `move_safety`.
pub fn capture_value(candidate: &CandidateMove) -> f64 {
    candidate.capture_kind.map(piece_value).unwrap_or(0.0)
}

/// Probability (0-1) that the capture target escapes before we arrive.
///
/// The target needs its cooldown plus a reaction delay to start a dodge;
/// the dodge only helps if it leaves the attack ray, since running along
/// the ray still collides with the attacker mid-path.
pub fn dodge_probability(
    candidate: &CandidateMove,
    ai: &AiState,
    arrival: &ArrivalData,
) -> f64 {
    if candidate.capture_kind.is_none() {
        return 0.0;
    }

    let dest = (candidate.to_row, candidate.to_col);
    let Some(target) = ai.enemy_pieces().find(|p| p.grid == dest) else {
        return 0.0;
    };
    if target.status == PieceStatus::Traveling {
        return 0.0;
    }

    let mover = &ai.pieces[candidate.piece];
    let our_arrival = travel_ticks(mover.grid, dest, mover.kind, arrival.tps);

    let dodge_start = target.cooldown_remaining + arrival.reaction_ticks;
    if dodge_start >= our_arrival {
        return 0.0;
    }

    let Some(escapes) = ai.enemy_escape_moves.get(&target.id) else {
        return 0.0;
    };
    if escapes.is_empty() {
        return 0.0;
    }

    let attack_dir = (dest.0 - mover.grid.0, dest.1 - mover.grid.1);
    let dodge_count = escapes
        .iter()
        .filter(|&&(er, ec)| !is_along_attack_ray((er - dest.0, ec - dest.1), attack_dir))
        .count();
    if dodge_count == 0 {
        return 0.0;
    }

    // Normalise the dodge window by two segments of travel so the factor
    // scales with game speed.
    let dodge_window = (our_arrival - dodge_start) as f64;
    let time_factor = (dodge_window / (2 * arrival.tps) as f64).min(1.0);
    let escape_factor = (dodge_count as f64 / 2.0).min(1.0);

    time_factor * escape_factor
}

/// An escape is "along the ray" when it runs in the attack's direction:
/// the target stays on the line and gets hit anyway.
fn is_along_attack_ray(escape: (i32, i32), attack: (i32, i32)) -> bool {
    if escape == (0, 0) {
        return true;
    }
    if attack == (0, 0) {
        return false;
    }
    escape.0.signum() == attack.0.signum() && escape.1.signum() == attack.1.signum()
}

/// Expected material loss from being recaptured on the destination, as a
/// non-positive number. Uses the post-arrival margin: at a margin of one
/// second we are safe, at zero or below the full piece value is at risk,
/// linear in between. Captures exclude the victim from the enemy field.
pub fn move_safety(candidate: &CandidateMove, ai: &AiState, arrival: &ArrivalData) -> f64 {
    let mover = &ai.pieces[candidate.piece];
    let dest = (candidate.to_row, candidate.to_col);
    let our_value = piece_value(mover.kind);

    let exclude_id = if candidate.capture_kind.is_some() {
        ai.enemy_pieces()
            .find(|p| p.grid == dest)
            .map(|p| p.id.clone())
    } else {
        None
    };

    let travel = travel_ticks(mover.grid, dest, mover.kind, arrival.tps);
    let margin = arrival.post_arrival_safety(
        dest.0,
        dest.1,
        travel,
        exclude_id.as_deref(),
        Some(mover.grid),
    );

    if margin >= TICK_RATE_HZ {
        return 0.0;
    }

    let recapture_prob = (1.0 - margin as f64 / TICK_RATE_HZ as f64).clamp(0.0, 1.0);
    -recapture_prob * our_value
}

/// Value of the best enemy piece we could safely attack from the
/// destination once our landing cooldown expires. "Safely" means the
/// enemy cannot reach our destination before that follow-up lands. King
/// threats are capped at queen value so they cannot drown out the rest
/// of the evaluation.
pub fn threaten_score(candidate: &CandidateMove, ai: &AiState, arrival: &ArrivalData) -> f64 {
    let mover = &ai.pieces[candidate.piece];
    let dest = (candidate.to_row, candidate.to_col);
    let our_travel = travel_ticks(mover.grid, dest, mover.kind, arrival.tps);

    let mut best = 0.0f64;
    for enemy in ai.enemy_pieces() {
        if enemy.status == PieceStatus::Traveling || enemy.grid == dest {
            continue;
        }

        let attack_travel = travel_ticks(dest, enemy.grid, mover.kind, arrival.tps);
        let our_attack_time = our_travel + arrival.cd_ticks + attack_travel;

        let enemy_to_dest =
            arrival.enemy_piece_time_vacated(&enemy.id, dest.0, dest.1, mover.grid);
        if enemy_to_dest <= our_attack_time {
            continue;
        }

        let value = if enemy.kind == PieceKind::King {
            piece_value(PieceKind::Queen)
        } else {
            piece_value(enemy.kind)
        };
        best = best.max(value);
    }

    best
}

/// Bonus for parking where we can punish an incoming enemy attacker
/// during its landing cooldown. Returns the best such attacker's value.
pub fn recapture_bonus(candidate: &CandidateMove, ai: &AiState, arrival: &ArrivalData) -> f64 {
    let mover = &ai.pieces[candidate.piece];
    let dest = (candidate.to_row, candidate.to_col);
    let (board_w, board_h) = (ai.board_width, ai.board_height);

    let own_squares: Vec<(i32, i32)> = ai
        .own_pieces()
        .filter(|p| p.status != PieceStatus::Traveling)
        .map(|p| p.grid)
        .collect();

    let mut best = 0.0f64;
    for enemy in ai.enemy_pieces() {
        if enemy.status != PieceStatus::Traveling {
            continue;
        }
        let Some((dir_r, dir_c)) = enemy.travel_direction else {
            continue;
        };
        let (pr, pc) = enemy.current;

        // Walk the observed ray until it meets one of our pieces.
        let mut target: Option<((i32, i32), Tick)> = None;
        for dist in 1..board_w.max(board_h) {
            let sr = (pr + dir_r * dist as f64).round() as i32;
            let sc = (pc + dir_c * dist as f64).round() as i32;
            if sr < 0 || sr >= board_h || sc < 0 || sc >= board_w {
                break;
            }
            if own_squares.contains(&(sr, sc)) {
                target = Some(((sr, sc), dist as Tick));
                break;
            }
        }
        let Some((target_pos, travel_dist)) = target else {
            continue;
        };

        let enemy_lands = travel_dist * arrival.tps;
        let enemy_vulnerable_until = enemy_lands + arrival.cd_ticks;

        let our_travel_to_dest = travel_ticks(mover.grid, dest, mover.kind, arrival.tps);
        let punish_travel = travel_ticks(dest, target_pos, mover.kind, arrival.tps);
        let our_punish_arrival =
            our_travel_to_dest + arrival.cd_ticks + arrival.reaction_ticks + punish_travel;

        if our_punish_arrival < enemy_vulnerable_until {
            best = best.max(piece_value(enemy.kind));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use kungfu_engine::board::{Board, Piece};
    use kungfu_engine::engine::{
        apply_move, create_game_from_board, set_player_ready, tick, validate_move,
    };
    use kungfu_engine::types::{BoardKind, PlayerNum, Speed};
    use kungfu_engine::GameState;

    use crate::arrival::ArrivalField;
    use crate::move_gen::MoveCategory;
    use crate::state::StateExtractor;

    fn game_with(pieces: Vec<Piece>) -> GameState {
        let mut board = Board::empty(BoardKind::Standard);
        board.add_piece(Piece::new(PieceKind::King, 1, 7, 7));
        board.add_piece(Piece::new(PieceKind::King, 2, 0, 0));
        for piece in pieces {
            board.add_piece(piece);
        }
        let players: BTreeMap<PlayerNum, String> =
            BTreeMap::from([(1, "bot:one".to_string()), (2, "bot:two".to_string())]);
        let mut state = create_game_from_board(Speed::Standard, players, board, None);
        set_player_ready(&mut state, 1);
        state
    }

    fn capture_candidate(
        ai: &AiState,
        piece_id: &str,
        dest: (i32, i32),
        capture_kind: PieceKind,
    ) -> CandidateMove {
        CandidateMove {
            piece_id: piece_id.to_string(),
            to_row: dest.0,
            to_col: dest.1,
            category: MoveCategory::Capture,
            capture_kind: Some(capture_kind),
            piece: ai.index_of(piece_id).unwrap(),
        }
    }

    #[test]
    fn capture_value_uses_material_table() {
        let state = game_with(vec![
            Piece::new(PieceKind::Rook, 1, 4, 0),
            Piece::new(PieceKind::Queen, 2, 4, 5),
        ]);
        let ai = StateExtractor::extract(&state, 1);
        let capture = capture_candidate(&ai, "R:1:4:0", (4, 5), PieceKind::Queen);
        assert_eq!(capture_value(&capture), 9.0);

        let positional = CandidateMove {
            capture_kind: None,
            category: MoveCategory::Positional,
            ..capture
        };
        assert_eq!(capture_value(&positional), 0.0);
    }

    #[test]
    fn pinned_by_cooldown_target_cannot_dodge() {
        // Target pawn has a long cooldown; our rook is adjacent, so the
        // attack lands long before the pawn can move again.
        let mut state = game_with(vec![
            Piece::new(PieceKind::Rook, 1, 4, 3),
            Piece::new(PieceKind::Pawn, 2, 4, 5),
        ]);
        state
            .cooldowns
            .push(kungfu_engine::Cooldown::new("P:2:4:5", 0, 1_000));

        let ai = StateExtractor::extract(&state, 1);
        let arrival = ArrivalField::compute(&ai, state.config(), false);
        let candidate = capture_candidate(&ai, "R:1:4:3", (4, 5), PieceKind::Pawn);
        assert_eq!(dodge_probability(&candidate, &ai, &arrival), 0.0);
    }

    #[test]
    fn distant_capture_of_idle_target_is_dodgeable() {
        let state = game_with(vec![
            Piece::new(PieceKind::Rook, 1, 4, 0),
            Piece::new(PieceKind::Knight, 2, 4, 7),
        ]);
        let ai = StateExtractor::extract(&state, 1);
        let arrival = ArrivalField::compute(&ai, state.config(), false);
        let candidate = capture_candidate(&ai, "R:1:4:0", (4, 7), PieceKind::Knight);
        let p = dodge_probability(&candidate, &ai, &arrival);
        assert!(p > 0.0, "idle knight seven squares away has time to dodge");
        assert!(p <= 1.0);
    }

    #[test]
    fn escape_along_the_ray_does_not_count() {
        assert!(is_along_attack_ray((0, 1), (0, 1)));
        assert!(is_along_attack_ray((1, 1), (2, 2)));
        assert!(!is_along_attack_ray((-1, 0), (0, 1)));
        assert!(!is_along_attack_ray((0, -1), (0, 1)));
    }

    #[test]
    fn landing_next_to_enemy_mass_is_unsafe() {
        let state = game_with(vec![
            Piece::new(PieceKind::Queen, 1, 7, 3),
            Piece::new(PieceKind::Rook, 2, 0, 3),
            Piece::new(PieceKind::Rook, 2, 0, 5),
        ]);
        let ai = StateExtractor::extract(&state, 1);
        let arrival = ArrivalField::compute(&ai, state.config(), false);

        // Queen lunging deep into the crossfire at (0,4)-adjacent square.
        let reckless = CandidateMove {
            piece_id: "Q:1:7:3".to_string(),
            to_row: 1,
            to_col: 3,
            category: MoveCategory::Positional,
            capture_kind: None,
            piece: ai.index_of("Q:1:7:3").unwrap(),
        };
        let penalty = move_safety(&reckless, &ai, &arrival);
        assert!(
            penalty <= -8.9,
            "queen walking into a defended square must risk its full value, got {penalty}"
        );

        // Sidestepping off the open files costs nothing.
        let quiet = CandidateMove {
            to_row: 6,
            to_col: 2,
            ..reckless
        };
        assert_eq!(move_safety(&quiet, &ai, &arrival), 0.0);
    }

    #[test]
    fn threats_are_capped_at_queen_value_for_kings() {
        let state = game_with(vec![Piece::new(PieceKind::Queen, 1, 5, 5)]);
        let ai = StateExtractor::extract(&state, 1);
        let arrival = ArrivalField::compute(&ai, state.config(), false);

        // Queen repositions to (2,2), putting the enemy king at (0,0) on
        // its diagonal; the king cannot reach (2,2) first.
        let candidate = CandidateMove {
            piece_id: "Q:1:5:5".to_string(),
            to_row: 2,
            to_col: 2,
            category: MoveCategory::Positional,
            capture_kind: None,
            piece: ai.index_of("Q:1:5:5").unwrap(),
        };
        let score = threaten_score(&candidate, &ai, &arrival);
        assert_eq!(score, piece_value(PieceKind::Queen));
    }

    #[test]
    fn incoming_attacker_rewards_recapture_setups() {
        // Enemy rook is committed toward our pawn; a short queen step
        // that covers the landing square gets the recapture bonus.
        let mut state = game_with(vec![
            Piece::new(PieceKind::Pawn, 1, 4, 4),
            Piece::new(PieceKind::Queen, 1, 5, 6),
            Piece::new(PieceKind::Rook, 2, 0, 4),
        ]);
        let mv = validate_move(&state, 2, "R:2:0:4", 3, 4).unwrap();
        apply_move(&mut state, mv);
        tick(&mut state);

        let ai = StateExtractor::extract(&state, 1);
        let arrival = ArrivalField::compute(&ai, state.config(), false);

        let covering_step = CandidateMove {
            piece_id: "Q:1:5:6".to_string(),
            to_row: 5,
            to_col: 5,
            category: MoveCategory::Positional,
            capture_kind: None,
            piece: ai.index_of("Q:1:5:6").unwrap(),
        };
        let bonus = recapture_bonus(&covering_step, &ai, &arrival);
        assert_eq!(
            bonus,
            piece_value(PieceKind::Rook),
            "queen covering the rook's landing square should earn the bonus"
        );
    }
}
