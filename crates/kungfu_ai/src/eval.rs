//! Candidate scoring.
//!
//! Combines material (discounted by the target's dodge chance), the
//! post-arrival safety penalty, threat generation, recapture setups and
//! small positional terms into one score per candidate. Levels 1 and 2
//! add Gaussian noise scaled to the score range so play stays imperfect;
//! level 3 plays the numbers straight.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use kungfu_engine::types::PieceKind;

use crate::arrival::ArrivalData;
use crate::move_gen::CandidateMove;
use crate::piece_value;
use crate::state::AiState;
use crate::tactics;

const MATERIAL_WEIGHT: f64 = 10.0;
const SAFETY_WEIGHT: f64 = 1.0;
const THREAT_WEIGHT: f64 = 0.8;
const RECAPTURE_WEIGHT: f64 = 1.5;
const KING_DANGER_WEIGHT: f64 = 3.0;
const CENTER_CONTROL_WEIGHT: f64 = 1.0;
const DEVELOPMENT_WEIGHT: f64 = 0.8;
const PAWN_ADVANCE_WEIGHT: f64 = 0.5;

/// Noise sigma as a fraction of the observed score range.
const NOISE_SIGMA_FRACTION: f64 = 0.35;

/// Score all candidates and return them best-first.
pub fn score_candidates(
    candidates: Vec<CandidateMove>,
    ai: &AiState,
    arrival: &ArrivalData,
    noise: bool,
    rng: &mut impl Rng,
) -> Vec<(CandidateMove, f64)> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(CandidateMove, f64)> = candidates
        .into_iter()
        .map(|candidate| {
            let score = score_move(&candidate, ai, arrival);
            (candidate, score)
        })
        .collect();

    if noise {
        let (min, max) = scored
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, s)| {
                (lo.min(*s), hi.max(*s))
            });
        let range = if scored.len() > 1 { max - min } else { 1.0 };
        let sigma = (range * NOISE_SIGMA_FRACTION).max(0.1);
        if let Ok(normal) = Normal::new(0.0, sigma) {
            for (_, score) in &mut scored {
                *score += normal.sample(rng);
            }
        }
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}

fn score_move(candidate: &CandidateMove, ai: &AiState, arrival: &ArrivalData) -> f64 {
    let mut score = 0.0;
    let dest = (candidate.to_row, candidate.to_col);
    let piece = &ai.pieces[candidate.piece];

    // Material, discounted by how likely the target slips away.
    if candidate.capture_kind.is_some() {
        let dodge = tactics::dodge_probability(candidate, ai, arrival);
        score += tactics::capture_value(candidate) * (1.0 - dodge) * MATERIAL_WEIGHT;
    }

    // Cooldown exposure on the landing square.
    score += tactics::move_safety(candidate, ai, arrival) * SAFETY_WEIGHT;

    // What we menace once we are settled.
    score += tactics::threaten_score(candidate, ai, arrival) * THREAT_WEIGHT;
    score += tactics::recapture_bonus(candidate, ai, arrival) * RECAPTURE_WEIGHT;

    // Pressure on the enemy king.
    if let Some(enemy_king) = ai.enemy_king() {
        let dist = chebyshev(dest, enemy_king.grid);
        if dist <= 1.0 {
            score += 5.0 * KING_DANGER_WEIGHT;
        } else if dist <= 3.0 {
            score += (4.0 - dist) * KING_DANGER_WEIGHT;
        }
    }

    let center = (
        ai.board_height as f64 / 2.0,
        ai.board_width as f64 / 2.0,
    );
    let max_dist = euclidean((0.0, 0.0), center);

    if let Some(own_king) = ai.own_king() {
        // Penalty for walking defenders away from our king.
        let current_dist = chebyshev(piece.grid, own_king.grid);
        let new_dist = chebyshev(dest, own_king.grid);
        if current_dist <= 2.0 && new_dist > current_dist {
            score -= 1.0;
        }
        // And keep the king itself out of the open centre.
        if piece.kind == PieceKind::King {
            let to_center = euclidean((dest.0 as f64, dest.1 as f64), center);
            if to_center < 2.0 {
                score -= 2.0;
            }
        }
    }

    if matches!(piece.kind, PieceKind::Knight | PieceKind::Bishop) && !piece.moved {
        score += DEVELOPMENT_WEIGHT;
    }

    if piece.kind == PieceKind::Pawn {
        score += pawn_advancement(candidate, ai) * PAWN_ADVANCE_WEIGHT * 0.1;
    }

    let to_center = euclidean((dest.0 as f64, dest.1 as f64), center);
    score += (1.0 - to_center / max_dist) * CENTER_CONTROL_WEIGHT;

    score
}

/// How far along its promotion run the pawn would be after this move.
fn pawn_advancement(candidate: &CandidateMove, ai: &AiState) -> f64 {
    let edge = (ai.board_height - 1) as f64;
    if ai.board_width > 8 {
        // On the big board, progress is measured toward the promotion
        // axis along the seat's travel direction.
        use kungfu_engine::move_gen::orientation::{orientation, Axis};
        let Some(orient) = orientation(ai.ai_player) else {
            return 0.0;
        };
        let coord = match orient.axis {
            Axis::Row => candidate.to_row,
            Axis::Col => candidate.to_col,
        };
        return edge - (coord - orient.promotion_axis).abs() as f64;
    }

    if ai.ai_player == 1 {
        edge - candidate.to_row as f64
    } else {
        candidate.to_row as f64
    }
}

fn chebyshev(a: (i32, i32), b: (i32, i32)) -> f64 {
    ((a.0 - b.0).abs().max((a.1 - b.1).abs())) as f64
}

fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
