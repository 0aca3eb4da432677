//! AI controllers.
//!
//! `KungFuAi` runs the full pipeline at one of three strength levels;
//! `DummyAi` plays random legal moves on a fixed cadence and exists for
//! harnesses and the easiest opponents. Both act through the engine's
//! `AiPlayer` gate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use kungfu_engine::api::AiPlayer;
use kungfu_engine::constants::TICK_RATE_HZ;
use kungfu_engine::engine::legal_moves;
use kungfu_engine::types::{PlayerNum, Speed, Tick};
use kungfu_engine::GameState;

use crate::arrival::ArrivalField;
use crate::eval::score_candidates;
use crate::move_gen::generate_candidates;
use crate::state::{AiState, StateExtractor};

/// Think-delay ranges in seconds, by (level, speed). A fresh delay is
/// rolled after every move so the tempo never turns robotic.
fn think_delay_seconds(level: u8, speed: Speed) -> (f64, f64) {
    match (level, speed) {
        (1, Speed::Standard) => (0.5, 5.0),
        (1, Speed::Lightning) => (0.3, 2.5),
        (2, Speed::Standard) => (0.3, 2.0),
        (2, Speed::Lightning) => (0.15, 1.0),
        (3, Speed::Standard) => (0.1, 1.0),
        (3, Speed::Lightning) => (0.05, 0.5),
        (_, Speed::Standard) => (0.5, 5.0),
        (_, Speed::Lightning) => (0.3, 2.5),
    }
}

fn max_pieces(level: u8) -> usize {
    match level {
        1 => 2,
        2 => 4,
        _ => 16,
    }
}

fn max_candidates_per_piece(level: u8) -> usize {
    match level {
        1 => 4,
        2 => 8,
        _ => 12,
    }
}

/// The pipeline AI. Levels trade depth for speed: level 1 considers two
/// pieces with noisy scoring, level 3 sixteen pieces with the noise off.
pub struct KungFuAi {
    level: u8,
    speed: Speed,
    last_move_tick: Tick,
    think_delay_ticks: Tick,
    cached: Option<(Tick, AiState)>,
    rng: StdRng,
}

impl KungFuAi {
    pub fn new(level: u8, speed: Speed) -> Self {
        let mut ai = KungFuAi {
            level: level.clamp(1, 3),
            speed,
            last_move_tick: -9_999,
            think_delay_ticks: 0,
            cached: None,
            rng: StdRng::from_os_rng(),
        };
        ai.roll_think_delay();
        ai
    }

    fn roll_think_delay(&mut self) {
        let (min_s, max_s) = think_delay_seconds(self.level, self.speed);
        let delay_seconds = self.rng.random_range(min_s..=max_s);
        self.think_delay_ticks = (delay_seconds * TICK_RATE_HZ as f64) as Tick;
    }
}

impl AiPlayer for KungFuAi {
    fn should_move(&mut self, state: &GameState, player: PlayerNum) -> bool {
        if state.current_tick - self.last_move_tick < self.think_delay_ticks {
            return false;
        }

        // Extract once and keep it for get_move on the same tick.
        let ai_state = StateExtractor::extract(state, player);
        let movable = ai_state.movable_count() > 0;
        self.cached = Some((state.current_tick, ai_state));
        movable
    }

    fn get_move(&mut self, state: &GameState, player: PlayerNum) -> Option<(String, i32, i32)> {
        let ai_state = match self.cached.take() {
            Some((tick, cached)) if tick == state.current_tick => cached,
            _ => StateExtractor::extract(state, player),
        };

        let candidates = generate_candidates(
            state,
            &ai_state,
            player,
            max_pieces(self.level),
            max_candidates_per_piece(self.level),
            &mut self.rng,
        );
        if candidates.is_empty() {
            return None;
        }

        // The full 12x12 field blows the per-tick budget; restrict the
        // big board to its critical squares.
        let critical_only = ai_state.board_width > 8;
        let arrival = ArrivalField::compute(&ai_state, state.config(), critical_only);

        let noise = self.level <= 2;
        let scored =
            score_candidates(candidates, &ai_state, &arrival, noise, &mut self.rng);
        let (best, score) = scored.into_iter().next()?;

        trace!(
            player,
            piece = %best.piece_id,
            to_row = best.to_row,
            to_col = best.to_col,
            score,
            "AI chose move"
        );

        self.last_move_tick = state.current_tick;
        self.roll_think_delay();

        Some((best.piece_id, best.to_row, best.to_col))
    }
}

/// Random-move opponent with a fixed one-second cadence.
pub struct DummyAi {
    speed: Speed,
    last_move_tick: Tick,
    rng: StdRng,
}

impl DummyAi {
    pub fn new(speed: Speed) -> Self {
        DummyAi {
            speed,
            last_move_tick: -9_999,
            rng: StdRng::from_os_rng(),
        }
    }

    fn cadence_ticks(&self) -> Tick {
        match self.speed {
            Speed::Standard => TICK_RATE_HZ,
            Speed::Lightning => TICK_RATE_HZ / 2,
        }
    }
}

impl AiPlayer for DummyAi {
    fn should_move(&mut self, state: &GameState, _player: PlayerNum) -> bool {
        state.current_tick - self.last_move_tick >= self.cadence_ticks()
    }

    fn get_move(&mut self, state: &GameState, player: PlayerNum) -> Option<(String, i32, i32)> {
        let moves = legal_moves(state, player);
        if moves.is_empty() {
            return None;
        }
        let pick = self.rng.random_range(0..moves.len());
        self.last_move_tick = state.current_tick;
        let (piece_id, to_row, to_col) = moves.into_iter().nth(pick)?;
        Some((piece_id, to_row, to_col))
    }
}

/// Factory mapping bot names to controllers, mirroring the ids the wider
/// system uses (`bot:novice`, `bot:intermediate`, `bot:advanced`,
/// `bot:dummy`).
pub fn ai_for(bot_name: &str, speed: Speed) -> Box<dyn AiPlayer> {
    let name = bot_name.strip_prefix("bot:").unwrap_or(bot_name);
    match name {
        "dummy" => Box::new(DummyAi::new(speed)),
        "novice" => Box::new(KungFuAi::new(1, speed)),
        "intermediate" => Box::new(KungFuAi::new(2, speed)),
        "advanced" | "campaign" => Box::new(KungFuAi::new(3, speed)),
        _ => Box::new(KungFuAi::new(1, speed)),
    }
}
