//! Game service: lifecycle, move intake, tick driving.
//!
//! Games live in memory while they run; the caller persists the `Replay`
//! when a game finishes. Player identity is two-layered: opaque player
//! ids (`u:…`, `guest:…`, `bot:…`) name seats for replays, while secret
//! per-seat keys authorise requests.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use super::registry::GameRegistry;
use super::AiPlayer;
use crate::board::Board;
use crate::collision::piece_position;
use crate::engine::{self, GameEvent};
use crate::error::{GameSetupError, MoveError};
use crate::moves::{cooldown_remaining, is_piece_moving, is_piece_on_cooldown, PathPoint};
use crate::replay::Replay;
use crate::state::GameState;
use crate::types::{BoardKind, GameStatus, PieceKind, PlayerNum, Speed, WinReason};

/// A successfully scheduled move, as reported back to the proposing
/// client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedMove {
    pub piece_id: String,
    pub path: Vec<PathPoint>,
    pub start_tick: i64,
}

/// Interpolated view of one piece, safe to hand to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieceView {
    pub id: String,
    pub kind: PieceKind,
    pub player: PlayerNum,
    pub row: f64,
    pub col: f64,
    pub captured: bool,
    pub moving: bool,
    pub on_cooldown: bool,
    pub cooldown_remaining: i64,
}

/// A game under management: its state plus everything the service needs
/// that the engine does not track.
pub struct ManagedGame {
    pub state: GameState,
    player_keys: HashMap<PlayerNum, String>,
    ai_players: BTreeMap<PlayerNum, Box<dyn AiPlayer>>,
    pub created_at: chrono::DateTime<Utc>,
    pub last_activity: chrono::DateTime<Utc>,
    draw_offers: BTreeSet<PlayerNum>,
}

impl ManagedGame {
    fn new(state: GameState, player_keys: HashMap<PlayerNum, String>) -> Self {
        let now = Utc::now();
        ManagedGame {
            state,
            player_keys,
            ai_players: BTreeMap::new(),
            created_at: now,
            last_activity: now,
            draw_offers: BTreeSet::new(),
        }
    }

    fn player_for_key(&self, player_key: &str) -> Option<PlayerNum> {
        self.player_keys
            .iter()
            .find(|(_, key)| key.as_str() == player_key)
            .map(|(&player, _)| player)
    }
}

fn generate_player_key(player: PlayerNum) -> String {
    let mut rng = rand::rng();
    let token: String = (0..22)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect();
    format!("p{player}_{token}")
}

/// Manages active games and their lifecycles.
#[derive(Default)]
pub struct GameService {
    registry: GameRegistry,
}

impl GameService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    /// Create a game with the stock layout. Every seat whose player id is
    /// not a bot gets a fresh secret key; the returned map holds them.
    pub fn create_game(
        &self,
        speed: Speed,
        board_kind: BoardKind,
        players: BTreeMap<PlayerNum, String>,
    ) -> Result<(String, HashMap<PlayerNum, String>), GameSetupError> {
        let game_id = self.unique_game_id();
        let state = engine::create_game(speed, players, board_kind, Some(game_id.clone()))?;
        Ok((game_id.clone(), self.install(game_id, state)))
    }

    /// Create a game from a custom board (campaign levels, tests).
    pub fn create_game_from_board(
        &self,
        speed: Speed,
        players: BTreeMap<PlayerNum, String>,
        board: Board,
    ) -> (String, HashMap<PlayerNum, String>) {
        let game_id = self.unique_game_id();
        let state = engine::create_game_from_board(speed, players, board, Some(game_id.clone()));
        let keys = self.install(game_id.clone(), state);
        (game_id, keys)
    }

    fn unique_game_id(&self) -> String {
        let mut game_id = engine::new_game_id();
        while self.registry.contains(&game_id) {
            game_id = engine::new_game_id();
        }
        game_id
    }

    fn install(&self, game_id: String, mut state: GameState) -> HashMap<PlayerNum, String> {
        let keys: HashMap<PlayerNum, String> = state
            .players
            .iter()
            .filter(|(_, id)| !id.starts_with("bot:"))
            .map(|(&player, _)| (player, generate_player_key(player)))
            .collect();

        // All-bot games have nobody to call mark_ready; start them now.
        if keys.is_empty() {
            if let Some(&seat) = state.players.keys().next() {
                engine::set_player_ready(&mut state, seat);
            }
        }

        info!(game_id = %game_id, players = state.players.len(), "game created");
        self.registry
            .insert(game_id, ManagedGame::new(state, keys.clone()));
        keys
    }

    /// Hook an AI into a seat. The seat should carry a `bot:` player id so
    /// readiness and draw handling treat it as a machine.
    pub fn attach_ai(&self, game_id: &str, player: PlayerNum, ai: Box<dyn AiPlayer>) -> bool {
        let Some(game) = self.registry.get(game_id) else {
            return false;
        };
        game.lock().ai_players.insert(player, ai);
        true
    }

    /// Mark a player ready. Returns `(ok, game_started)`.
    pub fn mark_ready(&self, game_id: &str, player_key: &str) -> (bool, bool) {
        let Some(game) = self.registry.get(game_id) else {
            return (false, false);
        };
        let mut game = game.lock();
        let Some(player) = game.player_for_key(player_key) else {
            return (false, false);
        };
        game.last_activity = Utc::now();

        if game.state.status != GameStatus::Waiting {
            return (false, false);
        }

        let events = engine::set_player_ready(&mut game.state, player);
        let started = events
            .iter()
            .any(|e| matches!(e, GameEvent::GameStarted { .. }));
        (true, started)
    }

    /// Validate and schedule a move for the next tick.
    pub fn propose_move(
        &self,
        game_id: &str,
        player_key: &str,
        piece_id: &str,
        to_row: i32,
        to_col: i32,
    ) -> Result<AcceptedMove, MoveError> {
        let game = self.registry.get(game_id).ok_or(MoveError::GameNotFound)?;
        let mut game = game.lock();
        let player = game
            .player_for_key(player_key)
            .ok_or(MoveError::InvalidKey)?;
        game.last_activity = Utc::now();

        let mv = engine::validate_move(&game.state, player, piece_id, to_row, to_col)?;
        let accepted = AcceptedMove {
            piece_id: mv.piece_id.clone(),
            path: mv.path.to_vec(),
            start_tick: mv.start_tick,
        };
        engine::apply_move(&mut game.state, mv);
        Ok(accepted)
    }

    /// Advance a game by one tick. AI seats act first, through the same
    /// validation gate as clients; then the simulator steps. Returns the
    /// tick's events and whether the game just finished, or `None` for an
    /// unknown game id.
    pub fn tick(&self, game_id: &str) -> Option<(Vec<GameEvent>, bool)> {
        let game = self.registry.get(game_id)?;
        let mut guard = game.lock();
        let game = &mut *guard;

        if game.state.status != GameStatus::Playing {
            return Some((Vec::new(), false));
        }

        for (&seat, ai) in game.ai_players.iter_mut() {
            if !ai.should_move(&game.state, seat) {
                continue;
            }
            if let Some((piece_id, to_row, to_col)) = ai.get_move(&game.state, seat) {
                match engine::validate_move(&game.state, seat, &piece_id, to_row, to_col) {
                    Ok(mv) => {
                        engine::apply_move(&mut game.state, mv);
                    }
                    Err(err) => {
                        debug!(seat, piece = %piece_id, %err, "AI move rejected");
                    }
                }
            }
        }

        let events = engine::tick(&mut game.state);
        let finished = events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { .. } | GameEvent::Draw { .. }));
        Some((events, finished))
    }

    /// Value-copied snapshot of a game's state.
    pub fn game_state(&self, game_id: &str) -> Option<GameState> {
        let game = self.registry.get(game_id)?;
        let mut game = game.lock();
        game.last_activity = Utc::now();
        Some(game.state.clone())
    }

    /// Interpolated view of one piece.
    pub fn piece_state(&self, game_id: &str, piece_id: &str) -> Option<PieceView> {
        let game = self.registry.get(game_id)?;
        let game = game.lock();
        let state = &game.state;
        let piece = state.board.piece(piece_id)?;

        let (row, col) = piece_position(
            piece,
            &state.active_moves,
            state.current_tick,
            state.config().ticks_per_square,
        );
        let on_cooldown = is_piece_on_cooldown(piece_id, &state.cooldowns, state.current_tick);

        Some(PieceView {
            id: piece.id.clone(),
            kind: piece.kind,
            player: piece.player,
            row,
            col,
            captured: piece.captured,
            moving: is_piece_moving(piece_id, &state.active_moves),
            on_cooldown,
            cooldown_remaining: cooldown_remaining(piece_id, &state.cooldowns, state.current_tick),
        })
    }

    /// All legal moves for the keyed player.
    pub fn legal_moves(
        &self,
        game_id: &str,
        player_key: &str,
    ) -> Result<Vec<(String, i32, i32)>, MoveError> {
        let game = self.registry.get(game_id).ok_or(MoveError::GameNotFound)?;
        let game = game.lock();
        let player = game
            .player_for_key(player_key)
            .ok_or(MoveError::InvalidKey)?;

        if game.state.status != GameStatus::Playing {
            return Ok(Vec::new());
        }
        Ok(engine::legal_moves(&game.state, player))
    }

    /// Resign: the player's king is captured on the spot. Ends the game
    /// immediately in two-player games; in four-player games the player
    /// is eliminated and play continues.
    pub fn resign(&self, game_id: &str, player: PlayerNum) -> bool {
        let Some(game) = self.registry.get(game_id) else {
            return false;
        };
        let mut game = game.lock();
        if game.state.status != GameStatus::Playing {
            return false;
        }

        let Some(king_id) = game.state.board.king(player).map(|k| k.id.clone()) else {
            return false;
        };
        if let Some(king) = game.state.board.piece_mut(&king_id) {
            king.captured = true;
        }
        info!(game_id, player, "player resigned");

        if let Some((winner, _)) = engine::check_winner(&game.state) {
            game.state.winner = Some(winner);
            game.state.status = GameStatus::Finished;
            game.state.finished_at = Some(Utc::now());
            game.state.win_reason = Some(WinReason::Resignation);
        }
        true
    }

    /// Offer (or agree to) a draw. The game draws once every active human
    /// player has offered. Returns `(accepted, rejection_reason)`.
    pub fn offer_draw(&self, game_id: &str, player: PlayerNum) -> (bool, Option<&'static str>) {
        let Some(game) = self.registry.get(game_id) else {
            return (false, Some("game not found"));
        };
        let mut guard = game.lock();
        let game = &mut *guard;

        if game.state.status != GameStatus::Playing {
            return (false, Some("game is not in progress"));
        }
        if game.ai_players.contains_key(&player) {
            return (false, Some("AI players cannot offer draw"));
        }
        if game.state.board.king(player).is_none() {
            return (false, Some("eliminated players cannot offer draw"));
        }
        if game.draw_offers.contains(&player) {
            return (false, Some("already offered draw"));
        }

        let active_humans: BTreeSet<PlayerNum> = game
            .state
            .players
            .keys()
            .copied()
            .filter(|p| !game.ai_players.contains_key(p))
            .filter(|&p| game.state.board.king(p).is_some())
            .collect();

        if active_humans.len() < 2 {
            return (false, Some("no other human players to agree"));
        }

        game.draw_offers.insert(player);

        if game.draw_offers.is_superset(&active_humans) {
            game.state.winner = Some(0);
            game.state.status = GameStatus::Finished;
            game.state.finished_at = Some(Utc::now());
            game.state.win_reason = Some(WinReason::Draw);
        }
        (true, None)
    }

    /// Replay record for a finished game, for the storage collaborator.
    pub fn replay(&self, game_id: &str) -> Option<Replay> {
        let game = self.registry.get(game_id)?;
        let game = game.lock();
        Replay::from_game_state(&game.state)
    }
}
