//! Core game state and logic
//!
//! A [`Game`] is one round: a board, the falling piece and the score. Every
//! action is applied to the piece speculatively and rolled back if it
//! collides, so the board only changes when a piece settles.

use crate::board::Board;
use crate::piece::{Collision, Piece};
use crate::score::Score;
use crate::settings::Settings;
use crate::spawn::Spawner;
use crate::tetromino::{RotationDirection, GAME_OVER_COLOR};

/// Info about the last line clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearInfo {
    /// Cleared row indices, top to bottom, as they were before collapsing
    pub rows: Vec<usize>,
    pub points: u64,
}

/// Game state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    GameOver,
}

/// Input actions the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    /// Also used for the automatic gravity tick
    SoftDrop,
    RotateCW,
    RotateCCW,
}

/// Result of advancing the game by one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    GameOver { score: u64 },
}

/// The main game struct
pub struct Game {
    /// The game board
    pub board: Board,
    /// Current falling piece (painted red once the round is over)
    pub current_piece: Piece,
    /// Piece source
    spawner: Spawner,
    /// Score tracking
    pub score: Score,
    /// Current game state
    pub state: GameState,
    /// Column new pieces are anchored on
    spawn_column: i32,
    /// Flag set when a piece is locked during the last action
    pub piece_just_locked: bool,
    /// Last line clear, kept until the next one
    pub last_clear: Option<ClearInfo>,
}

impl Game {
    /// Create a new game, seeded from the settings or at random
    pub fn new(settings: &Settings) -> Self {
        let seed = settings.gameplay.seed.unwrap_or_else(rand::random);
        Self::with_seed(settings, seed)
    }

    /// Create a new game with a fixed seed
    pub fn with_seed(settings: &Settings, seed: u64) -> Self {
        let gameplay = &settings.gameplay;
        let board = Board::new(gameplay.grid_width, gameplay.grid_height);
        let spawner = Spawner::with_seed(&settings.gap_fill, seed);
        let score = Score::new(gameplay.tick_interval_ms, gameplay.speedup_factor);
        tracing::info!(
            seed,
            width = gameplay.grid_width,
            height = gameplay.grid_height,
            "starting round"
        );
        Self::from_parts(board, spawner, score, gameplay.spawn_column)
    }

    /// Assemble a game around an existing board and spawn its first piece
    pub fn from_parts(board: Board, mut spawner: Spawner, score: Score, spawn_column: i32) -> Self {
        let current_piece = spawner.next(&board, spawn_column);
        let mut game = Self {
            board,
            current_piece,
            spawner,
            score,
            state: GameState::Playing,
            spawn_column,
            piece_just_locked: false,
            last_clear: None,
        };
        if !game.current_piece.collide(&game.board).is_none() {
            game.end_round();
        }
        game
    }

    pub fn is_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    /// Process an action
    pub fn advance(&mut self, action: Action) -> Outcome {
        if self.state == GameState::Playing {
            self.piece_just_locked = false;
            match action {
                Action::MoveLeft => {
                    self.try_translate(-1, 0);
                }
                Action::MoveRight => {
                    self.try_translate(1, 0);
                }
                Action::SoftDrop => self.soft_drop(),
                Action::RotateCW => self.rotate(RotationDirection::Clockwise),
                Action::RotateCCW => self.rotate(RotationDirection::CounterClockwise),
            }
        }
        self.outcome()
    }

    pub fn outcome(&self) -> Outcome {
        match self.state {
            GameState::Playing => Outcome::Continue,
            GameState::GameOver => Outcome::GameOver {
                score: self.score.points,
            },
        }
    }

    /// Move the piece, undoing the move if it collides
    fn try_translate(&mut self, dx: i32, dy: i32) -> Collision {
        self.current_piece.translate(dx, dy);
        let collision = self.current_piece.collide(&self.board);
        if !collision.is_none() {
            self.current_piece.translate(-dx, -dy);
        }
        collision
    }

    fn soft_drop(&mut self) {
        if self.try_translate(0, 1) == Collision::Settled {
            self.lock_piece();
        }
    }

    fn rotate(&mut self, direction: RotationDirection) {
        // Counter-rotation does not exactly undo rotation for even-sized
        // shapes, so restore the saved squares instead
        let original = self.current_piece.clone();
        self.current_piece.rotate(direction);
        if !self.current_piece.collide(&self.board).is_none() {
            self.current_piece = original;
        }
    }

    /// Lock the current piece, clear lines and spawn next
    fn lock_piece(&mut self) {
        let piece = &self.current_piece;
        let lock_out = piece.is_above_board();
        let positions: Vec<(i32, i32)> = piece
            .visible_positions()
            .into_iter()
            .filter(|&(_, y)| y >= 0)
            .collect();
        self.board.lock_cells(&positions, piece.color);
        self.score.add_piece();
        self.piece_just_locked = true;
        tracing::debug!(?positions, color = piece.color, "piece locked");

        let rows = self.board.full_rows();
        if !rows.is_empty() {
            self.board.collapse(&rows);
            let points = self.score.add_clear(rows.len());
            tracing::debug!(
                ?rows,
                points,
                score = self.score.points,
                interval_ms = self.score.tick_interval_ms(),
                "rows cleared"
            );
            self.last_clear = Some(ClearInfo { rows, points });
        }

        if lock_out {
            self.end_round();
            return;
        }

        self.current_piece = self.spawner.next(&self.board, self.spawn_column);
        if !self.current_piece.collide(&self.board).is_none() {
            self.end_round();
        }
    }

    fn end_round(&mut self) {
        self.current_piece.color = GAME_OVER_COLOR;
        self.state = GameState::GameOver;
        tracing::info!(
            score = self.score.points,
            lines = self.score.lines,
            pieces = self.score.pieces,
            "game over"
        );
    }
}
