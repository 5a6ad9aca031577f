//! Active falling piece logic

use crate::board::Board;
use crate::tetromino::{ColorIndex, RotationDirection, ShapeKind, Square};

/// Result of testing a piece's position against the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    None,
    /// A visible square is left or right of the board
    Wall,
    /// A visible square is on the floor or on a settled square
    Settled,
}

impl Collision {
    pub fn is_none(&self) -> bool {
        matches!(self, Collision::None)
    }
}

/// An active falling piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    squares: Vec<Square>,
    pub color: ColorIndex,
}

impl Piece {
    /// Create a canonical shape anchored on `spawn_col`
    pub fn new(kind: ShapeKind, spawn_col: i32) -> Self {
        Self {
            squares: kind.squares(spawn_col),
            color: kind.color(),
        }
    }

    /// Create a piece from arbitrary squares. At least one must be visible.
    pub fn from_squares(squares: Vec<Square>, color: ColorIndex) -> Self {
        assert!(
            squares.iter().any(|s| s.visible),
            "a piece needs at least one visible square"
        );
        Self { squares, color }
    }

    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// Positions (x, y) of the visible squares
    pub fn visible_positions(&self) -> Vec<(i32, i32)> {
        self.squares
            .iter()
            .filter(|s| s.visible)
            .map(|s| (s.x, s.y))
            .collect()
    }

    /// Shift every square, ghosts included. Never fails.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        for square in &mut self.squares {
            square.x += dx;
            square.y += dy;
        }
    }

    /// Rotate by 90 degrees around the bounding-box center of all squares.
    ///
    /// The squares are recentred on the floored center, transposed, moved
    /// back, then reflected around the exact center. `min + max` is the
    /// doubled center, so the reflection stays in integers; the floor must
    /// be `div_euclid` to match rounding toward negative infinity.
    pub fn rotate(&mut self, direction: RotationDirection) {
        let Some((min_x, max_x, min_y, max_y)) = self.bounds() else {
            return;
        };
        let twice_cx = min_x + max_x;
        let twice_cy = min_y + max_y;
        let floor_cx = twice_cx.div_euclid(2);
        let floor_cy = twice_cy.div_euclid(2);

        for square in &mut self.squares {
            // Transpose around the floored center
            let x = square.y - floor_cy + floor_cx;
            let y = square.x - floor_cx + floor_cy;

            let (x, y) = match direction {
                RotationDirection::Clockwise => (twice_cx - x, y),
                RotationDirection::CounterClockwise => (x, twice_cy - y),
            };
            square.x = x;
            square.y = y;
        }
    }

    /// Test the visible squares against the board walls, floor and settled cells.
    ///
    /// Rows above the board are free; any row at or below the floor counts as
    /// settled. The first offending square decides the result.
    pub fn collide(&self, board: &Board) -> Collision {
        let width = board.width() as i32;
        let height = board.height() as i32;

        for square in self.squares.iter().filter(|s| s.visible) {
            if square.x < 0 || square.x >= width {
                return Collision::Wall;
            }
            if square.y >= height {
                return Collision::Settled;
            }
            if square.y >= 0 && board.is_occupied(square.x as usize, square.y as usize) {
                return Collision::Settled;
            }
        }
        Collision::None
    }

    /// Whether any visible square is still above the board
    pub fn is_above_board(&self) -> bool {
        self.squares.iter().any(|s| s.visible && s.y < 0)
    }

    /// (min_x, max_x, min_y, max_y) over every square
    fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        let first = self.squares.first()?;
        let init = (first.x, first.x, first.y, first.y);
        Some(self.squares.iter().fold(init, |(min_x, max_x, min_y, max_y), s| {
            (min_x.min(s.x), max_x.max(s.x), min_y.min(s.y), max_y.max(s.y))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;

    const SPAWN: i32 = 6;

    fn sorted(mut positions: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
        positions.sort_unstable();
        positions
    }

    #[test]
    fn test_translate_round_trip() {
        for kind in ShapeKind::ALL {
            let original = Piece::new(kind, SPAWN);
            let mut piece = original.clone();
            piece.translate(-3, 7);
            assert_ne!(piece, original);
            piece.translate(3, -7);
            assert_eq!(piece, original);
        }
    }

    #[test]
    fn test_four_rotations_are_identity() {
        for kind in ShapeKind::ALL {
            for direction in [RotationDirection::Clockwise, RotationDirection::CounterClockwise] {
                let original = Piece::new(kind, SPAWN);
                let mut piece = original.clone();
                for _ in 0..4 {
                    piece.rotate(direction);
                }
                assert_eq!(
                    sorted(piece.visible_positions()),
                    sorted(original.visible_positions()),
                    "{:?} {:?}",
                    kind,
                    direction
                );
            }
        }
    }

    #[test]
    fn test_rotate_l_clockwise() {
        let mut piece = Piece::new(ShapeKind::L, SPAWN);
        piece.rotate(RotationDirection::Clockwise);
        // ###
        // #
        assert_eq!(
            sorted(piece.visible_positions()),
            vec![(5, 1), (5, 2), (6, 1), (7, 1)]
        );
    }

    #[test]
    fn test_rotate_i_both_directions() {
        let mut piece = Piece::new(ShapeKind::I, SPAWN);
        piece.rotate(RotationDirection::Clockwise);
        assert_eq!(
            sorted(piece.visible_positions()),
            vec![(5, 2), (6, 2), (7, 2), (8, 2)]
        );

        let mut piece = Piece::new(ShapeKind::I, SPAWN);
        piece.rotate(RotationDirection::CounterClockwise);
        assert_eq!(
            sorted(piece.visible_positions()),
            vec![(4, 2), (5, 2), (6, 2), (7, 2)]
        );
    }

    #[test]
    fn test_square_rotation_is_stable() {
        let original = Piece::new(ShapeKind::Square, SPAWN);
        let mut piece = original.clone();
        piece.rotate(RotationDirection::Clockwise);
        assert_eq!(
            sorted(piece.visible_positions()),
            sorted(original.visible_positions())
        );
    }

    #[test]
    fn test_s_rotation_can_leave_the_top() {
        let mut piece = Piece::new(ShapeKind::S, SPAWN);
        piece.rotate(RotationDirection::Clockwise);
        assert!(piece.is_above_board());
        assert!(piece.collide(&Board::default()).is_none());
    }

    #[test]
    fn test_no_collision_on_empty_board() {
        let board = Board::default();
        for kind in ShapeKind::ALL {
            let mut piece = Piece::new(kind, SPAWN);
            assert_eq!(piece.collide(&board), Collision::None);
            piece.translate(-3, 10);
            assert_eq!(piece.collide(&board), Collision::None, "{:?}", kind);
        }
    }

    #[test]
    fn test_wall_collision() {
        let board = Board::default();
        let mut piece = Piece::new(ShapeKind::I, 0);
        assert_eq!(piece.collide(&board), Collision::None);
        piece.translate(-1, 0);
        assert_eq!(piece.collide(&board), Collision::Wall);

        let mut piece = Piece::new(ShapeKind::Square, board.width() as i32 - 2);
        assert_eq!(piece.collide(&board), Collision::None);
        piece.translate(1, 0);
        assert_eq!(piece.collide(&board), Collision::Wall);
    }

    #[test]
    fn test_floor_collision() {
        let board = Board::new(11, 19);
        let mut piece = Piece::new(ShapeKind::Square, SPAWN);
        piece.translate(0, 17);
        assert_eq!(piece.collide(&board), Collision::None);
        piece.translate(0, 1);
        assert_eq!(piece.collide(&board), Collision::Settled);
        // Past the floor counts as settled too
        piece.translate(0, 3);
        assert_eq!(piece.collide(&board), Collision::Settled);
    }

    #[test]
    fn test_settled_on_occupied_cell() {
        let mut board = Board::new(11, 19);
        board.set(6, 5, Cell::Filled(2));
        let mut piece = Piece::new(ShapeKind::I, SPAWN);
        piece.translate(0, 1);
        assert_eq!(piece.collide(&board), Collision::None);
        piece.translate(0, 1);
        assert_eq!(piece.collide(&board), Collision::Settled);
    }

    #[test]
    fn test_ghost_squares_never_collide() {
        let mut board = Board::new(11, 19);
        // Ghost of the I piece sits at (6, 4)
        board.set(6, 4, Cell::Filled(0));
        let piece = Piece::new(ShapeKind::I, SPAWN);
        assert_eq!(piece.collide(&board), Collision::None);

        // L ghost sits left of the foot; push it off the board
        let piece = Piece::new(ShapeKind::L, 0);
        assert_eq!(piece.squares().iter().filter(|s| s.x < 0).count(), 1);
        assert_eq!(piece.collide(&board), Collision::None);
    }

    #[test]
    #[should_panic(expected = "at least one visible square")]
    fn test_piece_without_visible_squares_panics() {
        Piece::from_squares(vec![Square::ghost(0, 0)], 0);
    }
}
