//! Shape catalog
//!
//! The seven canonical shapes, each defined as a list of squares relative to
//! the spawn column. Some shapes carry an invisible "ghost" square so their
//! bounding box has odd dimensions and rotates around a whole-cell center.

/// Index into the color palette
pub type ColorIndex = u8;

/// Color used for synthesized gap-filling pieces
pub const GAP_FILL_COLOR: ColorIndex = 8;
/// Color the blocked piece is painted with when the round ends
pub const GAME_OVER_COLOR: ColorIndex = 9;
/// Number of entries in the palette
pub const PALETTE_SIZE: usize = 10;

/// One square of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Square {
    pub x: i32,
    pub y: i32,
    /// Ghost squares only take part in rotation geometry
    pub visible: bool,
}

impl Square {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y, visible: true }
    }

    pub const fn ghost(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            visible: false,
        }
    }
}

/// The 7 canonical shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    L,
    MirroredL,
    Square,
    I,
    S,
    Z,
    MirroredT,
}

impl ShapeKind {
    /// All shapes, in palette order
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::L,
        ShapeKind::MirroredL,
        ShapeKind::Square,
        ShapeKind::I,
        ShapeKind::S,
        ShapeKind::Z,
        ShapeKind::MirroredT,
    ];

    /// Palette entry for this shape
    pub fn color(&self) -> ColorIndex {
        match self {
            ShapeKind::L => 0,
            ShapeKind::MirroredL => 1,
            ShapeKind::Square => 2,
            ShapeKind::I => 3,
            ShapeKind::S => 4,
            ShapeKind::Z => 5,
            ShapeKind::MirroredT => 6,
        }
    }

    /// Squares of this shape with its top row at y = 0, anchored on `col`
    pub fn squares(&self, col: i32) -> Vec<Square> {
        match self {
            // #
            // #
            // ##  (ghost to the left of the foot)
            ShapeKind::L => vec![
                Square::new(col, 0),
                Square::new(col, 1),
                Square::new(col, 2),
                Square::new(col + 1, 2),
                Square::ghost(col - 1, 2),
            ],
            //  #
            //  #
            // ##
            ShapeKind::MirroredL => vec![
                Square::new(col + 1, 0),
                Square::new(col + 1, 1),
                Square::new(col + 1, 2),
                Square::new(col, 2),
                Square::ghost(col - 1, 2),
            ],
            ShapeKind::Square => vec![
                Square::new(col, 0),
                Square::new(col, 1),
                Square::new(col + 1, 0),
                Square::new(col + 1, 1),
            ],
            ShapeKind::I => vec![
                Square::new(col, 0),
                Square::new(col, 1),
                Square::new(col, 2),
                Square::new(col, 3),
                Square::ghost(col, 4),
            ],
            // ##
            //  ##
            ShapeKind::S => vec![
                Square::new(col, 0),
                Square::new(col + 1, 0),
                Square::new(col + 1, 1),
                Square::new(col + 2, 1),
            ],
            //  ##
            // ##
            ShapeKind::Z => vec![
                Square::new(col, 0),
                Square::new(col + 1, 0),
                Square::new(col, 1),
                Square::new(col - 1, 1),
            ],
            //  #
            // ###
            ShapeKind::MirroredT => vec![
                Square::new(col, 1),
                Square::new(col + 1, 1),
                Square::new(col + 2, 1),
                Square::new(col + 1, 0),
                Square::ghost(col + 1, 2),
            ],
        }
    }

    /// Leftmost and rightmost column offsets (visible squares) relative to the anchor
    pub fn column_extent(&self) -> (i32, i32) {
        let squares = self.squares(0);
        let visible = squares.iter().filter(|s| s.visible);
        let min = visible.clone().map(|s| s.x).min().unwrap_or(0);
        let max = visible.map(|s| s.x).max().unwrap_or(0);
        (min, max)
    }
}

/// Direction for rotation, as seen on screen (rows grow downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shape_has_four_visible_squares() {
        for kind in ShapeKind::ALL {
            let visible = kind.squares(6).iter().filter(|s| s.visible).count();
            assert_eq!(visible, 4, "{:?}", kind);
        }
    }

    #[test]
    fn test_colors_are_distinct_palette_entries() {
        let mut colors: Vec<_> = ShapeKind::ALL.iter().map(|k| k.color()).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), 7);
        assert!(colors.iter().all(|&c| (c as usize) < PALETTE_SIZE));
    }

    #[test]
    fn test_column_extent() {
        assert_eq!(ShapeKind::I.column_extent(), (0, 0));
        assert_eq!(ShapeKind::Z.column_extent(), (-1, 1));
        assert_eq!(ShapeKind::S.column_extent(), (0, 2));
        // Ghost squares do not count
        assert_eq!(ShapeKind::L.column_extent(), (0, 1));
    }
}
