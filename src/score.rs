//! Scoring and gravity speed-up

/// Points for clearing 1, 2, 3 or 4+ rows with a single lock
const CLEAR_POINTS: [u64; 4] = [1, 3, 9, 27];

/// Scoring calculation
#[derive(Debug, Clone)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Total lines cleared
    pub lines: u32,
    /// Pieces locked into the board
    pub pieces: u32,
    /// Gravity period in milliseconds
    tick_interval_ms: u64,
    /// Multiplier applied to the gravity period after every clear
    speedup_factor: f64,
}

impl Default for Score {
    fn default() -> Self {
        Self::new(300, 0.95)
    }
}

impl Score {
    pub fn new(tick_interval_ms: u64, speedup_factor: f64) -> Self {
        Self {
            points: 0,
            lines: 0,
            pieces: 0,
            tick_interval_ms,
            speedup_factor,
        }
    }

    /// Points awarded for clearing `rows` rows at once
    pub fn points_for(rows: usize) -> u64 {
        match rows {
            0 => 0,
            n => CLEAR_POINTS[n.min(CLEAR_POINTS.len()) - 1],
        }
    }

    /// Record a line clear: award points and speed up gravity.
    /// Returns the points awarded.
    pub fn add_clear(&mut self, rows: usize) -> u64 {
        if rows == 0 {
            return 0;
        }
        let points = Self::points_for(rows);
        self.points += points;
        self.lines += rows as u32;
        // Truncation toward zero keeps the interval an integer
        self.tick_interval_ms = (self.tick_interval_ms as f64 * self.speedup_factor) as u64;
        points
    }

    /// Record a locked piece
    pub fn add_piece(&mut self) {
        self.pieces += 1;
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }
}
