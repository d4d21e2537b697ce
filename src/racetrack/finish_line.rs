//! Finish-line geometry and the crossing test

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Which coordinate stays constant along the finish line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Both end cells share a row; the row is the fixed coordinate.
    Horizontal,
    /// The end cells differ in row; the column is the fixed coordinate.
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => f.write_str("horizontal"),
            Orientation::Vertical => f.write_str("vertical"),
        }
    }
}

/// The segment spanned by the two finish cells furthest apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishLine {
    pub orientation: Orientation,
    pub first: Position,
    pub second: Position,
}

impl FinishLine {
    /// Derive the finish line from finish cells given in scan order.
    ///
    /// Picks the first pair with maximal Manhattan distance. A lone finish
    /// cell produces a degenerate segment from the cell to itself.
    pub fn from_cells(cells: &[Position]) -> Option<Self> {
        let &seed = cells.first()?;
        let mut best = (seed, seed);
        let mut best_distance = 0;

        for &a in cells {
            for &b in cells {
                let distance = a.manhattan(b);
                if distance > best_distance {
                    best = (a, b);
                    best_distance = distance;
                }
            }
        }

        let (first, second) = best;
        let orientation = if first.row == second.row {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        Some(Self {
            orientation,
            first,
            second,
        })
    }

    /// The fixed coordinate of the line and the bounds of the varying one.
    fn geometry(&self) -> (i32, i32, i32) {
        match self.orientation {
            Orientation::Horizontal => (self.first.row, self.first.col, self.second.col),
            Orientation::Vertical => (self.first.col, self.first.row, self.second.row),
        }
    }

    /// Whether moving from `before` to `after` crosses (or lands on) the line.
    ///
    /// Only the perpendicular coordinate of `before` is checked against the
    /// segment bounds.
    pub fn crossed(&self, before: Position, after: Position) -> bool {
        let (line, b1, b2) = self.geometry();
        let (crossing_before, crossing_after, perpendicular) = match self.orientation {
            Orientation::Horizontal => (before.row, after.row, before.col),
            Orientation::Vertical => (before.col, after.col, before.row),
        };

        let diff_before = line - crossing_before;
        let diff_after = line - crossing_after;
        let straddles = (diff_before < 0 && 0 < diff_after)
            || (diff_after < 0 && 0 < diff_before)
            || diff_after == 0;

        let within = (b1.min(b2)..=b1.max(b2)).contains(&perpendicular);

        straddles && within
    }
}

impl fmt::Display for FinishLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.orientation, self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal() -> FinishLine {
        FinishLine::from_cells(&[
            Position::new(0, 2),
            Position::new(0, 3),
            Position::new(0, 4),
        ])
        .unwrap()
    }

    #[test]
    fn picks_extreme_pair_and_orientation() {
        let line = horizontal();
        assert_eq!(line.orientation, Orientation::Horizontal);
        assert_eq!(line.first, Position::new(0, 2));
        assert_eq!(line.second, Position::new(0, 4));

        let vertical = FinishLine::from_cells(&[
            Position::new(1, 6),
            Position::new(2, 6),
            Position::new(3, 6),
        ])
        .unwrap();
        assert_eq!(vertical.orientation, Orientation::Vertical);
        assert_eq!(vertical.first, Position::new(1, 6));
        assert_eq!(vertical.second, Position::new(3, 6));
    }

    #[test]
    fn single_cell_is_degenerate_segment() {
        let line = FinishLine::from_cells(&[Position::new(1, 2)]).unwrap();
        assert_eq!(line.first, line.second);
        assert_eq!(line.orientation, Orientation::Horizontal);
        assert!(FinishLine::from_cells(&[]).is_none());
    }

    #[test]
    fn crossing_requires_straddle_and_bounds() {
        let line = horizontal();
        // straight up through the line
        assert!(line.crossed(Position::new(2, 3), Position::new(-1, 3)));
        // landing exactly on the line
        assert!(line.crossed(Position::new(2, 3), Position::new(0, 3)));
        // stopping short
        assert!(!line.crossed(Position::new(3, 3), Position::new(1, 3)));
        // outside the segment bounds
        assert!(!line.crossed(Position::new(2, 6), Position::new(-1, 6)));
    }

    #[test]
    fn only_pre_move_perpendicular_coordinate_is_checked() {
        let line = horizontal();
        // starts inside the bounds, ends far outside: still counts
        assert!(line.crossed(Position::new(2, 4), Position::new(-1, 9)));
        // starts outside the bounds, ends inside: does not count
        assert!(!line.crossed(Position::new(2, 6), Position::new(-1, 3)));
    }

    #[test]
    fn vertical_line_uses_column_as_fixed_coordinate() {
        let line = FinishLine::from_cells(&[Position::new(1, 6), Position::new(3, 6)]).unwrap();
        assert!(line.crossed(Position::new(2, 4), Position::new(2, 7)));
        assert!(line.crossed(Position::new(2, 8), Position::new(2, 5)));
        assert!(line.crossed(Position::new(3, 4), Position::new(3, 6)));
        assert!(!line.crossed(Position::new(5, 4), Position::new(5, 8)));
    }
}
