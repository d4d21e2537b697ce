//! Immutable track grid with cached geometry

use std::fmt;

use serde::Serialize;

use super::{cell::CellKind, finish_line::FinishLine};
use crate::{Error, Result, types::Position};

/// A classified racetrack grid.
///
/// All derived cell sets are computed once in [`Grid::new`] and never change
/// afterwards. Cell sets are stored in row-major scan order, which is also
/// the tie-break order for the closest-cell queries. Grids are built only
/// through [`Grid::new`] or the track reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellKind>,
    start_cells: Vec<Position>,
    finish_cells: Vec<Position>,
    track_cells: Vec<Position>,
    valid_cells: Vec<Position>,
    finish_line: FinishLine,
}

impl Grid {
    /// Classify a rectangular array of cells.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or ragged array and for a grid that
    /// lacks start or finish cells.
    pub fn new(rows: Vec<Vec<CellKind>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || cols == 0 {
            return Err(Error::EmptyGrid);
        }

        if let Some((row, got)) = rows
            .iter()
            .enumerate()
            .map(|(row, cells)| (row, cells.len()))
            .find(|&(_, len)| len != cols)
        {
            return Err(Error::RaggedRow {
                row,
                expected: cols,
                got,
            });
        }

        let row_count = rows.len();
        let cells: Vec<CellKind> = rows.into_iter().flatten().collect();

        let collect = |kind: CellKind| -> Vec<Position> {
            cells
                .iter()
                .enumerate()
                .filter(|&(_, &cell)| cell == kind)
                .map(|(idx, _)| Position::new((idx / cols) as i32, (idx % cols) as i32))
                .collect()
        };

        let start_cells = collect(CellKind::Start);
        let finish_cells = collect(CellKind::Finish);
        let track_cells = collect(CellKind::Track);

        if start_cells.is_empty() {
            return Err(Error::MissingStart);
        }
        let finish_line = FinishLine::from_cells(&finish_cells).ok_or(Error::MissingFinish)?;

        let valid_cells = track_cells
            .iter()
            .chain(start_cells.iter())
            .copied()
            .collect();

        Ok(Self {
            rows: row_count,
            cols,
            cells,
            start_cells,
            finish_cells,
            track_cells,
            valid_cells,
            finish_line,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether `pos` lies inside the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.rows
            && (pos.col as usize) < self.cols
    }

    /// The cell at `pos`, or `None` when out of bounds.
    pub fn cell(&self, pos: Position) -> Option<CellKind> {
        self.contains(pos)
            .then(|| self.cells[pos.row as usize * self.cols + pos.col as usize])
    }

    /// Out-of-bounds positions count as walls.
    pub fn is_wall(&self, pos: Position) -> bool {
        self.cell(pos).is_none_or(|cell| cell == CellKind::Wall)
    }

    /// Whether the move from `before` to `after` crosses the finish line.
    pub fn crossed_finish(&self, before: Position, after: Position) -> bool {
        self.finish_line.crossed(before, after)
    }

    /// The start cell closest to `pos` (first one on ties).
    pub fn closest_start(&self, pos: Position) -> Position {
        closest(&self.start_cells, pos).unwrap_or(self.start_cells[0])
    }

    /// The track cell closest to `pos` (first one on ties).
    pub fn closest_track(&self, pos: Position) -> Option<Position> {
        closest(&self.track_cells, pos)
    }

    pub fn start_cells(&self) -> &[Position] {
        &self.start_cells
    }

    pub fn finish_cells(&self) -> &[Position] {
        &self.finish_cells
    }

    pub fn track_cells(&self) -> &[Position] {
        &self.track_cells
    }

    /// Track cells followed by start cells.
    pub fn valid_cells(&self) -> &[Position] {
        &self.valid_cells
    }

    pub fn finish_line(&self) -> &FinishLine {
        &self.finish_line
    }

    /// Iterate rows of cells.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[CellKind]> {
        self.cells.chunks(self.cols)
    }
}

fn closest(candidates: &[Position], pos: Position) -> Option<Position> {
    // min_by_key keeps the first minimum, matching scan order tie-breaking
    candidates
        .iter()
        .copied()
        .min_by_key(|candidate| candidate.manhattan(pos))
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows() {
            let line: String = row.iter().map(|cell| cell.to_char()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
