//! Track file reader
//!
//! The track format is a header line with the grid dimensions followed by
//! one line of cell symbols per row. The header is informational only; the
//! dimensions are taken from the rows themselves.

use std::{path::Path, str::FromStr};

use super::{cell::CellKind, grid::Grid};
use crate::{Error, Result};

/// Parse a track from its textual representation.
///
/// # Errors
///
/// Returns [`Error::InvalidCellCharacter`] for unknown symbols and any of the
/// [`Grid::new`] validation errors.
pub fn parse_track(text: &str) -> Result<Grid> {
    let mut rows = Vec::new();
    for line in text.lines().skip(1) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let row = rows.len();
        let cells = line
            .chars()
            .enumerate()
            .map(|(col, character)| {
                CellKind::from_char(character).ok_or(Error::InvalidCellCharacter {
                    character,
                    row,
                    col,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(cells);
    }
    Grid::new(rows)
}

/// Read and parse a track file.
pub fn load_track<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|source| Error::io(format!("read track file {}", path.display()), source))?;
    parse_track(&text)
}

impl FromStr for Grid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_track(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    #[test]
    fn header_line_is_discarded() {
        let grid: Grid = "3,4\n####\n#SF#\n####\n".parse().unwrap();
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 4);
        assert_eq!(grid.start_cells(), &[Position::new(1, 1)]);
    }

    #[test]
    fn windows_line_endings_are_accepted() {
        let grid = parse_track("2,3\r\nS.F\r\n...\r\n").unwrap();
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.rows(), 2);
    }

    #[test]
    fn unknown_symbol_reports_location() {
        let err = parse_track("1,3\nS?F\n").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCellCharacter {
                character: '?',
                row: 0,
                col: 1
            }
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_track("/definitely/not/here.track").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn bad_symbol_reports_grid_row() {
        let err = parse_track("3,3\n\nS.F\n\n.x.\n").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCellCharacter {
                character: 'x',
                row: 1,
                col: 1
            }
        ));
    }
}
