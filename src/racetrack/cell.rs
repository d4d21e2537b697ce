//! Cell kinds of a racetrack grid

use serde::{Deserialize, Serialize};

/// Classification of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Wall,
    Track,
    Start,
    Finish,
}

impl CellKind {
    pub fn to_char(self) -> char {
        match self {
            CellKind::Wall => '#',
            CellKind::Track => '.',
            CellKind::Start => 'S',
            CellKind::Finish => 'F',
        }
    }

    pub fn from_char(c: char) -> Option<CellKind> {
        match c {
            '#' => Some(CellKind::Wall),
            '.' => Some(CellKind::Track),
            'S' => Some(CellKind::Start),
            'F' => Some(CellKind::Finish),
            _ => None,
        }
    }

    /// Whether a vehicle may be placed on this cell at episode start.
    pub fn is_drivable(self) -> bool {
        matches!(self, CellKind::Track | CellKind::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_mapping_is_consistent() {
        for kind in [
            CellKind::Wall,
            CellKind::Track,
            CellKind::Start,
            CellKind::Finish,
        ] {
            assert_eq!(CellKind::from_char(kind.to_char()), Some(kind));
        }
        assert_eq!(CellKind::from_char('x'), None);
    }
}
