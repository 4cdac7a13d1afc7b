//! The grid variant: a 3×3 board where each move places the acting role's
//! mark in an empty cell. Three in a row wins; a full board with no line is a
//! draw.
//!
//! This variant never shipped bare delta tokens, so its legacy policy rejects
//! them outright.

use serde::Deserialize;
use serde::Serialize;

use crate::error::SyncError;
use crate::GameSpec;
use crate::LegacyDeltaPolicy;
use crate::Role;

/// Cell count of the square board.
pub const GRID_CELLS: usize = 9;

/// The eight winning lines: rows, columns, diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Marker type for the grid variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGame;

/// The 3×3 board, row-major. `None` is an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBoard {
    /// Cell contents, row-major.
    pub cells: [Option<Role>; GRID_CELLS],
}

/// Places the acting role's mark at a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceAt {
    /// Row-major cell index, 0..9.
    pub cell: u8,
}

impl GameSpec for GridGame {
    type Move = PlaceAt;
    type Board = GridBoard;

    const KIND: &'static str = "grid";
    const LEGACY_DELTA_POLICY: LegacyDeltaPolicy = LegacyDeltaPolicy::Reject;

    fn apply_move(
        board: &Self::Board,
        role: Role,
        action: &Self::Move,
    ) -> Result<Self::Board, SyncError> {
        let index = usize::from(action.cell);
        if index >= GRID_CELLS {
            return Err(SyncError::rule(format!("cell {} is out of range", index)));
        }
        if board.cells[index].is_some() {
            return Err(SyncError::rule(format!("cell {} is occupied", index)));
        }
        let mut next = board.clone();
        next.cells[index] = Some(role);
        Ok(next)
    }

    fn winner(board: &Self::Board) -> Option<Role> {
        for line in &LINES {
            if let Some(role) = board.cells[line[0]] {
                if board.cells[line[1]] == Some(role) && board.cells[line[2]] == Some(role) {
                    return Some(role);
                }
            }
        }
        None
    }

    fn is_draw(board: &Self::Board) -> bool {
        board.cells.iter().all(Option::is_some) && Self::winner(board).is_none()
    }
}
