//! Win detection logic for tic-tac-toe.

use super::super::{Board, Player, Position, Square};
use tracing::instrument;

/// The eight winning lines, in evaluation order: rows, columns, diagonals.
pub const LINES: [[Position; 3]; 8] = {
    let all = Position::ALL;
    [
        // Rows
        [all[0], all[1], all[2]],
        [all[3], all[4], all[5]],
        [all[6], all[7], all[8]],
        // Columns
        [all[0], all[3], all[6]],
        [all[1], all[4], all[7]],
        [all[2], all[5], all[8]],
        // Diagonals
        [all[0], all[4], all[8]],
        [all[2], all[4], all[6]],
    ]
};

/// Checks if there is a winner on the board.
///
/// Returns the owner of the first complete line in [`LINES`] order,
/// `None` otherwise.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Player> {
    LINES.iter().find_map(|[a, b, c]| {
        let sq = board.get(*a);
        match sq {
            Square::Occupied(player) if sq == board.get(*b) && sq == board.get(*c) => Some(player),
            _ => None,
        }
    })
}
