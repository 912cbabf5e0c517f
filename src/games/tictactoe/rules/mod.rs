//! Game rules for tic-tac-toe.
//!
//! Pure functions from board to result. Rules are separated from board
//! storage so the session and the client mirror evaluate the same way.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{check_winner, LINES};

use super::{Board, Outcome};
use tracing::{instrument, trace};

/// Evaluates the board.
///
/// Rows, then columns, then diagonals; a complete line wins. Otherwise a
/// full board is a draw and anything else is undecided. Never cached: the
/// session calls this after every accepted move.
#[instrument(skip(board))]
pub fn evaluate(board: &Board) -> Outcome {
    let outcome = if let Some(winner) = check_winner(board) {
        Outcome::Won(winner)
    } else if is_full(board) {
        Outcome::Draw
    } else {
        Outcome::Undecided
    };
    trace!(%outcome, "Board evaluated");
    outcome
}

#[cfg(test)]
mod tests {
    use super::super::{Player, Position};
    use super::*;

    fn board_from(rows: [&str; 3]) -> Board {
        let mut board = Board::new();
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let pos = Position::new(row, col).expect("on board");
                match ch {
                    'X' => board.set(pos, Player::A).expect("empty square"),
                    'O' => board.set(pos, Player::B).expect("empty square"),
                    _ => {}
                }
            }
        }
        board
    }

    #[test]
    fn test_empty_board_undecided() {
        assert_eq!(evaluate(&Board::new()), Outcome::Undecided);
    }

    #[test]
    fn test_draw_detection() {
        let board = board_from(["XOX", "OXX", "OXO"]);
        assert_eq!(evaluate(&board), Outcome::Draw);
    }

    #[test]
    fn test_full_board_with_line_is_win_not_draw() {
        let board = board_from(["XXX", "OOX", "XOO"]);
        assert_eq!(evaluate(&board), Outcome::Won(Player::A));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let board = board_from(["XO.", ".X.", "..O"]);
        let first = evaluate(&board);
        let copy = board.clone();
        assert_eq!(evaluate(&copy), first);
        assert_eq!(evaluate(&board), first);
        assert_eq!(first, Outcome::Undecided);
    }
}
