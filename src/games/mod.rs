//! Game rules and state.

pub mod tictactoe;
