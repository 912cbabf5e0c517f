mod action;
pub mod invariants;
mod position;
pub mod rules;
mod turn;
mod types;

pub use action::{Move, Rejection};
pub use position::Position;
pub use rules::evaluate;
pub use turn::TurnAuthority;
pub use types::{Board, Outcome, Player, Square};
