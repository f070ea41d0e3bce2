//! Core game representations: position, board, unit, phase, state, and the
//! combat mechanics they share.

pub mod board;
pub mod game;
pub mod mechanics;
pub mod phase;
pub mod position;
pub mod side;
pub mod unit;

pub use board::Board;
pub use game::GameState;
pub use phase::Phase;
pub use position::Position;
pub use side::{Team, TeamArray};
pub use unit::{MeleeWeapon, RangedWeapon, Unit};
