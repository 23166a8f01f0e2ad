//! Odd/even dice games over encrypted stakes

pub mod dice;
pub mod record;
pub mod registry;

pub use record::{Game, GameMetadata, GameStatus, MAX_DICE, MIN_DICE};
pub use registry::GameRegistry;
