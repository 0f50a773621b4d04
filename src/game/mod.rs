//! Arena simulation modules

pub mod arena;
pub mod error;
pub mod player;
pub mod snapshot;
pub mod state;
pub mod trail;
pub mod vector;

pub use arena::{ArenaHandle, GameArena};
pub use error::GameError;
pub use player::{Behavior, Player, PlayerId, TurnSide, AI_COLOR, HUMAN_COLOR};
pub use trail::Trails;
pub use vector::Vector3;
