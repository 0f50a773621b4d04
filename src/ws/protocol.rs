//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{GameError, PlayerId, TurnSide, Vector3};

/// The two sides of the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Blue,
    Orange,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Blue, Team::Orange];

    pub fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Orange,
            Self::Orange => Self::Blue,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blue => f.write_str("blue"),
            Self::Orange => f.write_str("orange"),
        }
    }
}

/// Directional input sent by the render client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    #[serde(alias = "ArrowUp")]
    Up,
    #[serde(alias = "ArrowDown")]
    Down,
    #[serde(alias = "ArrowLeft")]
    Left,
    #[serde(alias = "ArrowRight")]
    Right,
}

impl MoveDirection {
    /// Turn applied before the move step. Up and down keep the current heading.
    pub fn turn_side(self) -> Option<TurnSide> {
        match self {
            Self::Left => Some(TurnSide::Left),
            Self::Right => Some(TurnSide::Right),
            Self::Up | Self::Down => None,
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Enter the arena; spawns the player and one AI opponent
    JoinGame {
        name: String,
    },

    /// Steer the player (left/right turn), then step forward
    PlayerMove {
        direction: MoveDirection,
    },
}

impl ClientMsg {
    /// Parse a text frame into a client message
    pub fn parse(text: &str) -> Result<Self, GameError> {
        serde_json::from_str(text).map_err(|e| GameError::InvalidInput(e.to_string()))
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Full projection of the arena (sent every tick and after join/leave)
    StateSnapshot {
        /// Completed simulation ticks
        tick: u64,
        /// Every active player, keyed by id
        players: BTreeMap<PlayerId, PlayerSnapshot>,
        /// Both teams' trails since the last round reset
        trails: TeamTrails,
        scores: Scores,
    },

    /// A team reached the win score
    GameOver {
        winning_team: Team,
    },

    /// Confirmation of a join, sent to the joining connection only
    JoinAck {
        player_id: PlayerId,
    },

    /// Error message, sent to the originating connection only
    Error {
        code: String,
        message: String,
    },
}

impl From<&GameError> for ServerMsg {
    fn from(err: &GameError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub position: Vector3,
    pub direction: Vector3,
    /// Display color, chosen by the server
    pub color: String,
    pub team: Team,
    pub is_ai: bool,
}

/// Trail points per team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamTrails {
    pub blue: Vec<Vector3>,
    pub orange: Vec<Vector3>,
}

/// Eliminations scored per team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub blue: u32,
    pub orange: u32,
}

impl Scores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Blue => self.blue,
            Team::Orange => self.orange,
        }
    }

    /// Credit one elimination to `team`
    pub fn award(&mut self, team: Team) {
        match team {
            Team::Blue => self.blue += 1,
            Team::Orange => self.orange += 1,
        }
    }

    /// First team (blue before orange) at or above `win_score`
    pub fn winner(&self, win_score: u32) -> Option<Team> {
        Team::ALL
            .into_iter()
            .find(|team| self.get(*team) >= win_score)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
