//! Arena entities: identity, team, heading and movement

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ws::protocol::Team;

use super::Vector3;

/// Display color of human-driven vehicles
pub const HUMAN_COLOR: &str = "teal";
/// Display color of AI-driven vehicles
pub const AI_COLOR: &str = "orange";

/// Id prefix linking an AI opponent to the connection that spawned it
const AI_ID_PREFIX: &str = "AI_";

/// Stable player identity, assigned by the transport on join
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the AI opponent spawned alongside this human player
    pub fn paired_ai(&self) -> Self {
        Self(format!("{}{}", AI_ID_PREFIX, self.0))
    }
}

impl From<Uuid> for PlayerId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who steers a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Heading changes only on input events
    Human,
    /// Heading changes autonomously every tick
    Ai,
}

/// Side of a 90 degree turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnSide {
    Left,
    Right,
}

/// Player state in the arena (authoritative)
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Vector3,
    pub direction: Vector3,
    pub color: String,
    pub team: Team,
    pub behavior: Behavior,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: String,
        team: Team,
        behavior: Behavior,
        color: &str,
        position: Vector3,
    ) -> Self {
        Self {
            id,
            name,
            position,
            direction: Vector3::FORWARD,
            color: color.to_string(),
            team,
            behavior,
        }
    }

    pub fn is_ai(&self) -> bool {
        self.behavior == Behavior::Ai
    }

    /// Step one unit along the current heading. No arena bounds apply.
    pub fn advance(&mut self) {
        self.position += self.direction;
    }

    pub fn turn(&mut self, side: TurnSide) {
        self.direction = match side {
            TurnSide::Left => self.direction.rotated_left(),
            TurnSide::Right => self.direction.rotated_right(),
        };
    }

    /// Random walk step: turn left or right with probability 1/3 each, then advance
    pub fn decide_next_move<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let roll: f64 = rng.gen();
        if roll < 1.0 / 3.0 {
            self.turn(TurnSide::Left);
        } else if roll < 2.0 / 3.0 {
            self.turn(TurnSide::Right);
        }
        self.advance();
    }

    /// Per-tick movement
    pub fn next_move<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self.behavior {
            Behavior::Human => self.advance(),
            Behavior::Ai => self.decide_next_move(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn make_player(behavior: Behavior, position: Vector3) -> Player {
        Player::new(
            PlayerId::new("p1"),
            "Test".to_string(),
            Team::Blue,
            behavior,
            HUMAN_COLOR,
            position,
        )
    }

    #[test]
    fn test_turn_left_then_advance() {
        let mut player = make_player(Behavior::Human, Vector3::new(2.0, 0.0, 5.0));
        assert_eq!(player.direction, Vector3::FORWARD);

        player.turn(TurnSide::Left);
        assert_eq!(player.direction, Vector3::new(-1.0, 0.0, 0.0));

        player.advance();
        assert_eq!(player.position, Vector3::new(1.0, 0.0, 5.0));
    }

    #[test]
    fn test_turn_right_rotates_clockwise() {
        let mut player = make_player(Behavior::Human, Vector3::ZERO);
        player.turn(TurnSide::Right);
        assert_eq!(player.direction, Vector3::new(1.0, 0.0, 0.0));
        player.turn(TurnSide::Right);
        assert_eq!(player.direction, Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_opposite_turns_restore_direction() {
        let mut player = make_player(Behavior::Human, Vector3::ZERO);
        for _ in 0..4 {
            let before = player.direction;
            player.turn(TurnSide::Left);
            player.turn(TurnSide::Right);
            assert_eq!(player.direction, before);

            player.turn(TurnSide::Right);
            player.turn(TurnSide::Left);
            assert_eq!(player.direction, before);

            player.turn(TurnSide::Left);
        }
    }

    #[test]
    fn test_advance_is_linear() {
        let start = Vector3::new(-3.0, 0.0, 4.0);
        let mut player = make_player(Behavior::Human, start);
        player.turn(TurnSide::Right);

        for _ in 0..7 {
            player.advance();
        }

        assert_eq!(player.position, start + player.direction * 7.0);
    }

    #[test]
    fn test_human_next_move_keeps_heading() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut player = make_player(Behavior::Human, Vector3::ZERO);

        for step in 1..=20 {
            player.next_move(&mut rng);
            assert_eq!(player.direction, Vector3::FORWARD);
            assert_eq!(player.position, Vector3::new(0.0, 0.0, step as f32));
        }
    }

    #[test]
    fn test_ai_moves_one_grid_step_per_tick() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut player = make_player(Behavior::Ai, Vector3::ZERO);

        for _ in 0..200 {
            let before = player.position;
            player.next_move(&mut rng);

            let step = Vector3::new(
                player.position.x - before.x,
                player.position.y - before.y,
                player.position.z - before.z,
            );
            assert_eq!(step, player.direction);
            assert_eq!(step.y, 0.0);
            assert_eq!(step.x.abs() + step.z.abs(), 1.0);
        }
    }

    #[test]
    fn test_ai_decisions_are_reproducible() {
        let mut a = make_player(Behavior::Ai, Vector3::ZERO);
        let mut b = make_player(Behavior::Ai, Vector3::ZERO);
        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..50 {
            a.next_move(&mut rng_a);
            b.next_move(&mut rng_b);
        }

        assert_eq!(a, b);
    }

    #[test]
    fn test_ai_turns_both_ways() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut lefts = 0;
        let mut rights = 0;
        let mut straights = 0;

        for _ in 0..300 {
            let mut player = make_player(Behavior::Ai, Vector3::ZERO);
            player.decide_next_move(&mut rng);
            match player.direction {
                d if d == Vector3::FORWARD.rotated_left() => lefts += 1,
                d if d == Vector3::FORWARD.rotated_right() => rights += 1,
                _ => straights += 1,
            }
        }

        assert!(lefts > 50, "lefts = {}", lefts);
        assert!(rights > 50, "rights = {}", rights);
        assert!(straights > 50, "straights = {}", straights);
    }

    #[test]
    fn test_paired_ai_id() {
        let id = PlayerId::new("abc");
        assert_eq!(id.paired_ai(), PlayerId::new("AI_abc"));
    }
}
