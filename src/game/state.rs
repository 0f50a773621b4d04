//! Arena state machine: players, trails, scores and the per-tick rules

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::ws::protocol::{MoveDirection, Scores, ServerMsg, Team};

use super::snapshot::SnapshotBuilder;
use super::{Behavior, GameError, Player, PlayerId, Trails, Vector3, AI_COLOR, HUMAN_COLOR};

/// Longest accepted display name, in characters
pub const MAX_NAME_LEN: usize = 32;

/// Where the arena stands after evaluating end conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaPhase {
    /// Both teams have players and nobody has won
    Active,
    /// A team has no players left; positions and trails get reset
    RoundOver,
    /// A team reached the win score; scores, positions and trails get reset
    GameOver(Team),
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Players removed by trail collisions, in processing order
    pub eliminated: Vec<PlayerId>,
    /// Round resets triggered (game resets included)
    pub round_resets: u32,
    /// Winner, if the game ended during this tick
    pub winner: Option<Team>,
}

/// Authoritative arena state (owned by the arena task)
pub struct ArenaState {
    pub tick: u64,
    pub players: BTreeMap<PlayerId, Player>,
    pub trails: Trails,
    pub scores: Scores,
    config: GameConfig,
    rng: ChaCha8Rng,
    outbox: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
}

impl ArenaState {
    pub fn new(config: GameConfig, outbox: broadcast::Sender<ServerMsg>) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        info!(seed, win_score = config.win_score, "Arena state created");

        Self {
            tick: 0,
            players: BTreeMap::new(),
            trails: Trails::new(),
            scores: Scores::default(),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            outbox,
            snapshot_builder: SnapshotBuilder::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Random integer grid point in the spawn square, on the y = 0 plane
    pub fn spawn_position(&mut self) -> Vector3 {
        let extent = self.config.spawn_half_extent;
        let x = self.rng.gen_range(-extent..=extent);
        let z = self.rng.gen_range(-extent..=extent);
        Vector3::new(x as f32, 0.0, z as f32)
    }

    /// True if `position` lies inside the spawn square
    #[cfg(test)]
    pub fn in_spawn_region(&self, position: Vector3) -> bool {
        let extent = self.config.spawn_half_extent as f32;
        position.y == 0.0 && position.x.abs() <= extent && position.z.abs() <= extent
    }

    pub fn team_size(&self, team: Team) -> usize {
        self.players.values().filter(|p| p.team == team).count()
    }

    /// Derived phase of the current state, without applying any transition
    pub fn phase(&self) -> ArenaPhase {
        if let Some(winner) = self.scores.winner(self.config.win_score) {
            ArenaPhase::GameOver(winner)
        } else if Team::ALL.iter().any(|team| self.team_size(*team) == 0) {
            ArenaPhase::RoundOver
        } else {
            ArenaPhase::Active
        }
    }

    /// Insert a player and broadcast. Ids are never overwritten.
    pub fn add_player(&mut self, player: Player) -> Result<(), GameError> {
        if self.players.contains_key(&player.id) {
            return Err(GameError::DuplicateJoin(player.id));
        }

        info!(
            player_id = %player.id,
            team = %player.team,
            ai = player.is_ai(),
            position = %player.position,
            "Player added"
        );
        self.players.insert(player.id.clone(), player);
        self.broadcast_state();
        Ok(())
    }

    /// Remove a player if present and broadcast either way
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        let removed = self.players.remove(id);
        if removed.is_some() {
            info!(player_id = %id, "Player removed");
        }
        self.broadcast_state();
        removed
    }

    /// Spawn a human player for `connection_id` and its AI opponent.
    /// Returns the human player's id.
    pub fn join(&mut self, connection_id: &PlayerId, name: &str) -> Result<PlayerId, GameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::InvalidInput("name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(GameError::InvalidInput(format!(
                "name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }

        if self.players.contains_key(connection_id) {
            return Err(GameError::DuplicateJoin(connection_id.clone()));
        }

        // An eliminated player's AI outlives it; the rejoin spawns a fresh one
        let ai_id = connection_id.paired_ai();
        if self.players.remove(&ai_id).is_some() {
            info!(player_id = %ai_id, "Replacing AI left over from previous join");
        }

        let human_position = self.spawn_position();
        let human = Player::new(
            connection_id.clone(),
            name.to_string(),
            Team::Blue,
            Behavior::Human,
            HUMAN_COLOR,
            human_position,
        );
        self.add_player(human)?;

        let ai_position = self.spawn_position();
        let ai_name = format!("AI_{}", self.rng.gen_range(0..1000));
        let ai = Player::new(
            ai_id,
            ai_name,
            Team::Orange,
            Behavior::Ai,
            AI_COLOR,
            ai_position,
        );
        self.add_player(ai)?;

        Ok(connection_id.clone())
    }

    /// Apply a directional input: turn (left/right only), step, record the
    /// trail point and broadcast. Returns false if the player is not active.
    pub fn apply_move(&mut self, id: &PlayerId, direction: MoveDirection) -> bool {
        let Some(player) = self.players.get_mut(id) else {
            debug!(player_id = %id, "Move for inactive player ignored");
            return false;
        };

        if let Some(side) = direction.turn_side() {
            player.turn(side);
        }
        player.advance();
        let (team, position) = (player.team, player.position);

        self.trails.record(team, position);
        self.broadcast_state();
        true
    }

    /// Remove the connection's player and its paired AI. Idempotent.
    pub fn disconnect(&mut self, connection_id: &PlayerId) {
        self.remove_player(connection_id);
        self.remove_player(&connection_id.paired_ai());
    }

    /// Run one simulation step and broadcast the result
    pub fn tick(&mut self) -> Result<TickReport, GameError> {
        self.tick += 1;

        for player in self.players.values_mut() {
            player.next_move(&mut self.rng);
            if !player.position.is_finite() {
                return Err(GameError::TickFailure(format!(
                    "player {} moved to non-finite position {}",
                    player.id, player.position
                )));
            }
            self.trails.record(player.team, player.position);
        }

        let report = self.check_collisions();
        self.broadcast_state();
        Ok(report)
    }

    /// Eliminate every player standing on an enemy trail point.
    ///
    /// Runs after all moves of the tick, against the trails including this
    /// tick's points. A reset triggered mid-pass clears the trails, so later
    /// players in the same pass survive.
    fn check_collisions(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let ids: Vec<PlayerId> = self.players.keys().cloned().collect();

        for id in ids {
            let Some(player) = self.players.get(&id) else {
                continue;
            };
            if !self.trails.collides(player.position, player.team) {
                continue;
            }

            let enemy = player.team.opponent();
            info!(player_id = %id, position = %player.position, "Trail collision");
            self.players.remove(&id);
            self.scores.award(enemy);
            report.eliminated.push(id);

            match self.evaluate_end_condition() {
                ArenaPhase::GameOver(winner) => {
                    report.winner = Some(winner);
                    report.round_resets += 1;
                }
                ArenaPhase::RoundOver => report.round_resets += 1,
                ArenaPhase::Active => {}
            }
        }

        report
    }

    /// Apply the game-over or round-over transition if one is due
    pub fn evaluate_end_condition(&mut self) -> ArenaPhase {
        let phase = self.phase();
        match phase {
            ArenaPhase::GameOver(winning_team) => {
                info!(team = %winning_team, scores = ?self.scores, "Team has won the game");
                let _ = self.outbox.send(ServerMsg::GameOver { winning_team });
                self.reset_game();
            }
            ArenaPhase::RoundOver => self.reset_round(),
            ArenaPhase::Active => {}
        }
        phase
    }

    /// Respawn every player, clear trails, keep scores
    pub fn reset_round(&mut self) {
        info!(players = self.players.len(), "Resetting round");

        let ids: Vec<PlayerId> = self.players.keys().cloned().collect();
        for id in ids {
            let position = self.spawn_position();
            if let Some(player) = self.players.get_mut(&id) {
                player.position = position;
                player.direction = Vector3::FORWARD;
            }
        }

        self.trails.clear();
        self.broadcast_state();
    }

    /// Zero the scores, then reset the round
    pub fn reset_game(&mut self) {
        info!("Resetting game");
        self.scores.reset();
        self.reset_round();
    }

    /// Send a fresh snapshot to every subscriber
    pub fn broadcast_state(&mut self) {
        let snapshot =
            self.snapshot_builder
                .build(self.tick, &self.players, &self.trails, self.scores);
        // No subscribers is fine: nobody is watching yet
        let _ = self.outbox.send(snapshot);
    }

    pub fn snapshots_sent(&self) -> u64 {
        self.snapshot_builder.built()
    }
}
