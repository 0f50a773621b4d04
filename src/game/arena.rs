//! Arena task and authoritative tick loop

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::GameConfig;
use crate::util::time::Timer;
use crate::ws::protocol::{MoveDirection, ServerMsg};

use super::state::ArenaState;
use super::{GameError, PlayerId};

/// Commands serialized into the arena task
#[derive(Debug)]
pub enum ArenaCommand {
    Join {
        connection_id: PlayerId,
        name: String,
        reply: oneshot::Sender<Result<PlayerId, GameError>>,
    },
    Move {
        connection_id: PlayerId,
        direction: MoveDirection,
    },
    Disconnect {
        connection_id: PlayerId,
    },
}

/// Counters published by the arena task for the health endpoint
#[derive(Debug, Default)]
pub struct ArenaStats {
    player_count: AtomicUsize,
    tick: AtomicU64,
}

impl ArenaStats {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    command_tx: mpsc::Sender<ArenaCommand>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    stats: Arc<ArenaStats>,
}

impl ArenaHandle {
    /// Join with the connection's id; resolves to the new player's id
    pub async fn join(&self, connection_id: PlayerId, name: String) -> Result<PlayerId, GameError> {
        let (reply, response) = oneshot::channel();
        self.send(ArenaCommand::Join {
            connection_id,
            name,
            reply,
        })
        .await?;
        response.await.map_err(|_| GameError::ArenaClosed)?
    }

    pub async fn move_player(
        &self,
        connection_id: PlayerId,
        direction: MoveDirection,
    ) -> Result<(), GameError> {
        self.send(ArenaCommand::Move {
            connection_id,
            direction,
        })
        .await
    }

    pub async fn disconnect(&self, connection_id: PlayerId) -> Result<(), GameError> {
        self.send(ArenaCommand::Disconnect { connection_id }).await
    }

    /// Receive every broadcast (snapshots and game-over notifications)
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.snapshot_tx.subscribe()
    }

    /// Stop the tick driver
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn player_count(&self) -> usize {
        self.stats.player_count()
    }

    pub fn tick(&self) -> u64 {
        self.stats.tick()
    }

    async fn send(&self, command: ArenaCommand) -> Result<(), GameError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| GameError::ArenaClosed)
    }
}

/// The authoritative arena
pub struct GameArena {
    state: ArenaState,
    command_rx: mpsc::Receiver<ArenaCommand>,
    shutdown_rx: watch::Receiver<bool>,
    stats: Arc<ArenaStats>,
}

impl GameArena {
    /// Create the arena and the handle used to reach it
    pub fn new(config: GameConfig) -> (Self, ArenaHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(256);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(ArenaStats::default());

        let handle = ArenaHandle {
            command_tx,
            snapshot_tx: snapshot_tx.clone(),
            shutdown_tx: Arc::new(shutdown_tx),
            stats: stats.clone(),
        };

        let arena = Self {
            state: ArenaState::new(config, snapshot_tx),
            command_rx,
            shutdown_rx,
            stats,
        };

        (arena, handle)
    }

    /// Run the tick loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        let tick_duration = self.state.config().tick_interval;
        info!(tick_ms = tick_duration.as_millis() as u64, "Arena started");

        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    self.run_tick();
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            info!("All arena handles dropped");
                            break;
                        }
                    }
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Arena shutdown requested");
                        break;
                    }
                }
            }
        }

        info!(
            tick = self.state.tick,
            snapshots = self.state.snapshots_sent(),
            "Arena stopped"
        );
    }

    fn handle_command(&mut self, command: ArenaCommand) {
        match command {
            ArenaCommand::Join {
                connection_id,
                name,
                reply,
            } => {
                let result = self.state.join(&connection_id, &name);
                if let Err(e) = &result {
                    warn!(connection_id = %connection_id, error = %e, "Join rejected");
                }
                self.publish_stats();
                if reply.send(result).is_err() {
                    debug!(connection_id = %connection_id, "Join requester went away");
                }
            }
            ArenaCommand::Move {
                connection_id,
                direction,
            } => {
                self.state.apply_move(&connection_id, direction);
            }
            ArenaCommand::Disconnect { connection_id } => {
                self.state.disconnect(&connection_id);
                self.publish_stats();
                info!(connection_id = %connection_id, "Connection left the arena");
            }
        }
    }

    /// Run a single simulation tick. Failures are logged and the loop goes on.
    fn run_tick(&mut self) {
        let timer = Timer::new();

        match self.state.tick() {
            Ok(report) => {
                if let Some(team) = report.winner {
                    info!(team = %team, tick = self.state.tick, "Game over");
                }
                if !report.eliminated.is_empty() {
                    debug!(
                        tick = self.state.tick,
                        eliminated = report.eliminated.len(),
                        round_resets = report.round_resets,
                        "Eliminations this tick"
                    );
                }
            }
            Err(e) => {
                error!(tick = self.state.tick, error = %e, "Error updating arena state");
            }
        }

        self.publish_stats();

        let budget = self.state.config().tick_interval.as_micros() as u64;
        if timer.elapsed_micros() > budget {
            warn!(
                tick = self.state.tick,
                elapsed_micros = timer.elapsed_micros(),
                trail_points = self.state.trails.len(),
                "Tick overran its interval"
            );
        }
    }

    fn publish_stats(&self) {
        self.stats
            .player_count
            .store(self.state.players.len(), Ordering::Relaxed);
        self.stats.tick.store(self.state.tick, Ordering::Relaxed);
    }
}
