//! Snapshot building for network transmission

use std::collections::BTreeMap;

use crate::ws::protocol::{PlayerSnapshot, Scores, ServerMsg};

use super::{Player, PlayerId, Trails};

/// Builds the full outward projection of the arena.
///
/// Snapshots are recomputed from scratch on every broadcast; nothing is
/// diffed against the previous one.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    /// Snapshots built since startup
    built: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot message
    pub fn build(
        &mut self,
        tick: u64,
        players: &BTreeMap<PlayerId, Player>,
        trails: &Trails,
        scores: Scores,
    ) -> ServerMsg {
        let players = players
            .values()
            .map(|p| {
                (
                    p.id.clone(),
                    PlayerSnapshot {
                        name: p.name.clone(),
                        position: p.position,
                        direction: p.direction,
                        color: p.color.clone(),
                        team: p.team,
                        is_ai: p.is_ai(),
                    },
                )
            })
            .collect();

        self.built += 1;

        ServerMsg::StateSnapshot {
            tick,
            players,
            trails: trails.to_snapshot(),
            scores,
        }
    }

    pub fn built(&self) -> u64 {
        self.built
    }
}
