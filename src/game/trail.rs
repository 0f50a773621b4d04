//! Per-team trail history and trail collision

use crate::ws::protocol::{Team, TeamTrails};

use super::Vector3;

/// Positions each team has occupied during the current round, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trails {
    blue: Vec<Vector3>,
    orange: Vec<Vector3>,
}

impl Trails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, team: Team) -> &[Vector3] {
        match team {
            Team::Blue => &self.blue,
            Team::Orange => &self.orange,
        }
    }

    /// Append a point to the team's trail
    pub fn record(&mut self, team: Team, position: Vector3) {
        match team {
            Team::Blue => self.blue.push(position),
            Team::Orange => self.orange.push(position),
        }
    }

    /// True if `position` lies exactly on the trail of `team`'s opponent.
    /// A team's own trail is never a hazard to it.
    pub fn collides(&self, position: Vector3, team: Team) -> bool {
        self.get(team.opponent()).iter().any(|point| *point == position)
    }

    pub fn clear(&mut self) {
        self.blue.clear();
        self.orange.clear();
    }

    /// Total points over both teams
    pub fn len(&self) -> usize {
        self.blue.len() + self.orange.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_snapshot(&self) -> TeamTrails {
        TeamTrails {
            blue: self.blue.clone(),
            orange: self.orange.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut trails = Trails::new();
        let points = [
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(1.0, 0.0, 2.0),
        ];
        for point in points {
            trails.record(Team::Blue, point);
        }

        assert_eq!(trails.get(Team::Blue), &points);
        assert!(trails.get(Team::Orange).is_empty());
        assert_eq!(trails.len(), 3);
    }

    #[test]
    fn test_collides_with_enemy_trail_only() {
        let mut trails = Trails::new();
        let point = Vector3::new(4.0, 0.0, -2.0);
        trails.record(Team::Blue, point);

        assert!(trails.collides(point, Team::Orange));
        assert!(!trails.collides(point, Team::Blue));
    }

    #[test]
    fn test_collision_requires_exact_equality() {
        let mut trails = Trails::new();
        trails.record(Team::Orange, Vector3::new(1.0, 0.0, 1.0));

        assert!(!trails.collides(Vector3::new(1.0, 0.0, 1.0001), Team::Blue));
        assert!(!trails.collides(Vector3::new(1.0, 1.0, 1.0), Team::Blue));
        assert!(trails.collides(Vector3::new(1.0, 0.0, 1.0), Team::Blue));
    }

    #[test]
    fn test_clear_empties_both_teams() {
        let mut trails = Trails::new();
        trails.record(Team::Blue, Vector3::ZERO);
        trails.record(Team::Orange, Vector3::FORWARD);

        trails.clear();

        assert!(trails.is_empty());
        assert!(!trails.collides(Vector3::ZERO, Team::Orange));
    }

    #[test]
    fn test_snapshot_copies_both_trails() {
        let mut trails = Trails::new();
        trails.record(Team::Blue, Vector3::ZERO);
        trails.record(Team::Orange, Vector3::FORWARD);

        let snapshot = trails.to_snapshot();
        assert_eq!(snapshot.blue, vec![Vector3::ZERO]);
        assert_eq!(snapshot.orange, vec![Vector3::FORWARD]);
    }
}
