use crate::grid::GridMap;
use crate::types::{Direction, Vec2};

/// Shared entity representation for the player and every ghost. The player
/// gets its pending direction from input, ghosts get their direction from a
/// policy; the movement rules below are identical for both.
#[derive(Clone, Debug)]
pub struct Agent {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub pending_dir: Direction,
    pub speed: f32,
}

impl Agent {
    pub fn new(spawn: Vec2, speed: f32) -> Self {
        Self {
            x: spawn.x as f32,
            y: spawn.y as f32,
            dir: Direction::None,
            pending_dir: Direction::None,
            speed,
        }
    }

    pub fn tile(&self, map: &GridMap) -> Vec2 {
        map.tile_at(self.x, self.y)
    }

    pub fn reset(&mut self, spawn: Vec2) {
        self.x = spawn.x as f32;
        self.y = spawn.y as f32;
        self.dir = Direction::None;
        self.pending_dir = Direction::None;
    }
}

/// Advances one agent by one tick.
///
/// A buffered direction is adopted as soon as the tile one step ahead of the
/// rounded current tile is open; it stays buffered otherwise, so a turn
/// requested before a junction takes effect on arrival. A move whose rounded
/// destination tile is a wall is dropped entirely for this tick, with the
/// direction retained so tunnel-hugging agents resume when the wall ends.
pub fn advance(agent: &mut Agent, map: &GridMap) {
    if !agent.pending_dir.is_none() {
        let tile = agent.tile(map);
        let (dx, dy) = agent.pending_dir.delta();
        if !map.is_wall(tile.x + dx, tile.y + dy) {
            agent.dir = agent.pending_dir;
        }
    }

    if agent.dir.is_none() {
        return;
    }

    let (dx, dy) = agent.dir.delta();
    let candidate_x = agent.x + dx as f32 * agent.speed;
    let candidate_y = agent.y + dy as f32 * agent.speed;

    if map.is_wall(candidate_x.round() as i32, candidate_y.round() as i32) {
        return;
    }

    let (x, y) = map.wrap_pos(candidate_x, candidate_y);
    agent.x = x;
    agent.y = y;
    debug_assert!(x >= 0.0 && x < map.width as f32 && y >= 0.0 && y < map.height as f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(raw: &[&str]) -> GridMap {
        let rows: Vec<String> = raw.iter().map(|row| row.to_string()).collect();
        GridMap::parse(raw[0].len() as i32, raw.len() as i32, &rows).expect("valid layout")
    }

    #[test]
    fn moves_by_speed_along_open_corridor() {
        let map = map(&["11111", "10001", "11111"]);
        let mut agent = Agent::new(Vec2::new(1, 1), 0.5);
        agent.dir = Direction::Right;

        advance(&mut agent, &map);
        assert_eq!(agent.x, 1.5);
        advance(&mut agent, &map);
        assert_eq!(agent.x, 2.0);
        assert_eq!(agent.y, 1.0);
    }

    #[test]
    fn wall_rejects_move_but_keeps_direction() {
        let map = map(&["11111", "10001", "11111"]);
        let mut agent = Agent::new(Vec2::new(3, 1), 0.5);
        agent.dir = Direction::Right;

        // 3.5 rounds to 4, which is a wall.
        advance(&mut agent, &map);
        assert_eq!(agent.x, 3.0);
        assert_eq!(agent.dir, Direction::Right);
    }

    #[test]
    fn pending_direction_is_adopted_only_when_open() {
        let map = map(&["11111", "10001", "10101", "10001", "11111"]);
        let mut agent = Agent::new(Vec2::new(1, 1), 1.0);
        agent.dir = Direction::Right;
        agent.pending_dir = Direction::Down;

        // Down from (1,1) is open: turn immediately.
        advance(&mut agent, &map);
        assert_eq!(agent.dir, Direction::Down);
        assert_eq!((agent.x, agent.y), (1.0, 2.0));

        advance(&mut agent, &map);
        assert_eq!((agent.x, agent.y), (1.0, 3.0));

        agent.pending_dir = Direction::Down;
        advance(&mut agent, &map);
        // (1,4) is a wall: both the pending turn and the move are rejected.
        assert_eq!((agent.x, agent.y), (1.0, 3.0));
        assert_eq!(agent.dir, Direction::Down);
    }

    #[test]
    fn buffered_turn_fires_at_the_junction() {
        let map = map(&["11111", "00000", "11011", "11011", "11111"]);
        let mut agent = Agent::new(Vec2::new(0, 1), 1.0);
        agent.dir = Direction::Right;
        agent.pending_dir = Direction::Down;

        advance(&mut agent, &map); // (1,1), down still walled
        assert_eq!(agent.dir, Direction::Right);
        advance(&mut agent, &map); // (2,1), still walled below
        assert_eq!(agent.dir, Direction::Right);
        advance(&mut agent, &map); // junction at (2,1): adopt down
        assert_eq!(agent.dir, Direction::Down);
        assert_eq!((agent.x, agent.y), (2.0, 2.0));
    }

    #[test]
    fn crossing_the_edge_wraps_to_the_opposite_side() {
        let map = map(&["11111", "00000", "11111"]);
        let mut agent = Agent::new(Vec2::new(0, 1), 0.5);
        agent.dir = Direction::Left;

        advance(&mut agent, &map);
        assert_eq!((agent.x, agent.y), (4.5, 1.0));
        advance(&mut agent, &map);
        assert_eq!(agent.x, 4.0);
    }

    #[test]
    fn idle_agent_stays_put() {
        let map = map(&["111", "101", "111"]);
        let mut agent = Agent::new(Vec2::new(1, 1), 0.5);
        advance(&mut agent, &map);
        assert_eq!((agent.x, agent.y), (1.0, 1.0));
        assert_eq!(agent.dir, Direction::None);
    }
}
