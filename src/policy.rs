use crate::agent::Agent;
use crate::constants::reroll_chance;
use crate::grid::GridMap;
use crate::rng::Rng;
use crate::types::{Direction, GhostPolicy, Vec2};

/// A ghost is an ordinary agent plus a decision policy and a private RNG
/// stream, so replays with the same seed are reproducible per ghost.
#[derive(Clone, Debug)]
pub struct GhostState {
    pub agent: Agent,
    pub policy: GhostPolicy,
    pub spawn: Vec2,
    pub rng: Rng,
}

impl GhostState {
    pub fn new(spawn: Vec2, policy: GhostPolicy, speed: f32, rng: Rng) -> Self {
        Self {
            agent: Agent::new(spawn, speed),
            policy,
            spawn,
            rng,
        }
    }
}

/// Picks a ghost's direction for this tick.
///
/// The ghost keeps its direction unless it is about to hit a wall, has no
/// direction yet, or a per-tick draw fires. The draw is taken every call so
/// the RNG stream advances at a uniform rate regardless of the maze around
/// the ghost.
pub fn decide(
    agent: &Agent,
    policy: GhostPolicy,
    player_tile: Vec2,
    map: &GridMap,
    rng: &mut Rng,
) -> Direction {
    let tile = agent.tile(map);
    let (dx, dy) = agent.dir.delta();
    let blocked = agent.dir.is_none() || map.is_wall(tile.x + dx, tile.y + dy);
    let reroll = rng.chance(reroll_chance(policy));
    if !blocked && !reroll {
        return agent.dir;
    }

    let candidates = candidate_directions(tile, agent.dir, map);
    if candidates.is_empty() {
        // Boxed in on all four sides; movement will no-op anyway.
        return agent.dir;
    }

    match policy {
        GhostPolicy::RandomWalk => candidates[rng.pick_index(candidates.len())],
        GhostPolicy::Greedy => greedy_pick(&candidates, tile, player_tile, map),
        GhostPolicy::Probabilistic { chase_chance } => {
            if rng.chance(chase_chance) {
                greedy_pick(&candidates, tile, player_tile, map)
            } else {
                candidates[rng.pick_index(candidates.len())]
            }
        }
    }
}

/// Open directions excluding the direct reversal, unless the reversal is the
/// only way out (dead end).
fn candidate_directions(tile: Vec2, current: Direction, map: &GridMap) -> Vec<Direction> {
    let reverse = current.reversed();
    let mut out = Vec::new();
    for dir in Direction::AXES {
        if dir == reverse && !current.is_none() {
            continue;
        }
        let (dx, dy) = dir.delta();
        if !map.is_wall(tile.x + dx, tile.y + dy) {
            out.push(dir);
        }
    }

    if out.is_empty() && !current.is_none() {
        let (dx, dy) = reverse.delta();
        if !map.is_wall(tile.x + dx, tile.y + dy) {
            out.push(reverse);
        }
    }
    out
}

/// Minimizes squared Euclidean distance to the player's tile. Candidates
/// arrive in the fixed up/down/left/right order and ties keep the first, so
/// the choice is deterministic.
fn greedy_pick(
    candidates: &[Direction],
    tile: Vec2,
    player_tile: Vec2,
    map: &GridMap,
) -> Direction {
    let mut best = candidates[0];
    let mut best_dist = i64::MAX;
    for &dir in candidates {
        let (dx, dy) = dir.delta();
        let (tx, ty) = map.wrap_tile(tile.x + dx, tile.y + dy);
        let ddx = (tx - player_tile.x) as i64;
        let ddy = (ty - player_tile.y) as i64;
        let dist = ddx * ddx + ddy * ddy;
        if dist < best_dist {
            best_dist = dist;
            best = dir;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(raw: &[&str]) -> GridMap {
        let rows: Vec<String> = raw.iter().map(|row| row.to_string()).collect();
        GridMap::parse(raw[0].len() as i32, raw.len() as i32, &rows).expect("valid layout")
    }

    fn plaza() -> GridMap {
        map(&[
            "1111111", "1000001", "1000001", "1000001", "1000001", "1000001", "1111111",
        ])
    }

    fn agent_at(x: i32, y: i32, dir: Direction) -> Agent {
        let mut agent = Agent::new(Vec2::new(x, y), 0.5);
        agent.dir = dir;
        agent
    }

    #[test]
    fn greedy_moves_toward_the_player() {
        let map = plaza();
        let agent = agent_at(3, 3, Direction::None);
        let mut rng = Rng::new(1);
        // Player straight below; down is strictly closest.
        let dir = decide(
            &agent,
            GhostPolicy::Greedy,
            Vec2::new(3, 5),
            &map,
            &mut rng,
        );
        assert_eq!(dir, Direction::Down);
    }

    #[test]
    fn greedy_breaks_ties_in_fixed_priority_order() {
        let map = plaza();
        let agent = agent_at(3, 3, Direction::None);
        // Player on the ghost's own tile: all four candidates tie, the
        // up/down/left/right priority keeps up.
        for seed in 0..20 {
            let mut rng = Rng::new(seed);
            let dir = decide(
                &agent,
                GhostPolicy::Greedy,
                Vec2::new(3, 3),
                &map,
                &mut rng,
            );
            assert_eq!(dir, Direction::Up);
        }
    }

    #[test]
    fn reevaluation_never_reverses_outside_dead_ends() {
        let map = plaza();
        for seed in 0..200 {
            let mut rng = Rng::new(seed);
            let agent = agent_at(3, 3, Direction::Right);
            let dir = decide(
                &agent,
                GhostPolicy::RandomWalk,
                Vec2::new(1, 1),
                &map,
                &mut rng,
            );
            assert_ne!(dir, Direction::Left, "seed {seed} reversed in the open");
        }
    }

    #[test]
    fn dead_end_permits_the_reversal() {
        // Pocket above the corridor: the only exit from (1,1) is back down.
        let map = map(&["111111", "101111", "100001", "111111"]);
        let agent = agent_at(1, 1, Direction::Up);
        for seed in 0..50 {
            let mut rng = Rng::new(seed);
            let dir = decide(
                &agent,
                GhostPolicy::RandomWalk,
                Vec2::new(4, 2),
                &map,
                &mut rng,
            );
            assert_eq!(dir, Direction::Down);
        }
    }

    #[test]
    fn unblocked_ghost_mostly_keeps_its_direction() {
        let map = plaza();
        let agent = agent_at(3, 3, Direction::Right);
        let mut rng = Rng::new(77);
        let mut kept = 0;
        for _ in 0..200 {
            if decide(
                &agent,
                GhostPolicy::RandomWalk,
                Vec2::new(1, 1),
                &map,
                &mut rng,
            ) == Direction::Right
            {
                kept += 1;
            }
        }
        // Reroll chance is 0.04; even counting rerolls that re-pick right,
        // far more than half of the calls must keep the direction.
        assert!(kept > 150, "kept={kept}");
    }

    #[test]
    fn probabilistic_with_full_chase_chance_acts_greedy() {
        let map = plaza();
        // Direction none forces re-evaluation on every call.
        let agent = agent_at(3, 3, Direction::None);
        for seed in 0..50 {
            let mut rng = Rng::new(seed);
            let dir = decide(
                &agent,
                GhostPolicy::Probabilistic { chase_chance: 1.0 },
                Vec2::new(5, 3),
                &map,
                &mut rng,
            );
            assert_eq!(dir, Direction::Right);
        }
    }

    #[test]
    fn fully_boxed_ghost_keeps_direction_and_stays() {
        let map = map(&["111", "101", "111"]);
        let agent = agent_at(1, 1, Direction::Up);
        let mut rng = Rng::new(3);
        let dir = decide(
            &agent,
            GhostPolicy::Greedy,
            Vec2::new(1, 1),
            &map,
            &mut rng,
        );
        assert_eq!(dir, Direction::Up);
    }
}
