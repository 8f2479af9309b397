use std::collections::{BTreeMap, HashSet};

use crate::constants::{DEFAULT_PELLET_COUNT, GHOST_BASE_SPEED, PLAYER_BASE_SPEED};
use crate::rng::Rng;
use crate::types::{
    CollectibleKind, CollectibleView, ConfigError, GameConfig, GhostPolicy, GhostSpawn, Vec2,
};

/// Static wall layout plus the mutable collectible set for the current
/// level. All boundary traversal goes through the wrap helpers; there is no
/// explicit tunnel tile type.
#[derive(Clone, Debug)]
pub struct GridMap {
    pub width: i32,
    pub height: i32,
    walls: HashSet<(i32, i32)>,
    collectibles: BTreeMap<(i32, i32), CollectibleKind>,
}

impl GridMap {
    /// Walls are `'1'` or `'#'`; any other character is floor.
    pub fn parse(width: i32, height: i32, rows: &[String]) -> Result<Self, ConfigError> {
        if width <= 0 || height <= 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        if rows.len() != height as usize {
            return Err(ConfigError::LayoutRowCount {
                rows: rows.len(),
                expected: height as usize,
            });
        }

        let mut walls = HashSet::new();
        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width as usize {
                return Err(ConfigError::LayoutRowWidth {
                    row: y,
                    len,
                    expected: width as usize,
                });
            }
            for (x, tile) in row.chars().enumerate() {
                if tile == '1' || tile == '#' {
                    walls.insert((x as i32, y as i32));
                }
            }
        }

        Ok(Self {
            width,
            height,
            walls,
            collectibles: BTreeMap::new(),
        })
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn wrap_tile(&self, x: i32, y: i32) -> (i32, i32) {
        (x.rem_euclid(self.width), y.rem_euclid(self.height))
    }

    pub fn wrap_pos(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x.rem_euclid(self.width as f32),
            y.rem_euclid(self.height as f32),
        )
    }

    /// Rounded tile under a continuous position, wrapped into range.
    pub fn tile_at(&self, x: f32, y: f32) -> Vec2 {
        let (tx, ty) = self.wrap_tile(x.round() as i32, y.round() as i32);
        Vec2::new(tx, ty)
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.walls.contains(&self.wrap_tile(x, y))
    }

    pub fn collectible_at(&self, x: i32, y: i32) -> Option<CollectibleKind> {
        self.collectibles.get(&self.wrap_tile(x, y)).copied()
    }

    pub fn remove_collectible(&mut self, x: i32, y: i32) -> Option<CollectibleKind> {
        let key = self.wrap_tile(x, y);
        self.collectibles.remove(&key)
    }

    pub fn collectibles_left(&self) -> usize {
        self.collectibles.len()
    }

    /// Explicit placement used for configured collectible lists. Unlike the
    /// query path this does not wrap: a coordinate outside the map is a
    /// configuration mistake, not a tunnel crossing.
    pub fn place_collectible(
        &mut self,
        x: i32,
        y: i32,
        kind: CollectibleKind,
    ) -> Result<(), ConfigError> {
        if !self.in_bounds(x, y) {
            return Err(ConfigError::CollectibleOutOfBounds { x, y });
        }
        if self.walls.contains(&(x, y)) {
            return Err(ConfigError::CollectibleOnWall { x, y });
        }
        self.collectibles.insert((x, y), kind);
        Ok(())
    }

    /// Repopulates the collectible set: a dot on every floor tile except the
    /// excluded spawn tiles, then `pellet_count` of them upgraded to pellets
    /// by the given stream.
    pub fn seed_collectibles(&mut self, rng: &mut Rng, pellet_count: usize, exclude: &[Vec2]) {
        self.collectibles.clear();
        let excluded: HashSet<(i32, i32)> = exclude.iter().map(|cell| (cell.x, cell.y)).collect();

        let mut cells = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.walls.contains(&(x, y)) || excluded.contains(&(x, y)) {
                    continue;
                }
                self.collectibles.insert((x, y), CollectibleKind::Dot);
                cells.push((x, y));
            }
        }

        for _ in 0..pellet_count {
            if cells.is_empty() {
                break;
            }
            let idx = rng.pick_index(cells.len());
            let cell = cells.swap_remove(idx);
            self.collectibles.insert(cell, CollectibleKind::Pellet);
        }
    }

    pub fn collectible_views(&self) -> Vec<CollectibleView> {
        self.collectibles
            .iter()
            .map(|(&(x, y), &kind)| CollectibleView { x, y, kind })
            .collect()
    }

    /// Wall rows for adapters, `'#'` wall and `'.'` floor.
    pub fn tile_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.walls.contains(&(x, y)) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }
}

/// Default maze: bordered, interior
/// pillars every four tiles, and tunnel openings in the middle of each edge.
pub fn standard_layout(width: i32, height: i32) -> Vec<String> {
    (0..height)
        .map(|y| {
            (0..width)
                .map(|x| {
                    let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                    let tunnel = (y == height / 2 && (x == 0 || x == width - 1))
                        || (x == width / 2 && (y == 0 || y == height - 1));
                    let pillar = !border && x % 4 == 0 && y % 4 == 0;
                    if (border && !tunnel) || pillar {
                        '1'
                    } else {
                        '0'
                    }
                })
                .collect()
        })
        .collect()
}

/// Ready-to-run configuration on the standard layout: one ghost of each
/// policy near the center, player in the lower half.
pub fn standard_config(rng_seed: u32) -> GameConfig {
    let width = 21;
    let height = 21;
    GameConfig {
        width,
        height,
        wall_layout: standard_layout(width, height),
        player_spawn: Vec2::new(10, 15),
        ghosts: vec![
            GhostSpawn {
                x: 9,
                y: 9,
                policy: GhostPolicy::RandomWalk,
            },
            GhostSpawn {
                x: 10,
                y: 9,
                policy: GhostPolicy::Probabilistic { chase_chance: 0.5 },
            },
            GhostSpawn {
                x: 11,
                y: 9,
                policy: GhostPolicy::Greedy,
            },
        ],
        player_speed: PLAYER_BASE_SPEED,
        ghost_speed: GHOST_BASE_SPEED,
        pellet_count: DEFAULT_PELLET_COUNT,
        collectibles: None,
        collectible_seed: rng_seed.wrapping_mul(0x85eb_ca6b).wrapping_add(1),
        rng_seed,
        initial_high_score: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|row| row.to_string()).collect()
    }

    #[test]
    fn parse_rejects_dimension_mismatches() {
        assert_eq!(
            GridMap::parse(0, 3, &rows(&["111", "111", "111"])).err(),
            Some(ConfigError::InvalidDimensions { width: 0, height: 3 })
        );
        assert_eq!(
            GridMap::parse(3, 3, &rows(&["111", "111"])).err(),
            Some(ConfigError::LayoutRowCount { rows: 2, expected: 3 })
        );
        assert_eq!(
            GridMap::parse(3, 3, &rows(&["111", "11", "111"])).err(),
            Some(ConfigError::LayoutRowWidth {
                row: 1,
                len: 2,
                expected: 3
            })
        );
    }

    #[test]
    fn wall_queries_normalize_across_the_boundary() {
        let map = GridMap::parse(3, 3, &rows(&["101", "000", "101"])).expect("valid layout");
        assert!(map.is_wall(0, 0));
        assert!(!map.is_wall(1, 0));
        // One step past the right edge lands on column 0.
        assert!(map.is_wall(3, 0));
        assert!(map.is_wall(-1, 2));
        assert!(!map.is_wall(1, -2));
    }

    #[test]
    fn wrap_pos_keeps_positions_in_range() {
        let map = GridMap::parse(4, 4, &rows(&["0000"; 4])).expect("valid layout");
        let (x, y) = map.wrap_pos(-0.5, 4.25);
        assert!((x - 3.5).abs() < 1e-6);
        assert!((y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn place_collectible_validates_bounds_and_walls() {
        let mut map = GridMap::parse(3, 3, &rows(&["111", "100", "111"])).expect("valid layout");
        assert_eq!(
            map.place_collectible(5, 1, CollectibleKind::Dot),
            Err(ConfigError::CollectibleOutOfBounds { x: 5, y: 1 })
        );
        assert_eq!(
            map.place_collectible(0, 0, CollectibleKind::Dot),
            Err(ConfigError::CollectibleOnWall { x: 0, y: 0 })
        );
        assert_eq!(map.place_collectible(1, 1, CollectibleKind::Pellet), Ok(()));
        assert_eq!(map.collectible_at(1, 1), Some(CollectibleKind::Pellet));
    }

    #[test]
    fn seeding_skips_spawns_and_upgrades_pellets() {
        let mut map =
            GridMap::parse(4, 4, &rows(&["1111", "1001", "1001", "1111"])).expect("valid layout");
        let mut rng = Rng::new(9);
        map.seed_collectibles(&mut rng, 2, &[Vec2::new(1, 1)]);

        assert_eq!(map.collectible_at(1, 1), None);
        assert_eq!(map.collectibles_left(), 3);
        let pellets = map
            .collectible_views()
            .iter()
            .filter(|view| view.kind == CollectibleKind::Pellet)
            .count();
        assert_eq!(pellets, 2);
    }

    #[test]
    fn removal_is_single_shot() {
        let mut map = GridMap::parse(3, 1, &rows(&["000"])).expect("valid layout");
        map.place_collectible(2, 0, CollectibleKind::Dot)
            .expect("placement in bounds");
        assert_eq!(map.remove_collectible(2, 0), Some(CollectibleKind::Dot));
        assert_eq!(map.remove_collectible(2, 0), None);
    }

    #[test]
    fn standard_layout_has_open_tunnels_and_valid_spawns() {
        let config = standard_config(7);
        let map = GridMap::parse(config.width, config.height, &config.wall_layout)
            .expect("standard layout parses");

        assert!(!map.is_wall(0, config.height / 2));
        assert!(!map.is_wall(config.width - 1, config.height / 2));
        assert!(!map.is_wall(config.width / 2, 0));
        assert!(!map.is_wall(config.width / 2, config.height - 1));
        assert!(map.is_wall(0, 0));

        assert!(!map.is_wall(config.player_spawn.x, config.player_spawn.y));
        for ghost in &config.ghosts {
            assert!(!map.is_wall(ghost.x, ghost.y));
        }
    }
}
