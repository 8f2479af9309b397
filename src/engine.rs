use crate::agent::{advance, Agent};
use crate::constants::ghost_speed_for_level;
use crate::grid::GridMap;
use crate::policy::{decide, GhostState};
use crate::rng::Rng;
use crate::types::{
    CollectibleKind, ConfigError, Direction, GameConfig, GameEvent, GameSummary, GhostView,
    MapInit, Phase, PlayerView, Snapshot, Vec2,
};

/// Tick-driven game state: map, agents, score and phase. The engine reads no
/// wall clock and draws no randomness outside its seeded streams, so a config
/// plus an input sequence fully determines every snapshot.
#[derive(Clone, Debug)]
pub struct GameEngine {
    config: GameConfig,
    map: GridMap,
    player: Agent,
    ghosts: Vec<GhostState>,
    score: u32,
    high_score: u32,
    level: u32,
    phase: Phase,
    tick_counter: u64,
    events: Vec<GameEvent>,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        validate_speed(config.player_speed)?;
        validate_speed(config.ghost_speed)?;

        let mut map = GridMap::parse(config.width, config.height, &config.wall_layout)?;
        validate_spawn(&map, config.player_spawn.x, config.player_spawn.y)?;
        for ghost in &config.ghosts {
            validate_spawn(&map, ghost.x, ghost.y)?;
        }

        populate_collectibles(&mut map, &config, 1)?;
        if map.collectibles_left() == 0 {
            return Err(ConfigError::NoCollectibles);
        }

        let player = Agent::new(config.player_spawn, config.player_speed);
        let ghosts = config
            .ghosts
            .iter()
            .enumerate()
            .map(|(index, spawn)| {
                GhostState::new(
                    Vec2::new(spawn.x, spawn.y),
                    spawn.policy,
                    config.ghost_speed,
                    Rng::stream(config.rng_seed, index as u32),
                )
            })
            .collect();

        Ok(Self {
            high_score: config.initial_high_score,
            config,
            map,
            player,
            ghosts,
            score: 0,
            level: 1,
            phase: Phase::Running,
            tick_counter: 0,
            events: Vec::new(),
        })
    }

    /// Runs one simulation step. Game-over state is frozen: nothing moves,
    /// nothing is returned.
    pub fn tick(&mut self, input: Option<Direction>) -> Vec<GameEvent> {
        if self.phase == Phase::GameOver {
            return Vec::new();
        }
        self.tick_counter += 1;

        if let Some(dir) = input {
            self.player.pending_dir = dir;
        }

        advance(&mut self.player, &self.map);
        let player_tile = self.player.tile(&self.map);
        for ghost in &mut self.ghosts {
            ghost.agent.dir = decide(
                &ghost.agent,
                ghost.policy,
                player_tile,
                &self.map,
                &mut ghost.rng,
            );
            advance(&mut ghost.agent, &self.map);
        }

        let events = self.resolve_collisions();
        self.events.extend(events.iter().cloned());
        events
    }

    fn resolve_collisions(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let player_tile = self.player.tile(&self.map);

        if let Some(kind) = self
            .map
            .remove_collectible(player_tile.x, player_tile.y)
        {
            self.score += kind.points();
            self.high_score = self.high_score.max(self.score);
            events.push(match kind {
                CollectibleKind::Dot => GameEvent::DotEaten {
                    x: player_tile.x,
                    y: player_tile.y,
                },
                CollectibleKind::Pellet => GameEvent::PelletEaten {
                    x: player_tile.x,
                    y: player_tile.y,
                },
            });
        }

        for (index, ghost) in self.ghosts.iter().enumerate() {
            if ghost.agent.tile(&self.map) == player_tile {
                self.phase = Phase::GameOver;
                events.push(GameEvent::GhostCollision { ghost: index });
            }
        }

        if self.phase == Phase::Running && self.map.collectibles_left() == 0 {
            self.phase = Phase::LevelComplete;
            events.push(GameEvent::LevelComplete { level: self.level });
            self.advance_level();
        }

        events
    }

    /// Level transition: one more ghost, faster ghosts, fresh collectibles,
    /// everyone back to spawn. Resumes running within the same tick.
    fn advance_level(&mut self) {
        self.level += 1;

        if !self.config.ghosts.is_empty() {
            let index = self.ghosts.len();
            let template = self.config.ghosts[index % self.config.ghosts.len()];
            self.ghosts.push(GhostState::new(
                Vec2::new(template.x, template.y),
                template.policy,
                self.config.ghost_speed,
                Rng::stream(self.config.rng_seed, index as u32),
            ));
        }

        let ghost_speed = ghost_speed_for_level(self.config.ghost_speed, self.level);
        for ghost in &mut self.ghosts {
            ghost.agent.speed = ghost_speed;
            let spawn = ghost.spawn;
            ghost.agent.reset(spawn);
        }
        self.player.reset(self.config.player_spawn);

        // Placements were validated at construction, repopulation cannot fail.
        let _ = populate_collectibles(&mut self.map, &self.config, self.level);
        self.phase = Phase::Running;
    }

    /// Rebuilds level 1 from the construction-time config. The high score survives;
    /// everything else starts over.
    pub fn restart(&mut self) {
        let high_score = self.high_score;
        match Self::new(self.config.clone()) {
            Ok(mut fresh) => {
                fresh.high_score = fresh.high_score.max(high_score);
                *self = fresh;
            }
            Err(error) => {
                // The config was validated when this engine was built.
                debug_assert!(false, "validated config failed to rebuild: {error}");
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn collectibles_left(&self) -> usize {
        self.map.collectibles_left()
    }

    pub fn player_view(&self) -> PlayerView {
        PlayerView {
            x: self.player.x,
            y: self.player.y,
            dir: self.player.dir,
            pending_dir: self.player.pending_dir,
        }
    }

    pub fn ghost_views(&self) -> Vec<GhostView> {
        self.ghosts
            .iter()
            .enumerate()
            .map(|(id, ghost)| GhostView {
                id,
                x: ghost.agent.x,
                y: ghost.agent.y,
                dir: ghost.agent.dir,
                policy: ghost.policy,
            })
            .collect()
    }

    /// Current state for adapters. Drains the events accumulated since the
    /// previous snapshot, so a driver polling at tick rate sees each event
    /// exactly once.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            phase: self.phase,
            level: self.level,
            score: self.score,
            high_score: self.high_score,
            collectibles_left: self.map.collectibles_left(),
            player: self.player_view(),
            ghosts: self.ghost_views(),
            events: std::mem::take(&mut self.events),
        }
    }

    /// Static map description, resent after every level transition.
    pub fn map_init(&self) -> MapInit {
        MapInit {
            width: self.map.width,
            height: self.map.height,
            tiles: self.map.tile_rows(),
            collectibles: self.map.collectible_views(),
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            score: self.score,
            high_score: self.high_score,
            level: self.level,
            ticks: self.tick_counter,
        }
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }
}

fn validate_speed(speed: f32) -> Result<(), ConfigError> {
    if speed > 0.0 && speed <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::SpeedOutOfRange { speed })
    }
}

fn validate_spawn(map: &GridMap, x: i32, y: i32) -> Result<(), ConfigError> {
    if !map.in_bounds(x, y) {
        return Err(ConfigError::SpawnOutOfBounds { x, y });
    }
    if map.is_wall(x, y) {
        return Err(ConfigError::SpawnOnWall { x, y });
    }
    Ok(())
}

fn populate_collectibles(
    map: &mut GridMap,
    config: &GameConfig,
    level: u32,
) -> Result<(), ConfigError> {
    match &config.collectibles {
        Some(placements) => {
            for placement in placements {
                map.place_collectible(placement.x, placement.y, placement.kind)?;
            }
            Ok(())
        }
        None => {
            let mut exclude = vec![config.player_spawn];
            exclude.extend(config.ghosts.iter().map(|g| Vec2::new(g.x, g.y)));
            let mut rng = if level <= 1 {
                Rng::new(config.collectible_seed)
            } else {
                Rng::stream(config.collectible_seed, level)
            };
            map.seed_collectibles(&mut rng, config.pellet_count, &exclude);
            Ok(())
        }
    }
}
