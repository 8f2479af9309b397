use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub const AXES: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Unit vector in tile coordinates. y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Dot,
    Pellet,
}

impl CollectibleKind {
    pub fn points(self) -> u32 {
        match self {
            Self::Dot => 10,
            Self::Pellet => 50,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Running,
    GameOver,
    LevelComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostPolicy {
    RandomWalk,
    Greedy,
    Probabilistic { chase_chance: f32 },
}

impl GhostPolicy {
    /// CLI form: `random_walk`, `greedy`, or `probabilistic:<p>`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "random_walk" => Some(Self::RandomWalk),
            "greedy" => Some(Self::Greedy),
            _ => {
                let raw = value.strip_prefix("probabilistic:")?;
                let chase_chance: f32 = raw.parse().ok()?;
                if !(0.0..=1.0).contains(&chase_chance) {
                    return None;
                }
                Some(Self::Probabilistic { chase_chance })
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GhostSpawn {
    pub x: i32,
    pub y: i32,
    pub policy: GhostPolicy,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CollectiblePlacement {
    pub x: i32,
    pub y: i32,
    pub kind: CollectibleKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    #[serde(rename = "wallLayout")]
    pub wall_layout: Vec<String>,
    #[serde(rename = "playerSpawn")]
    pub player_spawn: Vec2,
    pub ghosts: Vec<GhostSpawn>,
    #[serde(rename = "playerSpeed")]
    pub player_speed: f32,
    #[serde(rename = "ghostSpeed")]
    pub ghost_speed: f32,
    /// Number of dots upgraded to pellets when collectibles are seeded.
    #[serde(rename = "pelletCount", default)]
    pub pellet_count: usize,
    /// Explicit placements override seeded population entirely.
    #[serde(default)]
    pub collectibles: Option<Vec<CollectiblePlacement>>,
    #[serde(rename = "collectibleSeed")]
    pub collectible_seed: u32,
    #[serde(rename = "rngSeed")]
    pub rng_seed: u32,
    #[serde(rename = "initialHighScore", default)]
    pub initial_high_score: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("map dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("wall layout has {rows} rows, expected {expected}")]
    LayoutRowCount { rows: usize, expected: usize },
    #[error("wall layout row {row} has {len} tiles, expected {expected}")]
    LayoutRowWidth {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("collectible out of bounds at ({x}, {y})")]
    CollectibleOutOfBounds { x: i32, y: i32 },
    #[error("collectible inside a wall at ({x}, {y})")]
    CollectibleOnWall { x: i32, y: i32 },
    #[error("spawn out of bounds at ({x}, {y})")]
    SpawnOutOfBounds { x: i32, y: i32 },
    #[error("spawn coincides with a wall at ({x}, {y})")]
    SpawnOnWall { x: i32, y: i32 },
    #[error("agent speed {speed} outside (0, 1] tiles per tick")]
    SpeedOutOfRange { speed: f32 },
    #[error("layout leaves no collectible to consume")]
    NoCollectibles,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    DotEaten { x: i32, y: i32 },
    PelletEaten { x: i32, y: i32 },
    GhostCollision { ghost: usize },
    LevelComplete { level: u32 },
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "pendingDir")]
    pub pending_dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub policy: GhostPolicy,
}

#[derive(Clone, Debug, Serialize)]
pub struct CollectibleView {
    pub x: i32,
    pub y: i32,
    pub kind: CollectibleKind,
}

/// Static map description sent to adapters once per level.
#[derive(Clone, Debug, Serialize)]
pub struct MapInit {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    pub collectibles: Vec<CollectibleView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: Phase,
    pub level: u32,
    pub score: u32,
    #[serde(rename = "highScore")]
    pub high_score: u32,
    #[serde(rename = "collectiblesLeft")]
    pub collectibles_left: usize,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<GameEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub score: u32,
    #[serde(rename = "highScore")]
    pub high_score: u32,
    pub level: u32,
    pub ticks: u64,
}
