pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

/// Tiles per tick. Submultiples of one tile keep the rounded-tile collision
/// rule sound; anything above 1.0 is rejected at config validation.
pub const PLAYER_BASE_SPEED: f32 = 0.5;
pub const GHOST_BASE_SPEED: f32 = 0.25;
pub const MAX_AGENT_SPEED: f32 = 1.0;

/// Ghost speed gain applied per completed level, capped at MAX_AGENT_SPEED.
pub const LEVEL_SPEED_GAIN: f32 = 0.05;

pub const DEFAULT_PELLET_COUNT: usize = 4;

/// Per-tick probability that a ghost reconsiders its direction even though
/// nothing blocks it. Kept small so corridors are walked, not jittered.
pub fn reroll_chance(policy: crate::types::GhostPolicy) -> f32 {
    match policy {
        crate::types::GhostPolicy::RandomWalk => 0.04,
        crate::types::GhostPolicy::Greedy => 0.1,
        crate::types::GhostPolicy::Probabilistic { .. } => 0.06,
    }
}

pub fn ghost_speed_for_level(base: f32, level: u32) -> f32 {
    let scaled = base * (1.0 + LEVEL_SPEED_GAIN * level.saturating_sub(1) as f32);
    scaled.min(MAX_AGENT_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghost_speed_scales_and_caps() {
        assert_eq!(ghost_speed_for_level(0.25, 1), 0.25);
        assert!(ghost_speed_for_level(0.25, 2) > 0.25);
        assert!(ghost_speed_for_level(0.25, 500) <= MAX_AGENT_SPEED);
    }

    #[test]
    fn reroll_chances_stay_small() {
        use crate::types::GhostPolicy;
        for policy in [
            GhostPolicy::RandomWalk,
            GhostPolicy::Greedy,
            GhostPolicy::Probabilistic { chase_chance: 0.5 },
        ] {
            let chance = reroll_chance(policy);
            assert!((0.02..=0.1).contains(&chance));
        }
    }
}
