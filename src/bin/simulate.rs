use clap::Parser;
use maze_chase::engine::GameEngine;
use maze_chase::grid::standard_config;
use maze_chase::types::{Direction, GameEvent, Phase, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Run a single custom scenario instead of the default pair.
    #[arg(long)]
    single: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    GameOver,
    TickLimit,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    ticks: u64,
    outcome: Outcome,
    score: u32,
    #[serde(rename = "highScore")]
    high_score: u32,
    level: u32,
    #[serde(rename = "dotsEaten")]
    dots_eaten: u64,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u64,
    #[serde(rename = "levelsCompleted")]
    levels_completed: u64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({ "maxTicks": scenario.max_ticks }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.result.ticks),
            json!({
                "outcome": scenario_run.result.outcome,
                "score": scenario_run.result.score,
                "level": scenario_run.result.level,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let scenario_count = scenario_results.len();
    let summary = RunSummary {
        run_id: run_id.clone(),
        started_at_ms: run_started_at_ms,
        finished_at_ms: run_finished_at_ms,
        scenario_count,
        anomaly_count: total_anomalies,
        outcome_counts,
        scenarios: scenario_results,
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    if cli.single || cli.seed.is_some() || cli.ticks.is_some() {
        return vec![Scenario {
            name: format!("custom-seed{seed}"),
            seed,
            max_ticks: cli.ticks.unwrap_or(2_000).clamp(1, 200_000),
        }];
    }

    vec![
        Scenario {
            name: "sweep-check".to_string(),
            seed,
            max_ticks: 2_000,
        },
        Scenario {
            name: "long-haul".to_string(),
            seed: normalize_seed(seed as u64 + 1),
            max_ticks: 10_000,
        },
    ]
}

struct SingleRun {
    serialized: Vec<String>,
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    anomaly_seen: HashSet<String>,
}

/// Runs the scenario twice with identical inputs; any divergence between the
/// two snapshot streams is itself an anomaly.
fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let first = run_once(scenario);
    let second = run_once(scenario);

    let mut result = first.result;
    let mut anomaly_records = first.anomaly_records;
    let mut anomaly_seen = first.anomaly_seen;
    if first.serialized != second.serialized {
        let tick = first
            .serialized
            .iter()
            .zip(second.serialized.iter())
            .position(|(a, b)| a != b)
            .map(|index| index as u64 + 1)
            .unwrap_or(result.ticks);
        push_anomaly(
            &mut result.anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            tick,
            "determinism violation: repeated run diverged".to_string(),
        );
    }

    ScenarioRunResult {
        result,
        anomaly_records,
    }
}

fn run_once(scenario: &Scenario) -> SingleRun {
    let mut engine =
        GameEngine::new(standard_config(scenario.seed)).expect("standard config should be valid");

    let mut serialized = Vec::new();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut dots_eaten = 0u64;
    let mut pellets_eaten = 0u64;
    let mut levels_completed = 0u64;
    let mut last_score = 0u32;
    let mut last_left = engine.collectibles_left();
    let mut ticks = 0u64;
    let mut outcome = Outcome::TickLimit;

    for tick in 0..scenario.max_ticks {
        engine.tick(Some(scripted_direction(tick)));
        let snapshot = engine.snapshot();
        ticks = snapshot.tick;

        let mut level_up = false;
        for event in &snapshot.events {
            match event {
                GameEvent::DotEaten { .. } => dots_eaten += 1,
                GameEvent::PelletEaten { .. } => pellets_eaten += 1,
                GameEvent::LevelComplete { .. } => {
                    levels_completed += 1;
                    level_up = true;
                }
                GameEvent::GhostCollision { .. } => {}
            }
        }

        for message in
            collect_tick_anomalies(&engine, &snapshot, last_score, last_left, level_up)
        {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        last_score = snapshot.score;
        last_left = snapshot.collectibles_left;

        serialized
            .push(serde_json::to_string(&snapshot).expect("snapshot should serialize"));

        if snapshot.phase == Phase::GameOver {
            outcome = Outcome::GameOver;
            break;
        }
    }

    let summary = engine.summary();
    SingleRun {
        serialized,
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            ticks,
            outcome,
            score: summary.score,
            high_score: summary.high_score,
            level: summary.level,
            dots_eaten,
            pellets_eaten,
            levels_completed,
            anomalies,
        },
        anomaly_records,
        anomaly_seen,
    }
}

/// Deterministic pilot: hold each direction for seven ticks, cycling through
/// the compass. Crude, but it covers corridors, turns and tunnels.
fn scripted_direction(tick: u64) -> Direction {
    const HOLD_TICKS: u64 = 7;
    match (tick / HOLD_TICKS) % 4 {
        0 => Direction::Right,
        1 => Direction::Down,
        2 => Direction::Left,
        _ => Direction::Up,
    }
}

fn collect_tick_anomalies(
    engine: &GameEngine,
    snapshot: &Snapshot,
    last_score: u32,
    last_left: usize,
    level_up: bool,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let map = engine.map();

    let player = &snapshot.player;
    if player.x < 0.0
        || player.x >= map.width as f32
        || player.y < 0.0
        || player.y >= map.height as f32
    {
        anomalies.push(format!(
            "player position out of range: ({}, {})",
            player.x, player.y
        ));
    }
    let tile = map.tile_at(player.x, player.y);
    if map.is_wall(tile.x, tile.y) {
        anomalies.push(format!("player inside wall tile ({}, {})", tile.x, tile.y));
    }

    for ghost in &snapshot.ghosts {
        let tile = map.tile_at(ghost.x, ghost.y);
        if map.is_wall(tile.x, tile.y) {
            anomalies.push(format!(
                "ghost {} inside wall tile ({}, {})",
                ghost.id, tile.x, tile.y
            ));
        }
    }

    if snapshot.score < last_score {
        anomalies.push(format!(
            "score decreased: {} -> {}",
            last_score, snapshot.score
        ));
    }
    if snapshot.high_score < snapshot.score {
        anomalies.push(format!(
            "high score {} below score {}",
            snapshot.high_score, snapshot.score
        ));
    }
    if !level_up && snapshot.collectibles_left > last_left {
        anomalies.push(format!(
            "collectibles grew without level change: {} -> {}",
            last_left, snapshot.collectibles_left
        ));
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn outcome_key(outcome: Outcome) -> String {
    match outcome {
        Outcome::GameOver => "game_over",
        Outcome::TickLimit => "tick_limit",
    }
    .to_string()
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text =
        serde_json::to_string_pretty(summary).expect("run summary should serialize");
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_direction_cycles_through_the_compass() {
        assert_eq!(scripted_direction(0), Direction::Right);
        assert_eq!(scripted_direction(6), Direction::Right);
        assert_eq!(scripted_direction(7), Direction::Down);
        assert_eq!(scripted_direction(14), Direction::Left);
        assert_eq!(scripted_direction(21), Direction::Up);
        assert_eq!(scripted_direction(28), Direction::Right);
    }

    #[test]
    fn clean_run_produces_no_anomalies() {
        let scenario = Scenario {
            name: "test".to_string(),
            seed: 42,
            max_ticks: 500,
        };
        let run = run_scenario(&scenario);
        assert!(
            run.result.anomalies.is_empty(),
            "unexpected anomalies: {:?}",
            run.result.anomalies
        );
        assert!(run.result.ticks > 0);
    }

    #[test]
    fn repeated_runs_report_identical_results() {
        let scenario = Scenario {
            name: "test".to_string(),
            seed: 7,
            max_ticks: 300,
        };
        let a = run_once(&scenario);
        let b = run_once(&scenario);
        assert_eq!(a.serialized, b.serialized);
        assert_eq!(a.result.score, b.result.score);
    }

    #[test]
    fn anomaly_messages_are_deduplicated_per_scenario() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 1, "x".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 2, "x".to_string());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
    }
}
