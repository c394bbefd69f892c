use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gesture_strike::analysis::Intent;
use gesture_strike::analytics::{derive_session_insights, HistoryStore};
use gesture_strike::config::AppConfig;
use gesture_strike::engine::{EngineHandle, EngineOptions, SystemTimeSource};
use gesture_strike::fixtures::{
    synthetic_frames, EmittedState, ExpectationDiff, FixtureCatalog, FixtureProcessor,
};
use gesture_strike::session::{Difficulty, HapticPattern, MatchStatus, RecordingHaptics};
use gesture_strike::telemetry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "gesture_cli",
    about = "Deterministic gesture fixture harness and match simulator for Gesture Strike"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to the bundled fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Config JSON (defaults to assets/gesture_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log level for stderr output
    #[arg(long, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a fixture through the gesture pipeline and optionally compare against expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Stream emitted hand states for a fixture to stdout, one JSON line each
    Stream {
        #[arg(long)]
        fixture: String,
    },
    /// Play one match against synthetic gestures and print the outcome
    Simulate {
        #[arg(long, default_value_t = 300)]
        frames: u32,
        /// Probability that a FIRE intent hits an enemy
        #[arg(long, default_value_t = 0.6)]
        hit_rate: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        /// Override the configured reload duration
        #[arg(long)]
        reload_ms: Option<u64>,
        /// Override the configured frame interval
        #[arg(long)]
        frame_ms: Option<u64>,
        /// Difficulty; the history recommendation when omitted
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Session history file to read and append to
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Print insights derived from a session history file
    Insights {
        #[arg(long)]
        history: PathBuf,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    gesture_strike::init_logging(cli.log_level);

    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Replay {
            fixture,
            expect,
            output,
        } => run_replay(&catalog, &fixture, expect, output),
        Commands::Stream { fixture } => run_stream(&catalog, &fixture),
        Commands::Simulate {
            frames,
            hit_rate,
            seed,
            reload_ms,
            frame_ms,
            difficulty,
            history,
        } => {
            let mut config = config.in_memory();
            if let Some(reload_ms) = reload_ms {
                config.session.reload_ms = reload_ms;
            }
            if let Some(frame_ms) = frame_ms {
                config.gesture.frame_interval_ms = frame_ms;
            }
            config.storage.history_path = history;

            let options = SimulationOptions {
                frames,
                hit_rate: hit_rate.clamp(0.0, 1.0),
                seed,
                difficulty,
            };
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("building simulation runtime")?;
            runtime.block_on(run_simulation(config, options))
        }
        Commands::Insights { history } => run_insights(history),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn run_replay(
    catalog: &FixtureCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let data = catalog
        .load(fixture, override_expect)
        .with_context(|| format!("loading fixture {}", fixture))?;
    let actual = FixtureProcessor::for_fixture(&data).run(&data.frames);

    emit_report(&data.metadata.name, data.frames.len(), &actual, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&actual) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_stream(catalog: &FixtureCatalog, fixture: &str) -> Result<ExitCode> {
    let data = catalog.load(fixture, None)?;
    let actual = FixtureProcessor::for_fixture(&data).run(&data.frames);

    for event in actual {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn run_insights(history: PathBuf) -> Result<ExitCode> {
    let store = HistoryStore::new(history);
    let snapshots = store.load();
    let insights = derive_session_insights(&snapshots);
    println!("{}", serde_json::to_string_pretty(&insights)?);
    Ok(ExitCode::from(0))
}

// ============================================================================
// MATCH SIMULATION
// ============================================================================

struct SimulationOptions {
    frames: u32,
    hit_rate: f64,
    seed: u64,
    difficulty: Option<Difficulty>,
}

/// Points per defeated enemy, scaled by wave
const ENEMY_POINTS: u64 = 100;
/// Kills needed to advance one wave
const KILLS_PER_WAVE: u32 = 4;
/// Chance per frame that an enemy lands a hit
const DAMAGE_CHANCE: f64 = 0.03;

#[derive(Serialize)]
struct SimulationReport {
    seed: u64,
    frames_processed: u32,
    intents: BTreeMap<String, u32>,
    haptics: BTreeMap<String, usize>,
    final_state: gesture_strike::session::GameState,
    insights: gesture_strike::analytics::SessionInsights,
    sessions_in_history: usize,
}

async fn run_simulation(config: AppConfig, options: SimulationOptions) -> Result<ExitCode> {
    let frame_interval = Duration::from_millis(config.gesture.frame_interval_ms);
    let frames = synthetic_frames(
        options.frames,
        options.seed,
        config.gesture.frame_interval_ms,
        None,
    );

    let haptics = Arc::new(RecordingHaptics::new());
    let engine = EngineHandle::with_options(
        config,
        EngineOptions {
            haptics: haptics.clone(),
            time_source: Arc::new(SystemTimeSource),
            telemetry: telemetry::hub(),
        },
    )
    .context("creating engine")?;

    match options.difficulty {
        Some(difficulty) => engine.start_match(Some(difficulty)),
        None => engine.start_match_with_recommendation(),
    };

    let mut rng = StdRng::seed_from_u64(options.seed ^ 0x5eed);
    let mut intents: BTreeMap<String, u32> = BTreeMap::new();
    let mut frames_processed = 0;

    for frame in &frames {
        let outcome = engine.process_frame(frame);
        frames_processed += 1;

        for intent in &outcome.intents {
            let key = match intent {
                Intent::Fire => "fire".to_string(),
                Intent::Reload => "reload".to_string(),
                Intent::Movement(movement) => format!("move_{:?}", movement).to_lowercase(),
            };
            *intents.entry(key).or_default() += 1;

            if *intent == Intent::Fire {
                let did_hit = rng.gen_bool(options.hit_rate);
                let shot = engine.register_shot(did_hit);
                if shot.applied && did_hit {
                    let wave = shot.current.wave;
                    let kill = engine.report_enemy_defeated(ENEMY_POINTS * wave as u64);
                    let kills = kill.current.stats.enemies_defeated;
                    if kills % KILLS_PER_WAVE == 0 {
                        engine.set_wave(wave + 1);
                    }
                }
            }
        }

        if rng.gen_bool(DAMAGE_CHANCE) {
            engine.report_damage(rng.gen_range(8..=20));
        }

        if engine.game_state().status == MatchStatus::GameOver {
            break;
        }
        tokio::time::sleep(frame_interval).await;
    }

    engine.shutdown();

    let haptic_counts = [
        HapticPattern::Footstep,
        HapticPattern::Shot,
        HapticPattern::Damage,
        HapticPattern::ReloadReady,
        HapticPattern::GameOver,
    ]
    .into_iter()
    .map(|pattern| (format!("{:?}", pattern).to_lowercase(), haptics.count(pattern)))
    .collect();

    let history = engine.history();
    let report = SimulationReport {
        seed: options.seed,
        frames_processed,
        intents,
        haptics: haptic_counts,
        final_state: engine.game_state(),
        insights: engine.insights(),
        sessions_in_history: history.len(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

// ============================================================================
// OUTPUT HELPERS
// ============================================================================

fn emit_report(
    fixture: &str,
    frame_count: usize,
    states: &[EmittedState],
    output_path: Option<PathBuf>,
) -> Result<()> {
    let report = FixtureReportPayload {
        fixture,
        frame_count,
        state_count: states.len(),
        states,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct FixtureReportPayload<'a> {
    fixture: &'a str,
    frame_count: usize,
    state_count: usize,
    #[serde(skip_serializing_if = "slice_empty")]
    states: &'a [EmittedState],
}

fn slice_empty(states: &&[EmittedState]) -> bool {
    states.is_empty()
}
