//! Sleigh Drop demo host
//!
//! Builds the scene on a headless world and plays it with a scripted player.
//! Collisions are synthetic: a dropped item lands on whichever house is
//! closest to the sleigh a short while after it was dropped.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use sleigh_drop::consts::SIM_DT;
use sleigh_drop::sim::{
    DropSentinel, EntityId, Game, HeadlessWorld, ItemType, SessionPhase, TickInput, tick,
};
use sleigh_drop::{Difficulty, Tuning};

/// Frames to wait before pressing on the title / game-over screens
const START_DELAY: u64 = 30;
const RESTART_DELAY: u64 = 90;
/// Frames between drops while playing
const DROP_INTERVAL: u64 = 45;
/// Frames an item falls before it lands
const FALL_FRAMES: u64 = 20;
/// Chance the scripted player picks the right item
const ACCURACY: f64 = 0.9;
/// Per-frame chance of flying into a house
const CRASH_CHANCE: f64 = 0.002;

struct Options {
    seed: u64,
    frames: u64,
    tuning: Option<PathBuf>,
    difficulty: Option<Difficulty>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            seed: 1,
            frames: 3600,
            tuning: None,
            difficulty: None,
        }
    }
}

#[derive(Debug, Default)]
struct Summary {
    sessions: u32,
    matches: u32,
    misses: u32,
    crashes: u32,
    best_level: u32,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match parse_args(env::args().skip(1).collect()) {
        Ok(Some(options)) => {
            run(&options);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("{}", usage_text());
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{}", usage_text());
            ExitCode::from(2)
        }
    }
}

fn usage_text() -> String {
    "usage: sleigh-drop [--seed N] [--frames N] [--tuning FILE] [--difficulty relaxed|standard|frantic]"
        .to_string()
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut index = 0usize;
    while index < args.len() {
        let flag = args[index].as_str();
        if flag == "-h" || flag == "--help" {
            return Ok(None);
        }
        let value = args
            .get(index + 1)
            .ok_or_else(|| format!("missing value for {flag}"))?;
        match flag {
            "--seed" => {
                options.seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid --seed value '{value}' (expected u64)"))?;
            }
            "--frames" => {
                options.frames = value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid --frames value '{value}' (expected u64)"))?;
            }
            "--tuning" => options.tuning = Some(PathBuf::from(value)),
            "--difficulty" => {
                options.difficulty = Some(
                    Difficulty::from_str(value)
                        .ok_or_else(|| format!("unknown difficulty '{value}'"))?,
                );
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
        index += 2;
    }
    Ok(Some(options))
}

fn run(options: &Options) {
    let mut tuning = match &options.tuning {
        Some(path) => Tuning::load(path),
        None => Tuning::default(),
    };
    if let Some(preset) = options.difficulty {
        tuning.apply_preset(preset);
    }

    let mut game = Game::new(HeadlessWorld::new(), &tuning, options.seed);
    let handles = game.handles();
    // Separate stream so the player doesn't perturb the field
    let mut player = Pcg32::seed_from_u64(options.seed.wrapping_add(1));
    let mut summary = Summary::default();
    let mut falling: Vec<(EntityId, u64)> = Vec::new();
    let mut phase_since = 0u64;
    let mut last_phase = game.session_phase();

    for frame in 0..options.frames {
        let phase = game.session_phase();
        if phase != last_phase {
            phase_since = frame;
            last_phase = phase;
        }
        let waited = frame - phase_since;

        let mut input = TickInput::default();
        match phase {
            Some(SessionPhase::Start) if waited == START_DELAY => {
                input.primary_press = true;
                summary.sessions += 1;
            }
            Some(SessionPhase::GameOver) if waited == RESTART_DELAY => input.primary_press = true,
            Some(SessionPhase::Playing) if waited > 0 && waited % DROP_INTERVAL == 0 => {
                if let Some((_, color)) = game.nearest_house() {
                    let right = color.accepts();
                    input.drop = Some(if player.random_bool(ACCURACY) {
                        right
                    } else {
                        match right {
                            ItemType::Gift => ItemType::Coal,
                            ItemType::Coal => ItemType::Gift,
                        }
                    });
                }
            }
            _ => {}
        }

        let known = game.falling_items();
        tick(&mut game, &input, SIM_DT);
        for item in game.falling_items() {
            if !known.contains(&item) {
                falling.push((item, frame + FALL_FRAMES));
            }
        }

        // Land items that have fallen long enough
        let (landing, still): (Vec<_>, Vec<_>) =
            falling.drain(..).partition(|(_, lands)| *lands <= frame);
        falling = still;
        for (item, _) in landing {
            if !game.falling_items().contains(&item) {
                continue;
            }
            let Some((house, color)) = game.nearest_house() else {
                continue;
            };
            let dropped = game
                .sim()
                .machine::<DropSentinel>(item)
                .map(|m| m.behavior().item());
            match dropped {
                Some(kind) if kind.matches(color) => summary.matches += 1,
                Some(_) => summary.misses += 1,
                None => {}
            }
            game.sim_mut().collision_start(item, house);
        }

        if game.session_phase() == Some(SessionPhase::Playing) && player.random_bool(CRASH_CHANCE)
        {
            if let Some((house, _)) = game.nearest_house() {
                summary.crashes += 1;
                game.sim_mut().collision_start(house, handles.character);
            }
        }

        if let Some(state) = game.session_state() {
            summary.best_level = summary.best_level.max(state.level);
        }
    }

    log::info!(
        "Ran {} frames ({:.1}s simulated), {} entities, {} live subscriptions",
        game.sim().frame(),
        game.sim().frame() as f32 * SIM_DT,
        game.world().entity_count(),
        game.sim().bus().len()
    );
    println!(
        "sessions: {}  matches: {}  misses: {}  crashes: {}  best level: {}",
        summary.sessions, summary.matches, summary.misses, summary.crashes, summary.best_level
    );
}
