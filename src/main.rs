//! Twin Resonance headless runner
//!
//! Plays a level with a seeded autopilot and logs every event.
//! Set `RUST_LOG=info` (or `debug`) to see the event stream.

use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use twin_resonance::Tuning;
use twin_resonance::sim::{
    GameEvent, GameSession, LevelCatalog, LevelData, TickInput, WorldSimulation,
};

const FRAME: f32 = 1.0 / 60.0;
/// Give up on a level after this much game time
const TIME_LIMIT_SECS: f32 = 180.0;
/// How far ahead of the character the drag pointer leads
const DRAG_LEAD: f32 = 40.0;

#[derive(Parser)]
#[command(
    name = "twin-resonance",
    about = "Headless runner for the Twin Resonance mechanics core",
    version
)]
struct Cli {
    /// Built-in level index or path to a level JSON file (default: 0)
    level: Option<String>,

    /// Tuning JSON overriding the default balance
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Autopilot seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Keep playing the following built-in levels after the first
    #[arg(long)]
    all: bool,
}

fn load_level(arg: &str, catalog: &LevelCatalog) -> Result<LevelData, Box<dyn Error>> {
    if let Ok(index) = arg.parse::<usize>() {
        return Ok(catalog.get(index).clone());
    }
    let json =
        std::fs::read_to_string(arg).map_err(|e| format!("cannot read level file {arg}: {e}"))?;
    Ok(LevelData::from_json(&json)?)
}

/// Seeded stand-in for a player
struct Autopilot {
    rng: Pcg32,
    wander: Option<Vec2>,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            wander: None,
        }
    }

    fn input(&mut self, session: &GameSession) -> TickInput {
        TickInput {
            surge_drag: Some(self.surge_pointer(session)),
            flow_target: self.flow_target(session),
        }
    }

    /// Stand on a heat plate while any ice remains, then head for the portal
    fn surge_pointer(&mut self, session: &GameSession) -> Vec2 {
        let surge = session.surge_world();
        let pos = surge.character().pos;
        let ice_remaining = session.flow_world().ice_walls().iter().any(|w| w.is_solid());
        let goal = match surge.heat_plates().first() {
            Some(plate) if ice_remaining => plate.pos,
            _ => surge.portal().pos,
        };
        let jitter = Vec2::new(
            self.rng.random_range(-2.0..2.0),
            self.rng.random_range(-2.0..2.0),
        );
        pos + (goal - pos).clamp_length_max(DRAG_LEAD) + jitter
    }

    /// Wander to make wind while bridges are short, then glide to the portal
    fn flow_target(&mut self, session: &GameSession) -> Option<Vec2> {
        let flow = session.flow_world();
        if needs_wind(session.surge_world()) {
            let size = session.level().world_size.flow;
            let reached = self
                .wander
                .is_none_or(|w| w.distance(flow.character().pos) < 20.0);
            if reached {
                let next = Vec2::new(
                    self.rng.random_range(0.0..size.x),
                    self.rng.random_range(0.0..size.y),
                );
                self.wander = Some(next);
                return Some(next);
            }
            return None;
        }
        self.wander = None;
        let portal = flow.portal().pos;
        match flow.character().target() {
            Some(t) if t == portal => None,
            _ if flow.portal().occupied => None,
            _ => Some(portal),
        }
    }
}

fn needs_wind(surge: &WorldSimulation) -> bool {
    surge.bridges().iter().any(|b| b.extension() < 0.95)
}

/// Run one level to completion or the time limit. Returns the completion time.
fn play(session: &mut GameSession, autopilot: &mut Autopilot) -> Option<f32> {
    while session.clock().elapsed() < TIME_LIMIT_SECS {
        let input = autopilot.input(session);
        session.tick(FRAME, &input);
        for event in session.drain_events() {
            match event {
                GameEvent::Cue(cue) => log::debug!("cue: {:?}", cue),
                GameEvent::LevelComplete(win) => return Some(win.elapsed_secs),
            }
        }
        if session.clock().frames() % 600 == 0 {
            let hud = session.hud();
            log::info!(
                "[{}] {} surge {:.2} flow {:.2} wind {:.2} proximity {:.2}",
                hud.timer,
                hud.title,
                hud.surge,
                hud.flow,
                session.surge_world().wind_received(),
                hud.proximity.strength
            );
        }
    }
    None
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(opts: &Cli) -> Result<(), Box<dyn Error>> {
    let tuning = match &opts.tuning {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read tuning file {}: {e}", path.display()))?;
            Tuning::from_json(&json)?
        }
        None => Tuning::default(),
    };
    let catalog = LevelCatalog::builtin();
    let first = match &opts.level {
        Some(arg) => load_level(arg, &catalog)?,
        None => catalog.get(0).clone(),
    };

    log::info!(
        "Twin Resonance runner starting (seed {}, {} built-in levels)",
        opts.seed,
        catalog.len()
    );
    let mut session = GameSession::new(tuning);
    let mut autopilot = Autopilot::new(opts.seed);
    let mut level = Some(first);

    while let Some(next) = level.take() {
        let index = next.index;
        let report = session.advance(next);
        if !report.is_clean() {
            log::warn!("Level {} loaded with {} warning(s)", index, report.warnings.len());
        }
        match play(&mut session, &mut autopilot) {
            Some(secs) => println!(
                "Level {} \"{}\" complete in {:.2}s",
                index,
                session.level().title,
                secs
            ),
            None => {
                println!("Level {} not completed within {}s", index, TIME_LIMIT_SECS);
                break;
            }
        }
        if opts.all {
            level = catalog.next_after(index).cloned();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["twin-resonance"]).unwrap();
        assert!(cli.level.is_none());
        assert!(cli.tuning.is_none());
        assert_eq!(cli.seed, 1);
        assert!(!cli.all);
    }

    #[test]
    fn test_cli_full() {
        let cli = Cli::try_parse_from([
            "twin-resonance",
            "2",
            "--seed",
            "7",
            "--tuning",
            "tuning.json",
            "--all",
        ])
        .unwrap();
        assert_eq!(cli.level.as_deref(), Some("2"));
        assert_eq!(cli.seed, 7);
        assert_eq!(cli.tuning, Some(PathBuf::from("tuning.json")));
        assert!(cli.all);
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        let err = Cli::try_parse_from(["twin-resonance", "--sed", "2"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_rejects_second_level() {
        assert!(Cli::try_parse_from(["twin-resonance", "1", "--all", "3"]).is_err());
    }

    #[test]
    fn test_cli_help() {
        let err = Cli::try_parse_from(["twin-resonance", "--help"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_load_level_by_index_or_missing_file() {
        let catalog = LevelCatalog::builtin();
        assert_eq!(load_level("2", &catalog).unwrap().index, 2);
        let err = load_level("no/such/level.json", &catalog).err().unwrap();
        assert!(err.to_string().contains("no/such/level.json"));
    }
}
