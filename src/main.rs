//! Portal Puck - headless match runner
//!
//! Plays a match at the fixed 60 Hz step without a renderer and reports the
//! score. Human seats receive no input, so they stand still.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};
    use clap::Parser;
    use serde::Serialize;

    use portal_puck::consts::SIM_DT;
    use portal_puck::sim::{FixedStepper, GameState, PlayerId, SimEvent, TickInput};
    use portal_puck::{AiDifficulty, GameConfig, MatchSetup};

    #[derive(Parser, Debug)]
    #[command(name = "portal-puck")]
    #[command(about = "Run a headless three-player Portal Puck match")]
    struct Args {
        /// RNG seed (defaults to the current time)
        #[arg(long)]
        seed: Option<u64>,
        /// Simulation ticks to run (60 per second)
        #[arg(long, default_value_t = 3600)]
        ticks: u64,
        /// Number of human seats, filled from P1 upward
        #[arg(long, default_value_t = 0)]
        humans: u8,
        /// AI difficulty: easy, medium or hard
        #[arg(long, default_value = "medium")]
        difficulty: String,
        /// JSON config file (otherwise $PORTAL_PUCK_CONFIG or the default path)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Simulated frame time in milliseconds fed to the fixed stepper
        #[arg(long, default_value_t = 16.667)]
        frame_ms: f32,
        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    }

    #[derive(Debug, Default, Serialize)]
    struct MatchReport {
        seed: u64,
        ticks: u64,
        scores: [u32; 3],
        goals: u32,
        blocked: u32,
        portals: u32,
        kicks: u32,
        face_offs: u32,
        powerups_collected: u32,
        leader: Option<String>,
    }

    impl MatchReport {
        fn record(&mut self, event: &SimEvent) {
            match event {
                SimEvent::GoalScored { .. } => self.goals += 1,
                SimEvent::GoalBlocked { .. } => self.blocked += 1,
                SimEvent::PortalEntered { .. } => self.portals += 1,
                SimEvent::Kicked { .. } => self.kicks += 1,
                SimEvent::FaceOffStarted { .. } => self.face_offs += 1,
                SimEvent::PowerUpCollected { .. } => self.powerups_collected += 1,
                _ => {}
            }
        }
    }

    fn leader(scores: &[u32; 3]) -> Option<PlayerId> {
        let best = *scores.iter().max()?;
        let mut leaders = PlayerId::ALL.into_iter().filter(|p| scores[p.index()] == best);
        let first = leaders.next()?;
        // Ties have no leader
        leaders.next().is_none().then_some(first)
    }

    pub fn run() -> Result<()> {
        env_logger::init();
        let args = Args::parse();

        let Some(difficulty) = AiDifficulty::from_str(&args.difficulty) else {
            bail!("unknown difficulty '{}' (expected easy, medium or hard)", args.difficulty);
        };
        if !(args.frame_ms > 0.0 && args.frame_ms.is_finite()) {
            bail!("--frame-ms must be positive, got {}", args.frame_ms);
        }
        let config = match &args.config {
            Some(path) => GameConfig::from_path(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GameConfig::load(),
        };
        let seed = args.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
        let setup = MatchSetup {
            humans: args.humans,
            difficulty,
        };

        let mut state = GameState::new(seed, config, setup).context("starting match")?;
        log::info!(
            "Portal Puck starting: seed {seed}, {} human(s), {} AI",
            setup.humans,
            difficulty.as_str()
        );

        let mut report = MatchReport {
            seed,
            ..Default::default()
        };
        let mut stepper = FixedStepper::new();
        let input = TickInput::default();
        let frame_dt = (args.frame_ms / 1000.0).max(SIM_DT * 0.01);

        while state.time_ticks < args.ticks {
            stepper.advance(&mut state, &input, frame_dt);
            for event in state.drain_events() {
                match &event {
                    SimEvent::PuckMoved { .. } => log::trace!("{event:?}"),
                    _ => log::debug!("{event:?}"),
                }
                report.record(&event);
            }
        }

        report.ticks = state.time_ticks;
        report.scores = state.scores;
        report.leader = leader(&state.scores).map(|p| p.to_string());

        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("=== MATCH OVER ({} ticks, seed {}) ===", report.ticks, report.seed);
            for p in PlayerId::ALL {
                println!("  {p}: {}", state.scores[p.index()]);
            }
            println!(
                "  goals {} (blocked {}), portals {}, kicks {}, power-ups {}",
                report.goals, report.blocked, report.portals, report.kicks, report.powerups_collected
            );
            match &report.leader {
                Some(p) => println!("  {p} leads"),
                None => println!("  No outright leader"),
            }
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_leader_needs_outright_lead() {
            assert_eq!(leader(&[3, 1, 2]), Some(PlayerId::P1));
            assert_eq!(leader(&[2, 2, 0]), None);
            assert_eq!(leader(&[0, 0, 0]), None);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

// The browser build embeds the library directly; there is no standalone binary
#[cfg(target_arch = "wasm32")]
fn main() {}
