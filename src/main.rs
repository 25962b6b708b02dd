//! xo-rust: a five-in-a-row engine arena.
//!
//! ## Usage
//!
//! - `xo-rust brain` - Run the built-in random engine on stdin/stdout
//! - `xo-rust match --first <engine> --second <engine>` - Let two engines play each other
//! - `xo-rust think --engine <engine>` - Ask one engine for an opening move

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use xo_rust::binding::{DualEngine, EngineBinding, SingleEngine};
use xo_rust::brain::Brain;
use xo_rust::config::{EngineRecord, EngineRegistry};
use xo_rust::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use xo_rust::controller::EngineController;
use xo_rust::game::Game;

/// xo-rust: a five-in-a-row engine arena
#[derive(Parser)]
#[command(name = "xo-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in random engine on stdin/stdout
    Brain,
    /// Let two engines play a full game against each other
    Match {
        /// Engine playing first: a path, or a name from --registry
        #[arg(long)]
        first: String,
        /// Engine playing second: a path, or a name from --registry
        #[arg(long)]
        second: String,
        #[command(flatten)]
        common: Common,
    },
    /// Ask one engine for its move on an empty board
    Think {
        /// Engine to ask: a path, or a name from --registry
        #[arg(long)]
        engine: String,
        #[command(flatten)]
        common: Common,
    },
}

#[derive(clap::Args)]
struct Common {
    /// TOML engine registry to resolve engine names against
    #[arg(long)]
    registry: Option<PathBuf>,
    /// Board width
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: usize,
    /// Board height
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: usize,
    /// Echo engine traffic to the log
    #[arg(long)]
    show_io: bool,
}

impl Common {
    fn resolve(&self, engine: &str) -> Result<EngineRecord> {
        if let Some(path) = &self.registry {
            let registry = EngineRegistry::load(path)?;
            if let Some(id) = registry.names().iter().position(|n| n == engine) {
                if let Some(record) = registry.get(id) {
                    return Ok(record.clone());
                }
            }
        }
        Ok(EngineRecord::new(engine, engine))
    }

    fn start(&self, slot: usize, engine: &str) -> Result<EngineController> {
        let record = self.resolve(engine)?;
        let mut controller = EngineController::new(slot);
        controller.set_show_engine_io(self.show_io);
        controller
            .start(&record)
            .with_context(|| format!("Failed to start engine {}", record.name))?;
        if !controller.ready() {
            bail!("engine {} exited during startup", record.name);
        }
        Ok(controller)
    }
}

fn main() -> Result<()> {
    // stdout belongs to the protocol when running as an engine.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Brain => {
            Brain::new().run()?;
        }
        Commands::Match {
            first,
            second,
            common,
        } => {
            let mut a = common.start(0, &first)?;
            let mut b = common.start(1, &second)?;
            let mut game = Game::new(common.width, common.height);
            EngineBinding::Dual(DualEngine::new(&mut a, &mut b, &mut game)).play()?;
            a.shutdown();
            b.shutdown();

            print!("{game}");
            match (game.is_over(), game.last_mover()) {
                (true, Some(side)) if game.moves().count() < game.board().square_count() => {
                    info!(moves = game.moves().count(), ?side, "game won");
                    println!("{side:?} wins after {} moves", game.moves().count());
                }
                (true, _) => println!("Draw: board full"),
                (false, _) => println!("Unfinished after {} moves", game.moves().count()),
            }
        }
        Commands::Think { engine, common } => {
            let mut controller = common.start(0, &engine)?;
            let mut game = Game::new(common.width, common.height);
            EngineBinding::Single(SingleEngine::new(&mut controller, &mut game)).think()?;
            controller.shutdown();
            match game.moves().iter().next() {
                Some(m) => println!("{},{}", m.x, m.y),
                None => bail!("engine did not produce a move"),
            }
        }
    }
    Ok(())
}
