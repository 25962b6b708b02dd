//! Two match slots, each with a game and an engine.
//!
//! The manager is the crash boundary: every entry point catches
//! [`EngineError`], logs it, and returns, so one misbehaving engine only
//! aborts the operation it was part of.

use tracing::{error, info, instrument, warn};

use crate::binding::{DualEngine, DualGame, EngineBinding, SingleEngine};
use crate::config::{EngineRegistry, Settings};
use crate::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH, SLOT_COUNT};
use crate::controller::EngineController;
use crate::error::EngineResult;
use crate::game::{Game, SharedGame};
use crate::library::GameLibrary;

pub struct EngineManager {
    engines: [EngineController; SLOT_COUNT],
    games: [SharedGame; SLOT_COUNT],
}

impl Default for EngineManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineManager {
    pub fn new() -> Self {
        Self::with_engines([EngineController::new(0), EngineController::new(1)])
    }

    /// Use pre-built controllers, e.g. ones with a custom local copy directory.
    pub fn with_engines(engines: [EngineController; SLOT_COUNT]) -> Self {
        Self {
            engines,
            games: [
                Game::shared(DEFAULT_WIDTH, DEFAULT_HEIGHT),
                Game::shared(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            ],
        }
    }

    pub fn controller(&self, slot: usize) -> &EngineController {
        &self.engines[slot]
    }

    pub fn controller_mut(&mut self, slot: usize) -> &mut EngineController {
        &mut self.engines[slot]
    }

    /// The slot's game, for binding observers.
    pub fn game(&self, slot: usize) -> SharedGame {
        self.games[slot].clone()
    }

    fn guard(operation: &str, result: EngineResult<()>) {
        if let Err(err) = result {
            error!(operation, %err, "engine operation aborted");
        }
    }

    /// Start each slot's selected engine.
    #[instrument(skip_all)]
    pub fn run_engines(&mut self, registry: &EngineRegistry, settings: &Settings) {
        for slot in 0..SLOT_COUNT {
            let engine_id = settings.engine_id(slot);
            let Some(record) = registry.get(engine_id) else {
                warn!(slot, engine_id, "no such engine");
                continue;
            };
            let engine = &mut self.engines[slot];
            engine.set_show_engine_io(settings.show_engine_io(slot));
            Self::guard("start", engine.start(record));
            if engine.ready() {
                info!(slot, prompt = %engine.prompt(), "engine running");
            }
        }
    }

    /// Shut every engine down and start fresh controllers.
    pub fn reload(&mut self, registry: &EngineRegistry, settings: &Settings) {
        self.shutdown();
        self.engines = [EngineController::new(0), EngineController::new(1)];
        self.run_engines(registry, settings);
    }

    pub fn shutdown(&mut self) {
        for engine in &mut self.engines {
            if engine.ready() {
                engine.shutdown();
            }
        }
    }

    /// Any engine has a request outstanding.
    pub fn is_locked(&self) -> bool {
        self.engines.iter().any(EngineController::locked)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        for game in &self.games {
            game.borrow_mut().resize(width, height);
        }
    }

    pub fn new_game(&mut self, slot: usize) {
        self.games[slot].borrow_mut().new_game();
    }

    /// Let the slot's engine play its game out by itself.
    pub fn single_play(&mut self, slot: usize) {
        let mut game = self.games[slot].borrow_mut();
        let mut binding = EngineBinding::Single(SingleEngine::new(&mut self.engines[slot], &mut game));
        if binding.ready() {
            Self::guard("single_play", binding.play());
        }
    }

    /// One move in the slot's game, with the slot's engine playing first and
    /// the other slot's engine playing second.
    pub fn dual_play(&mut self, slot: usize) {
        let mut game = self.games[slot].borrow_mut();
        let [a, b] = &mut self.engines;
        let (first, second) = if slot == 0 { (a, b) } else { (b, a) };
        let mut binding = EngineBinding::Dual(DualEngine::new(first, second, &mut game));
        if binding.ready() {
            Self::guard("dual_play", binding.think());
        }
    }

    /// One move in `slot`, or in both slots when `slot` is `None`.
    pub fn think(&mut self, slot: Option<usize>) {
        match slot {
            Some(slot) => {
                let mut game = self.games[slot].borrow_mut();
                let mut binding =
                    EngineBinding::Single(SingleEngine::new(&mut self.engines[slot], &mut game));
                if binding.ready() {
                    Self::guard("think", binding.think());
                }
            }
            None => {
                let [a, b] = &mut self.engines;
                let [game_a, game_b] = &self.games;
                let mut game_a = game_a.borrow_mut();
                let mut game_b = game_b.borrow_mut();
                let mut binding =
                    EngineBinding::DualGame(DualGame::new(a, b, &mut game_a, &mut game_b));
                if binding.ready() {
                    Self::guard("think", binding.think());
                }
            }
        }
    }

    pub fn print_square_info(&mut self, slot: usize, x: usize, y: usize) {
        let engine = &mut self.engines[slot];
        if engine.ready() {
            let game = self.games[slot].borrow();
            Self::guard("squareinfo", engine.print_square_info(&game, x, y));
        }
    }

    /// Replace the slot's game with a saved one.
    pub fn load_saved(&mut self, slot: usize, library: &GameLibrary, id: usize) {
        let Some(saved) = library.get(id) else {
            warn!(slot, id, "no such saved game");
            return;
        };
        if let Err(err) = self.games[slot].borrow_mut().load(&saved.game) {
            error!(slot, %err, "saved game could not be replayed");
        }
    }

    pub fn save(&self, slot: usize, library: &mut GameLibrary, name: &str) -> usize {
        library.append(name, &self.games[slot].borrow())
    }
}
