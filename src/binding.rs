//! Which engine acts on which game, and when.

use tracing::{debug, warn};

use crate::controller::EngineController;
use crate::error::EngineResult;
use crate::game::Game;

/// One engine plays one game.
pub struct SingleEngine<'a> {
    engine: &'a mut EngineController,
    game: &'a mut Game,
}

impl<'a> SingleEngine<'a> {
    pub fn new(engine: &'a mut EngineController, game: &'a mut Game) -> Self {
        Self { engine, game }
    }

    pub fn think(&mut self) -> EngineResult<()> {
        self.engine.think(self.game)
    }

    pub fn play(&mut self) -> EngineResult<()> {
        self.engine.play(self.game)
    }

    pub fn ready(&self) -> bool {
        self.engine.ready()
    }
}

/// Two engines play each other on one game.
pub struct DualEngine<'a> {
    first: &'a mut EngineController,
    second: &'a mut EngineController,
    game: &'a mut Game,
}

impl<'a> DualEngine<'a> {
    /// `first` moves for [`crate::board::Side::First`], `second` for the other side.
    pub fn new(
        first: &'a mut EngineController,
        second: &'a mut EngineController,
        game: &'a mut Game,
    ) -> Self {
        Self { first, second, game }
    }

    /// One move by whichever engine owns the side to move.
    pub fn think(&mut self) -> EngineResult<()> {
        if self.game.is_over() {
            return Ok(());
        }
        let engine = match self.game.turn_index() {
            0 => &mut *self.first,
            _ => &mut *self.second,
        };
        engine.think(self.game)
    }

    /// Alternate moves until the game ends.
    ///
    /// Also stops if a move request does not advance the game, which happens
    /// when an engine answers with something other than a legal move.
    pub fn play(&mut self) -> EngineResult<()> {
        while !self.game.is_over() {
            let before = self.game.moves().count();
            self.think()?;
            if self.game.moves().count() == before {
                warn!(moves = before, "engine made no move, stopping self-play");
                break;
            }
        }
        debug!(moves = self.game.moves().count(), "self-play finished");
        Ok(())
    }

    pub fn ready(&self) -> bool {
        self.first.ready() && self.second.ready()
    }
}

/// Two slots, each with its own engine and game, processed one after the other.
pub struct DualGame<'a> {
    slots: [SingleEngine<'a>; 2],
}

impl<'a> DualGame<'a> {
    pub fn new(
        engine_a: &'a mut EngineController,
        engine_b: &'a mut EngineController,
        game_a: &'a mut Game,
        game_b: &'a mut Game,
    ) -> Self {
        Self {
            slots: [
                SingleEngine::new(engine_a, game_a),
                SingleEngine::new(engine_b, game_b),
            ],
        }
    }

    pub fn think(&mut self) -> EngineResult<()> {
        for slot in &mut self.slots {
            slot.think()?;
        }
        Ok(())
    }

    pub fn play(&mut self) -> EngineResult<()> {
        for slot in &mut self.slots {
            slot.play()?;
        }
        Ok(())
    }

    pub fn ready(&self) -> bool {
        self.slots.iter().all(SingleEngine::ready)
    }
}

/// Orchestration policy over engines and games.
pub enum EngineBinding<'a> {
    Single(SingleEngine<'a>),
    Dual(DualEngine<'a>),
    DualGame(DualGame<'a>),
}

impl<'a> EngineBinding<'a> {
    pub fn think(&mut self) -> EngineResult<()> {
        match self {
            EngineBinding::Single(b) => b.think(),
            EngineBinding::Dual(b) => b.think(),
            EngineBinding::DualGame(b) => b.think(),
        }
    }

    pub fn play(&mut self) -> EngineResult<()> {
        match self {
            EngineBinding::Single(b) => b.play(),
            EngineBinding::Dual(b) => b.play(),
            EngineBinding::DualGame(b) => b.play(),
        }
    }

    pub fn ready(&self) -> bool {
        match self {
            EngineBinding::Single(b) => b.ready(),
            EngineBinding::Dual(b) => b.ready(),
            EngineBinding::DualGame(b) => b.ready(),
        }
    }
}
