//! Named snapshots of games, kept sorted by name.

use crate::game::Game;

#[derive(Debug, Clone)]
pub struct SavedGame {
    pub name: String,
    pub game: Game,
}

#[derive(Debug, Clone, Default)]
pub struct GameLibrary {
    records: Vec<SavedGame>,
}

impl GameLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an independent copy of `game` under `name`. Returns its id.
    pub fn append(&mut self, name: impl Into<String>, game: &Game) -> usize {
        let name = name.into();
        let at = self.records.partition_point(|r| r.name <= name);
        self.records.insert(
            at,
            SavedGame {
                name,
                game: game.make_copy(None),
            },
        );
        at
    }

    pub fn get(&self, id: usize) -> Option<&SavedGame> {
        self.records.get(id)
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_sorted_by_name() {
        let game = Game::new(16, 16);
        let mut library = GameLibrary::new();
        library.append("opening", &game);
        library.append("endgame", &game);
        assert_eq!(library.append("middle", &game), 1);
        assert_eq!(library.names(), vec!["endgame", "middle", "opening"]);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut game = Game::new(16, 16);
        game.play(4, 4).unwrap();
        let mut library = GameLibrary::new();
        let id = library.append("one move", &game);
        game.play(5, 5).unwrap();
        assert_eq!(library.get(id).unwrap().game.moves().count(), 1);
    }
}
