use crate::{Generation, PokemonType, SpeciesEntry};
use serde::{Deserialize, Serialize};

/// A move as listed in a dex catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveEntry {
    pub id: String,
    pub name: String,
    pub move_type: PokemonType,
    /// Base power; 0 for status moves.
    #[serde(default)]
    pub power: u16,
    /// Percent accuracy; `None` never misses.
    #[serde(default)]
    pub accuracy: Option<u8>,
    pub generation: Generation,
    #[serde(default)]
    pub nonstandard: bool,
}

impl MoveEntry {
    pub fn is_available_in(&self, generation: Generation) -> bool {
        !self.nonstandard && self.generation <= generation
    }
}

/// The full species and move listing a dex is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexCatalog {
    pub species: Vec<SpeciesEntry>,
    pub moves: Vec<MoveEntry>,
}

impl DexCatalog {
    pub fn roster(&self, generation: Generation) -> Vec<&SpeciesEntry> {
        self.species
            .iter()
            .filter(|s| s.is_available_in(generation))
            .collect()
    }

    pub fn move_pool(&self, generation: Generation) -> Vec<&MoveEntry> {
        self.moves
            .iter()
            .filter(|m| m.is_available_in(generation))
            .collect()
    }

    pub fn find_species(&self, id: &str) -> Option<&SpeciesEntry> {
        self.species.iter().find(|s| s.id == id)
    }
}
