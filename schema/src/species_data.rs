use crate::{Generation, PokemonType};
use serde::{Deserialize, Serialize};

/// A species as listed in a dex catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    /// Lowercase dex id, also used as the sprite key ("mrmime").
    pub id: String,
    pub name: String,
    pub primary_type: PokemonType,
    #[serde(default)]
    pub secondary_type: Option<PokemonType>,
    /// Generation the species was introduced in.
    pub generation: Generation,
    /// Placeholder, glitch, or fan-made entries that never appear in battle.
    #[serde(default)]
    pub nonstandard: bool,
}

impl SpeciesEntry {
    /// Whether the species may be drawn for a battle in `generation`.
    pub fn is_available_in(&self, generation: Generation) -> bool {
        !self.nonstandard && self.generation <= generation
    }
}
