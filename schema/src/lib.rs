// Pokemon Duel Schema - Shared type definitions
// This crate contains the static data types shared between the duel
// coordinator and anything that produces or inspects dex catalogs: the
// canonical type chart, generations, and the catalog entry records.

// Re-export the main types
pub use battle_data::*;
pub use generation::*;
pub use pokemon_types::*;
pub use species_data::*;

pub mod battle_data;
pub mod generation;
pub mod pokemon_types;
pub mod species_data;
