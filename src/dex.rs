//! Dex gateway: the read-only source of species and moves.
//!
//! The battle engine only ever talks to a [`DexGateway`]. [`StaticDex`] is the
//! bundled implementation, backed by a RON catalog that ships with the crate
//! (`data/dex.ron`) or is loaded from disk.

use crate::errors::{DexError, DexResult};
use rand::seq::IndexedRandom;
use schema::{DexCatalog, Generation, MoveEntry, PokemonType, SpeciesEntry, TypeMatchups};
use std::fs;
use std::future::Future;
use std::path::Path;

/// Dex id of a species, e.g. `"pikachu"`.
pub type CreatureId = String;

const BUNDLED_CATALOG: &str = include_str!("../data/dex.ron");

pub trait DexGateway: Send + Sync {
    /// `size` species drawn uniformly, with replacement, from the standard
    /// roster of `generation`.
    fn random_team(
        &self,
        generation: Generation,
        size: usize,
    ) -> impl Future<Output = DexResult<Vec<CreatureId>>> + Send;

    fn creature(
        &self,
        generation: Generation,
        id: &CreatureId,
    ) -> impl Future<Output = DexResult<SpeciesEntry>> + Send;

    /// Up to four distinct standard moves legal at or below `generation`.
    /// Learnsets are not consulted.
    fn moves_for(
        &self,
        generation: Generation,
        id: &CreatureId,
    ) -> impl Future<Output = DexResult<Vec<MoveEntry>>> + Send;

    fn type_matchups(&self, pokemon_type: PokemonType) -> TypeMatchups {
        pokemon_type.matchups()
    }
}

#[derive(Debug, Clone)]
pub struct StaticDex {
    catalog: DexCatalog,
}

impl StaticDex {
    pub fn new(catalog: DexCatalog) -> Self {
        StaticDex { catalog }
    }

    /// The catalog compiled into the crate.
    pub fn bundled() -> DexResult<Self> {
        Self::from_ron(BUNDLED_CATALOG)
    }

    pub fn from_ron(source: &str) -> DexResult<Self> {
        let catalog: DexCatalog = ron::from_str(source)?;
        Ok(StaticDex::new(catalog))
    }

    pub fn from_path(path: &Path) -> DexResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    pub fn catalog(&self) -> &DexCatalog {
        &self.catalog
    }

    fn draw_team(&self, generation: Generation, size: usize) -> DexResult<Vec<CreatureId>> {
        let roster = self.catalog.roster(generation);
        if roster.is_empty() {
            return Err(DexError::EmptyRoster(generation));
        }

        let mut rng = rand::rng();
        Ok((0..size)
            .filter_map(|_| roster.choose(&mut rng))
            .map(|species| species.id.clone())
            .collect())
    }

    fn lookup(&self, generation: Generation, id: &CreatureId) -> DexResult<SpeciesEntry> {
        self.catalog
            .find_species(id)
            .filter(|species| species.is_available_in(generation))
            .cloned()
            .ok_or_else(|| DexError::UnknownCreature {
                id: id.clone(),
                generation,
            })
    }

    fn draw_moves(&self, generation: Generation, id: &CreatureId) -> DexResult<Vec<MoveEntry>> {
        self.lookup(generation, id)?;

        let pool = self.catalog.move_pool(generation);
        if pool.is_empty() {
            return Err(DexError::EmptyMovePool(generation));
        }

        let mut rng = rand::rng();
        Ok(pool
            .choose_multiple(&mut rng, crate::battle::state::MAX_KNOWN_MOVES)
            .map(|entry| (*entry).clone())
            .collect())
    }
}

impl DexGateway for StaticDex {
    async fn random_team(&self, generation: Generation, size: usize) -> DexResult<Vec<CreatureId>> {
        self.draw_team(generation, size)
    }

    async fn creature(&self, generation: Generation, id: &CreatureId) -> DexResult<SpeciesEntry> {
        self.lookup(generation, id)
    }

    async fn moves_for(&self, generation: Generation, id: &CreatureId) -> DexResult<Vec<MoveEntry>> {
        self.draw_moves(generation, id)
    }
}
