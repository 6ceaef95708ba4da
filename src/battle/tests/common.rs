use crate::battle::state::{Battle, Creature, Move, PlayerSide};
use crate::dex::{CreatureId, DexGateway};
use crate::errors::{DexError, DexResult};
use crate::player::Participant;
use schema::{Generation, MoveEntry, PokemonType, SpeciesEntry};

const TEST_MOVES: [(&str, PokemonType); 4] = [
    ("Tackle", PokemonType::Normal),
    ("Ember", PokemonType::Fire),
    ("Water Gun", PokemonType::Water),
    ("Vine Whip", PokemonType::Grass),
];

pub fn gen9() -> Generation {
    Generation::LATEST
}

/// Ash (id "1") and Gary (id "2").
pub fn participants() -> (Participant, Participant) {
    (Participant::new("1", "Ash"), Participant::new("2", "Gary"))
}

/// A creature whose moves all have 40 power.
pub fn test_creature(name: &str, move_count: usize) -> Creature {
    Creature {
        name: name.to_string(),
        primary_type: PokemonType::Normal,
        known_moves: TEST_MOVES
            .iter()
            .take(move_count)
            .map(|(move_name, move_type)| Move {
                name: move_name.to_string(),
                move_type: *move_type,
                power: 40,
                accuracy: Some(100),
            })
            .collect(),
        sprite_ref: name.to_lowercase(),
    }
}

/// A builder for battle fixtures that skip the dex entirely.
///
/// # Example
/// ```
/// let battle = TestBattleBuilder::new(3).with_health(10, 100).build();
/// ```
pub struct TestBattleBuilder {
    team_size: usize,
    move_count: usize,
    health: (i32, i32),
}

impl TestBattleBuilder {
    pub fn new(team_size: usize) -> Self {
        Self {
            team_size,
            move_count: 4,
            health: (100, 100),
        }
    }

    pub fn with_moves(mut self, move_count: usize) -> Self {
        self.move_count = move_count;
        self
    }

    /// Starting health for Ash and Gary.
    pub fn with_health(mut self, ash: i32, gary: i32) -> Self {
        self.health = (ash, gary);
        self
    }

    pub fn build(self) -> Battle {
        let (ash, gary) = participants();
        let team = |prefix: &str| -> Vec<Creature> {
            (0..self.team_size)
                .map(|i| test_creature(&format!("{}{}", prefix, i), self.move_count))
                .collect()
        };

        let mut side_a = PlayerSide::new(ash, team("Ash"));
        let mut side_b = PlayerSide::new(gary, team("Gary"));
        side_a.remaining_health = self.health.0;
        side_b.remaining_health = self.health.1;

        Battle::new(side_a, side_b, gen9())
    }
}

/// Ash vs Gary, `team_size` creatures each with four moves, full health.
pub fn test_battle(team_size: usize) -> Battle {
    TestBattleBuilder::new(team_size).build()
}

/// Deterministic in-memory dex. Every species is `"stub<n>"`.
#[derive(Debug, Clone, Default)]
pub struct StubDex {
    missing: usize,
}

impl StubDex {
    /// A dex that always returns one creature fewer than requested.
    pub fn short_by_one() -> Self {
        StubDex { missing: 1 }
    }
}

impl DexGateway for StubDex {
    async fn random_team(&self, _generation: Generation, size: usize) -> DexResult<Vec<CreatureId>> {
        Ok((0..size.saturating_sub(self.missing))
            .map(|i| format!("stub{}", i))
            .collect())
    }

    async fn creature(&self, generation: Generation, id: &CreatureId) -> DexResult<SpeciesEntry> {
        Ok(SpeciesEntry {
            id: id.clone(),
            name: id.to_uppercase(),
            primary_type: PokemonType::Normal,
            secondary_type: None,
            generation,
            nonstandard: false,
        })
    }

    async fn moves_for(&self, generation: Generation, _id: &CreatureId) -> DexResult<Vec<MoveEntry>> {
        Ok(TEST_MOVES
            .iter()
            .map(|(name, move_type)| MoveEntry {
                id: name.to_lowercase().replace(' ', ""),
                name: name.to_string(),
                move_type: *move_type,
                power: 40,
                accuracy: Some(100),
                generation,
                nonstandard: false,
            })
            .collect())
    }
}

/// A dex whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingDex;

impl DexGateway for FailingDex {
    async fn random_team(&self, _generation: Generation, _size: usize) -> DexResult<Vec<CreatureId>> {
        Err(DexError::Unavailable("dex is down".to_string()))
    }

    async fn creature(&self, _generation: Generation, _id: &CreatureId) -> DexResult<SpeciesEntry> {
        Err(DexError::Unavailable("dex is down".to_string()))
    }

    async fn moves_for(&self, _generation: Generation, _id: &CreatureId) -> DexResult<Vec<MoveEntry>> {
        Err(DexError::Unavailable("dex is down".to_string()))
    }
}
