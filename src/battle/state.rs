use crate::player::{Participant, UserId};
use schema::{Generation, MoveEntry, PokemonType, SpeciesEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Health every side starts a battle with.
pub const STARTING_HEALTH: i32 = 100;

/// A creature never knows more than this many moves.
pub const MAX_KNOWN_MOVES: usize = 4;

/// Identifier of a battle: the ordered pair of its participants.
///
/// Kept as a pair rather than a joined string, since user ids are opaque and
/// may themselves contain the `-` used when rendering.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct BattleId {
    pub challenger: UserId,
    pub opponent: UserId,
}

impl BattleId {
    pub fn for_pair(challenger: &UserId, opponent: &UserId) -> Self {
        BattleId {
            challenger: challenger.clone(),
            opponent: opponent.clone(),
        }
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.challenger, self.opponent)
    }
}

/// Number of creatures per team, 1 through 6.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub struct TeamSize(u8);

impl TeamSize {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;
    pub const DEFAULT: TeamSize = TeamSize(3);

    pub fn new(size: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&size).then_some(TeamSize(size))
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for TeamSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<TeamSize> for u8 {
    fn from(size: TeamSize) -> Self {
        size.0
    }
}

impl TryFrom<u8> for TeamSize {
    type Error = String;

    fn try_from(size: u8) -> Result<Self, Self::Error> {
        TeamSize::new(size).ok_or_else(|| format!("team size {} is outside 1-6", size))
    }
}

impl fmt::Display for TeamSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Move {
    pub name: String,
    pub move_type: PokemonType,
    pub power: u16,
    pub accuracy: Option<u8>,
}

impl From<&MoveEntry> for Move {
    fn from(entry: &MoveEntry) -> Self {
        Move {
            name: entry.name.clone(),
            move_type: entry.move_type,
            power: entry.power,
            accuracy: entry.accuracy,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Creature {
    pub name: String,
    pub primary_type: PokemonType,
    pub known_moves: Vec<Move>,
    pub sprite_ref: String,
}

impl Creature {
    /// Build a creature from dex entries, keeping at most four moves.
    pub fn from_dex(species: &SpeciesEntry, moves: &[MoveEntry]) -> Self {
        Creature {
            name: species.name.clone(),
            primary_type: species.primary_type,
            known_moves: moves.iter().take(MAX_KNOWN_MOVES).map(Move::from).collect(),
            sprite_ref: species.id.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlayerSide {
    pub participant: Participant,
    pub team: Vec<Creature>,
    // Index into `team` of the creature currently in play.
    pub active_index: usize,
    // Shared by the whole team. May end below zero.
    pub remaining_health: i32,
}

impl PlayerSide {
    pub fn new(participant: Participant, team: Vec<Creature>) -> Self {
        PlayerSide {
            participant,
            team,
            active_index: 0,
            remaining_health: STARTING_HEALTH,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.participant.id
    }

    /// Get the currently active creature
    pub fn active_creature(&self) -> Option<&Creature> {
        self.team.get(self.active_index)
    }

    pub fn is_defeated(&self) -> bool {
        self.remaining_health <= 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    AwaitingCreatureSelection,
    AwaitingMoveSelection,
    Finished,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Battle {
    pub id: BattleId,
    /// Side A (the challenger) at index 0, side B (the opponent) at index 1.
    pub sides: [PlayerSide; 2],
    pub turn_owner: UserId,
    pub phase: BattlePhase,
    pub generation: Generation,
    pub last_update: SystemTime,
}

impl Battle {
    pub fn new(side_a: PlayerSide, side_b: PlayerSide, generation: Generation) -> Self {
        Battle {
            id: BattleId::for_pair(side_a.user_id(), side_b.user_id()),
            turn_owner: side_a.user_id().clone(),
            sides: [side_a, side_b],
            phase: BattlePhase::AwaitingCreatureSelection,
            generation,
            last_update: SystemTime::now(),
        }
    }

    pub fn side_index(&self, user: &UserId) -> Option<usize> {
        self.sides.iter().position(|side| side.user_id() == user)
    }

    pub fn side(&self, user: &UserId) -> Option<&PlayerSide> {
        self.side_index(user).map(|i| &self.sides[i])
    }

    /// The side of whoever is not `user`.
    pub fn opposing_side(&self, user: &UserId) -> Option<&PlayerSide> {
        self.side_index(user).map(|i| &self.sides[1 - i])
    }

    pub fn turn_owner_side(&self) -> Option<&PlayerSide> {
        self.side(&self.turn_owner)
    }

    pub fn involves(&self, user: &UserId) -> bool {
        self.side_index(user).is_some()
    }

    pub fn team_size(&self) -> usize {
        self.sides[0].team.len()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == BattlePhase::Finished
    }

    /// The winner of a finished battle: the side whose opponent dropped to zero.
    pub fn winner(&self) -> Option<&UserId> {
        if !self.is_finished() {
            return None;
        }
        self.sides
            .iter()
            .position(PlayerSide::is_defeated)
            .map(|loser| self.sides[1 - loser].user_id())
    }
}
