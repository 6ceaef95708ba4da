//! Pokemon Duel Coordinator
//!
//! Turns challenge, accept/decline, creature-selection and move-selection
//! actions arriving from independent chat users into consistent, turn-ordered
//! battles. Rendering and the creature dex are reached through narrow traits.

// --- MODULE DECLARATIONS ---
pub mod actions;
pub mod battle;
pub mod challenge;
pub mod config;
pub mod coordinator;
pub mod damage;
pub mod dex;
pub mod errors;
pub mod events;
pub mod player;
pub mod presenter;
pub mod registry;
pub mod teams;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    DexCatalog, Generation, GenerationError, MoveEntry, PokemonType, SpeciesEntry, TypeMatchups,
};

// --- From this crate's modules (`src/`) ---

// Inbound actions and the entry point that handles them.
pub use actions::{Action, ComponentId, Decision};
pub use coordinator::Coordinator;

// Session state.
pub use battle::engine::{create_battle, select_creature, select_move, MoveOutcome};
pub use battle::state::{Battle, BattleId, BattlePhase, Creature, Move, PlayerSide, TeamSize};
pub use challenge::{Challenge, ChallengeRequest};
pub use player::{Participant, UserId};
pub use registry::{Resolution, SessionRegistry};

// Collaborators.
pub use config::{ConfigError, DuelConfig};
pub use damage::{DamagePolicy, FixedDamage, FlatRandomDamage};
pub use dex::{DexGateway, StaticDex};
pub use events::{Audience, OutboundEvent};
pub use presenter::{ChannelPresenter, DispatchReport, LogPresenter, Presenter};

// Crate-specific error and result types.
pub use errors::{DeliveryError, DexError, DexResult, ErrorKind, SessionError, SessionResult};
