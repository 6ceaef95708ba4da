use crate::battle::state::BattleId;
use crate::player::UserId;
use schema::Generation;
use thiserror::Error;

/// Broad classification of a [`SessionError`], used by front ends to decide
/// how to surface a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape or range. Shown to the acting user.
    Validation,
    /// The action conflicts with current session state. No mutation occurred.
    StateConflict,
    /// The dex could not supply data.
    UpstreamData,
}

/// Main error type for the duel coordinator.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid opponent: {0}")]
    InvalidOpponent(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("malformed component id '{0}'")]
    MalformedComponent(String),

    #[error("it is not {0}'s turn")]
    NotYourTurn(UserId),

    #[error("{0} is already in a battle")]
    AlreadyInBattle(UserId),

    #[error("no pending challenge from {0}")]
    NoSuchChallenge(UserId),

    #[error("the challenge from {0} has expired")]
    ChallengeExpired(UserId),

    #[error("{0} is not in an active battle")]
    NoSuchBattle(String),

    #[error("the challenge from {challenger} is addressed to {opponent}, not {responder}")]
    NotAddressee {
        challenger: UserId,
        opponent: UserId,
        responder: UserId,
    },

    #[error(transparent)]
    Dex(#[from] DexError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::InvalidOpponent(_)
            | SessionError::InvalidParameters(_)
            | SessionError::IndexOutOfRange { .. }
            | SessionError::MalformedComponent(_) => ErrorKind::Validation,
            SessionError::NotYourTurn(_)
            | SessionError::AlreadyInBattle(_)
            | SessionError::NoSuchChallenge(_)
            | SessionError::ChallengeExpired(_)
            | SessionError::NoSuchBattle(_)
            | SessionError::NotAddressee { .. } => ErrorKind::StateConflict,
            SessionError::Dex(_) => ErrorKind::UpstreamData,
        }
    }

    pub(crate) fn no_battle_for_user(user: &UserId) -> Self {
        SessionError::NoSuchBattle(user.to_string())
    }

    pub(crate) fn no_battle(id: &BattleId) -> Self {
        SessionError::NoSuchBattle(id.to_string())
    }
}

/// Errors raised by a dex gateway.
#[derive(Debug, Error)]
pub enum DexError {
    #[error("failed to read dex catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dex catalog: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("no standard species available in {0}")]
    EmptyRoster(Generation),

    #[error("no standard moves available in {0}")]
    EmptyMovePool(Generation),

    #[error("unknown creature '{id}' in {generation}")]
    UnknownCreature { id: String, generation: Generation },

    #[error("dex unavailable: {0}")]
    Unavailable(String),
}

/// A presenter failed to deliver an event. Never rolls back session state.
#[derive(Debug, Clone, Error)]
#[error("failed to deliver {event} to {audience}: {reason}")]
pub struct DeliveryError {
    pub event: &'static str,
    pub audience: String,
    pub reason: String,
}

/// Type alias for Results using SessionError
pub type SessionResult<T> = Result<T, SessionError>;

/// Type alias for Results using DexError
pub type DexResult<T> = Result<T, DexError>;
