//! Inbound actions and the component ids attached to interactive buttons.

use crate::errors::SessionError;
use crate::player::{Participant, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Decline,
}

/// Everything a user can ask the coordinator to do.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// `/retar`. Generation and team size arrive raw and are validated later.
    Challenge {
        challenger: Participant,
        opponent: Participant,
        generation: Option<String>,
        team_size: Option<i64>,
    },
    RespondChallenge {
        challenger: UserId,
        responder: UserId,
        decision: Decision,
    },
    /// Zero-based team index.
    SelectCreature { user: UserId, index: usize },
    /// One-based, as shown on the buttons.
    SelectMove { user: UserId, move_number: usize },
    ShowTypeChart { type_name: Option<String> },
    ShowHelp,
}

impl Action {
    /// The user who triggered the action, if it has one.
    pub fn actor(&self) -> Option<&UserId> {
        match self {
            Action::Challenge { challenger, .. } => Some(&challenger.id),
            Action::RespondChallenge { responder, .. } => Some(responder),
            Action::SelectCreature { user, .. } | Action::SelectMove { user, .. } => Some(user),
            Action::ShowTypeChart { .. } | Action::ShowHelp => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Challenge { .. } => "challenge",
            Action::RespondChallenge { .. } => "respond_challenge",
            Action::SelectCreature { .. } => "select_creature",
            Action::SelectMove { .. } => "select_move",
            Action::ShowTypeChart { .. } => "show_type_chart",
            Action::ShowHelp => "show_help",
        }
    }
}

/// Id carried by an interactive button, e.g. `accept:1234` or `move:2`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentId {
    Accept { challenger: UserId },
    Decline { challenger: UserId },
    Creature { index: usize },
    Move { number: usize },
}

impl ComponentId {
    /// Turn a button press into the action it stands for.
    pub fn into_action(self, clicked_by: UserId) -> Action {
        match self {
            ComponentId::Accept { challenger } => Action::RespondChallenge {
                challenger,
                responder: clicked_by,
                decision: Decision::Accept,
            },
            ComponentId::Decline { challenger } => Action::RespondChallenge {
                challenger,
                responder: clicked_by,
                decision: Decision::Decline,
            },
            ComponentId::Creature { index } => Action::SelectCreature {
                user: clicked_by,
                index,
            },
            ComponentId::Move { number } => Action::SelectMove {
                user: clicked_by,
                move_number: number,
            },
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Accept { challenger } => write!(f, "accept:{}", challenger),
            ComponentId::Decline { challenger } => write!(f, "decline:{}", challenger),
            ComponentId::Creature { index } => write!(f, "creature:{}", index),
            ComponentId::Move { number } => write!(f, "move:{}", number),
        }
    }
}

impl FromStr for ComponentId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SessionError::MalformedComponent(s.to_string());
        let (kind, value) = s.split_once(':').ok_or_else(malformed)?;
        if value.is_empty() {
            return Err(malformed());
        }

        match kind {
            "accept" => Ok(ComponentId::Accept {
                challenger: UserId::from(value),
            }),
            "decline" => Ok(ComponentId::Decline {
                challenger: UserId::from(value),
            }),
            "creature" => value
                .parse()
                .map(|index| ComponentId::Creature { index })
                .map_err(|_| malformed()),
            "move" => value
                .parse()
                .map(|number| ComponentId::Move { number })
                .map_err(|_| malformed()),
            _ => Err(malformed()),
        }
    }
}

impl TryFrom<String> for ComponentId {
    type Error = SessionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        id.to_string()
    }
}
