use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identifier of a chat user. For a Discord user this is the
/// snowflake id as a string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId(id)
    }
}

/// A user as seen at the moment they issued or received an action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
    // Bot accounts can be mentioned but never challenged.
    #[serde(default)]
    pub automated: bool,
}

impl Participant {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Participant {
            id: id.into(),
            display_name: display_name.into(),
            automated: false,
        }
    }

    pub fn automated(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Participant {
            automated: true,
            ..Participant::new(id, display_name)
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}
