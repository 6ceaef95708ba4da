use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A mainline game generation, 1 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Generation(u8);

impl Generation {
    pub const FIRST: Generation = Generation(1);
    pub const LATEST: Generation = Generation(9);

    pub fn new(number: u8) -> Option<Self> {
        (Self::FIRST.0..=Self::LATEST.0)
            .contains(&number)
            .then_some(Generation(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Generation> {
        (Self::FIRST.0..=Self::LATEST.0).map(Generation)
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen {}", self.0)
    }
}

impl From<Generation> for u8 {
    fn from(generation: Generation) -> Self {
        generation.0
    }
}

impl TryFrom<u8> for Generation {
    type Error = GenerationError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Generation::new(number).ok_or_else(|| GenerationError(number.to_string()))
    }
}

/// Accepts exactly the strings "1" through "9".
impl FromStr for Generation {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 1 {
            return Err(GenerationError(s.to_string()));
        }
        s.parse::<u8>()
            .ok()
            .and_then(Generation::new)
            .ok_or_else(|| GenerationError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError(pub String);

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid generation '{}', expected 1-9", self.0)
    }
}

impl std::error::Error for GenerationError {}
