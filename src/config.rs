use crate::battle::state::TeamSize;
use crate::challenge::ChallengeDefaults;
use crate::damage::{FlatRandomDamage, DEFAULT_MAX_DAMAGE, DEFAULT_MIN_DAMAGE};
use crate::dex::StaticDex;
use crate::errors::DexResult;
use schema::Generation;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CHALLENGE_TTL_SECS: u64 = 900;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{var}={value:?} is invalid: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Coordinator configuration loaded from environment variables.
///
/// | Env Var                   | Default          |
/// |---------------------------|------------------|
/// | `DUEL_DEFAULT_GENERATION` | `9`              |
/// | `DUEL_DEFAULT_TEAM_SIZE`  | `3`              |
/// | `DUEL_DAMAGE_MIN`         | `20`             |
/// | `DUEL_DAMAGE_MAX`         | `50`             |
/// | `DUEL_CHALLENGE_TTL_SECS` | `900` (0 = off)  |
/// | `DUEL_DEX_PATH`           | bundled catalog  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuelConfig {
    pub default_generation: Generation,
    pub default_team_size: TeamSize,
    pub damage_min: i32,
    pub damage_max: i32,
    /// `None` keeps challenges until they are answered.
    pub challenge_ttl: Option<Duration>,
    pub dex_path: Option<PathBuf>,
}

impl Default for DuelConfig {
    fn default() -> Self {
        DuelConfig {
            default_generation: Generation::LATEST,
            default_team_size: TeamSize::DEFAULT,
            damage_min: DEFAULT_MIN_DAMAGE,
            damage_max: DEFAULT_MAX_DAMAGE,
            challenge_ttl: Some(Duration::from_secs(DEFAULT_CHALLENGE_TTL_SECS)),
            dex_path: None,
        }
    }
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl DuelConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from any variable source. Unset or blank variables keep
    /// their defaults; set but unparsable ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = DuelConfig::default();

        if let Some(raw) = get("DUEL_DEFAULT_GENERATION") {
            config.default_generation = raw
                .trim()
                .parse()
                .map_err(|e| invalid("DUEL_DEFAULT_GENERATION", &raw, e))?;
        }

        if let Some(raw) = get("DUEL_DEFAULT_TEAM_SIZE") {
            config.default_team_size = raw
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(TeamSize::new)
                .ok_or_else(|| invalid("DUEL_DEFAULT_TEAM_SIZE", &raw, "expected 1-6"))?;
        }

        if let Some(raw) = get("DUEL_DAMAGE_MIN") {
            config.damage_min = raw
                .trim()
                .parse()
                .map_err(|e| invalid("DUEL_DAMAGE_MIN", &raw, e))?;
        }

        if let Some(raw) = get("DUEL_DAMAGE_MAX") {
            config.damage_max = raw
                .trim()
                .parse()
                .map_err(|e| invalid("DUEL_DAMAGE_MAX", &raw, e))?;
        }

        if config.damage_min < 0 || config.damage_min > config.damage_max {
            return Err(invalid(
                "DUEL_DAMAGE_MIN",
                &config.damage_min.to_string(),
                format!("must be between 0 and DUEL_DAMAGE_MAX ({})", config.damage_max),
            ));
        }

        if let Some(raw) = get("DUEL_CHALLENGE_TTL_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|e| invalid("DUEL_CHALLENGE_TTL_SECS", &raw, e))?;
            config.challenge_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.dex_path = get("DUEL_DEX_PATH").map(PathBuf::from);

        Ok(config)
    }

    pub fn challenge_defaults(&self) -> ChallengeDefaults {
        ChallengeDefaults {
            generation: self.default_generation,
            team_size: self.default_team_size,
        }
    }

    pub fn damage_policy(&self) -> FlatRandomDamage {
        FlatRandomDamage::new(self.damage_min, self.damage_max)
    }

    /// The catalog at `dex_path`, or the bundled one.
    pub fn load_dex(&self) -> DexResult<StaticDex> {
        match &self.dex_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading dex catalog");
                StaticDex::from_path(path)
            }
            None => StaticDex::bundled(),
        }
    }
}
