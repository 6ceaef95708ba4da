//! Challenge workflow.
//!
//! Validation of `/retar` requests lives here so the same rules apply whether
//! a challenge arrives from a slash command, a tool call, or a test:
//!
//! 1. an automated opponent is rejected,
//! 2. so is challenging yourself,
//! 3. neither side may already be in a battle,
//! 4. the generation must be "1" through "9" and the team size 1 through 6.

use crate::battle::state::TeamSize;
use crate::errors::{SessionError, SessionResult};
use crate::player::{Participant, UserId};
use crate::registry::SessionRegistry;
use schema::Generation;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// A pending offer from one user to another.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub challenger: Participant,
    pub opponent: Participant,
    pub generation: Generation,
    pub team_size: TeamSize,
    pub created_at: Instant,
}

impl Challenge {
    pub fn new(
        challenger: Participant,
        opponent: Participant,
        generation: Generation,
        team_size: TeamSize,
    ) -> Self {
        Challenge {
            challenger,
            opponent,
            generation,
            team_size,
            created_at: Instant::now(),
        }
    }

    pub fn involves(&self, user: &UserId) -> bool {
        &self.challenger.id == user || &self.opponent.id == user
    }

    pub fn view(&self) -> ChallengeView {
        ChallengeView {
            challenger: self.challenger.clone(),
            opponent: self.opponent.clone(),
            generation: self.generation,
            team_size: self.team_size,
        }
    }
}

/// Serializable snapshot of a challenge for presentation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChallengeView {
    pub challenger: Participant,
    pub opponent: Participant,
    pub generation: Generation,
    pub team_size: TeamSize,
}

/// Raw `/retar` input, before validation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChallengeRequest {
    pub challenger: Participant,
    pub opponent: Participant,
    pub generation: Option<String>,
    pub team_size: Option<i64>,
}

/// Values used when a request leaves the generation or team size out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeDefaults {
    pub generation: Generation,
    pub team_size: TeamSize,
}

impl Default for ChallengeDefaults {
    fn default() -> Self {
        ChallengeDefaults {
            generation: Generation::LATEST,
            team_size: TeamSize::DEFAULT,
        }
    }
}

/// Rules 1 and 2.
pub fn validate_opponent(challenger: &Participant, opponent: &Participant) -> SessionResult<()> {
    if opponent.automated {
        return Err(SessionError::InvalidOpponent(format!(
            "{} is a bot",
            opponent.display_name
        )));
    }
    if opponent.id == challenger.id {
        return Err(SessionError::InvalidOpponent(
            "you cannot challenge yourself".to_string(),
        ));
    }
    Ok(())
}

pub fn parse_generation(raw: Option<&str>, default: Generation) -> SessionResult<Generation> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse::<Generation>()
            .map_err(|e| SessionError::InvalidParameters(e.to_string())),
    }
}

pub fn parse_team_size(raw: Option<i64>, default: TeamSize) -> SessionResult<TeamSize> {
    match raw {
        None => Ok(default),
        Some(raw) => u8::try_from(raw)
            .ok()
            .and_then(TeamSize::new)
            .ok_or_else(|| {
                SessionError::InvalidParameters(format!(
                    "team size {} is outside {}-{}",
                    raw,
                    TeamSize::MIN,
                    TeamSize::MAX
                ))
            }),
    }
}

/// Validate a request and store it as the challenger's pending challenge.
///
/// Nothing is written to the registry unless every rule passes.
pub async fn open_challenge(
    registry: &SessionRegistry,
    request: ChallengeRequest,
    defaults: ChallengeDefaults,
) -> SessionResult<Challenge> {
    validate_opponent(&request.challenger, &request.opponent)?;
    registry
        .ensure_available(&[&request.challenger.id, &request.opponent.id])
        .await?;

    let generation = parse_generation(request.generation.as_deref(), defaults.generation)?;
    let team_size = parse_team_size(request.team_size, defaults.team_size)?;

    registry
        .register_challenge(request.challenger, request.opponent, generation, team_size)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn request(generation: Option<&str>, team_size: Option<i64>) -> ChallengeRequest {
        ChallengeRequest {
            challenger: Participant::new("1", "Ash"),
            opponent: Participant::new("2", "Gary"),
            generation: generation.map(str::to_string),
            team_size,
        }
    }

    #[test]
    fn test_bot_and_self_are_invalid_opponents() {
        let ash = Participant::new("1", "Ash");
        let bot = Participant::automated("99", "Showdown Bot");

        assert!(matches!(
            validate_opponent(&ash, &bot),
            Err(SessionError::InvalidOpponent(_))
        ));
        assert!(matches!(
            validate_opponent(&ash, &ash.clone()),
            Err(SessionError::InvalidOpponent(_))
        ));
        assert!(validate_opponent(&ash, &Participant::new("2", "Gary")).is_ok());
    }

    #[test]
    fn test_defaults_apply_when_omitted() {
        let defaults = ChallengeDefaults::default();
        assert_eq!(parse_generation(None, defaults.generation).unwrap(), Generation::LATEST);
        assert_eq!(parse_team_size(None, defaults.team_size).unwrap(), TeamSize::DEFAULT);
    }

    #[rstest]
    #[case("smallest team", 1, Some(1))]
    #[case("largest team", 6, Some(6))]
    #[case("empty team", 0, None)]
    #[case("one too many", 7, None)]
    #[case("negative", -3, None)]
    fn test_team_size_bounds(#[case] desc: &str, #[case] raw: i64, #[case] expected: Option<usize>) {
        let parsed = parse_team_size(Some(raw), TeamSize::DEFAULT).ok().map(TeamSize::get);
        assert_eq!(parsed, expected, "{}", desc);
    }

    #[rstest]
    #[case("1")]
    #[case("9")]
    fn test_generation_strings_accepted(#[case] raw: &str) {
        assert!(parse_generation(Some(raw), Generation::LATEST).is_ok());
    }

    #[rstest]
    #[case("0")]
    #[case("10")]
    #[case("nine")]
    #[case("")]
    #[case(" 9 ")]
    fn test_generation_strings_rejected(#[case] raw: &str) {
        assert!(matches!(
            parse_generation(Some(raw), Generation::LATEST),
            Err(SessionError::InvalidParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_generation_ten_is_rejected_before_registry_mutation() {
        let registry = SessionRegistry::default();
        let result = open_challenge(
            &registry,
            request(Some("10"), None),
            ChallengeDefaults::default(),
        )
        .await;

        assert!(matches!(result, Err(SessionError::InvalidParameters(_))));
        assert!(registry.pending_challenge(&UserId::from("1")).await.is_none());
    }

    #[tokio::test]
    async fn test_open_challenge_stores_parsed_terms() {
        let registry = SessionRegistry::default();
        let challenge = open_challenge(
            &registry,
            request(Some("4"), Some(2)),
            ChallengeDefaults::default(),
        )
        .await
        .unwrap();

        assert_eq!(challenge.generation.number(), 4);
        assert_eq!(challenge.team_size.get(), 2);

        let stored = registry.pending_challenge(&UserId::from("1")).await.unwrap();
        assert_eq!(stored.view(), challenge.view());
    }
}
