use crate::battle::state::{Creature, PlayerSide, TeamSize};
use crate::dex::DexGateway;
use crate::errors::{DexError, DexResult};
use crate::player::Participant;
use schema::Generation;

/// Draw a full random team for one participant.
///
/// Species are sampled with replacement, so the same species may appear more
/// than once within a team or across both teams. Each creature gets its own
/// random move draw.
pub async fn draw_side<D: DexGateway>(
    dex: &D,
    participant: Participant,
    generation: Generation,
    team_size: TeamSize,
) -> DexResult<PlayerSide> {
    let ids = dex.random_team(generation, team_size.get()).await?;
    if ids.len() != team_size.get() {
        return Err(DexError::Unavailable(format!(
            "asked for {} creatures, got {}",
            team_size,
            ids.len()
        )));
    }

    let mut team = Vec::with_capacity(ids.len());
    for id in &ids {
        let species = dex.creature(generation, id).await?;
        let moves = dex.moves_for(generation, id).await?;
        team.push(Creature::from_dex(&species, &moves));
    }

    tracing::debug!(
        user = %participant.id,
        %generation,
        team = ?team.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "drew team"
    );

    Ok(PlayerSide::new(participant, team))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::state::STARTING_HEALTH;
    use crate::battle::tests::common::{FailingDex, StubDex};
    use crate::dex::StaticDex;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_draw_side_from_bundled_dex() {
        let dex = StaticDex::bundled().unwrap();
        let side = draw_side(
            &dex,
            Participant::new("1", "Red"),
            Generation::LATEST,
            TeamSize::new(6).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(side.team.len(), 6);
        assert_eq!(side.active_index, 0);
        assert_eq!(side.remaining_health, STARTING_HEALTH);
        for creature in &side.team {
            assert!(!creature.known_moves.is_empty());
            assert!(creature.known_moves.len() <= 4);
        }
    }

    #[tokio::test]
    async fn test_short_team_is_rejected() {
        let dex = StubDex::short_by_one();
        let result = draw_side(
            &dex,
            Participant::new("1", "Red"),
            Generation::LATEST,
            TeamSize::DEFAULT,
        )
        .await;
        assert!(matches!(result, Err(DexError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_dex_failure_propagates() {
        let result = draw_side(
            &FailingDex,
            Participant::new("1", "Red"),
            Generation::LATEST,
            TeamSize::DEFAULT,
        )
        .await;
        assert!(result.is_err());
    }
}
