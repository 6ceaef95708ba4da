use crate::battle::state::{Battle, BattlePhase, Move, TeamSize};
use crate::damage::DamagePolicy;
use crate::dex::DexGateway;
use crate::errors::{DexResult, SessionError, SessionResult};
use crate::player::{Participant, UserId};
use crate::teams::draw_side;
use schema::Generation;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// What a single `select_move` did to the battle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub attacker: UserId,
    pub defender: UserId,
    pub move_used: Move,
    pub damage_dealt: i32,
    pub defender_remaining_health: i32,
    pub winner: Option<UserId>,
}

/// Build a new battle between the challenger (side A) and the opponent
/// (side B). Side A moves first.
pub async fn create_battle<D: DexGateway>(
    dex: &D,
    player_a: Participant,
    player_b: Participant,
    generation: Generation,
    team_size: TeamSize,
) -> DexResult<Battle> {
    let side_a = draw_side(dex, player_a, generation, team_size).await?;
    let side_b = draw_side(dex, player_b, generation, team_size).await?;

    let battle = Battle::new(side_a, side_b, generation);
    tracing::info!(battle = %battle.id, %generation, %team_size, "battle created");
    Ok(battle)
}

/// Rejects actions on finished battles and from anyone but the turn owner.
/// Returns the acting side's index.
fn ensure_turn(battle: &Battle, actor: &UserId) -> SessionResult<usize> {
    if battle.is_finished() {
        return Err(SessionError::no_battle(&battle.id));
    }
    let index = battle
        .side_index(actor)
        .ok_or_else(|| SessionError::no_battle_for_user(actor))?;
    if &battle.turn_owner != actor {
        return Err(SessionError::NotYourTurn(actor.clone()));
    }
    Ok(index)
}

/// Put the creature at `index` into play for the acting side.
pub fn select_creature(battle: &mut Battle, actor: &UserId, index: usize) -> SessionResult<()> {
    let side_index = ensure_turn(battle, actor)?;
    let side = &mut battle.sides[side_index];

    if index >= side.team.len() {
        return Err(SessionError::IndexOutOfRange {
            index,
            len: side.team.len(),
        });
    }

    side.active_index = index;
    battle.phase = BattlePhase::AwaitingMoveSelection;
    battle.last_update = SystemTime::now();

    tracing::debug!(battle = %battle.id, user = %actor, index, "creature selected");
    Ok(())
}

/// Use move `move_index` of the acting side's active creature.
///
/// On a knockout the battle moves to `Finished` and the attacker wins;
/// otherwise the turn passes to the defender.
pub fn select_move<P: DamagePolicy + ?Sized>(
    battle: &mut Battle,
    actor: &UserId,
    move_index: usize,
    policy: &P,
) -> SessionResult<MoveOutcome> {
    let attacker_index = ensure_turn(battle, actor)?;
    let defender_index = 1 - attacker_index;

    let attacker_side = &battle.sides[attacker_index];
    let attacker = attacker_side
        .active_creature()
        .ok_or(SessionError::IndexOutOfRange {
            index: attacker_side.active_index,
            len: attacker_side.team.len(),
        })?;
    let move_used = attacker
        .known_moves
        .get(move_index)
        .cloned()
        .ok_or(SessionError::IndexOutOfRange {
            index: move_index,
            len: attacker.known_moves.len(),
        })?;

    let defender_side = &battle.sides[defender_index];
    let defender = defender_side
        .active_creature()
        .ok_or(SessionError::IndexOutOfRange {
            index: defender_side.active_index,
            len: defender_side.team.len(),
        })?;

    // Health never goes back up, whatever the policy returns.
    let damage_dealt = policy.damage(&move_used, attacker, defender).max(0);

    let defender_side = &mut battle.sides[defender_index];
    defender_side.remaining_health -= damage_dealt;
    let defender_id = defender_side.user_id().clone();
    let defender_remaining_health = defender_side.remaining_health;
    let knocked_out = defender_side.is_defeated();

    let winner = if knocked_out {
        battle.phase = BattlePhase::Finished;
        Some(actor.clone())
    } else {
        battle.turn_owner = defender_id.clone();
        battle.phase = BattlePhase::AwaitingCreatureSelection;
        None
    };
    battle.last_update = SystemTime::now();

    tracing::info!(
        battle = %battle.id,
        attacker = %actor,
        defender = %defender_id,
        move_name = %move_used.name,
        damage = damage_dealt,
        remaining = defender_remaining_health,
        finished = knocked_out,
        "move resolved"
    );

    Ok(MoveOutcome {
        attacker: actor.clone(),
        defender: defender_id,
        move_used,
        damage_dealt,
        defender_remaining_health,
        winner,
    })
}
