//! Session registry: the single owner of pending challenges and live battles.
//!
//! Two levels of locking:
//! - one short-lived index lock over the user -> challenge / battle maps,
//!   a plain `std::sync::Mutex` that is never held across an await;
//! - one async lock per battle, held for a whole transition.
//!
//! Locks are always taken battle first, index second.

use crate::actions::Decision;
use crate::battle::state::{Battle, BattleId, TeamSize};
use crate::challenge::{validate_opponent, Challenge};
use crate::errors::{DexResult, SessionError, SessionResult};
use crate::player::{Participant, UserId};
use schema::Generation;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Duration;

type BattleHandle = Arc<tokio::sync::Mutex<Battle>>;

/// Result of answering a challenge.
#[derive(Debug, Clone)]
pub enum Resolution {
    Accepted(Battle),
    Declined(Challenge),
}

#[derive(Debug, Default)]
struct SessionIndex {
    // Keyed by challenger.
    pending: HashMap<UserId, Challenge>,
    // Challenges whose battle is being built right now, keyed by challenger.
    accepting: HashMap<UserId, Challenge>,
    members: HashMap<UserId, BattleId>,
    battles: HashMap<BattleId, BattleHandle>,
}

impl SessionIndex {
    fn ensure_free(&self, user: &UserId) -> SessionResult<()> {
        let busy = self.members.contains_key(user)
            || self.accepting.values().any(|c| c.involves(user));
        if busy {
            return Err(SessionError::AlreadyInBattle(user.clone()));
        }
        Ok(())
    }

    fn battle_handle(&self, user: &UserId) -> Option<BattleHandle> {
        self.members
            .get(user)
            .and_then(|id| self.battles.get(id))
            .cloned()
    }

    fn detach(&mut self, id: &BattleId) -> bool {
        self.members.retain(|_, battle_id| battle_id != id);
        self.battles.remove(id).is_some()
    }

    /// Move a reserved challenge back to pending.
    fn release(&mut self, challenger: &UserId) -> bool {
        match self.accepting.remove(challenger) {
            Some(challenge) => {
                self.pending.insert(challenger.clone(), challenge);
                true
            }
            None => false,
        }
    }
}

// Every critical section leaves the maps consistent, so poisoning is ignored.
fn lock(index: &Mutex<SessionIndex>) -> MutexGuard<'_, SessionIndex> {
    index.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A challenge parked in `accepting` while its battle is built.
///
/// Unless disarmed, dropping it puts the challenge back to pending. This
/// covers an accept whose future is dropped mid-build.
struct Reservation<'a> {
    index: &'a Mutex<SessionIndex>,
    challenger: UserId,
    armed: bool,
}

impl Reservation<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed && lock(self.index).release(&self.challenger) {
            tracing::warn!(
                challenger = %self.challenger,
                "battle setup abandoned, challenge restored"
            );
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    index: Mutex<SessionIndex>,
    challenge_ttl: Option<Duration>,
}

impl SessionRegistry {
    /// `challenge_ttl` of `None` keeps pending challenges until answered.
    pub fn new(challenge_ttl: Option<Duration>) -> Self {
        SessionRegistry {
            index: Mutex::new(SessionIndex::default()),
            challenge_ttl,
        }
    }

    fn is_expired(&self, challenge: &Challenge) -> bool {
        self.challenge_ttl
            .is_some_and(|ttl| challenge.created_at.elapsed() > ttl)
    }

    /// Fails with `AlreadyInBattle` for the first listed user who is in a
    /// battle or in one being set up.
    pub async fn ensure_available(&self, users: &[&UserId]) -> SessionResult<()> {
        let index = lock(&self.index);
        users.iter().try_for_each(|user| index.ensure_free(user))
    }

    /// Store a challenge, replacing any earlier one from the same challenger.
    pub async fn register_challenge(
        &self,
        challenger: Participant,
        opponent: Participant,
        generation: Generation,
        team_size: TeamSize,
    ) -> SessionResult<Challenge> {
        validate_opponent(&challenger, &opponent)?;

        let mut index = lock(&self.index);
        index.ensure_free(&challenger.id)?;
        index.ensure_free(&opponent.id)?;

        let challenge = Challenge::new(challenger, opponent, generation, team_size);
        let replaced = index
            .pending
            .insert(challenge.challenger.id.clone(), challenge.clone());

        tracing::info!(
            challenger = %challenge.challenger.id,
            opponent = %challenge.opponent.id,
            %generation,
            %team_size,
            replaced = replaced.is_some(),
            "challenge registered"
        );
        Ok(challenge)
    }

    pub async fn pending_challenge(&self, challenger: &UserId) -> Option<Challenge> {
        lock(&self.index).pending.get(challenger).cloned()
    }

    /// Answer the pending challenge from `challenger`.
    ///
    /// On accept the challenge is reserved while `build` runs: a second accept
    /// sees `NoSuchChallenge` and both users count as busy. If `build` fails,
    /// or the returned future is dropped before it completes, the challenge
    /// goes back to pending so the pair can retry.
    pub async fn resolve_challenge<F, Fut>(
        &self,
        challenger: &UserId,
        responder: &UserId,
        decision: Decision,
        build: F,
    ) -> SessionResult<Resolution>
    where
        F: FnOnce(Challenge) -> Fut,
        Fut: Future<Output = DexResult<Battle>>,
    {
        let challenge = {
            let mut index = lock(&self.index);
            let challenge = index
                .pending
                .remove(challenger)
                .ok_or_else(|| SessionError::NoSuchChallenge(challenger.clone()))?;

            if &challenge.opponent.id != responder {
                let err = SessionError::NotAddressee {
                    challenger: challenger.clone(),
                    opponent: challenge.opponent.id.clone(),
                    responder: responder.clone(),
                };
                index.pending.insert(challenger.clone(), challenge);
                return Err(err);
            }

            if self.is_expired(&challenge) {
                tracing::info!(%challenger, "challenge expired before it was answered");
                return Err(SessionError::ChallengeExpired(challenger.clone()));
            }

            if decision == Decision::Decline {
                tracing::info!(%challenger, %responder, "challenge declined");
                return Ok(Resolution::Declined(challenge));
            }

            // Either side may have joined another battle since the offer was made.
            let eligibility = index
                .ensure_free(&challenge.challenger.id)
                .and_then(|_| index.ensure_free(&challenge.opponent.id));
            if let Err(err) = eligibility {
                index.pending.insert(challenger.clone(), challenge);
                return Err(err);
            }

            index.accepting.insert(challenger.clone(), challenge.clone());
            challenge
        };
        let mut reservation = Reservation {
            index: &self.index,
            challenger: challenger.clone(),
            armed: true,
        };

        let built = build(challenge.clone()).await;

        let mut index = lock(&self.index);
        reservation.disarm();
        index.accepting.remove(challenger);

        match built {
            Ok(battle) if index.battles.contains_key(&battle.id) => {
                tracing::error!(battle = %battle.id, "battle id already live, challenge restored");
                index.pending.insert(challenger.clone(), challenge);
                Err(SessionError::AlreadyInBattle(challenger.clone()))
            }
            Ok(battle) => {
                for side in &battle.sides {
                    index
                        .members
                        .insert(side.user_id().clone(), battle.id.clone());
                }
                index.battles.insert(
                    battle.id.clone(),
                    Arc::new(tokio::sync::Mutex::new(battle.clone())),
                );
                tracing::info!(battle = %battle.id, "challenge accepted");
                Ok(Resolution::Accepted(battle))
            }
            Err(err) => {
                tracing::warn!(%challenger, error = %err, "battle setup failed, challenge restored");
                index.pending.insert(challenger.clone(), challenge);
                Err(err.into())
            }
        }
    }

    fn battle_handle(&self, user: &UserId) -> Option<BattleHandle> {
        lock(&self.index).battle_handle(user)
    }

    /// Snapshot of the battle `user` is in, if any.
    pub async fn find_battle_for_user(&self, user: &UserId) -> Option<Battle> {
        let handle = self.battle_handle(user)?;
        let battle = handle.lock().await;
        // A finished battle may still be reachable for the instant between
        // its last transition and its removal.
        (!battle.is_finished() && battle.involves(user)).then(|| battle.clone())
    }

    /// Run one transition on `user`'s battle under that battle's lock.
    ///
    /// If the transition finishes the battle it is removed from the registry
    /// before the lock is released, so a queued action on the same battle
    /// observes `NoSuchBattle`.
    pub async fn with_battle_for_user<R>(
        &self,
        user: &UserId,
        transition: impl FnOnce(&mut Battle) -> SessionResult<R>,
    ) -> SessionResult<(R, Battle)> {
        let handle = self
            .battle_handle(user)
            .ok_or_else(|| SessionError::no_battle_for_user(user))?;

        let mut battle = handle.lock().await;
        if battle.is_finished() || !battle.involves(user) {
            return Err(SessionError::no_battle_for_user(user));
        }

        let result = transition(&mut *battle)?;
        if battle.is_finished() {
            self.remove_battle(&battle.id).await;
        }
        Ok((result, battle.clone()))
    }

    /// Drop a battle and its memberships. Returns whether it existed.
    pub async fn remove_battle(&self, id: &BattleId) -> bool {
        let removed = lock(&self.index).detach(id);
        if removed {
            tracing::info!(battle = %id, "battle removed");
        }
        removed
    }

    /// Remove every pending challenge older than the TTL.
    pub async fn prune_expired(&self) -> usize {
        let Some(ttl) = self.challenge_ttl else {
            return 0;
        };
        let mut index = lock(&self.index);
        let before = index.pending.len();
        index
            .pending
            .retain(|_, challenge| challenge.created_at.elapsed() <= ttl);
        let pruned = before - index.pending.len();
        if pruned > 0 {
            tracing::debug!(pruned, "expired challenges pruned");
        }
        pruned
    }

    pub async fn battle_count(&self) -> usize {
        lock(&self.index).battles.len()
    }

    pub async fn pending_count(&self) -> usize {
        lock(&self.index).pending.len()
    }
}
