//! The single entry point for inbound actions.
//!
//! [`Coordinator::handle`] routes an [`Action`] to the challenge workflow or the
//! battle state machine through the shared [`SessionRegistry`] and returns the
//! events to present. Rejected actions leave the registry untouched.

use crate::actions::{Action, ComponentId};
use crate::battle::engine::{create_battle, select_creature, select_move};
use crate::challenge::{open_challenge, ChallengeDefaults, ChallengeRequest};
use crate::config::DuelConfig;
use crate::damage::{DamagePolicy, FlatRandomDamage};
use crate::dex::DexGateway;
use crate::errors::{SessionError, SessionResult};
use crate::events::{help_entries, OutboundEvent};
use crate::player::UserId;
use crate::presenter::{DispatchReport, Presenter};
use crate::registry::{Resolution, SessionRegistry};
use schema::{PokemonType, TypeMatchups};
use std::sync::Arc;

pub struct Coordinator<D, P = FlatRandomDamage> {
    registry: Arc<SessionRegistry>,
    dex: Arc<D>,
    damage: P,
    defaults: ChallengeDefaults,
}

impl<D: DexGateway> Coordinator<D, FlatRandomDamage> {
    pub fn new(config: &DuelConfig, dex: D) -> Self {
        Coordinator {
            registry: Arc::new(SessionRegistry::new(config.challenge_ttl)),
            dex: Arc::new(dex),
            damage: config.damage_policy(),
            defaults: config.challenge_defaults(),
        }
    }
}

impl<D: DexGateway, P: DamagePolicy> Coordinator<D, P> {
    /// Swap the damage policy, keeping sessions and dex.
    pub fn with_damage_policy<Q: DamagePolicy>(self, damage: Q) -> Coordinator<D, Q> {
        Coordinator {
            registry: self.registry,
            dex: self.dex,
            damage,
            defaults: self.defaults,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn dex(&self) -> &D {
        &self.dex
    }

    pub async fn handle(&self, action: Action) -> SessionResult<Vec<OutboundEvent>> {
        let name = action.name();
        let actor = action.actor().cloned();
        tracing::debug!(action = name, actor = ?actor, "handling action");

        let result = self.route(action).await;
        if let Err(err) = &result {
            tracing::warn!(action = name, actor = ?actor, kind = ?err.kind(), error = %err, "action rejected");
        }
        result
    }

    /// Handle `action` and deliver every resulting event.
    ///
    /// Delivery failures are logged and reported but never undo the action.
    pub async fn dispatch<R: Presenter>(
        &self,
        action: Action,
        presenter: &R,
    ) -> SessionResult<DispatchReport> {
        let events = self.handle(action).await?;
        let mut report = DispatchReport::default();

        for event in &events {
            if let Err(err) = presenter.deliver(event).await {
                tracing::warn!(event = event.name(), error = %err, "delivery failed");
                report.failures.push(err);
            }
        }

        report.events = events;
        Ok(report)
    }

    async fn route(&self, action: Action) -> SessionResult<Vec<OutboundEvent>> {
        match action {
            Action::Challenge {
                challenger,
                opponent,
                generation,
                team_size,
            } => {
                let request = ChallengeRequest {
                    challenger,
                    opponent,
                    generation,
                    team_size,
                };
                let challenge = open_challenge(&self.registry, request, self.defaults).await?;
                let challenger = challenge.challenger.id.clone();
                Ok(vec![OutboundEvent::ChallengeCreated {
                    challenge: challenge.view(),
                    accept: ComponentId::Accept {
                        challenger: challenger.clone(),
                    },
                    decline: ComponentId::Decline { challenger },
                }])
            }

            Action::RespondChallenge {
                challenger,
                responder,
                decision,
            } => {
                let dex = self.dex.as_ref();
                let resolution = self
                    .registry
                    .resolve_challenge(&challenger, &responder, decision, |c| async move {
                        create_battle(dex, c.challenger, c.opponent, c.generation, c.team_size)
                            .await
                    })
                    .await?;

                match resolution {
                    Resolution::Declined(challenge) => Ok(vec![OutboundEvent::ChallengeDeclined {
                        challenge: challenge.view(),
                    }]),
                    Resolution::Accepted(battle) => {
                        let mut events = vec![OutboundEvent::battle_started(&battle)];
                        events.extend(OutboundEvent::team_reveals(&battle));
                        events.extend(OutboundEvent::turn_prompt(&battle));
                        Ok(events)
                    }
                }
            }

            Action::SelectCreature { user, index } => {
                let ((), battle) = self
                    .registry
                    .with_battle_for_user(&user, |battle| select_creature(battle, &user, index))
                    .await?;
                Ok(OutboundEvent::turn_prompt(&battle).into_iter().collect())
            }

            Action::SelectMove { user, move_number } => {
                let move_index = move_index(move_number)?;
                let damage = &self.damage;
                let (outcome, battle) = self
                    .registry
                    .with_battle_for_user(&user, |battle| {
                        select_move(battle, &user, move_index, damage)
                    })
                    .await?;

                if let Some(winner) = &outcome.winner {
                    tracing::info!(battle = %battle.id, %winner, "battle finished");
                }

                let mut events: Vec<OutboundEvent> =
                    OutboundEvent::attack_result(&battle, outcome).into_iter().collect();
                events.extend(OutboundEvent::turn_prompt(&battle));
                Ok(events)
            }

            Action::ShowTypeChart { type_name } => {
                let matchups: Vec<TypeMatchups> = match type_name.as_deref().map(str::trim) {
                    None | Some("") => PokemonType::all()
                        .map(|t| self.dex.type_matchups(t))
                        .collect(),
                    Some(name) => {
                        let pokemon_type: PokemonType = name.parse().map_err(|_| {
                            SessionError::InvalidParameters(format!("unknown type '{}'", name))
                        })?;
                        vec![self.dex.type_matchups(pokemon_type)]
                    }
                };
                Ok(vec![OutboundEvent::TypeChart { matchups }])
            }

            Action::ShowHelp => Ok(vec![OutboundEvent::Help {
                entries: help_entries(),
            }]),
        }
    }

    /// Drop expired challenges. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        self.registry.prune_expired().await
    }

    pub async fn is_in_battle(&self, user: &UserId) -> bool {
        self.registry.find_battle_for_user(user).await.is_some()
    }
}

/// Buttons are numbered from 1.
fn move_index(move_number: usize) -> SessionResult<usize> {
    move_number
        .checked_sub(1)
        .ok_or_else(|| SessionError::InvalidParameters("move numbers start at 1".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Decision;
    use crate::battle::state::{BattlePhase, STARTING_HEALTH};
    use crate::battle::tests::common::FailingDex;
    use crate::damage::FixedDamage;
    use crate::dex::StaticDex;
    use crate::errors::DeliveryError;
    use crate::events::TurnOptions;
    use crate::player::Participant;
    use pretty_assertions::assert_eq;

    fn coordinator(damage: i32) -> Coordinator<StaticDex, FixedDamage> {
        let dex = StaticDex::bundled().unwrap();
        Coordinator::new(&DuelConfig::default(), dex).with_damage_policy(FixedDamage(damage))
    }

    fn ash() -> Participant {
        Participant::new("1", "Ash")
    }

    fn gary() -> Participant {
        Participant::new("2", "Gary")
    }

    fn challenge(challenger: Participant, opponent: Participant) -> Action {
        Action::Challenge {
            challenger,
            opponent,
            generation: Some("9".to_string()),
            team_size: Some(3),
        }
    }

    fn select_move(user: &Participant, move_number: usize) -> Action {
        Action::SelectMove {
            user: user.id.clone(),
            move_number,
        }
    }

    async fn start_battle<D: DexGateway, P: DamagePolicy>(coordinator: &Coordinator<D, P>) {
        coordinator.handle(challenge(ash(), gary())).await.unwrap();
        let accept: ComponentId = "accept:1".parse().unwrap();
        coordinator
            .handle(accept.into_action(gary().id))
            .await
            .unwrap();
    }

    async fn health<D: DexGateway, P: DamagePolicy>(
        coordinator: &Coordinator<D, P>,
        user: &Participant,
    ) -> i32 {
        coordinator
            .registry()
            .find_battle_for_user(&user.id)
            .await
            .and_then(|b| b.side(&user.id).map(|s| s.remaining_health))
            .unwrap()
    }

    #[tokio::test]
    async fn test_challenge_event_carries_buttons() {
        let coordinator = coordinator(40);
        let events = coordinator.handle(challenge(ash(), gary())).await.unwrap();

        let [OutboundEvent::ChallengeCreated {
            challenge,
            accept,
            decline,
        }] = events.as_slice()
        else {
            panic!("expected a single challenge event, got {:?}", events);
        };
        assert_eq!(challenge.opponent, gary());
        assert_eq!(accept.to_string(), "accept:1");
        assert_eq!(decline.to_string(), "decline:1");
    }

    #[tokio::test]
    async fn test_full_duel() {
        let coordinator = coordinator(40);
        coordinator.handle(challenge(ash(), gary())).await.unwrap();

        let events = coordinator
            .handle(Action::RespondChallenge {
                challenger: ash().id,
                responder: gary().id,
                decision: Decision::Accept,
            })
            .await
            .unwrap();

        let names: Vec<&str> = events.iter().map(OutboundEvent::name).collect();
        assert_eq!(
            names,
            vec!["battle_started", "team_revealed", "team_revealed", "turn_prompt"]
        );
        let OutboundEvent::BattleStarted { sides, .. } = &events[0] else {
            panic!("expected battle_started first");
        };
        for side in sides {
            assert_eq!(side.team.len(), 3);
            assert_eq!(side.remaining_health, STARTING_HEALTH);
        }

        // Ash: 100, Gary: 100. Ash moves first.
        coordinator
            .handle(Action::SelectCreature {
                user: ash().id,
                index: 2,
            })
            .await
            .unwrap();
        coordinator.handle(select_move(&ash(), 1)).await.unwrap();
        assert_eq!(health(&coordinator, &gary()).await, 60);

        coordinator.handle(select_move(&gary(), 1)).await.unwrap();
        assert_eq!(health(&coordinator, &ash()).await, 60);

        coordinator.handle(select_move(&ash(), 2)).await.unwrap();
        coordinator.handle(select_move(&gary(), 2)).await.unwrap();
        assert_eq!(health(&coordinator, &gary()).await, 20);
        assert_eq!(health(&coordinator, &ash()).await, 20);

        let events = coordinator.handle(select_move(&ash(), 1)).await.unwrap();
        let [OutboundEvent::AttackResult {
            attacker,
            defender,
            outcome,
            next_turn,
            ..
        }] = events.as_slice()
        else {
            panic!("expected only an attack result, got {:?}", events);
        };
        assert_eq!(attacker, &ash());
        assert_eq!(defender, &gary());
        assert_eq!(outcome.winner, Some(ash().id));
        assert_eq!(outcome.defender_remaining_health, -20);
        assert_eq!(next_turn, &None);

        assert!(!coordinator.is_in_battle(&ash().id).await);
        assert!(!coordinator.is_in_battle(&gary().id).await);
        assert!(matches!(
            coordinator.handle(select_move(&gary(), 1)).await,
            Err(SessionError::NoSuchBattle(_))
        ));
    }

    #[tokio::test]
    async fn test_default_damage_is_between_20_and_50() {
        let dex = StaticDex::bundled().unwrap();
        let coordinator = Coordinator::new(&DuelConfig::default(), dex);
        start_battle(&coordinator).await;

        coordinator.handle(select_move(&ash(), 1)).await.unwrap();
        let remaining = health(&coordinator, &gary()).await;
        assert!((50..=80).contains(&remaining), "remaining {}", remaining);
    }

    #[tokio::test]
    async fn test_out_of_turn_actions_change_nothing() {
        let coordinator = coordinator(40);
        start_battle(&coordinator).await;

        assert!(matches!(
            coordinator.handle(select_move(&gary(), 1)).await,
            Err(SessionError::NotYourTurn(_))
        ));
        assert!(matches!(
            coordinator
                .handle(Action::SelectCreature {
                    user: gary().id,
                    index: 0
                })
                .await,
            Err(SessionError::NotYourTurn(_))
        ));

        let battle = coordinator
            .registry()
            .find_battle_for_user(&ash().id)
            .await
            .unwrap();
        assert_eq!(battle.turn_owner, ash().id);
        assert_eq!(battle.phase, BattlePhase::AwaitingCreatureSelection);
        assert_eq!(health(&coordinator, &ash()).await, STARTING_HEALTH);
    }

    #[tokio::test]
    async fn test_double_submit_resolves_once() {
        let coordinator = coordinator(10);
        start_battle(&coordinator).await;

        let (first, second) = tokio::join!(
            coordinator.handle(select_move(&ash(), 1)),
            coordinator.handle(select_move(&ash(), 1))
        );

        assert!(first.is_ok() != second.is_ok());
        assert!(
            matches!(first, Err(SessionError::NotYourTurn(_)))
                || matches!(second, Err(SessionError::NotYourTurn(_)))
        );
        assert_eq!(health(&coordinator, &gary()).await, 90);
    }

    #[tokio::test]
    async fn test_creature_selection_prompts_for_moves() {
        let coordinator = coordinator(40);
        start_battle(&coordinator).await;

        let events = coordinator
            .handle(Action::SelectCreature {
                user: ash().id,
                index: 1,
            })
            .await
            .unwrap();
        let [OutboundEvent::TurnPrompt { acting, options, .. }] = events.as_slice() else {
            panic!("expected a turn prompt, got {:?}", events);
        };
        assert_eq!(acting, &ash());
        assert!(matches!(options, TurnOptions::Moves(moves) if !moves.is_empty()));

        assert!(matches!(
            coordinator
                .handle(Action::SelectCreature {
                    user: ash().id,
                    index: 3
                })
                .await,
            Err(SessionError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[tokio::test]
    async fn test_move_number_out_of_range() {
        let coordinator = coordinator(40);
        start_battle(&coordinator).await;

        assert!(matches!(
            coordinator.handle(select_move(&ash(), 0)).await,
            Err(SessionError::InvalidParameters(_))
        ));
        assert!(matches!(
            coordinator.handle(select_move(&ash(), 5)).await,
            Err(SessionError::IndexOutOfRange { index: 4, .. })
        ));
        assert_eq!(health(&coordinator, &gary()).await, STARTING_HEALTH);
    }

    #[tokio::test]
    async fn test_challenge_while_in_battle_stores_nothing() {
        let coordinator = coordinator(40);
        start_battle(&coordinator).await;
        let misty = Participant::new("3", "Misty");

        assert!(matches!(
            coordinator.handle(challenge(ash(), misty.clone())).await,
            Err(SessionError::AlreadyInBattle(_))
        ));
        assert!(coordinator
            .registry()
            .pending_challenge(&ash().id)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_invalid_challenges() {
        let coordinator = coordinator(40);
        let bot = Participant::automated("99", "Showdown Bot");

        assert!(matches!(
            coordinator.handle(challenge(ash(), bot)).await,
            Err(SessionError::InvalidOpponent(_))
        ));
        assert!(matches!(
            coordinator
                .handle(Action::Challenge {
                    challenger: ash(),
                    opponent: gary(),
                    generation: Some("10".to_string()),
                    team_size: None,
                })
                .await,
            Err(SessionError::InvalidParameters(_))
        ));
        assert_eq!(coordinator.registry().pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_decline() {
        let coordinator = coordinator(40);
        coordinator.handle(challenge(ash(), gary())).await.unwrap();

        let decline: ComponentId = "decline:1".parse().unwrap();
        let events = coordinator
            .handle(decline.into_action(gary().id))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].format(), "Gary ha rechazado el desafío.");
        assert!(!coordinator.is_in_battle(&ash().id).await);
    }

    #[tokio::test]
    async fn test_dex_failure_keeps_challenge_pending() {
        let coordinator = Coordinator::new(&DuelConfig::default(), FailingDex);
        coordinator.handle(challenge(ash(), gary())).await.unwrap();

        let result = coordinator
            .handle(Action::RespondChallenge {
                challenger: ash().id,
                responder: gary().id,
                decision: Decision::Accept,
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::UpstreamData);
        assert!(coordinator
            .registry()
            .pending_challenge(&ash().id)
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_type_chart() {
        let coordinator = coordinator(40);

        let events = coordinator
            .handle(Action::ShowTypeChart {
                type_name: Some("fire".to_string()),
            })
            .await
            .unwrap();
        let [OutboundEvent::TypeChart { matchups }] = events.as_slice() else {
            panic!("expected a type chart");
        };
        assert_eq!(matchups.len(), 1);
        assert_eq!(matchups[0].pokemon_type, PokemonType::Fire);

        let events = coordinator
            .handle(Action::ShowTypeChart { type_name: None })
            .await
            .unwrap();
        assert!(matches!(&events[0], OutboundEvent::TypeChart { matchups } if matchups.len() == 18));

        assert!(matches!(
            coordinator
                .handle(Action::ShowTypeChart {
                    type_name: Some("Sound".to_string())
                })
                .await,
            Err(SessionError::InvalidParameters(_))
        ));
    }

    struct BrokenPresenter;

    impl Presenter for BrokenPresenter {
        async fn deliver(&self, event: &OutboundEvent) -> Result<(), DeliveryError> {
            Err(DeliveryError {
                event: event.name(),
                audience: event.audience().to_string(),
                reason: "gateway closed".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_roll_back() {
        let coordinator = coordinator(40);

        let report = coordinator
            .dispatch(challenge(ash(), gary()), &BrokenPresenter)
            .await
            .unwrap();

        assert!(!report.all_delivered());
        assert_eq!(report.failures.len(), report.events.len());
        assert!(coordinator
            .registry()
            .pending_challenge(&ash().id)
            .await
            .is_some());
    }
}
