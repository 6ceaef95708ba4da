//! Outbound events and their plain-text rendering.
//!
//! Every event is self-contained: a presenter never needs to look anything up
//! in the registry to render it.

use crate::actions::ComponentId;
use crate::battle::engine::MoveOutcome;
use crate::battle::state::{Battle, BattleId, BattlePhase, PlayerSide};
use crate::challenge::ChallengeView;
use crate::player::{Participant, UserId};
use schema::{PokemonType, TypeMatchups};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Where an event should be delivered.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// The channel the action came from.
    Channel,
    Direct(UserId),
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Audience::Channel => f.write_str("channel"),
            Audience::Direct(user) => write!(f, "dm:{}", user),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreatureOption {
    pub index: usize,
    pub name: String,
    pub component: ComponentId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveOption {
    pub number: usize,
    pub name: String,
    pub move_type: PokemonType,
    pub power: u16,
    pub component: ComponentId,
}

/// Buttons offered to the turn owner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TurnOptions {
    Creatures(Vec<CreatureOption>),
    Moves(Vec<MoveOption>),
}

impl TurnOptions {
    /// Options for the turn owner of `battle` in its current phase.
    pub fn for_battle(battle: &Battle) -> Self {
        let Some(side) = battle.turn_owner_side() else {
            return TurnOptions::Creatures(Vec::new());
        };

        match battle.phase {
            BattlePhase::AwaitingMoveSelection => TurnOptions::Moves(
                side.active_creature()
                    .map(|creature| {
                        creature
                            .known_moves
                            .iter()
                            .enumerate()
                            .map(|(i, m)| MoveOption {
                                number: i + 1,
                                name: m.name.clone(),
                                move_type: m.move_type,
                                power: m.power,
                                component: ComponentId::Move { number: i + 1 },
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            BattlePhase::AwaitingCreatureSelection | BattlePhase::Finished => TurnOptions::Creatures(
                side.team
                    .iter()
                    .enumerate()
                    .map(|(index, creature)| CreatureOption {
                        index,
                        name: creature.name.clone(),
                        component: ComponentId::Creature { index },
                    })
                    .collect(),
            ),
        }
    }

    pub fn components(&self) -> Vec<&ComponentId> {
        match self {
            TurnOptions::Creatures(options) => options.iter().map(|o| &o.component).collect(),
            TurnOptions::Moves(options) => options.iter().map(|o| &o.component).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub command: String,
    pub description: String,
}

pub fn help_entries() -> Vec<HelpEntry> {
    [
        (
            "/retar @usuario [generación] [pokemones]",
            "Reta a otro usuario a una batalla. Puedes especificar la generación (1-9) y la cantidad de Pokémon por equipo (1-6).",
        ),
        (
            "/tabla [tipo]",
            "Muestra las fortalezas y debilidades de un tipo, o de todos.",
        ),
        ("/ayuda", "Muestra este mensaje de ayuda"),
    ]
    .into_iter()
    .map(|(command, description)| HelpEntry {
        command: command.to_string(),
        description: description.to_string(),
    })
    .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutboundEvent {
    ChallengeCreated {
        challenge: ChallengeView,
        accept: ComponentId,
        decline: ComponentId,
    },
    ChallengeDeclined {
        challenge: ChallengeView,
    },
    BattleStarted {
        battle_id: BattleId,
        sides: [PlayerSide; 2],
        generation: schema::Generation,
    },
    /// A participant's own team, sent privately.
    TeamRevealed {
        recipient: Participant,
        side: PlayerSide,
    },
    TurnPrompt {
        battle_id: BattleId,
        acting: Participant,
        phase: BattlePhase,
        options: TurnOptions,
    },
    AttackResult {
        battle_id: BattleId,
        attacker: Participant,
        defender: Participant,
        outcome: MoveOutcome,
        /// `None` once the battle is over.
        next_turn: Option<Participant>,
    },
    TypeChart {
        matchups: Vec<TypeMatchups>,
    },
    Help {
        entries: Vec<HelpEntry>,
    },
}

impl OutboundEvent {
    pub fn battle_started(battle: &Battle) -> Self {
        OutboundEvent::BattleStarted {
            battle_id: battle.id.clone(),
            sides: battle.sides.clone(),
            generation: battle.generation,
        }
    }

    pub fn team_reveals(battle: &Battle) -> Vec<Self> {
        battle
            .sides
            .iter()
            .map(|side| OutboundEvent::TeamRevealed {
                recipient: side.participant.clone(),
                side: side.clone(),
            })
            .collect()
    }

    /// Prompt for the turn owner, or `None` if the battle is over.
    pub fn turn_prompt(battle: &Battle) -> Option<Self> {
        if battle.is_finished() {
            return None;
        }
        let acting = battle.turn_owner_side()?.participant.clone();
        Some(OutboundEvent::TurnPrompt {
            battle_id: battle.id.clone(),
            acting,
            phase: battle.phase,
            options: TurnOptions::for_battle(battle),
        })
    }

    /// Result of a move, taken from the battle right after the move resolved.
    pub fn attack_result(battle: &Battle, outcome: MoveOutcome) -> Option<Self> {
        let attacker = battle.side(&outcome.attacker)?.participant.clone();
        let defender = battle.opposing_side(&outcome.attacker)?.participant.clone();
        let next_turn = if outcome.winner.is_some() {
            None
        } else {
            battle.turn_owner_side().map(|side| side.participant.clone())
        };

        Some(OutboundEvent::AttackResult {
            battle_id: battle.id.clone(),
            attacker,
            defender,
            outcome,
            next_turn,
        })
    }

    pub fn audience(&self) -> Audience {
        match self {
            OutboundEvent::TeamRevealed { recipient, .. } => Audience::Direct(recipient.id.clone()),
            _ => Audience::Channel,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::ChallengeCreated { .. } => "challenge_created",
            OutboundEvent::ChallengeDeclined { .. } => "challenge_declined",
            OutboundEvent::BattleStarted { .. } => "battle_started",
            OutboundEvent::TeamRevealed { .. } => "team_revealed",
            OutboundEvent::TurnPrompt { .. } => "turn_prompt",
            OutboundEvent::AttackResult { .. } => "attack_result",
            OutboundEvent::TypeChart { .. } => "type_chart",
            OutboundEvent::Help { .. } => "help",
        }
    }

    /// User-facing text for the event.
    pub fn format(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        match self {
            OutboundEvent::ChallengeCreated {
                challenge,
                accept,
                decline,
            } => {
                writeln!(out, "{}, has sido retado a una batalla!", challenge.opponent)?;
                writeln!(out, "¡Desafío Pokémon!")?;
                writeln!(
                    out,
                    "{} te ha retado a una batalla Pokémon",
                    challenge.challenger
                )?;
                writeln!(out, "Generación: {}", challenge.generation)?;
                writeln!(out, "Pokémon por equipo: {}", challenge.team_size)?;
                write!(out, "[Aceptar: {}] [Rechazar: {}]", accept, decline)
            }
            OutboundEvent::ChallengeDeclined { challenge } => {
                write!(out, "{} ha rechazado el desafío.", challenge.opponent)
            }
            OutboundEvent::BattleStarted {
                sides, generation, ..
            } => {
                writeln!(
                    out,
                    "¡La batalla ha comenzado! Revisa tus mensajes privados para ver tu equipo."
                )?;
                writeln!(out, "¡Batalla Pokémon!")?;
                writeln!(out, "{} vs {}", sides[0].participant, sides[1].participant)?;
                writeln!(out, "Generación: {}", generation)?;
                write!(out, "Pokémon por equipo: {}", sides[0].team.len())
            }
            OutboundEvent::TeamRevealed { recipient, side } => {
                writeln!(out, "Equipo de {}", recipient)?;
                writeln!(out, "¡Este es tu equipo para la batalla!")?;
                let team: Vec<String> = side
                    .team
                    .iter()
                    .map(|creature| {
                        let moves: Vec<&str> =
                            creature.known_moves.iter().map(|m| m.name.as_str()).collect();
                        format!("{} ({}): {}", creature.name, creature.primary_type, moves.join(", "))
                    })
                    .collect();
                write!(out, "{}", team.join("\n"))
            }
            OutboundEvent::TurnPrompt {
                acting, options, ..
            } => match options {
                TurnOptions::Creatures(creatures) => {
                    writeln!(out, "{}, elige tu Pokémon:", acting)?;
                    let labels: Vec<String> = creatures
                        .iter()
                        .map(|c| format!("[{}: {}]", c.component, c.name))
                        .collect();
                    write!(out, "{}", labels.join(" "))
                }
                TurnOptions::Moves(moves) => {
                    writeln!(out, "{}, elige un movimiento:", acting)?;
                    let labels: Vec<String> = moves
                        .iter()
                        .map(|m| format!("[{}: {} ({}, {})]", m.component, m.name, m.move_type, m.power))
                        .collect();
                    write!(out, "{}", labels.join(" "))
                }
            },
            OutboundEvent::AttackResult {
                attacker,
                defender,
                outcome,
                next_turn,
                ..
            } => {
                writeln!(
                    out,
                    "{} usó {} e hizo {} de daño.",
                    attacker, outcome.move_used.name, outcome.damage_dealt
                )?;
                write!(
                    out,
                    "Vida restante de {}: {}",
                    defender,
                    outcome.defender_remaining_health.max(0)
                )?;
                match next_turn {
                    Some(next) => write!(out, "\nTurno de {}.", next),
                    None => write!(out, "\n¡{} ha ganado la batalla!", attacker),
                }
            }
            OutboundEvent::TypeChart { matchups } => {
                let rows: Vec<String> = matchups.iter().map(format_matchups).collect();
                write!(out, "{}", rows.join("\n\n"))
            }
            OutboundEvent::Help { entries } => {
                writeln!(out, "Comandos del Bot Pokémon Showdown")?;
                writeln!(out, "Aquí están los comandos disponibles:")?;
                let lines: Vec<String> = entries
                    .iter()
                    .map(|e| format!("{}: {}", e.command, e.description))
                    .collect();
                write!(out, "{}", lines.join("\n"))
            }
        }
    }
}

fn join_types(types: &[PokemonType]) -> String {
    if types.is_empty() {
        return "-".to_string();
    }
    types
        .iter()
        .map(PokemonType::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_matchups(m: &TypeMatchups) -> String {
    [
        format!("Tipo {}", m.pokemon_type),
        format!("  Súper eficaz contra: {}", join_types(&m.super_effective_on)),
        format!("  Poco eficaz contra: {}", join_types(&m.not_very_effective_on)),
        format!("  Sin efecto contra: {}", join_types(&m.no_effect_on)),
        format!("  Débil ante: {}", join_types(&m.weak_to)),
        format!("  Resiste: {}", join_types(&m.resists)),
        format!("  Inmune a: {}", join_types(&m.immune_to)),
    ]
    .join("\n")
}
