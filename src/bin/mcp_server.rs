//! Pokemon Duel MCP Server
//!
//! A Model Context Protocol server (rmcp, stdio transport) exposing every
//! inbound duel action as a tool, so a chat front end or an LLM can drive
//! challenges and battles between users.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use pokemon_duel::{
    Action, ComponentId, Coordinator, Decision, DuelConfig, OutboundEvent, Participant,
    SessionResult, StaticDex, UserId,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ErrorData as McpError, *},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use tokio::io::{stdin, stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct DuelService {
    tool_router: ToolRouter<DuelService>,
    coordinator: Arc<Coordinator<StaticDex>>,
}

// Tool request structures
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChallengeToolRequest {
    #[schemars(description = "User id of the challenger")]
    pub challenger_id: String,
    #[schemars(description = "Display name of the challenger")]
    pub challenger_name: String,
    #[schemars(description = "User id of the user being challenged")]
    pub opponent_id: String,
    #[schemars(description = "Display name of the user being challenged")]
    pub opponent_name: String,
    #[schemars(description = "Whether the opponent is a bot account")]
    #[serde(default)]
    pub opponent_is_bot: bool,
    #[schemars(description = "Generation, \"1\" to \"9\" (default \"9\")")]
    pub generation: Option<String>,
    #[schemars(description = "Creatures per team, 1 to 6 (default 3)")]
    pub team_size: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RespondRequest {
    #[schemars(description = "User id of the challenger whose offer is answered")]
    pub challenger_id: String,
    #[schemars(description = "User id of the user answering")]
    pub responder_id: String,
    #[schemars(description = "true to accept, false to decline")]
    pub accept: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectCreatureRequest {
    #[schemars(description = "User id of the acting player")]
    pub user_id: String,
    #[schemars(description = "Team index of the creature, starting at 0")]
    pub index: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectMoveRequest {
    #[schemars(description = "User id of the acting player")]
    pub user_id: String,
    #[schemars(description = "Move number as shown on the buttons, 1 to 4")]
    pub move_number: usize,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PressComponentRequest {
    #[schemars(description = "User id of whoever pressed the button")]
    pub user_id: String,
    #[schemars(description = "Button id, e.g. 'accept:1234', 'creature:0' or 'move:2'")]
    pub component_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TypeChartRequest {
    #[schemars(description = "One of the 18 type names; omit for the whole chart")]
    pub type_name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BattleStateRequest {
    #[schemars(description = "User id of a participant")]
    pub user_id: String,
}

fn render(events: &[OutboundEvent]) -> String {
    events
        .iter()
        .map(|event| format!("[{}] {}", event.audience(), event.format()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn reply(result: SessionResult<Vec<OutboundEvent>>) -> CallToolResult {
    let text = match result {
        Ok(events) => render(&events),
        Err(e) => format!("Error: {}", e),
    };
    CallToolResult::success(vec![Content::text(text)])
}

#[tool_router]
impl DuelService {
    pub fn new(coordinator: Arc<Coordinator<StaticDex>>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            coordinator,
        }
    }

    #[tool(description = "Challenge another user to a battle (/retar)")]
    async fn challenge(
        &self,
        Parameters(request): Parameters<ChallengeToolRequest>,
    ) -> Result<CallToolResult, McpError> {
        let opponent = if request.opponent_is_bot {
            Participant::automated(request.opponent_id, request.opponent_name)
        } else {
            Participant::new(request.opponent_id, request.opponent_name)
        };
        let action = Action::Challenge {
            challenger: Participant::new(request.challenger_id, request.challenger_name),
            opponent,
            generation: request.generation,
            team_size: request.team_size,
        };
        Ok(reply(self.coordinator.handle(action).await))
    }

    #[tool(description = "Accept or decline a pending challenge")]
    async fn respond_challenge(
        &self,
        Parameters(request): Parameters<RespondRequest>,
    ) -> Result<CallToolResult, McpError> {
        let action = Action::RespondChallenge {
            challenger: UserId::from(request.challenger_id),
            responder: UserId::from(request.responder_id),
            decision: if request.accept {
                Decision::Accept
            } else {
                Decision::Decline
            },
        };
        Ok(reply(self.coordinator.handle(action).await))
    }

    #[tool(description = "Put a creature from your team into play")]
    async fn select_creature(
        &self,
        Parameters(request): Parameters<SelectCreatureRequest>,
    ) -> Result<CallToolResult, McpError> {
        let action = Action::SelectCreature {
            user: UserId::from(request.user_id),
            index: request.index,
        };
        Ok(reply(self.coordinator.handle(action).await))
    }

    #[tool(description = "Attack with one of your active creature's moves")]
    async fn select_move(
        &self,
        Parameters(request): Parameters<SelectMoveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let action = Action::SelectMove {
            user: UserId::from(request.user_id),
            move_number: request.move_number,
        };
        Ok(reply(self.coordinator.handle(action).await))
    }

    #[tool(description = "Press an interactive button by its component id")]
    async fn press_component(
        &self,
        Parameters(request): Parameters<PressComponentRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = match request.component_id.parse::<ComponentId>() {
            Ok(component) => {
                let action = component.into_action(UserId::from(request.user_id));
                self.coordinator.handle(action).await
            }
            Err(e) => Err(e),
        };
        Ok(reply(result))
    }

    #[tool(description = "Show type strengths and weaknesses")]
    async fn type_chart(
        &self,
        Parameters(request): Parameters<TypeChartRequest>,
    ) -> Result<CallToolResult, McpError> {
        let action = Action::ShowTypeChart {
            type_name: request.type_name,
        };
        Ok(reply(self.coordinator.handle(action).await))
    }

    #[tool(description = "List the available commands (/ayuda)")]
    async fn help(&self) -> Result<CallToolResult, McpError> {
        Ok(reply(self.coordinator.handle(Action::ShowHelp).await))
    }

    #[tool(description = "Get the current battle of a user as JSON")]
    async fn battle_state(
        &self,
        Parameters(request): Parameters<BattleStateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let user = UserId::from(request.user_id);
        let text = match self.coordinator.registry().find_battle_for_user(&user).await {
            Some(battle) => serde_json::to_string_pretty(&battle).map_err(|e| McpError {
                code: ErrorCode(-32603),
                message: Cow::from(format!("Error serializing battle: {}", e)),
                data: None,
            })?,
            None => format!("{} is not in an active battle.", user),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for DuelService {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pokemon_duel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DuelConfig::from_env()?;
    let dex = config.load_dex()?;
    let coordinator = Arc::new(Coordinator::new(&config, dex));

    if config.challenge_ttl.is_some() {
        let sweeper = Arc::clone(&coordinator);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                sweeper.sweep().await;
            }
        });
    }

    tracing::info!("Pokemon Duel MCP server starting");
    let service = DuelService::new(coordinator);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!(?quit_reason, "Pokemon Duel MCP server exiting");
    Ok(())
}
