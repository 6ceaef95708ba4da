//! Scripted duel between two simulated users.
//!
//! Plays challenge, acceptance and alternating turns through the coordinator
//! until someone wins, printing every rendered event.

use pokemon_duel::{
    Action, Coordinator, DamagePolicy, DexGateway, DuelConfig, OutboundEvent, Participant,
    SessionResult,
};
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Guard against a damage policy that never knocks anyone out.
const MAX_TURNS: usize = 200;

fn print_events(events: &[OutboundEvent]) {
    for event in events {
        println!("--- {} ({}) ---", event.name(), event.audience());
        println!("{}", event.format());
        println!();
    }
}

async fn run_duel<D: DexGateway, P: DamagePolicy>(
    coordinator: &Coordinator<D, P>,
    ash: &Participant,
    gary: &Participant,
) -> SessionResult<()> {
    print_events(&coordinator.handle(Action::ShowHelp).await?);

    let events = coordinator
        .handle(Action::Challenge {
            challenger: ash.clone(),
            opponent: gary.clone(),
            generation: Some("1".to_string()),
            team_size: Some(3),
        })
        .await?;
    print_events(&events);

    // Gary presses the accept button from the challenge message.
    let accept = events.iter().find_map(|event| match event {
        OutboundEvent::ChallengeCreated { accept, .. } => Some(accept.clone()),
        _ => None,
    });
    let Some(accept) = accept else {
        println!("No challenge was created.");
        return Ok(());
    };
    print_events(&coordinator.handle(accept.into_action(gary.id.clone())).await?);

    let mut rng = rand::rng();
    for _ in 0..MAX_TURNS {
        let Some(battle) = coordinator.registry().find_battle_for_user(&ash.id).await else {
            break;
        };
        let actor = battle.turn_owner.clone();
        let team_size = battle.team_size();

        let events = coordinator
            .handle(Action::SelectCreature {
                user: actor.clone(),
                index: rng.random_range(0..team_size),
            })
            .await?;
        print_events(&events);

        let move_count = coordinator
            .registry()
            .find_battle_for_user(&actor)
            .await
            .and_then(|battle| {
                battle
                    .side(&actor)
                    .and_then(|side| side.active_creature())
                    .map(|creature| creature.known_moves.len())
            })
            .unwrap_or(1)
            .max(1);
        let events = coordinator
            .handle(Action::SelectMove {
                user: actor,
                move_number: rng.random_range(1..=move_count),
            })
            .await?;
        print_events(&events);
    }

    print_events(
        &coordinator
            .handle(Action::ShowTypeChart {
                type_name: Some("Electric".to_string()),
            })
            .await?,
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pokemon_duel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DuelConfig::from_env()?;
    let dex = config.load_dex()?;
    tracing::info!(
        species = dex.catalog().species.len(),
        moves = dex.catalog().moves.len(),
        "dex loaded"
    );

    let coordinator = Coordinator::new(&config, dex);
    let ash = Participant::new("1001", "Ash");
    let gary = Participant::new("1002", "Gary");

    run_duel(&coordinator, &ash, &gary).await?;
    Ok(())
}
