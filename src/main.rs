use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use aros::config::EngineConfig;
use aros::engine::event::{Event, InputContent, InputEvent, SideEffect};
use aros::engine::state::AgentState;
use aros::engine::time::TICK_MS;
use aros::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => EngineConfig::from_env(),
    };

    let (tx, rx) = mpsc::channel(100);
    let mut engine = Engine::new(config, rx, tx.clone());
    engine.attach_responder();

    let (render_tx, mut render_rx) = watch::channel(AgentState::new());
    let shutdown = CancellationToken::new();

    // Renderer stand-in: log whatever a real renderer would repaint.
    tokio::spawn(async move {
        let mut last: Option<AgentState> = None;
        while render_rx.changed().await.is_ok() {
            let snapshot = render_rx.borrow_and_update().clone();
            let interesting = last.as_ref().is_none_or(|prev| {
                prev.expression != snapshot.expression || prev.message != snapshot.message
            });
            if interesting {
                tracing::info!(
                    expression = ?snapshot.expression,
                    battery = snapshot.battery_level,
                    message = ?snapshot.message,
                    "agent"
                );
            }
            last = Some(snapshot);
        }
    });

    // Each stdin line is free text: local command or chat.
    let input_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let _ = input_tx
                .send(Event::Input(InputEvent::message("stdin", &line)))
                .await;
        }
    });

    let stop = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        stop.cancel();
    });

    tx.send(Event::Input(InputEvent::ui(InputContent::StartSession)))
        .await?;
    tracing::info!("session started; type to talk, ctrl-c to quit");

    let mut cadence = tokio::time::interval(Duration::from_millis(TICK_MS));
    cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = cadence.tick() => {}
        }

        let mut events = Vec::new();
        while let Ok(event) = engine.receiver.try_recv() {
            events.push(event);
        }

        for effect in engine.tick_step(events) {
            match effect {
                SideEffect::Sound(cue) => tracing::info!(cue = cue.name(), "sound cue"),
            }
        }

        let _ = render_tx.send(engine.state.clone());
    }

    tracing::info!("shutting down");
    Ok(())
}
