use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::broadcast::{fan_out, FanOutReport, Frame, SessionHandle};
use crate::config::ServerConfig;
use crate::protocol::ServerMsg;
use crate::world::{wall_clock, Departed, RegisterError, SessionId, World};

/// Commands from client connections to the game loop
pub enum GameCommand {
    RegisterPlayer {
        name: String,
        session: SessionHandle,
        response: oneshot::Sender<Result<(), RegisterError>>,
    },
    RegisterWatcher {
        session: SessionHandle,
    },
    Move {
        name: String,
        x: f64,
        y: f64,
    },
    Unregister {
        session: SessionId,
    },
}

/// Run the main game loop. Owns the world and the session registry.
///
/// Commands are applied as they arrive. Each tick advances the world,
/// serializes one snapshot and fans it out; the next tick is scheduled one
/// period after the fan-out finishes.
pub async fn run_game_loop(mut cmd_rx: mpsc::Receiver<GameCommand>, server_config: ServerConfig) {
    let mut world = World::new(server_config.game, server_config.rng_seed);
    let mut sessions: HashMap<SessionId, SessionHandle> = HashMap::new();

    let tick_duration = Duration::from_secs_f64(server_config.tick_seconds());
    let send_timeout = Duration::from_millis(server_config.send_timeout_ms);

    let next_tick = tokio::time::sleep(tick_duration);
    tokio::pin!(next_tick);

    loop {
        tokio::select! {
            () = &mut next_tick => {
                let report = tick(&mut world, &sessions, send_timeout).await;
                if report.failed > 0 {
                    tracing::debug!(
                        "Snapshot delivered to {}, failed for {}",
                        report.delivered,
                        report.failed
                    );
                }
                next_tick.as_mut().reset(Instant::now() + tick_duration);
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&mut world, &mut sessions, cmd),
                    None => break,
                }
            }
        }
    }

    tracing::info!("Game loop ended");
}

/// One tick: simulate, snapshot once, deliver to every recipient.
pub async fn tick(
    world: &mut World,
    sessions: &HashMap<SessionId, SessionHandle>,
    send_timeout: Duration,
) -> FanOutReport {
    let now = wall_clock();
    world.update(now);

    let msg = ServerMsg::UpdateTableState {
        state: world.snapshot(now),
    };
    let frame = match serde_json::to_string(&msg) {
        Ok(json) => Frame::from(json),
        Err(e) => {
            tracing::error!("Failed to serialize snapshot: {}", e);
            return FanOutReport::default();
        }
    };

    let recipients: Vec<SessionHandle> = world
        .recipients()
        .into_iter()
        .filter_map(|id| sessions.get(&id).cloned())
        .collect();
    fan_out(&recipients, &frame, send_timeout).await
}

pub fn handle_command(
    world: &mut World,
    sessions: &mut HashMap<SessionId, SessionHandle>,
    cmd: GameCommand,
) {
    match cmd {
        GameCommand::RegisterPlayer {
            name,
            session,
            response,
        } => {
            let result = world.register_player(&name, session.id);
            match &result {
                Ok(()) => {
                    tracing::info!("Player {} joined from session {}", name.trim(), session.id);
                    sessions.insert(session.id, session);
                }
                Err(e) => tracing::warn!("Rejected player {:?}: {}", name, e),
            }
            let _ = response.send(result);
        }
        GameCommand::RegisterWatcher { session } => {
            world.register_watcher(session.id);
            tracing::info!(
                "Watcher joined from session {} ({} watching)",
                session.id,
                world.watcher_count()
            );
            sessions.insert(session.id, session);
        }
        GameCommand::Move { name, x, y } => {
            world.on_player_move(&name, x, y, wall_clock());
        }
        GameCommand::Unregister { session } => {
            sessions.remove(&session);
            match world.unregister(session) {
                Some(Departed::Player(name)) => tracing::info!("Player {} left", name),
                Some(Departed::Watcher) => tracing::info!("Watcher {} left", session),
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SnapshotWire;

    fn test_config() -> ServerConfig {
        ServerConfig {
            tick_rate_hz: 50,
            rng_seed: 7,
            ..Default::default()
        }
    }

    fn parse_snapshot(frame: &Frame) -> SnapshotWire {
        match serde_json::from_str::<ServerMsg>(frame.as_str()).unwrap() {
            ServerMsg::UpdateTableState { state } => state,
            other => panic!("Expected UpdateTableState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn tick_reaches_players_and_watchers() {
        let mut world = World::new(test_config().game, 7);
        let mut sessions = HashMap::new();

        let (player_tx, mut player_rx) = mpsc::channel(4);
        let (watcher_tx, mut watcher_rx) = mpsc::channel(4);
        let (resp_tx, resp_rx) = oneshot::channel();
        handle_command(
            &mut world,
            &mut sessions,
            GameCommand::RegisterPlayer {
                name: "ann".to_string(),
                session: SessionHandle::new(SessionId(1), player_tx),
                response: resp_tx,
            },
        );
        assert!(resp_rx.await.unwrap().is_ok());
        handle_command(
            &mut world,
            &mut sessions,
            GameCommand::RegisterWatcher {
                session: SessionHandle::new(SessionId(2), watcher_tx),
            },
        );

        let report = tick(&mut world, &sessions, Duration::from_millis(50)).await;
        assert_eq!(report, FanOutReport { delivered: 2, failed: 0 });

        let seen_by_player = parse_snapshot(&player_rx.recv().await.unwrap());
        let seen_by_watcher = parse_snapshot(&watcher_rx.recv().await.unwrap());
        assert!(seen_by_player.players.contains_key("ann"));
        assert!(!seen_by_player.foods.is_empty());
        assert_eq!(seen_by_watcher.server_time, seen_by_player.server_time);
    }

    #[tokio::test]
    async fn duplicate_registration_reports_name_taken() {
        let mut world = World::new(test_config().game, 7);
        let mut sessions = HashMap::new();

        for (id, expected) in [(1, Ok(())), (2, Err(RegisterError::NameTaken))] {
            let (tx, _rx) = mpsc::channel(4);
            let (resp_tx, resp_rx) = oneshot::channel();
            handle_command(
                &mut world,
                &mut sessions,
                GameCommand::RegisterPlayer {
                    name: "x".to_string(),
                    session: SessionHandle::new(SessionId(id), tx),
                    response: resp_tx,
                },
            );
            assert_eq!(resp_rx.await.unwrap(), expected);
        }
        assert_eq!(world.player("x").unwrap().session, SessionId(1));
        assert!(!sessions.contains_key(&SessionId(2)));
    }

    #[tokio::test]
    async fn dead_session_does_not_abort_tick() {
        let mut world = World::new(test_config().game, 7);
        let mut sessions = HashMap::new();

        let (dead_tx, dead_rx) = mpsc::channel(4);
        let (live_tx, mut live_rx) = mpsc::channel(4);
        drop(dead_rx);
        for (id, tx) in [(1, dead_tx), (2, live_tx)] {
            handle_command(
                &mut world,
                &mut sessions,
                GameCommand::RegisterWatcher {
                    session: SessionHandle::new(SessionId(id), tx),
                },
            );
        }

        let report = tick(&mut world, &sessions, Duration::from_millis(50)).await;
        assert_eq!(report, FanOutReport { delivered: 1, failed: 1 });
        assert!(live_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn loop_broadcasts_until_senders_drop() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let handle = tokio::spawn(run_game_loop(cmd_rx, test_config()));

        let (tx, mut rx) = mpsc::channel(4);
        cmd_tx
            .send(GameCommand::RegisterWatcher {
                session: SessionHandle::new(SessionId(9), tx),
            })
            .await
            .unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("snapshot within two seconds")
            .unwrap();
        let snapshot = parse_snapshot(&frame);
        assert!(snapshot.players.is_empty());
        assert!(snapshot.foods.len() >= 10);

        drop(rx);
        cmd_tx
            .send(GameCommand::Unregister {
                session: SessionId(9),
            })
            .await
            .unwrap();
        drop(cmd_tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop exits")
            .unwrap();
    }
}
