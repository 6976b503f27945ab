use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::config::Color;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../static/generated/")]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ServerMsg {
    UpdateTableState { state: SnapshotWire },
    Error { message: String, recoverable: bool },
}

impl ServerMsg {
    /// Errors are reported to the offending session only; it may retry.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMsg::Error {
            message: message.into(),
            recoverable: true,
        }
    }
}

/// Full world state, sent identically to every session once per tick.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../static/generated/")]
pub struct SnapshotWire {
    /// Wall clock, seconds since the Unix epoch
    pub server_time: f64,
    pub players: HashMap<String, PlayerWire>,
    /// Keyed by food id in decimal; JSON object keys are strings
    pub foods: HashMap<String, FoodWire>,
    /// Score changes since the previous snapshot
    pub events: Vec<EventWire>,
    pub tail_lifespan: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../static/generated/")]
pub struct PlayerWire {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    /// `[t, x, y]` samples, newest first
    pub trail: Vec<[f64; 3]>,
    pub score: u32,
    pub color: Color,
    pub invincible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../static/generated/")]
pub struct FoodWire {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub dx: f64,
    pub dy: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../static/generated/")]
pub struct EventWire {
    pub x: f64,
    pub y: f64,
    #[ts(type = "number")]
    pub score: i64,
    pub player_name: String,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../static/generated/")]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientMsg {
    RegisterPlayer { name: String },
    RegisterWatcher,
    PlayerMove { x: f64, y: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse_from_browser_json() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"command":"register_player","name":"ann"}"#).unwrap();
        match msg {
            ClientMsg::RegisterPlayer { name } => assert_eq!(name, "ann"),
            _ => panic!("Expected RegisterPlayer"),
        }

        let msg: ClientMsg = serde_json::from_str(r#"{"command":"register_watcher"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::RegisterWatcher));

        let msg: ClientMsg =
            serde_json::from_str(r#"{"command":"player_move","x":0.25,"y":0.75}"#).unwrap();
        match msg {
            ClientMsg::PlayerMove { x, y } => {
                assert!((x - 0.25).abs() < 1e-12);
                assert!((y - 0.75).abs() < 1e-12);
            }
            _ => panic!("Expected PlayerMove"),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"command":"fly","x":1}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>("not json").is_err());
    }

    #[test]
    fn snapshot_serializes_with_command_tag() {
        let mut players = HashMap::new();
        players.insert(
            "ann".to_string(),
            PlayerWire {
                x: 0.5,
                y: 0.5,
                r: 0.015,
                trail: vec![[10.0, 0.5, 0.49]],
                score: 2,
                color: (0.8, 0.0, 0.0),
                invincible: false,
            },
        );
        let mut foods = HashMap::new();
        foods.insert(
            "7".to_string(),
            FoodWire {
                x: 0.1,
                y: 0.2,
                r: 0.01,
                dx: 0.01,
                dy: -0.01,
                color: (0.3, 0.3, 0.3),
            },
        );
        let msg = ServerMsg::UpdateTableState {
            state: SnapshotWire {
                server_time: 10.0,
                players,
                foods,
                events: vec![EventWire {
                    x: 0.5,
                    y: 0.5,
                    score: 1,
                    player_name: "ann".to_string(),
                }],
                tail_lifespan: 1.0,
            },
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["command"], "update_table_state");
        assert_eq!(value["state"]["players"]["ann"]["color"][0], 0.8);
        assert_eq!(value["state"]["players"]["ann"]["trail"][0][0], 10.0);
        assert_eq!(value["state"]["foods"]["7"]["r"], 0.01);
        assert_eq!(value["state"]["events"][0]["player_name"], "ann");
        assert_eq!(value["state"]["tail_lifespan"], 1.0);
    }

    #[test]
    fn snapshot_parses_back_through_command_tag() {
        let json = r#"{
            "command": "update_table_state",
            "state": {
                "server_time": 12.5,
                "players": {
                    "ann": {
                        "x": 0.5, "y": 0.5, "r": 0.015,
                        "trail": [[12.4, 0.5, 0.49]],
                        "score": 3, "color": [0.8, 0.0, 0.0], "invincible": true
                    }
                },
                "foods": {
                    "8": {"x": 0.1, "y": 0.2, "r": 0.01, "dx": 0.0, "dy": 0.01, "color": [0.3, 0.3, 0.3]}
                },
                "events": [{"x": 0.5, "y": 0.5, "score": -2, "player_name": "ann"}],
                "tail_lifespan": 1.0
            }
        }"#;

        let state = match serde_json::from_str::<ServerMsg>(json).unwrap() {
            ServerMsg::UpdateTableState { state } => state,
            other => panic!("Expected UpdateTableState, got {:?}", other),
        };
        assert_eq!(state.foods["8"].dy, 0.01);
        assert_eq!(state.players["ann"].score, 3);
        assert!(state.players["ann"].invincible);
        assert_eq!(state.events[0].score, -2);

        // And our own output survives the same path
        let again = serde_json::to_string(&ServerMsg::UpdateTableState { state }).unwrap();
        match serde_json::from_str::<ServerMsg>(&again).unwrap() {
            ServerMsg::UpdateTableState { state } => assert_eq!(state.foods.len(), 1),
            other => panic!("Expected UpdateTableState, got {:?}", other),
        }
    }

    #[test]
    fn error_frame_shape() {
        let msg = ServerMsg::error("unrecognized command");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"command\":\"error\""));
        assert!(json.contains("\"recoverable\":true"));
    }
}
