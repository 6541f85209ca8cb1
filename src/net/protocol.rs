//! Wire protocol: tagged intent/event unions carried as JSON text frames.
//!
//! Every message is `{ "type": ..., "payload": ... }` with kebab-case tags
//! and camelCase payload fields. The engine's internal types never cross
//! the wire directly; views and summaries below are the outbound shapes.

use serde::{Deserialize, Serialize};

use crate::cards::{Card, HandCategory};
use crate::engine::nl::{Chips, LegalActions, PlayerAction};
use crate::room::view::{GameView, RoomInfo};

/// Client → server intents.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        room_name: String,
        player_name: String,
    },
    JoinRoom {
        room_id: String,
        player_name: String,
    },
    LeaveRoom {
        room_id: String,
        seat_id: String,
    },
    StartGame {
        room_id: String,
    },
    PlayerAction {
        room_id: String,
        seat_id: String,
        action: ActionIntent,
    },
    GetRooms,
}

/// One betting action as the client words it. For bet and raise, `amount`
/// is the **total** committed to the current street after the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionIntent {
    Fold,
    Check,
    Call,
    Bet { amount: Chips },
    Raise { amount: Chips },
    AllIn,
}

impl From<ActionIntent> for PlayerAction {
    fn from(intent: ActionIntent) -> Self {
        match intent {
            ActionIntent::Fold => PlayerAction::Fold,
            ActionIntent::Check => PlayerAction::Check,
            ActionIntent::Call => PlayerAction::Call,
            ActionIntent::Bet { amount } => PlayerAction::BetTo { to: amount },
            ActionIntent::Raise { amount } => PlayerAction::RaiseTo { to: amount },
            ActionIntent::AllIn => PlayerAction::AllIn,
        }
    }
}

/// Server → client events.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
#[serde(rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomCreated {
        room: RoomInfo,
    },
    RoomJoined {
        room: RoomInfo,
        seat_id: String,
    },
    PlayerJoined {
        room_id: String,
        seat_id: String,
        player_name: String,
        room: RoomInfo,
    },
    PlayerLeft {
        room_id: String,
        seat_id: String,
        room: RoomInfo,
    },
    RoomsList {
        rooms: Vec<RoomInfo>,
    },
    GameStarted {
        game_view: GameView,
    },
    GameUpdated {
        game_view: GameView,
    },
    ActionRequired {
        seat_id: String,
        legal_actions: Vec<LegalActionEntry>,
        /// Epoch milliseconds.
        turn_deadline: u64,
    },
    HandComplete {
        winners: Vec<WinnerInfo>,
        players: Vec<ShowdownSeat>,
        community_cards: Vec<Card>,
        pot: Chips,
        is_showdown: bool,
    },
    GameOver {
        winner: Option<SeatSummary>,
        final_standings: Vec<SeatSummary>,
    },
    Error {
        message: String,
    },
}

/// One legal action with its amounts, as derived by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum LegalActionEntry {
    Fold,
    Check,
    Call { amount: Chips },
    Bet { min: Chips, max: Chips },
    Raise { min: Chips, max: Chips },
    AllIn { amount: Chips },
}

impl LegalActionEntry {
    pub fn list(legals: &LegalActions) -> Vec<LegalActionEntry> {
        let mut entries = Vec::new();
        if legals.fold {
            entries.push(LegalActionEntry::Fold);
        }
        if legals.check {
            entries.push(LegalActionEntry::Check);
        }
        if let Some(amount) = legals.call {
            entries.push(LegalActionEntry::Call { amount });
        }
        if let Some(range) = &legals.bet {
            entries.push(LegalActionEntry::Bet {
                min: *range.start(),
                max: *range.end(),
            });
        }
        if let Some(range) = &legals.raise {
            entries.push(LegalActionEntry::Raise {
                min: *range.start(),
                max: *range.end(),
            });
        }
        if let Some(amount) = legals.all_in {
            entries.push(LegalActionEntry::AllIn { amount });
        }
        entries
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerInfo {
    pub seat_id: String,
    pub player_name: String,
    pub amount: Chips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<HandCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_five: Option<[Card; 5]>,
}

/// Per-seat entry in the hand-complete payload. `hole_cards` is populated
/// only for seats that reached a showdown.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowdownSeat {
    pub seat_id: String,
    pub player_name: String,
    pub chips: Chips,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<[Card; 2]>,
    pub folded: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSummary {
    pub seat_id: String,
    pub player_name: String,
    pub chips: Chips,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_parse_from_tagged_json() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"join-room","payload":{"roomId":"r1","playerName":"ada"}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room_id: "r1".into(),
                player_name: "ada".into(),
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"get-rooms"}"#).unwrap();
        assert_eq!(msg, ClientMessage::GetRooms);

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"player-action","payload":{"roomId":"r1","seatId":"s1","action":{"type":"raise","amount":60}}}"#,
        )
        .unwrap();
        let ClientMessage::PlayerAction { action, .. } = msg else {
            panic!("expected player-action");
        };
        assert_eq!(action, ActionIntent::Raise { amount: 60 });
        assert_eq!(
            PlayerAction::from(action),
            PlayerAction::RaiseTo { to: 60 }
        );
    }

    #[test]
    fn all_in_intent_uses_the_kebab_tag() {
        let action: ActionIntent = serde_json::from_str(r#"{"type":"all-in"}"#).unwrap();
        assert_eq!(action, ActionIntent::AllIn);
    }

    #[test]
    fn malformed_intents_are_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"no-such"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(
            r#"{"type":"join-room","payload":{"roomId":"r1"}}"#
        )
        .is_err());
        assert!(serde_json::from_str::<ActionIntent>(r#"{"type":"bet"}"#).is_err());
    }

    #[test]
    fn events_serialize_with_type_and_payload() {
        let msg = ServerMessage::Error {
            message: "nope".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["payload"]["message"], "nope");
    }
}
