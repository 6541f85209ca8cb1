//! Message router: one inbound intent becomes exactly one controller call
//! under that room's single-writer inbox; outbound events flow back through
//! the connection's event channel. Contract violations are answered to the
//! sender only and never touch room state.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::room::controller::{JoinOutcome, RoomCommand, RoomError, RoomHandle};
use crate::room::RoomRegistry;

use super::protocol::{ClientMessage, ServerMessage};
use super::ConnId;

const LOG_TARGET: &str = "net::router";

pub struct Router {
    registry: Arc<RoomRegistry>,
}

/// Routing state of one connection: its event channel and the rooms it is
/// bound to, so a dropped socket can be reported to each of them.
pub struct Connection {
    pub id: ConnId,
    pub events: mpsc::UnboundedSender<ServerMessage>,
    pub rooms: HashSet<String>,
}

impl Connection {
    pub fn new(id: ConnId, events: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id,
            events,
            rooms: HashSet::new(),
        }
    }

    fn reply(&self, message: ServerMessage) {
        let _ = self.events.send(message);
    }

    fn reply_error(&self, message: impl Into<String>) {
        self.reply(ServerMessage::Error {
            message: message.into(),
        });
    }
}

impl Router {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, conn: &mut Connection, msg: ClientMessage) {
        match msg {
            ClientMessage::CreateRoom {
                room_name,
                player_name,
            } => {
                let handle = self.registry.create_room(&room_name);
                match self.join(conn, &handle, player_name).await {
                    Ok(outcome) => {
                        conn.reply(ServerMessage::RoomCreated {
                            room: outcome.room.clone(),
                        });
                        conn.reply(ServerMessage::RoomJoined {
                            room: outcome.room,
                            seat_id: outcome.seat_id,
                        });
                    }
                    Err(err) => conn.reply_error(err.to_string()),
                }
            }
            ClientMessage::JoinRoom {
                room_id,
                player_name,
            } => match self.registry.get(&room_id) {
                Some(handle) => match self.join(conn, &handle, player_name).await {
                    Ok(outcome) => conn.reply(ServerMessage::RoomJoined {
                        room: outcome.room,
                        seat_id: outcome.seat_id,
                    }),
                    Err(err) => conn.reply_error(err.to_string()),
                },
                None => conn.reply_error("room not found"),
            },
            ClientMessage::LeaveRoom { room_id, seat_id } => {
                self.route(conn, &room_id, RoomCommand::Leave {
                    conn: conn.id,
                    seat_id,
                })
                .await;
                conn.rooms.remove(&room_id);
            }
            ClientMessage::StartGame { room_id } => {
                self.route(conn, &room_id, RoomCommand::StartGame { conn: conn.id })
                    .await;
            }
            ClientMessage::PlayerAction {
                room_id,
                seat_id,
                action,
            } => {
                self.route(conn, &room_id, RoomCommand::Action {
                    conn: conn.id,
                    seat_id,
                    action: action.into(),
                })
                .await;
            }
            ClientMessage::GetRooms => {
                let rooms = self.registry.list().await;
                conn.reply(ServerMessage::RoomsList { rooms });
            }
        }
    }

    /// Report a closed socket to every room the connection was bound to.
    pub async fn disconnect(&self, conn: &Connection) {
        for room_id in &conn.rooms {
            if let Some(handle) = self.registry.get(room_id) {
                let _ = handle
                    .send(RoomCommand::Disconnect { conn: conn.id })
                    .await;
            }
        }
        debug!(target = LOG_TARGET, conn = conn.id, "connection unbound");
    }

    async fn join(
        &self,
        conn: &mut Connection,
        handle: &RoomHandle,
        player_name: String,
    ) -> Result<JoinOutcome, RoomError> {
        let (reply, rx) = oneshot::channel();
        handle
            .send(RoomCommand::Join {
                conn: conn.id,
                player_name,
                events: conn.events.clone(),
                reply,
            })
            .await?;
        let outcome = rx.await.map_err(|_| RoomError::Closed)??;
        conn.rooms.insert(handle.room_id.clone());
        Ok(outcome)
    }

    async fn route(&self, conn: &Connection, room_id: &str, cmd: RoomCommand) {
        match self.registry.get(room_id) {
            Some(handle) => {
                if handle.send(cmd).await.is_err() {
                    conn.reply_error("room is closed");
                }
            }
            None => conn.reply_error("room not found"),
        }
    }
}
