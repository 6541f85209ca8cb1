//! Process-wide room registry: room id → controller handle.

use std::sync::Arc;

use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::TableConfig;
use crate::tokio_tools::spawn_named;

use super::controller::{RoomCommand, RoomController, RoomHandle};
use super::view::RoomInfo;

const LOG_TARGET: &str = "room::registry";
const ID_LEN: usize = 9;

/// Identifier for rooms and seats: 9 alphanumeric characters, regenerated
/// on the (astronomically unlikely) conflict by the caller.
pub fn random_id<R: Rng>(rng: &mut R) -> String {
    (0..ID_LEN).map(|_| rng.sample(Alphanumeric) as char).collect()
}

pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
    cfg: TableConfig,
    cancel: CancellationToken,
}

impl RoomRegistry {
    pub fn new(cfg: TableConfig, cancel: CancellationToken) -> Self {
        Self {
            rooms: DashMap::new(),
            cfg,
            cancel,
        }
    }

    /// Create a room and spawn its controller. The registry entry is
    /// pruned automatically when the controller task ends, so dissolved
    /// rooms disappear from listings without an extra round-trip.
    pub fn create_room(self: &Arc<Self>, name: &str) -> RoomHandle {
        let mut rng = StdRng::from_entropy();
        let room_id = loop {
            let id = random_id(&mut rng);
            if !self.rooms.contains_key(&id) {
                break id;
            }
        };
        let (handle, task) = RoomController::spawn(
            room_id.clone(),
            name.to_owned(),
            self.cfg.clone(),
            self.cancel.child_token(),
        );
        self.rooms.insert(room_id.clone(), handle.clone());
        debug!(target = LOG_TARGET, room_id = %room_id, name, "room registered");

        let registry = Arc::clone(self);
        spawn_named(format!("room-reaper-{room_id}"), async move {
            let _ = task.await;
            registry.rooms.remove(&room_id);
            debug!(target = LOG_TARGET, room_id = %room_id, "room unregistered");
        });
        handle
    }

    pub fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    /// Snapshot every live room for the lobby listing. Rooms that dissolve
    /// while we ask are simply skipped.
    pub async fn list(&self) -> Vec<RoomInfo> {
        let handles: Vec<RoomHandle> = self
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            let (reply, rx) = oneshot::channel();
            if handle.send(RoomCommand::Describe { reply }).await.is_err() {
                continue;
            }
            if let Ok(info) = rx.await {
                rooms.push(info);
            }
        }
        rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rooms_dissolve_when_the_last_seat_leaves() {
        let registry = Arc::new(RoomRegistry::new(
            TableConfig::default(),
            CancellationToken::new(),
        ));
        let handle = registry.create_room("lonely table");
        let room_id = handle.room_id.clone();
        assert_eq!(registry.len(), 1);

        let (events, _rx) = mpsc::unbounded_channel();
        let (reply, outcome) = tokio::sync::oneshot::channel();
        handle
            .send(RoomCommand::Join {
                conn: 1,
                player_name: "ada".into(),
                events,
                reply,
            })
            .await
            .unwrap();
        let outcome = outcome.await.unwrap().unwrap();

        let listed = registry.list().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].room_id, room_id);
        assert_eq!(listed[0].seat_count, 1);

        handle
            .send(RoomCommand::Leave {
                conn: 1,
                seat_id: outcome.seat_id,
            })
            .await
            .unwrap();
        // The controller exits and the reaper prunes the entry.
        for _ in 0..50 {
            if registry.get(&room_id).is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(registry.get(&room_id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn generated_ids_are_long_enough_and_distinct() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = random_id(&mut rng);
        let b = random_id(&mut rng);
        assert_eq!(a.len(), ID_LEN);
        assert!(a.len() >= 7);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
