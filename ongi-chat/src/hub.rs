//! Room broadcast hub
//!
//! One coordinator task exclusively owns the room → clients map and
//! consumes three bounded control queues (register, unregister,
//! broadcast). No lock guards the map; single-writer ownership is the
//! concurrency model. Each client holds a bounded outbound queue written
//! by the coordinator and drained by that client's write pump; a full
//! queue means the client is unresponsive and it is disconnected rather
//! than allowed to stall the broadcaster.

use ongi_common::events::{ChatEvent, EventKind, RoomId, UserId};
use ongi_common::{config::HubSettings, Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Serialized event frame, shared across all recipients of one broadcast
pub type Frame = Arc<[u8]>;

/// A client's entry in the hub: identity plus the sender side of its
/// outbound queue. The hub closes the queue by dropping the sender.
#[derive(Debug)]
pub struct Registration {
    pub conn_id: Uuid,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub outbound: mpsc::Sender<Frame>,
}

#[derive(Debug)]
struct Departure {
    room_id: RoomId,
    conn_id: Uuid,
}

/// Cloneable handle for submitting control inputs to the hub
#[derive(Debug, Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<Registration>,
    unregister_tx: mpsc::Sender<Departure>,
    broadcast_tx: mpsc::Sender<ChatEvent>,
    client_queue_capacity: usize,
}

impl HubHandle {
    /// Add a client to its room's set
    pub async fn register(&self, registration: Registration) -> Result<()> {
        self.register_tx
            .send(registration)
            .await
            .map_err(|_| Error::Internal("broadcast hub is not running".to_string()))
    }

    /// Remove a client from its room's set and close its outbound queue.
    /// Unknown clients are a no-op.
    pub async fn unregister(&self, room_id: RoomId, conn_id: Uuid) -> Result<()> {
        self.unregister_tx
            .send(Departure { room_id, conn_id })
            .await
            .map_err(|_| Error::Internal("broadcast hub is not running".to_string()))
    }

    /// Fan an event out to every client currently in the room
    pub async fn broadcast(
        &self,
        room_id: RoomId,
        kind: EventKind,
        user_id: UserId,
        data: Value,
    ) -> Result<()> {
        self.broadcast_tx
            .send(ChatEvent::new(kind, room_id, user_id, data))
            .await
            .map_err(|_| Error::Internal("broadcast hub is not running".to_string()))
    }

    /// Capacity connection drivers should use for client outbound queues
    pub fn client_queue_capacity(&self) -> usize {
        self.client_queue_capacity
    }
}

/// The coordinator: sole owner of the room membership map
pub struct BroadcastHub {
    rooms: HashMap<RoomId, HashMap<Uuid, mpsc::Sender<Frame>>>,
    register_rx: mpsc::Receiver<Registration>,
    unregister_rx: mpsc::Receiver<Departure>,
    broadcast_rx: mpsc::Receiver<ChatEvent>,
}

impl BroadcastHub {
    /// Start the hub, returning the handle its callers use. The
    /// coordinator exits once every handle clone is dropped and the
    /// control queues drain.
    pub fn spawn(settings: &HubSettings) -> HubHandle {
        let (register_tx, register_rx) = mpsc::channel(settings.control_queue_capacity);
        let (unregister_tx, unregister_rx) = mpsc::channel(settings.control_queue_capacity);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(settings.control_queue_capacity);

        let hub = Self {
            rooms: HashMap::new(),
            register_rx,
            unregister_rx,
            broadcast_rx,
        };
        tokio::spawn(hub.run());
        info!("Broadcast hub started");

        HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
            client_queue_capacity: settings.client_queue_capacity,
        }
    }

    /// Coordinator loop. Membership changes take priority over pending
    /// broadcasts so a completed registration is visible to every later
    /// broadcast.
    async fn run(mut self) {
        let mut registers_open = true;
        let mut unregisters_open = true;
        let mut broadcasts_open = true;

        while registers_open || unregisters_open || broadcasts_open {
            tokio::select! {
                biased;
                registration = self.register_rx.recv(), if registers_open => {
                    match registration {
                        Some(registration) => self.add_client(registration),
                        None => registers_open = false,
                    }
                }
                departure = self.unregister_rx.recv(), if unregisters_open => {
                    match departure {
                        Some(departure) => self.remove_client(departure.room_id, departure.conn_id),
                        None => unregisters_open = false,
                    }
                }
                event = self.broadcast_rx.recv(), if broadcasts_open => {
                    match event {
                        Some(event) => self.broadcast(event),
                        None => broadcasts_open = false,
                    }
                }
            }
        }

        debug!("Broadcast hub stopped");
    }

    fn add_client(&mut self, registration: Registration) {
        let Registration {
            conn_id,
            room_id,
            user_id,
            outbound,
        } = registration;

        self.rooms
            .entry(room_id)
            .or_default()
            .insert(conn_id, outbound);
        info!("Client registered: user={} room={}", user_id, room_id);
    }

    fn remove_client(&mut self, room_id: RoomId, conn_id: Uuid) {
        let Some(clients) = self.rooms.get_mut(&room_id) else {
            return;
        };

        // dropping the sender closes the client's queue and ends its
        // write pump
        if clients.remove(&conn_id).is_some() {
            info!("Client unregistered: room={}", room_id);
        }
        if clients.is_empty() {
            self.rooms.remove(&room_id);
        }
    }

    fn broadcast(&mut self, event: ChatEvent) {
        let Some(clients) = self.rooms.get_mut(&event.room_id) else {
            return;
        };

        // serialize once, share the frame across all recipients
        let frame: Frame = match serde_json::to_vec(&event) {
            Ok(bytes) => Arc::from(bytes.into_boxed_slice()),
            Err(e) => {
                warn!("Error serializing event: {}", e);
                return;
            }
        };

        let mut dropped = Vec::new();
        for (conn_id, outbound) in clients.iter() {
            match outbound.try_send(frame.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // unresponsive consumer: disconnect it rather than
                    // block the broadcaster
                    warn!(
                        "Client queue full, disconnecting: room={}",
                        event.room_id
                    );
                    dropped.push(*conn_id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dropped.push(*conn_id);
                }
            }
        }

        for conn_id in dropped {
            clients.remove(&conn_id);
        }
        if clients.is_empty() {
            self.rooms.remove(&event.room_id);
        }

        debug!(
            "Broadcast {:?} event to room {}",
            event.kind, event.room_id
        );
    }
}
