//! Per-connection read/write pumps
//!
//! The hub sees transports only through these seams: a stream of inbound
//! byte frames and a sink for outbound ones. The surrounding system
//! supplies the concrete socket; tests supply channel-backed pairs.

use crate::hub::{HubHandle, Registration};
use async_trait::async_trait;
use ongi_common::events::{ChatEvent, EventKind, RoomId, UserId};
use ongi_common::Result;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Inbound half of a client transport. `None` means closed or errored.
#[async_trait]
pub trait MessageStream: Send {
    async fn next_frame(&mut self) -> Option<Vec<u8>>;
}

/// Outbound half of a client transport
#[async_trait]
pub trait MessageSink: Send {
    async fn send_frame(&mut self, frame: &[u8]) -> std::io::Result<()>;
    async fn close(&mut self);
}

/// Drive one chat connection for its lifetime.
///
/// Registers the client, announces presence, pumps the transport until
/// it closes, then performs the connection's single unregistration and
/// announces departure. The write pump runs as its own task and
/// terminates when the hub closes the outbound queue — on ordinary
/// teardown or when the backpressure policy drops this client.
pub async fn serve_connection<S, K>(
    hub: HubHandle,
    room_id: RoomId,
    user_id: UserId,
    mut stream: S,
    mut sink: K,
) -> Result<()>
where
    S: MessageStream + 'static,
    K: MessageSink + 'static,
{
    let conn_id = Uuid::new_v4();
    let (outbound, mut outbound_rx) = mpsc::channel(hub.client_queue_capacity());

    hub.register(Registration {
        conn_id,
        room_id,
        user_id,
        outbound,
    })
    .await?;

    hub.broadcast(
        room_id,
        EventKind::MemberOnline,
        user_id,
        json!({ "user_id": user_id, "status": "online" }),
    )
    .await?;

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if sink.send_frame(&frame).await.is_err() {
                debug!("Transport write failed, stopping write pump");
                break;
            }
        }
        sink.close().await;
    });

    // Inbound frames carry no commands: messages enter through the
    // message API, which persists and then broadcasts. The reader only
    // validates and discards until the transport closes.
    while let Some(frame) = stream.next_frame().await {
        match serde_json::from_slice::<ChatEvent>(&frame) {
            Ok(event) if event.room_id != room_id => {
                warn!(
                    "Invalid room ID: expected={}, got={}",
                    room_id, event.room_id
                );
            }
            Ok(_) => {}
            Err(e) => warn!("Error parsing client frame: {}", e),
        }
    }

    hub.unregister(room_id, conn_id).await?;
    hub.broadcast(
        room_id,
        EventKind::MemberOffline,
        user_id,
        json!({ "user_id": user_id, "status": "offline" }),
    )
    .await?;

    let _ = writer.await;
    Ok(())
}
