//! Table actor message types.

use tokio::sync::{mpsc, oneshot};

use crate::game::{GameError, GameEvent, entities::GameSnapshot};
use crate::net::messages::ClientAction;

/// Identifier for one connected client, assigned by the gateway.
pub type ClientId = u64;

/// Messages that can be sent to a [`TableActor`](super::TableActor).
#[derive(Debug)]
pub enum TableMessage {
    /// Apply one client action to the game state. On success the
    /// resulting events are broadcast to every subscriber before the
    /// next message is processed; on rejection the error comes back on
    /// the response channel and nothing is broadcast.
    Apply {
        action: ClientAction,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Fetch the canonical snapshot.
    GetSnapshot {
        response: oneshot::Sender<GameSnapshot>,
    },

    /// Start receiving broadcast events.
    Subscribe {
        client_id: ClientId,
        sender: mpsc::Sender<GameEvent>,
    },

    /// Stop receiving broadcast events.
    Unsubscribe { client_id: ClientId },

    /// Shut the table down.
    Close,
}
