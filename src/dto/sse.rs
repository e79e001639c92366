use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::GameStatus,
    dto::game::{SessionView, TeamView},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event with a pre-rendered data payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Token payload sent to a freshly connected host stream.
pub struct HostHandshake {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the game status changes.
pub struct StatusChangedEvent {
    pub status: GameStatus,
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast with the full public session snapshot after every committed
/// session write. Consumers replace their whole local copy with this payload
/// rather than merging fields.
pub struct SessionUpdatedEvent(pub SessionView);

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a new team is created.
pub struct TeamCreatedEvent {
    pub team: TeamView,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when an existing team changed (status, prize, lifelines).
pub struct TeamUpdatedEvent {
    pub team: TeamView,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when a team has been deleted.
pub struct TeamDeletedEvent {
    pub team_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Event emitted when the whole team collection changed (reset, wipe).
pub struct TeamsReplacedEvent {
    pub teams: Vec<TeamView>,
}
