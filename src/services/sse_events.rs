use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::GameStatus,
    dto::{
        game::{SessionView, TeamView},
        sse::{
            ServerEvent, SessionUpdatedEvent, StatusChangedEvent, SystemStatus, TeamCreatedEvent,
            TeamDeletedEvent, TeamUpdatedEvent, TeamsReplacedEvent,
        },
    },
    state::SharedState,
};

const EVENT_STATUS_CHANGED: &str = "status.changed";
const EVENT_SESSION_UPDATED: &str = "session.updated";
const EVENT_TEAM_CREATED: &str = "team.created";
const EVENT_TEAM_UPDATED: &str = "team.updated";
const EVENT_TEAM_DELETED: &str = "team.deleted";
const EVENT_TEAMS_REPLACED: &str = "teams.replaced";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast a game-status change to both streams.
pub fn broadcast_status_changed(state: &SharedState, status: GameStatus) {
    let payload = StatusChangedEvent {
        status,
        degraded: state.is_degraded(),
    };
    send_public_event(state, EVENT_STATUS_CHANGED, &payload);
    send_host_event(state, EVENT_STATUS_CHANGED, &payload);
}

/// Broadcast the full public session snapshot.
///
/// Sent after every committed session write; subscribers replace their local
/// copy wholesale instead of merging fields.
pub fn broadcast_session_updated(state: &SharedState, session: SessionView) {
    let payload = SessionUpdatedEvent(session);
    send_public_event(state, EVENT_SESSION_UPDATED, &payload);
    send_host_event(state, EVENT_SESSION_UPDATED, &payload);
}

/// Broadcast the creation of a new team.
pub fn broadcast_team_created(state: &SharedState, team: TeamView) {
    let payload = TeamCreatedEvent { team };
    send_public_event(state, EVENT_TEAM_CREATED, &payload);
    send_host_event(state, EVENT_TEAM_CREATED, &payload);
}

/// Broadcast that a team record changed.
pub fn broadcast_team_updated(state: &SharedState, team: TeamView) {
    let payload = TeamUpdatedEvent { team };
    send_public_event(state, EVENT_TEAM_UPDATED, &payload);
    send_host_event(state, EVENT_TEAM_UPDATED, &payload);
}

/// Broadcast that a team has been deleted.
pub fn broadcast_team_deleted(state: &SharedState, team_id: Uuid) {
    let payload = TeamDeletedEvent { team_id };
    send_public_event(state, EVENT_TEAM_DELETED, &payload);
    send_host_event(state, EVENT_TEAM_DELETED, &payload);
}

/// Broadcast the whole team collection after a reset or wipe.
pub fn broadcast_teams_replaced(state: &SharedState, teams: Vec<TeamView>) {
    let payload = TeamsReplacedEvent { teams };
    send_public_event(state, EVENT_TEAMS_REPLACED, &payload);
    send_host_event(state, EVENT_TEAMS_REPLACED, &payload);
}

/// Broadcast a degraded-mode flip to both streams.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_public_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_host_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_host_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.host_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize host SSE payload"),
    }
}
