//! Listener on the store's change stream.
//!
//! The command side and the replication stream are two independent writers
//! into local observer state, so every notification is handled by
//! re-fetching the full fresh snapshot of the named collection and
//! rebroadcasting it wholesale over SSE; fields are never merged. A second
//! host tab or the public display converges from these rebroadcasts alone.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    dao::game_store::{GameStore, StoreChange},
    services::sse_events,
    state::SharedState,
};

/// Spawn the change-stream listener for a freshly installed store.
///
/// The task ends on its own when the store (and with it the change channel)
/// is dropped during a reconnect.
pub fn spawn(state: SharedState, store: Arc<dyn GameStore>) -> JoinHandle<()> {
    tokio::spawn(run(state, store))
}

async fn run(state: SharedState, store: Arc<dyn GameStore>) {
    // Seed the status machine from the authoritative snapshot before
    // processing any notifications.
    match store.session().await {
        Ok(Some(session)) => {
            state.reseed_status(session.game_status).await;
            info!(status = ?session.game_status, "seeded game status from store");
        }
        Ok(None) => {}
        Err(err) => warn!(error = %err, "could not read session while seeding"),
    }

    let mut changes = store.subscribe();
    loop {
        match changes.recv().await {
            Ok(change) => handle_change(&state, &store, change).await,
            Err(RecvError::Lagged(skipped)) => {
                // Missed notifications only delay convergence; a full
                // session-and-teams refresh catches everything up.
                warn!(skipped, "change stream lagged; rebroadcasting full snapshot");
                handle_change(&state, &store, StoreChange::Session).await;
                handle_change(&state, &store, StoreChange::Teams).await;
            }
            Err(RecvError::Closed) => {
                info!("store change stream closed; listener stopping");
                break;
            }
        }
    }
}

async fn handle_change(state: &SharedState, store: &Arc<dyn GameStore>, change: StoreChange) {
    match change {
        StoreChange::Session => match store.session().await {
            Ok(Some(session)) => {
                sse_events::broadcast_session_updated(state, session.into());
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "could not refetch session after change"),
        },
        StoreChange::Team(id) => match store.team(id).await {
            Ok(Some(team)) => sse_events::broadcast_team_updated(state, team.into()),
            Ok(None) => sse_events::broadcast_team_deleted(state, id),
            Err(err) => warn!(team_id = %id, error = %err, "could not refetch team after change"),
        },
        StoreChange::Teams => match store.teams().await {
            Ok(teams) => sse_events::broadcast_teams_replaced(
                state,
                teams.into_iter().map(Into::into).collect(),
            ),
            Err(err) => warn!(error = %err, "could not refetch teams after change"),
        },
        StoreChange::QuestionSet(id) => {
            // An upstream edit invalidates the cached copy; the next load
            // refetches regardless of its age.
            state.question_cache().invalidate(id);
        }
        StoreChange::PrizeLadder => {}
    }
}

/// Forward degraded-mode flips to both SSE streams.
pub fn spawn_degraded_broadcast(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut watcher = state.degraded_watcher();
        while watcher.changed().await.is_ok() {
            let degraded = *watcher.borrow();
            sse_events::broadcast_system_status(&state, degraded);
        }
    })
}
