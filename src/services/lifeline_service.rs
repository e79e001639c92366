//! Lifeline engine: the 50/50 filter and the phone-a-friend countdown,
//! plus the one-lifeline-per-question rule.
//!
//! Availability flags on the team record are global for the whole game; the
//! per-question usage flag lives in the host-local turn state and resets
//! whenever a new question is loaded.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{LifelineKind, SessionPatch},
    },
    dto::host::{FiftyFiftyResponse, PhoneAFriendResponse},
    error::ServiceError,
    rules,
    services::{session_service, team_service},
    state::{SharedState, turn::{LoadedQuestion, PhoneCountdown, TurnState}},
};

/// Apply the 50/50 lifeline: hide two incorrect options, always preserving
/// the correct one, and spend the lifeline for the rest of the game.
pub async fn activate_fifty_fifty(
    state: &SharedState,
) -> Result<FiftyFiftyResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let mut turn = state.turn().lock().await;
    let (loaded, team_id) = ensure_lifeline_allowed(&store, &turn).await?;

    let team = team_service::fetch_team(&store, team_id).await?;
    if !team.lifelines.fifty_fifty {
        return Err(ServiceError::InvalidTransition(format!(
            "team `{team_id}` has already spent its 50/50"
        )));
    }

    // Spend on the team record first; the filtered projection derives from it.
    team_service::mark_lifeline_spent(&store, team_id, LifelineKind::FiftyFifty).await?;

    let survivors = {
        let mut rng = rand::rng();
        rules::fifty_fifty_survivors(&loaded.question, &mut rng)
    };

    store
        .patch_session(SessionPatch {
            options_visible: Some(survivors.clone()),
            active_lifeline: Some(Some(LifelineKind::FiftyFifty)),
            ..SessionPatch::default()
        })
        .await
        .map_err(|err| {
            ServiceError::Partial(format!("50/50 spent but options not filtered: {err}"))
        })?;

    turn.lifeline_used = true;

    // The filter itself is self-resolving; only the indicator lingers, and
    // it clears on its own shortly after.
    spawn_indicator_clear(state.clone());

    Ok(FiftyFiftyResponse {
        options_visible: survivors,
    })
}

/// Activate phone-a-friend: spend the lifeline immediately and start the
/// host-local countdown. Only the activation and the eventual resume touch
/// the shared store; the ticking itself is purely presentational.
pub async fn activate_phone_a_friend(
    state: &SharedState,
) -> Result<PhoneAFriendResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let mut turn = state.turn().lock().await;
    let (_, team_id) = ensure_lifeline_allowed(&store, &turn).await?;

    let team = team_service::fetch_team(&store, team_id).await?;
    if !team.lifelines.phone_a_friend {
        return Err(ServiceError::InvalidTransition(format!(
            "team `{team_id}` has already spent phone-a-friend"
        )));
    }

    team_service::mark_lifeline_spent(&store, team_id, LifelineKind::PhoneAFriend).await?;

    store
        .patch_session(SessionPatch {
            active_lifeline: Some(Some(LifelineKind::PhoneAFriend)),
            ..SessionPatch::default()
        })
        .await
        .map_err(|err| {
            ServiceError::Partial(format!(
                "phone-a-friend spent but indicator not published: {err}"
            ))
        })?;

    turn.lifeline_used = true;

    let duration = state.config().phone_countdown();
    let ticket = Uuid::new_v4();
    let expiry_state = state.clone();
    let task = tokio::spawn(async move {
        sleep(duration).await;
        if let Err(err) = resume_phone_a_friend(&expiry_state, Some(ticket)).await {
            warn!(error = %err, "phone-a-friend auto-resume failed");
        }
    });

    turn.cancel_countdown();
    turn.phone_countdown = Some(PhoneCountdown { ticket, task });

    Ok(PhoneAFriendResponse {
        countdown_seconds: duration.as_secs(),
    })
}

/// Resume play after a phone call.
///
/// Idempotent by design: the manual path (`ticket` = `None`) and the timer
/// expiry path (`ticket` = the activation's id) can race, and whichever
/// arrives second finds nothing left to do.
pub async fn resume_phone_a_friend(
    state: &SharedState,
    ticket: Option<Uuid>,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;

    let mut turn = state.turn().lock().await;
    match (turn.phone_countdown.take(), ticket) {
        (Some(countdown), Some(fired)) => {
            if countdown.ticket != fired {
                // Expiry of an older activation; the current countdown stays.
                turn.phone_countdown = Some(countdown);
                return Ok(());
            }
            // The expiry task resumes itself; dropping the handle without
            // aborting lets it finish this very call.
        }
        (Some(countdown), None) => countdown.task.abort(),
        (None, Some(_)) => return Ok(()),
        (None, None) => {}
    }

    let session = session_service::fetch_session(&store).await?;
    if session.active_lifeline == Some(LifelineKind::PhoneAFriend) {
        store
            .patch_session(SessionPatch {
                active_lifeline: Some(None),
                ..SessionPatch::default()
            })
            .await?;
    }

    Ok(())
}

/// Shared activation preconditions: a loaded, visible, unrevealed question
/// with no lifeline used on it yet. Returns the host-view question and the
/// freshly read hot-seat team id.
async fn ensure_lifeline_allowed(
    store: &Arc<dyn GameStore>,
    turn: &TurnState,
) -> Result<(LoadedQuestion, Uuid), ServiceError> {
    let loaded = turn
        .loaded
        .clone()
        .ok_or_else(|| ServiceError::InvalidTransition("no question loaded".into()))?;
    if turn.resolved {
        return Err(ServiceError::InvalidTransition(
            "question already resolved".into(),
        ));
    }
    if turn.lifeline_used {
        return Err(ServiceError::InvalidTransition(
            "a lifeline was already used on this question".into(),
        ));
    }

    let session = session_service::fetch_session(store).await?;
    if !session.question_visible {
        return Err(ServiceError::InvalidTransition(
            "question is not visible".into(),
        ));
    }
    if session.answer_revealed {
        return Err(ServiceError::InvalidTransition(
            "answer already revealed".into(),
        ));
    }

    let team_id = session_service::current_team_id(&session)?;
    Ok((loaded, team_id))
}

/// Clear the 50/50 indicator after the configured delay, provided it still
/// reads 50/50 (a newer lifeline or question wins otherwise).
fn spawn_indicator_clear(state: SharedState) {
    let delay = state.config().lifeline_clear_delay();
    tokio::spawn(async move {
        sleep(delay).await;

        let Some(store) = state.game_store().await else {
            return;
        };
        let session = match store.session().await {
            Ok(Some(session)) => session,
            _ => return,
        };
        if session.active_lifeline != Some(LifelineKind::FiftyFifty) {
            return;
        }
        if let Err(err) = store
            .patch_session(SessionPatch {
                active_lifeline: Some(None),
                ..SessionPatch::default()
            })
            .await
        {
            warn!(error = %err, "failed to clear the 50/50 indicator");
        }
    });
}
