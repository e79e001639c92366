//! The game session controller: every host action enters here.
//!
//! Operations follow the read-fresh-then-write discipline: each one re-reads
//! the authoritative session and team records through the gateway before
//! computing its writes, and multi-step sequences run as strictly awaited
//! steps with the source-of-truth write (team status) ahead of the derived
//! public-projection write.

use std::{sync::Arc, time::SystemTime};

use indexmap::IndexMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{
            GameStatus, SessionEntity, SessionPatch, TeamStatus,
        },
    },
    dto::{
        game::{HostQuestionView, SessionView, TeamView},
        host::{
            AdvanceTeamResponse, InitializeGameRequest, LoadQuestionRequest, LoadQuestionResponse,
            LockAnswerRequest, LockAnswerResponse, SkipQuestionResponse, UninitializeRequest,
        },
    },
    error::ServiceError,
    rules,
    services::{question_service, sse_events, team_service},
    state::{
        SharedState,
        state_machine::{FinishReason, GameEvent},
        transitions::run_transition_with_broadcast,
    },
};

/// Fix the play queue and question-set assignments, moving the game to the
/// initialized status.
///
/// The session record and every team's assignment are written through the
/// store's one multi-path atomic primitive, so no observer can see the pair
/// half-applied.
pub async fn initialize_game(
    state: &SharedState,
    request: InitializeGameRequest,
) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;

    let session = run_transition_with_broadcast(state, GameEvent::Initialize, || async {
        let InitializeGameRequest {
            play_queue,
            question_set_assignments,
        } = request;

        validate_queue(&play_queue)?;

        for team_id in &play_queue {
            let team = team_service::fetch_team(&store, *team_id).await?;
            if team.status != TeamStatus::Waiting {
                return Err(ServiceError::InvalidTransition(format!(
                    "team `{team_id}` is {:?}; only waiting teams can be queued",
                    team.status
                )));
            }
            if !question_set_assignments.contains_key(team_id) {
                return Err(ServiceError::InvalidInput(format!(
                    "team `{team_id}` has no question-set assignment"
                )));
            }
        }

        let expected_count = ladder_or_seed(state, &store).await?.amounts.len();
        for (team_id, set_id) in &question_set_assignments {
            let set = state
                .question_cache()
                .load(&store, *set_id, true)
                .await?;
            if set.questions.len() != expected_count {
                return Err(ServiceError::InvalidInput(format!(
                    "question set `{set_id}` assigned to team `{team_id}` has {} questions, expected {expected_count}",
                    set.questions.len()
                )));
            }
        }

        let session = SessionEntity {
            game_status: GameStatus::Initialized,
            play_queue: play_queue.clone(),
            question_set_assignments: question_set_assignments.clone(),
            initialized_at: Some(SystemTime::now()),
            ..SessionEntity::default()
        };

        let team_patches = question_set_assignments
            .iter()
            .map(|(team_id, set_id)| {
                (
                    *team_id,
                    crate::dao::models::TeamPatch {
                        question_set_id: Some(Some(*set_id)),
                        ..Default::default()
                    },
                )
            })
            .collect();

        store.initialize_game(session.clone(), team_patches).await?;
        Ok(session)
    })
    .await?;

    state.turn().lock().await.clear();
    Ok(session.into())
}

/// Begin play: the first queued team takes the hot seat.
pub async fn start_game(state: &SharedState) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;

    let session = run_transition_with_broadcast(state, GameEvent::Start, || async {
        let session = fetch_session(&store).await?;
        let first = session
            .play_queue
            .first()
            .copied()
            .ok_or_else(|| ServiceError::Stale("play queue is empty; run resync".into()))?;

        // Team status is the source of truth; it is committed before the
        // session's derived fields.
        team_service::activate(&store, first).await?;

        let mut patch = SessionPatch::clear_projection();
        patch.game_status = Some(GameStatus::Active);
        patch.current_team_id = Some(Some(first));
        patch.current_question_number = Some(0);
        patch.started_at = Some(Some(SystemTime::now()));
        store
            .patch_session(patch)
            .await
            .map_err(|err| partial("team activated but session not started", err.into()))?;

        fetch_session(&store).await
    })
    .await?;

    state.turn().lock().await.clear();
    Ok(session.into())
}

/// Suspend play.
pub async fn pause_game(state: &SharedState) -> Result<SessionView, ServiceError> {
    set_status_only(state, GameEvent::Pause, GameStatus::Paused).await
}

/// Resume play after a pause.
pub async fn resume_game(state: &SharedState) -> Result<SessionView, ServiceError> {
    set_status_only(state, GameEvent::Resume, GameStatus::Active).await
}

/// End the game early at the host's request.
pub async fn stop_game(state: &SharedState) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;
    let session = run_transition_with_broadcast(
        state,
        GameEvent::Finish(FinishReason::ManualStop),
        || async {
            store
                .patch_session(SessionPatch {
                    game_status: Some(GameStatus::Completed),
                    ..SessionPatch::default()
                })
                .await?;
            fetch_session(&store).await
        },
    )
    .await?;

    state.turn().lock().await.clear();
    Ok(session.into())
}

/// Soft teardown: clear the session and queue, optionally resetting teams.
/// Question sets persist independently.
pub async fn uninitialize(
    state: &SharedState,
    request: UninitializeRequest,
) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;

    let session = run_transition_with_broadcast(state, GameEvent::Uninitialize, || async {
        if request.reset_teams {
            team_service::reset_all(state).await?;
        }

        store.patch_session(session_reset_patch()).await?;
        fetch_session(&store).await
    })
    .await?;

    state.turn().lock().await.clear();
    Ok(session.into())
}

/// Hard teardown: wipe teams and session and restore the default prize
/// ladder. Question sets persist.
pub async fn factory_reset(state: &SharedState) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;
    let default_ladder = state.config().default_prize_ladder();

    let session = run_transition_with_broadcast(state, GameEvent::Uninitialize, || async {
        store.factory_reset(default_ladder).await?;
        fetch_session(&store).await
    })
    .await?;

    state.turn().lock().await.clear();
    state.question_cache().clear();
    Ok(session.into())
}

/// Recovery action: re-read the authoritative store snapshot, re-seed the
/// status machine, refresh the active question set, and rebroadcast.
///
/// Available to the host specifically for "partially applied" failures.
pub async fn resync(state: &SharedState) -> Result<(SessionView, Vec<TeamView>), ServiceError> {
    let store = state.require_game_store().await?;

    let session = store.session().await?.unwrap_or_default();
    state.reseed_status(session.game_status).await;

    if let Some(team_id) = session.current_team_id
        && let Some(set_id) = session.question_set_assignments.get(&team_id).copied()
        && let Err(err) = state.question_cache().load(&store, set_id, true).await
    {
        warn!(%set_id, error = %err, "resync could not refresh the active question set");
    }

    let teams: Vec<TeamView> = store
        .teams()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let view: SessionView = session.into();

    sse_events::broadcast_session_updated(state, view.clone());
    sse_events::broadcast_teams_replaced(state, teams.clone());
    info!("resynchronized state from store");

    Ok((view, teams))
}

/// Load question `number` of the current team's set into the host view.
///
/// The public projection is cleared in the same write that moves the turn
/// counter, so the display can never pair a stale question with the new
/// number.
pub async fn load_question(
    state: &SharedState,
    request: LoadQuestionRequest,
) -> Result<LoadQuestionResponse, ServiceError> {
    let store = state.require_game_store().await?;
    ensure_game_active(state).await?;

    let mut turn = state.turn().lock().await;
    if turn.loaded.is_some() && !turn.resolved {
        return Err(ServiceError::InvalidTransition(
            "current question is not resolved yet (lock or skip it first)".into(),
        ));
    }

    let session = fetch_session(&store).await?;
    let team_id = current_team_id(&session)?;
    let team = team_service::fetch_team(&store, team_id).await?;
    if team.status != TeamStatus::Active {
        return Err(ServiceError::InvalidTransition(format!(
            "team `{team_id}` is {:?}, not at the hot seat",
            team.status
        )));
    }

    let set_id = session
        .question_set_assignments
        .get(&team_id)
        .copied()
        .ok_or_else(|| {
            ServiceError::Stale(format!(
                "no question-set assignment for team `{team_id}`; run resync"
            ))
        })?;

    let ladder = fetch_ladder(&store).await?;
    let count = ladder.amounts.len() as u32;
    let number = request.number;
    if number == 0 || number > count {
        return Err(ServiceError::InvalidInput(format!(
            "question number {number} is outside 1..={count}"
        )));
    }

    state.question_cache().load(&store, set_id, false).await?;
    let question = state
        .question_cache()
        .get_question(set_id, number - 1)
        .ok_or_else(|| {
            ServiceError::NotFound(format!("question set `{set_id}` has no question {number}"))
        })?;

    let mut patch = SessionPatch::clear_projection();
    patch.current_question_number = Some(number);
    store.patch_session(patch).await?;

    turn.load(number, question.clone());

    Ok(LoadQuestionResponse {
        question: HostQuestionView::from_question(number, &question),
    })
}

/// Publish the answer-stripped question to the public display.
pub async fn show_question(state: &SharedState) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;

    let turn = state.turn().lock().await;
    let loaded = turn
        .loaded
        .as_ref()
        .ok_or_else(|| ServiceError::InvalidTransition("no question loaded".into()))?;
    if turn.resolved {
        return Err(ServiceError::InvalidTransition(
            "question already resolved".into(),
        ));
    }

    let public = question_service::to_public_view(loaded.number, &loaded.question);
    store
        .patch_session(SessionPatch {
            current_question: Some(Some(public)),
            question_visible: Some(true),
            ..SessionPatch::default()
        })
        .await?;

    Ok(fetch_session(&store).await?.into())
}

/// Retract the question from the public display. Only legal while the
/// answer has not been revealed.
pub async fn hide_question(state: &SharedState) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;

    let _turn = state.turn().lock().await;
    let session = fetch_session(&store).await?;
    if session.answer_revealed {
        return Err(ServiceError::InvalidTransition(
            "answer already revealed; the question can no longer be hidden".into(),
        ));
    }

    store
        .patch_session(SessionPatch {
            question_visible: Some(false),
            ..SessionPatch::default()
        })
        .await?;

    Ok(fetch_session(&store).await?.into())
}

/// Lock the team's answer: validate it against the host view, reveal the
/// correct option, and resolve the team (advance, complete, or eliminate).
///
/// The reveal flag and the correct option travel in one session update; this
/// is the only moment the correct answer reaches the public projection.
pub async fn lock_answer(
    state: &SharedState,
    request: LockAnswerRequest,
) -> Result<LockAnswerResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let mut turn = state.turn().lock().await;
    let loaded = turn
        .loaded
        .clone()
        .ok_or_else(|| ServiceError::InvalidTransition("no question loaded".into()))?;
    if turn.resolved {
        return Err(ServiceError::InvalidTransition(
            "question already resolved".into(),
        ));
    }

    let session = fetch_session(&store).await?;
    if !session.question_visible {
        return Err(ServiceError::InvalidTransition(
            "question is not visible; show it before locking".into(),
        ));
    }
    if session.answer_revealed {
        return Err(ServiceError::InvalidTransition(
            "answer already revealed".into(),
        ));
    }

    let selected = rules::parse_option_label(&request.selected).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "selection `{}` is not one of the option letters A-D",
            request.selected
        ))
    })?;

    let team_id = current_team_id(&session)?;
    let number = loaded.number;
    let correct = loaded.question.correct_option;
    let is_correct = rules::answers_match(selected, correct);

    // The reveal pair is one atomic update; from here on the lock is
    // irreversible and later failures surface as partial.
    store
        .patch_session(SessionPatch {
            answer_revealed: Some(true),
            correct_option: Some(Some(correct)),
            ..SessionPatch::default()
        })
        .await?;
    turn.resolved = true;
    turn.cancel_countdown();

    let ladder = fetch_ladder(&store)
        .await
        .map_err(|err| partial("answer revealed but prize lookup failed", err))?;
    let count = ladder.amounts.len() as u32;

    let (team, new_prize) = if is_correct {
        let prize = rules::prize_for_question(&ladder, number).ok_or_else(|| {
            ServiceError::Partial(format!(
                "answer revealed but no prize rung for question {number}"
            ))
        })?;
        let team = team_service::advance_on_correct_answer(&store, team_id, prize)
            .await
            .map_err(|err| partial("answer revealed but team not advanced", err))?;
        let team = if number >= count {
            team_service::complete(&store, team_id, prize, number)
                .await
                .map_err(|err| partial("answer revealed but team not completed", err))?
        } else {
            team
        };
        (team, Some(prize))
    } else {
        let team = team_service::eliminate(&store, team_id, request.consolation_prize)
            .await
            .map_err(|err| partial("answer revealed but team not eliminated", err))?;
        (team, None)
    };

    let game_completed = if team.status.is_terminal() {
        finish_if_queue_exhausted(state, &store, team_id)
            .await
            .map_err(|err| partial("team resolved but game completion check failed", err))?
    } else {
        false
    };

    Ok(LockAnswerResponse {
        correct: is_correct,
        correct_option: correct,
        team: team.into(),
        new_prize,
        game_completed,
    })
}

/// Skip the current question: retract it from the public view and advance
/// the team's position without credit. Skipping the last question completes
/// the team with its current, unchanged prize.
pub async fn skip_question(state: &SharedState) -> Result<SkipQuestionResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let mut turn = state.turn().lock().await;
    if turn.loaded.is_none() {
        return Err(ServiceError::InvalidTransition("no question loaded".into()));
    }
    if turn.resolved {
        return Err(ServiceError::InvalidTransition(
            "question already resolved".into(),
        ));
    }

    let session = fetch_session(&store).await?;
    if session.answer_revealed {
        return Err(ServiceError::InvalidTransition(
            "answer already revealed; the question can no longer be skipped".into(),
        ));
    }
    let team_id = current_team_id(&session)?;
    // The turn counter, not the credit counter, decides whether this was the
    // last question.
    let number = session.current_question_number;

    store.patch_session(SessionPatch::clear_projection()).await?;

    let team = team_service::advance_on_skip(&store, team_id)
        .await
        .map_err(|err| partial("question retracted but team not advanced", err))?;

    let ladder = fetch_ladder(&store)
        .await
        .map_err(|err| partial("team advanced but ladder fetch failed", err))?;
    let team_completed = number >= ladder.amounts.len() as u32;

    let team = if team_completed {
        team_service::complete(&store, team_id, team.current_prize, number)
            .await
            .map_err(|err| partial("last question skipped but team not completed", err))?
    } else {
        team
    };

    turn.clear();

    let game_completed = if team.status.is_terminal() {
        finish_if_queue_exhausted(state, &store, team_id)
            .await
            .map_err(|err| partial("team completed but game completion check failed", err))?
    } else {
        false
    };

    Ok(SkipQuestionResponse {
        team_completed,
        team: team.into(),
        game_completed,
    })
}

/// Hand the hot seat to the next waiting team in the queue.
///
/// The outgoing team's status is never touched here; advancing past a team
/// that is still active or waiting is legal but logged.
pub async fn advance_to_next_team(
    state: &SharedState,
) -> Result<AdvanceTeamResponse, ServiceError> {
    let store = state.require_game_store().await?;
    ensure_game_active(state).await?;

    let mut turn = state.turn().lock().await;
    let session = fetch_session(&store).await?;

    let position = session
        .current_team_id
        .and_then(|id| session.play_queue.iter().position(|entry| *entry == id));

    if let Some(current_id) = session.current_team_id {
        let current = team_service::fetch_team(&store, current_id).await?;
        if !current.status.is_terminal() {
            warn!(
                team_id = %current_id,
                status = ?current.status,
                "advancing past a team that was never resolved"
            );
        }
    }

    let start = position.map(|index| index + 1).unwrap_or(0);
    let mut next_id = None;
    for candidate in session.play_queue.iter().skip(start) {
        let team = team_service::fetch_team(&store, *candidate).await?;
        if team.status == TeamStatus::Waiting {
            next_id = Some(*candidate);
            break;
        }
    }
    let next_id = next_id.ok_or_else(|| {
        ServiceError::InvalidTransition("no waiting team left in the play queue".into())
    })?;

    let next = team_service::activate(&store, next_id).await?;

    let mut patch = SessionPatch::clear_projection();
    patch.current_team_id = Some(Some(next_id));
    patch.current_question_number = Some(0);
    store
        .patch_session(patch)
        .await
        .map_err(|err| partial("next team activated but session not updated", err.into()))?;

    turn.clear();

    Ok(AdvanceTeamResponse {
        current_team: next.into(),
    })
}

/// Fresh session snapshot as seen by the host.
pub async fn get_session(state: &SharedState) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;
    Ok(fetch_session(&store).await?.into())
}

/// Complete the game when the resolved team exhausted the queue: it sat in
/// the final slot, or no waiting team remains.
async fn finish_if_queue_exhausted(
    state: &SharedState,
    store: &Arc<dyn GameStore>,
    resolved_team_id: Uuid,
) -> Result<bool, ServiceError> {
    let session = fetch_session(store).await?;
    let last_slot = session
        .play_queue
        .last()
        .is_some_and(|last| *last == resolved_team_id);

    let mut any_waiting = false;
    for candidate in &session.play_queue {
        let team = team_service::fetch_team(store, *candidate).await?;
        if team.status == TeamStatus::Waiting {
            any_waiting = true;
            break;
        }
    }

    if !last_slot && any_waiting {
        return Ok(false);
    }

    run_transition_with_broadcast(
        state,
        GameEvent::Finish(FinishReason::QueueExhausted),
        || async {
            store
                .patch_session(SessionPatch {
                    game_status: Some(GameStatus::Completed),
                    ..SessionPatch::default()
                })
                .await?;
            Ok(())
        },
    )
    .await?;

    info!("play queue exhausted; game completed");
    Ok(true)
}

async fn set_status_only(
    state: &SharedState,
    event: GameEvent,
    status: GameStatus,
) -> Result<SessionView, ServiceError> {
    let store = state.require_game_store().await?;
    let session = run_transition_with_broadcast(state, event, || async {
        store
            .patch_session(SessionPatch {
                game_status: Some(status),
                ..SessionPatch::default()
            })
            .await?;
        fetch_session(&store).await
    })
    .await?;
    Ok(session.into())
}

pub(crate) async fn fetch_session(
    store: &Arc<dyn GameStore>,
) -> Result<SessionEntity, ServiceError> {
    store
        .session()
        .await?
        .ok_or_else(|| ServiceError::Stale("session record missing; run resync".into()))
}

async fn fetch_ladder(
    store: &Arc<dyn GameStore>,
) -> Result<crate::dao::models::PrizeLadderEntity, ServiceError> {
    store
        .prize_ladder()
        .await?
        .ok_or_else(|| ServiceError::Stale("prize ladder missing; run resync".into()))
}

async fn ladder_or_seed(
    state: &SharedState,
    store: &Arc<dyn GameStore>,
) -> Result<crate::dao::models::PrizeLadderEntity, ServiceError> {
    if let Some(ladder) = store.prize_ladder().await? {
        return Ok(ladder);
    }
    let ladder = state.config().default_prize_ladder();
    store.put_prize_ladder(ladder.clone()).await?;
    Ok(ladder)
}

async fn ensure_game_active(state: &SharedState) -> Result<(), ServiceError> {
    let status = state.game_status().await;
    if status != GameStatus::Active {
        return Err(ServiceError::InvalidTransition(format!(
            "operation requires an active game, current status {status:?}"
        )));
    }
    Ok(())
}

pub(crate) fn current_team_id(session: &SessionEntity) -> Result<Uuid, ServiceError> {
    session.current_team_id.ok_or_else(|| {
        ServiceError::InvalidTransition("no team is at the hot seat".into())
    })
}

fn validate_queue(play_queue: &[Uuid]) -> Result<(), ServiceError> {
    if play_queue.is_empty() {
        return Err(ServiceError::InvalidInput(
            "play queue must contain at least one team".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for id in play_queue {
        if !seen.insert(*id) {
            return Err(ServiceError::InvalidInput(format!(
                "duplicate team `{id}` in the play queue"
            )));
        }
    }
    Ok(())
}

/// Convert a storage failure into a partial-sequence error; precondition
/// failures pass through untouched since nothing further was applied.
fn partial(context: &str, err: ServiceError) -> ServiceError {
    match err {
        ServiceError::Unavailable(source) => {
            ServiceError::Partial(format!("{context}: {source}"))
        }
        other => other,
    }
}

/// Build the session patch used by the soft teardown.
fn session_reset_patch() -> SessionPatch {
    let mut patch = SessionPatch::clear_projection();
    patch.game_status = Some(GameStatus::NotStarted);
    patch.current_team_id = Some(None);
    patch.current_question_number = Some(0);
    patch.play_queue = Some(Vec::new());
    patch.question_set_assignments = Some(IndexMap::new());
    patch.initialized_at = Some(None);
    patch.started_at = Some(None);
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::{OptionLabel, TeamPatch},
        services::testing::{insert_waiting_team, load_and_show, running_game, test_state},
    };

    const CORRECT: &str = "A";
    const WRONG: &str = "B";

    fn lock_request(selected: &str) -> LockAnswerRequest {
        LockAnswerRequest {
            selected: selected.into(),
            consolation_prize: None,
        }
    }

    #[tokio::test]
    async fn initialize_requires_assignment_for_every_queued_team() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;

        let err = initialize_game(
            &state,
            InitializeGameRequest {
                play_queue: vec![team.id],
                question_set_assignments: IndexMap::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        // The failed work aborted the transition.
        assert_eq!(state.game_status().await, GameStatus::NotStarted);
    }

    #[tokio::test]
    async fn start_puts_first_queued_team_at_the_hot_seat() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha", "beta"]).await;

        assert_eq!(state.game_status().await, GameStatus::Active);
        let session = store.session().await.unwrap().unwrap();
        assert_eq!(session.current_team_id, Some(queue[0]));
        assert_eq!(session.current_question_number, 0);

        let first = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(first.status, TeamStatus::Active);
        let second = store.team(queue[1]).await.unwrap().unwrap();
        assert_eq!(second.status, TeamStatus::Waiting);
    }

    #[tokio::test]
    async fn correct_option_stays_hidden_until_lock_then_appears_with_reveal() {
        let (state, store) = test_state().await;
        running_game(&state, &store, &["alpha"]).await;

        load_and_show(&state, 1).await;

        let shown = store.session().await.unwrap().unwrap();
        assert!(shown.question_visible);
        assert_eq!(shown.correct_option, None);
        assert!(!shown.answer_revealed);
        // The published question carries no correct-option field at all.
        let json = serde_json::to_value(shown.current_question.as_ref().unwrap()).unwrap();
        assert!(!json.as_object().unwrap().contains_key("correctOption"));

        lock_answer(&state, lock_request(CORRECT)).await.unwrap();

        let revealed = store.session().await.unwrap().unwrap();
        assert!(revealed.answer_revealed);
        assert_eq!(revealed.correct_option, Some(OptionLabel::A));
    }

    #[tokio::test]
    async fn correct_lock_advances_prize_and_counters() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha", "beta"]).await;

        load_and_show(&state, 1).await;
        let outcome = lock_answer(&state, lock_request(CORRECT)).await.unwrap();

        assert!(outcome.correct);
        assert_eq!(outcome.new_prize, Some(100));
        assert!(!outcome.game_completed);

        let team = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(team.current_prize, 100);
        assert_eq!(team.questions_answered, 1);
        assert_eq!(team.current_question_index, 1);
        assert_eq!(team.status, TeamStatus::Active);
    }

    #[tokio::test]
    async fn wrong_lock_eliminates_without_prize_change() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha", "beta"]).await;
        store
            .patch_team(
                queue[0],
                TeamPatch {
                    current_prize: Some(500),
                    ..TeamPatch::default()
                },
            )
            .await
            .unwrap();

        load_and_show(&state, 1).await;
        let outcome = lock_answer(&state, lock_request(WRONG)).await.unwrap();

        assert!(!outcome.correct);
        let team = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(team.status, TeamStatus::Eliminated);
        assert_eq!(team.current_prize, 500);
        assert_eq!(team.questions_answered, 0);
        assert!(team.eliminated_at.is_some());
        // A second team still waits, so the game continues.
        assert!(!outcome.game_completed);
        assert_eq!(state.game_status().await, GameStatus::Active);
    }

    #[tokio::test]
    async fn wrong_lock_with_consolation_sets_the_consolation_prize() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha", "beta"]).await;

        load_and_show(&state, 1).await;
        lock_answer(
            &state,
            LockAnswerRequest {
                selected: WRONG.into(),
                consolation_prize: Some(1_000),
            },
        )
        .await
        .unwrap();

        let team = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(team.current_prize, 1_000);
    }

    #[tokio::test]
    async fn completing_last_question_completes_team_and_single_team_game() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha"]).await;
        let count = state.config().question_count();

        // Fast-forward to the final question slot.
        store
            .patch_team(
                queue[0],
                TeamPatch {
                    current_question_index: Some(count - 1),
                    questions_answered: Some(count - 1),
                    ..TeamPatch::default()
                },
            )
            .await
            .unwrap();

        load_and_show(&state, count).await;
        let outcome = lock_answer(&state, lock_request(CORRECT)).await.unwrap();

        assert!(outcome.correct);
        assert!(outcome.game_completed);
        assert_eq!(outcome.new_prize, Some(1_000_000));

        let team = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(team.status, TeamStatus::Completed);
        assert_eq!(team.questions_answered, count);
        assert_eq!(team.current_question_index, count);
        assert_eq!(state.game_status().await, GameStatus::Completed);
    }

    #[tokio::test]
    async fn skip_never_touches_the_credit_counter() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha", "beta"]).await;

        load_and_show(&state, 1).await;
        let outcome = skip_question(&state).await.unwrap();

        assert!(!outcome.team_completed);
        let team = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(team.current_question_index, 1);
        assert_eq!(team.questions_answered, 0);
        assert_eq!(team.current_prize, 0);

        // The projection was retracted.
        let session = store.session().await.unwrap().unwrap();
        assert!(!session.question_visible);
        assert_eq!(session.current_question, None);
    }

    #[tokio::test]
    async fn skipping_the_last_question_completes_with_unchanged_prize() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha"]).await;
        let count = state.config().question_count();

        store
            .patch_team(
                queue[0],
                TeamPatch {
                    current_question_index: Some(count - 1),
                    questions_answered: Some(count - 1),
                    current_prize: Some(64_000),
                    ..TeamPatch::default()
                },
            )
            .await
            .unwrap();

        load_and_show(&state, count).await;
        let outcome = skip_question(&state).await.unwrap();

        assert!(outcome.team_completed);
        assert!(outcome.game_completed);
        let team = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(team.status, TeamStatus::Completed);
        assert_eq!(team.current_prize, 64_000);
        assert_eq!(team.questions_answered, count - 1);
    }

    #[tokio::test]
    async fn load_is_rejected_while_a_question_is_unresolved() {
        let (state, store) = test_state().await;
        running_game(&state, &store, &["alpha"]).await;

        load_and_show(&state, 1).await;
        let err = load_question(&state, LoadQuestionRequest { number: 2 })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn loading_the_next_question_clears_the_projection_first() {
        let (state, store) = test_state().await;
        running_game(&state, &store, &["alpha"]).await;

        load_and_show(&state, 1).await;
        lock_answer(&state, lock_request(CORRECT)).await.unwrap();

        load_question(&state, LoadQuestionRequest { number: 2 })
            .await
            .unwrap();

        let session = store.session().await.unwrap().unwrap();
        assert_eq!(session.current_question_number, 2);
        assert_eq!(session.current_question, None);
        assert!(!session.question_visible);
        assert!(!session.answer_revealed);
        assert_eq!(session.correct_option, None);
    }

    #[tokio::test]
    async fn hide_is_rejected_after_reveal() {
        let (state, store) = test_state().await;
        running_game(&state, &store, &["alpha"]).await;

        load_and_show(&state, 1).await;
        lock_answer(&state, lock_request(CORRECT)).await.unwrap();

        let err = hide_question(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn lock_requires_a_visible_question() {
        let (state, store) = test_state().await;
        running_game(&state, &store, &["alpha"]).await;

        load_question(&state, LoadQuestionRequest { number: 1 })
            .await
            .unwrap();
        let err = lock_answer(&state, lock_request(CORRECT)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn advance_hands_the_hot_seat_to_the_next_waiting_team() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha", "beta"]).await;

        load_and_show(&state, 1).await;
        lock_answer(&state, lock_request(WRONG)).await.unwrap();

        let advanced = advance_to_next_team(&state).await.unwrap();
        assert_eq!(advanced.current_team.id, queue[1]);

        let session = store.session().await.unwrap().unwrap();
        assert_eq!(session.current_team_id, Some(queue[1]));
        assert_eq!(session.current_question_number, 0);
        assert_eq!(session.current_question, None);

        // The eliminated team's record was not touched by the advance.
        let previous = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(previous.status, TeamStatus::Eliminated);
    }

    #[tokio::test]
    async fn advance_fails_when_no_waiting_team_remains() {
        let (state, store) = test_state().await;
        running_game(&state, &store, &["alpha"]).await;

        let err = advance_to_next_team(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn eliminating_the_final_slot_team_completes_the_game() {
        let (state, store) = test_state().await;
        let _queue = running_game(&state, &store, &["alpha", "beta"]).await;

        // First team wipes out, host advances.
        load_and_show(&state, 1).await;
        lock_answer(&state, lock_request(WRONG)).await.unwrap();
        advance_to_next_team(&state).await.unwrap();

        // Second (final-slot) team also wipes out.
        load_and_show(&state, 1).await;
        let outcome = lock_answer(&state, lock_request(WRONG)).await.unwrap();

        assert!(outcome.game_completed);
        assert_eq!(state.game_status().await, GameStatus::Completed);
        let session = store.session().await.unwrap().unwrap();
        assert_eq!(session.game_status, GameStatus::Completed);
    }

    #[tokio::test]
    async fn pause_and_resume_round_trip() {
        let (state, store) = test_state().await;
        running_game(&state, &store, &["alpha"]).await;

        pause_game(&state).await.unwrap();
        assert_eq!(state.game_status().await, GameStatus::Paused);
        let session = store.session().await.unwrap().unwrap();
        assert_eq!(session.game_status, GameStatus::Paused);

        resume_game(&state).await.unwrap();
        assert_eq!(state.game_status().await, GameStatus::Active);
    }

    #[tokio::test]
    async fn uninitialize_clears_session_and_optionally_teams() {
        let (state, store) = test_state().await;
        let queue = running_game(&state, &store, &["alpha"]).await;

        load_and_show(&state, 1).await;
        lock_answer(&state, lock_request(CORRECT)).await.unwrap();

        uninitialize(&state, UninitializeRequest { reset_teams: true })
            .await
            .unwrap();

        assert_eq!(state.game_status().await, GameStatus::NotStarted);
        let session = store.session().await.unwrap().unwrap();
        assert_eq!(session.game_status, GameStatus::NotStarted);
        assert!(session.play_queue.is_empty());
        assert_eq!(session.current_team_id, None);

        let team = store.team(queue[0]).await.unwrap().unwrap();
        assert_eq!(team.status, TeamStatus::Waiting);
        assert_eq!(team.current_prize, 0);
        assert_eq!(team.question_set_id, None);
    }

    #[tokio::test]
    async fn resync_reseeds_the_machine_from_the_store() {
        let (state, store) = test_state().await;
        running_game(&state, &store, &["alpha"]).await;

        // Simulate a crashed process: the machine forgot everything.
        state.reseed_status(GameStatus::NotStarted).await;

        let (session, teams) = resync(&state).await.unwrap();
        assert_eq!(session.game_status, GameStatus::Active);
        assert_eq!(state.game_status().await, GameStatus::Active);
        assert_eq!(teams.len(), 1);
    }
}
