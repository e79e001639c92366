//! Team registry: owns every team's lifecycle, prize, lifeline availability
//! and question position.
//!
//! Every mutation re-reads the authoritative team record through the gateway
//! immediately before computing its patch; the local caches and SSE mirrors
//! are never trusted for decisions.

use std::{sync::Arc, time::SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{LifelineKind, LifelinesEntity, TeamEntity, TeamPatch, TeamStatus},
    },
    dto::{
        game::TeamView,
        host::{CreateTeamRequest, UpdateTeamRequest},
    },
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Create a team in the waiting state with both lifelines available.
pub async fn create_team(
    state: &SharedState,
    request: CreateTeamRequest,
) -> Result<TeamView, ServiceError> {
    let store = state.require_game_store().await?;

    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "team name must not be empty".into(),
        ));
    }

    let team = TeamEntity::new(name, request.members);
    store.insert_team(team.clone()).await?;

    let view: TeamView = team.into();
    sse_events::broadcast_team_created(state, view.clone());
    Ok(view)
}

/// Apply a partial host-side update to a team.
///
/// A requested status change must be legal per the team state machine,
/// otherwise the whole update is rejected with no partial apply.
pub async fn update_team(
    state: &SharedState,
    id: Uuid,
    request: UpdateTeamRequest,
) -> Result<TeamView, ServiceError> {
    let store = state.require_game_store().await?;
    let current = fetch_team(&store, id).await?;

    let mut patch = TeamPatch::default();

    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput(
                "team name must not be empty".into(),
            ));
        }
        patch.name = Some(name);
    }
    if let Some(members) = request.members {
        patch.members = Some(members);
    }

    if let Some(next) = request.status
        && next != current.status
    {
        if !current.status.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "team `{id}` cannot move from {:?} to {next:?}",
                current.status
            )));
        }
        if current.status == TeamStatus::Active && next == TeamStatus::Waiting {
            warn!(team_id = %id, "host override: returning an active team to the waiting state");
        }
        patch.status = Some(next);
    }

    let updated = apply_patch(&store, id, patch).await?;
    Ok(updated.into())
}

/// Move a waiting team into the hot seat.
pub(crate) async fn activate(
    store: &Arc<dyn GameStore>,
    id: Uuid,
) -> Result<TeamEntity, ServiceError> {
    let team = fetch_team(store, id).await?;
    ensure_transition(&team, TeamStatus::Active)?;
    apply_patch(
        store,
        id,
        TeamPatch {
            status: Some(TeamStatus::Active),
            ..TeamPatch::default()
        },
    )
    .await
}

/// Record a correct answer: advance the position and credit counters
/// together and secure the new prize.
pub(crate) async fn advance_on_correct_answer(
    store: &Arc<dyn GameStore>,
    id: Uuid,
    new_prize: u64,
) -> Result<TeamEntity, ServiceError> {
    let team = fetch_active_team(store, id).await?;
    apply_patch(
        store,
        id,
        TeamPatch {
            current_question_index: Some(team.current_question_index + 1),
            questions_answered: Some(team.questions_answered + 1),
            current_prize: Some(new_prize),
            ..TeamPatch::default()
        },
    )
    .await
}

/// Record a skip: the position advances, the credit counter and prize do not.
pub(crate) async fn advance_on_skip(
    store: &Arc<dyn GameStore>,
    id: Uuid,
) -> Result<TeamEntity, ServiceError> {
    let team = fetch_active_team(store, id).await?;
    apply_patch(
        store,
        id,
        TeamPatch {
            current_question_index: Some(team.current_question_index + 1),
            ..TeamPatch::default()
        },
    )
    .await
}

/// Eliminate a team, optionally granting a consolation prize.
///
/// The prize field is omitted from the patch entirely when no consolation
/// applies, so the stored amount stays untouched.
pub(crate) async fn eliminate(
    store: &Arc<dyn GameStore>,
    id: Uuid,
    consolation_prize: Option<u64>,
) -> Result<TeamEntity, ServiceError> {
    let team = fetch_team(store, id).await?;
    ensure_transition(&team, TeamStatus::Eliminated)?;

    let mut patch = TeamPatch {
        status: Some(TeamStatus::Eliminated),
        eliminated_at: Some(Some(SystemTime::now())),
        ..TeamPatch::default()
    };
    if let Some(prize) = consolation_prize {
        patch.current_prize = Some(prize);
    }

    apply_patch(store, id, patch).await
}

/// Complete a team with its final prize, aligning the position counter on
/// the final question number.
///
/// The credit counter is deliberately left alone: it only ever moves through
/// [`advance_on_correct_answer`], so completing via a skip keeps the count
/// of correctly answered questions intact.
pub(crate) async fn complete(
    store: &Arc<dyn GameStore>,
    id: Uuid,
    final_prize: u64,
    final_question_number: u32,
) -> Result<TeamEntity, ServiceError> {
    let team = fetch_team(store, id).await?;
    ensure_transition(&team, TeamStatus::Completed)?;

    apply_patch(
        store,
        id,
        TeamPatch {
            status: Some(TeamStatus::Completed),
            current_prize: Some(final_prize),
            current_question_index: Some(final_question_number),
            completed_at: Some(Some(SystemTime::now())),
            ..TeamPatch::default()
        },
    )
    .await
}

/// Mark one lifeline spent for the rest of the game.
pub(crate) async fn mark_lifeline_spent(
    store: &Arc<dyn GameStore>,
    id: Uuid,
    kind: LifelineKind,
) -> Result<TeamEntity, ServiceError> {
    let team = fetch_active_team(store, id).await?;

    let lifelines = match kind {
        LifelineKind::FiftyFifty => LifelinesEntity {
            fifty_fifty: false,
            ..team.lifelines
        },
        LifelineKind::PhoneAFriend => LifelinesEntity {
            phone_a_friend: false,
            ..team.lifelines
        },
    };

    apply_patch(
        store,
        id,
        TeamPatch {
            lifelines: Some(lifelines),
            ..TeamPatch::default()
        },
    )
    .await
}

/// Return one team to the waiting state, wiping its progress and restoring
/// both lifelines. The only path out of a terminal status.
pub(crate) async fn reset_progress(
    store: &Arc<dyn GameStore>,
    id: Uuid,
) -> Result<TeamEntity, ServiceError> {
    info!(team_id = %id, "resetting team progress");
    apply_patch(store, id, reset_patch()).await
}

/// Reset every team, returning the refreshed collection.
pub async fn reset_all(state: &SharedState) -> Result<Vec<TeamView>, ServiceError> {
    let store = state.require_game_store().await?;
    let teams = store.teams().await?;

    let mut views = Vec::with_capacity(teams.len());
    for team in teams {
        let reset = reset_progress(&store, team.id).await?;
        views.push(reset.into());
    }

    sse_events::broadcast_teams_replaced(state, views.clone());
    Ok(views)
}

/// Delete a team record; thin wrapper guarded by the route layer.
pub async fn delete_team(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    if !store.delete_team(id).await? {
        return Err(ServiceError::NotFound(format!("team `{id}` not found")));
    }
    sse_events::broadcast_team_deleted(state, id);
    Ok(())
}

/// List every team in creation order.
pub async fn list_teams(state: &SharedState) -> Result<Vec<TeamView>, ServiceError> {
    let store = state.require_game_store().await?;
    let teams = store.teams().await?;
    Ok(teams.into_iter().map(Into::into).collect())
}

/// Fetch a fresh team record or fail with `NotFound`.
pub(crate) async fn fetch_team(
    store: &Arc<dyn GameStore>,
    id: Uuid,
) -> Result<TeamEntity, ServiceError> {
    store
        .team(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{id}` not found")))
}

async fn fetch_active_team(
    store: &Arc<dyn GameStore>,
    id: Uuid,
) -> Result<TeamEntity, ServiceError> {
    let team = fetch_team(store, id).await?;
    if team.status != TeamStatus::Active {
        return Err(ServiceError::InvalidTransition(format!(
            "team `{id}` is {:?}, not at the hot seat",
            team.status
        )));
    }
    Ok(team)
}

fn ensure_transition(team: &TeamEntity, next: TeamStatus) -> Result<(), ServiceError> {
    if !team.status.can_transition_to(next) {
        return Err(ServiceError::InvalidTransition(format!(
            "team `{}` cannot move from {:?} to {next:?}",
            team.id, team.status
        )));
    }
    Ok(())
}

fn reset_patch() -> TeamPatch {
    TeamPatch {
        status: Some(TeamStatus::Waiting),
        current_prize: Some(0),
        question_set_id: Some(None),
        current_question_index: Some(0),
        questions_answered: Some(0),
        lifelines: Some(LifelinesEntity::default()),
        eliminated_at: Some(None),
        completed_at: Some(None),
        ..TeamPatch::default()
    }
}

async fn apply_patch(
    store: &Arc<dyn GameStore>,
    id: Uuid,
    patch: TeamPatch,
) -> Result<TeamEntity, ServiceError> {
    store
        .patch_team(id, patch)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{id}` not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{insert_waiting_team, test_state};

    #[tokio::test]
    async fn create_team_defaults() {
        let (state, _store) = test_state().await;
        let view = create_team(
            &state,
            CreateTeamRequest {
                name: "  The Crustaceans ".into(),
                members: vec!["ada".into()],
            },
        )
        .await
        .unwrap();

        assert_eq!(view.name, "The Crustaceans");
        assert_eq!(view.status, TeamStatus::Waiting);
        assert_eq!(view.current_prize, 0);
        assert_eq!(view.current_question_index, 0);
        assert!(view.lifelines_available.fifty_fifty);
        assert!(view.lifelines_available.phone_a_friend);
    }

    #[tokio::test]
    async fn create_team_rejects_blank_name() {
        let (state, _store) = test_state().await;
        let err = create_team(
            &state,
            CreateTeamRequest {
                name: "   ".into(),
                members: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn update_rejects_illegal_status_transition() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;

        let err = update_team(
            &state,
            team.id,
            UpdateTeamRequest {
                name: None,
                members: None,
                status: Some(TeamStatus::Completed),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));

        // The whole update was rejected: nothing was applied.
        let stored = store.team(team.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TeamStatus::Waiting);
    }

    #[tokio::test]
    async fn correct_answer_advances_both_counters_and_prize() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;
        let store = state.require_game_store().await.unwrap();
        activate(&store, team.id).await.unwrap();

        let advanced = advance_on_correct_answer(&store, team.id, 1_000)
            .await
            .unwrap();
        assert_eq!(advanced.current_question_index, 1);
        assert_eq!(advanced.questions_answered, 1);
        assert_eq!(advanced.current_prize, 1_000);
    }

    #[tokio::test]
    async fn skip_advances_position_only() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;
        let store = state.require_game_store().await.unwrap();
        activate(&store, team.id).await.unwrap();
        advance_on_correct_answer(&store, team.id, 500)
            .await
            .unwrap();

        let skipped = advance_on_skip(&store, team.id).await.unwrap();
        assert_eq!(skipped.current_question_index, 2);
        assert_eq!(skipped.questions_answered, 1);
        assert_eq!(skipped.current_prize, 500);
    }

    #[tokio::test]
    async fn eliminate_without_consolation_keeps_prize() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;
        let store = state.require_game_store().await.unwrap();
        activate(&store, team.id).await.unwrap();
        advance_on_correct_answer(&store, team.id, 500)
            .await
            .unwrap();

        let out = eliminate(&store, team.id, None).await.unwrap();
        assert_eq!(out.status, TeamStatus::Eliminated);
        assert_eq!(out.current_prize, 500);
        assert!(out.eliminated_at.is_some());
    }

    #[tokio::test]
    async fn eliminate_with_consolation_overrides_prize() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;
        let store = state.require_game_store().await.unwrap();
        activate(&store, team.id).await.unwrap();
        advance_on_correct_answer(&store, team.id, 500)
            .await
            .unwrap();

        let out = eliminate(&store, team.id, Some(1_000)).await.unwrap();
        assert_eq!(out.current_prize, 1_000);
    }

    #[tokio::test]
    async fn terminal_team_rejects_further_mutation_until_reset() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;
        let store_handle = state.require_game_store().await.unwrap();
        activate(&store_handle, team.id).await.unwrap();
        eliminate(&store_handle, team.id, None).await.unwrap();
        let frozen = store.team(team.id).await.unwrap().unwrap();

        assert!(
            advance_on_correct_answer(&store_handle, team.id, 9_999)
                .await
                .is_err()
        );
        assert!(advance_on_skip(&store_handle, team.id).await.is_err());
        assert!(
            complete(&store_handle, team.id, 9_999, 15).await.is_err()
        );
        assert!(
            update_team(
                &state,
                team.id,
                UpdateTeamRequest {
                    name: None,
                    members: None,
                    status: Some(TeamStatus::Active),
                },
            )
            .await
            .is_err()
        );

        let still = store.team(team.id).await.unwrap().unwrap();
        assert_eq!(still.status, frozen.status);
        assert_eq!(still.current_prize, frozen.current_prize);
        assert_eq!(still.eliminated_at, frozen.eliminated_at);

        // Reset is the one legal way out.
        let reset = reset_progress(&store_handle, team.id).await.unwrap();
        assert_eq!(reset.status, TeamStatus::Waiting);
        assert_eq!(reset.current_prize, 0);
        assert_eq!(reset.eliminated_at, None);
        assert!(reset.lifelines.fifty_fifty);
    }

    #[tokio::test]
    async fn complete_aligns_position_but_not_credit() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;
        let store = state.require_game_store().await.unwrap();
        activate(&store, team.id).await.unwrap();
        advance_on_correct_answer(&store, team.id, 100)
            .await
            .unwrap();

        let done = complete(&store, team.id, 1_000_000, 15).await.unwrap();
        assert_eq!(done.status, TeamStatus::Completed);
        assert_eq!(done.current_question_index, 15);
        assert_eq!(done.questions_answered, 1);
        assert_eq!(done.current_prize, 1_000_000);
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn spending_a_lifeline_leaves_the_other_available() {
        let (state, store) = test_state().await;
        let team = insert_waiting_team(&store, "alpha").await;
        let store = state.require_game_store().await.unwrap();
        activate(&store, team.id).await.unwrap();

        let spent = mark_lifeline_spent(&store, team.id, LifelineKind::FiftyFifty)
            .await
            .unwrap();
        assert!(!spent.lifelines.fifty_fifty);
        assert!(spent.lifelines.phone_a_friend);
    }
}
