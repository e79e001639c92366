//! Host control-panel routes: team registry, game lifecycle, question flow,
//! lifelines and recovery.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        game::{CacheInfoView, SessionView, TeamView},
        host::{
            ActionResponse, AdvanceTeamResponse, CreateTeamRequest, FiftyFiftyResponse,
            InitializeGameRequest, LoadQuestionRequest, LoadQuestionResponse, LockAnswerRequest,
            LockAnswerResponse, PhoneAFriendResponse, ResyncResponse, SkipQuestionResponse,
            UninitializeRequest, UpdateTeamRequest, UpsertQuestionSetRequest,
            UpsertQuestionSetResponse,
        },
    },
    error::AppError,
    services::{lifeline_service, question_service, session_service, team_service},
    state::SharedState,
};

/// Configure the host route subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/host/teams", post(create_team).get(list_teams))
        .route(
            "/host/teams/{id}",
            axum::routing::patch(update_team).delete(delete_team),
        )
        .route("/host/game/initialize", post(initialize_game))
        .route("/host/game/start", post(start_game))
        .route("/host/game/pause", post(pause_game))
        .route("/host/game/resume", post(resume_game))
        .route("/host/game/stop", post(stop_game))
        .route("/host/game/uninitialize", post(uninitialize_game))
        .route("/host/game/factory-reset", post(factory_reset))
        .route("/host/game/resync", post(resync))
        .route("/host/game/session", get(get_session))
        .route("/host/game/question/load", post(load_question))
        .route("/host/game/question/show", post(show_question))
        .route("/host/game/question/hide", post(hide_question))
        .route("/host/game/question/lock", post(lock_answer))
        .route("/host/game/question/skip", post(skip_question))
        .route("/host/game/advance", post(advance_to_next_team))
        .route("/host/game/lifeline/fifty-fifty", post(fifty_fifty))
        .route("/host/game/lifeline/phone", post(phone_a_friend))
        .route("/host/game/lifeline/phone/resume", post(phone_resume))
        .route("/host/question-sets", put(upsert_question_set))
        .route(
            "/host/question-sets/{id}/cache",
            get(question_set_cache_info),
        )
}

#[utoipa::path(
    post,
    path = "/host/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses((status = 200, description = "Team created", body = TeamView))
)]
/// Create a team in the waiting state.
pub async fn create_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<Json<TeamView>, AppError> {
    let team = team_service::create_team(&state, payload).await?;
    Ok(Json(team))
}

#[utoipa::path(
    get,
    path = "/host/teams",
    tag = "teams",
    responses((status = 200, description = "Every team", body = [TeamView]))
)]
/// List every team in creation order.
pub async fn list_teams(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TeamView>>, AppError> {
    let teams = team_service::list_teams(&state).await?;
    Ok(Json(teams))
}

#[utoipa::path(
    patch,
    path = "/host/teams/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team identifier")),
    request_body = UpdateTeamRequest,
    responses((status = 200, description = "Team updated", body = TeamView))
)]
/// Apply a partial update to one team.
pub async fn update_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateTeamRequest>>,
) -> Result<Json<TeamView>, AppError> {
    let team = team_service::update_team(&state, id, payload).await?;
    Ok(Json(team))
}

#[utoipa::path(
    delete,
    path = "/host/teams/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team identifier")),
    responses((status = 200, description = "Team deleted", body = ActionResponse))
)]
/// Remove a team record.
pub async fn delete_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    team_service::delete_team(&state, id).await?;
    Ok(Json(ActionResponse {
        message: format!("team `{id}` deleted"),
    }))
}

#[utoipa::path(
    post,
    path = "/host/game/initialize",
    tag = "game",
    request_body = InitializeGameRequest,
    responses((status = 200, description = "Session initialized", body = SessionView))
)]
/// Fix the play queue and question-set assignments.
pub async fn initialize_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<InitializeGameRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::initialize_game(&state, payload).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/start",
    tag = "game",
    responses((status = 200, description = "Play started", body = SessionView))
)]
/// Begin play with the first queued team.
pub async fn start_game(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::start_game(&state).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/pause",
    tag = "game",
    responses((status = 200, description = "Play paused", body = SessionView))
)]
/// Suspend play.
pub async fn pause_game(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::pause_game(&state).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/resume",
    tag = "game",
    responses((status = 200, description = "Play resumed", body = SessionView))
)]
/// Resume play after a pause.
pub async fn resume_game(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::resume_game(&state).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/stop",
    tag = "game",
    responses((status = 200, description = "Game ended early", body = SessionView))
)]
/// End the game early.
pub async fn stop_game(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    let session = session_service::stop_game(&state).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/uninitialize",
    tag = "game",
    request_body = UninitializeRequest,
    responses((status = 200, description = "Session torn down", body = SessionView))
)]
/// Soft teardown: clear the session, optionally resetting teams.
pub async fn uninitialize_game(
    State(state): State<SharedState>,
    Json(payload): Json<UninitializeRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::uninitialize(&state, payload).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/factory-reset",
    tag = "game",
    responses((status = 200, description = "All game data wiped", body = SessionView))
)]
/// Hard teardown: wipe teams and session, restore ladder defaults.
pub async fn factory_reset(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::factory_reset(&state).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/resync",
    tag = "game",
    responses((status = 200, description = "State resynchronized from the store", body = ResyncResponse))
)]
/// Recovery action re-reading the authoritative store snapshot.
pub async fn resync(State(state): State<SharedState>) -> Result<Json<ResyncResponse>, AppError> {
    let (session, teams) = session_service::resync(&state).await?;
    Ok(Json(ResyncResponse { session, teams }))
}

#[utoipa::path(
    get,
    path = "/host/game/session",
    tag = "game",
    responses((status = 200, description = "Fresh session snapshot", body = SessionView))
)]
/// Fresh session snapshot for the host panel.
pub async fn get_session(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::get_session(&state).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/question/load",
    tag = "questions",
    request_body = LoadQuestionRequest,
    responses((status = 200, description = "Question loaded into the host view", body = LoadQuestionResponse))
)]
/// Load a question of the current team's set into the host view.
pub async fn load_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoadQuestionRequest>>,
) -> Result<Json<LoadQuestionResponse>, AppError> {
    let response = session_service::load_question(&state, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/host/game/question/show",
    tag = "questions",
    responses((status = 200, description = "Question published to the public display", body = SessionView))
)]
/// Publish the answer-stripped question.
pub async fn show_question(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::show_question(&state).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/question/hide",
    tag = "questions",
    responses((status = 200, description = "Question retracted from the public display", body = SessionView))
)]
/// Retract the question; only legal before the reveal.
pub async fn hide_question(
    State(state): State<SharedState>,
) -> Result<Json<SessionView>, AppError> {
    let session = session_service::hide_question(&state).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/host/game/question/lock",
    tag = "questions",
    request_body = LockAnswerRequest,
    responses((status = 200, description = "Answer locked and resolved", body = LockAnswerResponse))
)]
/// Lock the team's answer: validate, reveal, and resolve.
pub async fn lock_answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LockAnswerRequest>>,
) -> Result<Json<LockAnswerResponse>, AppError> {
    let response = session_service::lock_answer(&state, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/host/game/question/skip",
    tag = "questions",
    responses((status = 200, description = "Question skipped", body = SkipQuestionResponse))
)]
/// Skip the current question without awarding credit.
pub async fn skip_question(
    State(state): State<SharedState>,
) -> Result<Json<SkipQuestionResponse>, AppError> {
    let response = session_service::skip_question(&state).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/host/game/advance",
    tag = "game",
    responses((status = 200, description = "Next team at the hot seat", body = AdvanceTeamResponse))
)]
/// Hand the hot seat to the next waiting team.
pub async fn advance_to_next_team(
    State(state): State<SharedState>,
) -> Result<Json<AdvanceTeamResponse>, AppError> {
    let response = session_service::advance_to_next_team(&state).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/host/game/lifeline/fifty-fifty",
    tag = "lifelines",
    responses((status = 200, description = "Two options hidden", body = FiftyFiftyResponse))
)]
/// Apply the 50/50 lifeline.
pub async fn fifty_fifty(
    State(state): State<SharedState>,
) -> Result<Json<FiftyFiftyResponse>, AppError> {
    let response = lifeline_service::activate_fifty_fifty(&state).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/host/game/lifeline/phone",
    tag = "lifelines",
    responses((status = 200, description = "Countdown started", body = PhoneAFriendResponse))
)]
/// Activate phone-a-friend and start the countdown.
pub async fn phone_a_friend(
    State(state): State<SharedState>,
) -> Result<Json<PhoneAFriendResponse>, AppError> {
    let response = lifeline_service::activate_phone_a_friend(&state).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/host/game/lifeline/phone/resume",
    tag = "lifelines",
    responses((status = 200, description = "Play resumed after the call", body = ActionResponse))
)]
/// Resume after a phone call; safe to call twice.
pub async fn phone_resume(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    lifeline_service::resume_phone_a_friend(&state, None).await?;
    Ok(Json(ActionResponse {
        message: "phone-a-friend resumed".into(),
    }))
}

#[utoipa::path(
    put,
    path = "/host/question-sets",
    tag = "questions",
    request_body = UpsertQuestionSetRequest,
    responses((status = 200, description = "Question set stored", body = UpsertQuestionSetResponse))
)]
/// Create or replace a question set.
pub async fn upsert_question_set(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpsertQuestionSetRequest>>,
) -> Result<Json<UpsertQuestionSetResponse>, AppError> {
    let response = question_service::upsert_question_set(&state, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/host/question-sets/{id}/cache",
    tag = "questions",
    params(("id" = Uuid, Path, description = "Question set identifier")),
    responses((status = 200, description = "Cache freshness report", body = CacheInfoView))
)]
/// Freshness report of one cached question set.
pub async fn question_set_cache_info(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CacheInfoView>, AppError> {
    let info = question_service::set_cache_info(&state, id).await?;
    Ok(Json(info))
}
