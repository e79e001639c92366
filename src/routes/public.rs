//! Read-only routes consumed by the public display.

use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        game::PrizeLadderView,
        public::{PublicSessionResponse, TeamsResponse},
    },
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Configure the public route subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/public/session", get(public_session))
        .route("/public/teams", get(public_teams))
        .route("/public/prizes", get(public_prizes))
}

#[utoipa::path(
    get,
    path = "/public/session",
    tag = "public",
    responses((status = 200, description = "Public session snapshot", body = PublicSessionResponse))
)]
/// Current session as the public display renders it.
pub async fn public_session(
    State(state): State<SharedState>,
) -> Result<Json<PublicSessionResponse>, AppError> {
    let response = public_service::public_session(&state).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/public/teams",
    tag = "public",
    responses((status = 200, description = "Every team", body = TeamsResponse))
)]
/// Every team, for public scoreboards.
pub async fn public_teams(
    State(state): State<SharedState>,
) -> Result<Json<TeamsResponse>, AppError> {
    let response = public_service::public_teams(&state).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/public/prizes",
    tag = "public",
    responses((status = 200, description = "The prize ladder", body = PrizeLadderView))
)]
/// The prize ladder.
pub async fn public_prizes(
    State(state): State<SharedState>,
) -> Result<Json<PrizeLadderView>, AppError> {
    let response = public_service::prize_ladder(&state).await?;
    Ok(Json(response))
}
