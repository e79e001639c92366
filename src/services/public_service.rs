//! Service helpers that expose read-only public projections of the session.
//!
//! Everything here renders purely from the session record's public-safe
//! fields and the team collection; no host-only data is reachable through
//! these paths.

use crate::{
    dto::{
        game::PrizeLadderView,
        public::{PublicSessionResponse, TeamsResponse},
    },
    error::ServiceError,
    state::SharedState,
};

/// Current public session snapshot.
pub async fn public_session(state: &SharedState) -> Result<PublicSessionResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let session = store.session().await?.unwrap_or_default();
    Ok(PublicSessionResponse {
        session: session.into(),
        degraded: state.is_degraded(),
    })
}

/// Every team, for public scoreboards.
pub async fn public_teams(state: &SharedState) -> Result<TeamsResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let teams = store.teams().await?;
    Ok(TeamsResponse {
        teams: teams.into_iter().map(Into::into).collect(),
    })
}

/// The prize ladder, falling back to the configured default when the store
/// has none yet.
pub async fn prize_ladder(state: &SharedState) -> Result<PrizeLadderView, ServiceError> {
    let store = state.require_game_store().await?;
    let ladder = store
        .prize_ladder()
        .await?
        .unwrap_or_else(|| state.config().default_prize_ladder());
    Ok(ladder.into())
}
