use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::game::{SessionView, TeamView};

/// Response payload listing every team for public scoreboards.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsResponse {
    pub teams: Vec<TeamView>,
}

/// Snapshot of the session as the public display renders it.
///
/// Built exclusively from the session record's public-safe fields; the
/// correct option appears only once `answer_revealed` is true.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicSessionResponse {
    pub session: SessionView,
    /// True when the backend operates without a storage connection.
    pub degraded: bool,
}
