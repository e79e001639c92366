pub mod memory;

use futures::future::BoxFuture;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dao::models::{
    PrizeLadderEntity, QuestionSetEntity, SessionEntity, SessionPatch, TeamEntity, TeamPatch,
};
use crate::dao::storage::StorageResult;

/// Change notification emitted by a store backend after a committed write.
///
/// Notifications are delivery hints, not payloads: subscribers re-read the
/// full fresh snapshot of the named collection instead of merging fields, so
/// losing or reordering a notification only delays convergence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// The session singleton changed.
    Session,
    /// One team record changed.
    Team(Uuid),
    /// The whole team collection changed (reset, wipe).
    Teams,
    /// A question set was created or replaced.
    QuestionSet(Uuid),
    /// The prize ladder changed.
    PrizeLadder,
}

/// Abstraction over the replicated store for session, team, question-set and
/// prize-ladder collections.
///
/// This is the only seam through which shared state is read or written.
/// `update`-style methods apply partial patches without clobbering untouched
/// fields; `initialize_game` is the one true multi-path atomic primitive.
pub trait GameStore: Send + Sync {
    /// Current session snapshot, if one was ever written.
    fn session(&self) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Apply a partial update to the session singleton.
    fn patch_session(&self, patch: SessionPatch) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch one team by id.
    fn team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Fetch every team in creation order.
    fn teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Insert a new team record.
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Apply a partial update to one team; `None` when the id is unknown.
    fn patch_team(
        &self,
        id: Uuid,
        patch: TeamPatch,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Remove a team record; `false` when the id is unknown.
    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Fetch one question set by id.
    fn question_set(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<QuestionSetEntity>>>;
    /// Create or replace a question set.
    fn put_question_set(&self, set: QuestionSetEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Current prize ladder, if one was ever written.
    fn prize_ladder(&self) -> BoxFuture<'static, StorageResult<Option<PrizeLadderEntity>>>;
    /// Replace the prize ladder.
    fn put_prize_ladder(&self, ladder: PrizeLadderEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically write the initialized session together with every team's
    /// question-set assignment; observers never see the pair half-applied.
    fn initialize_game(
        &self,
        session: SessionEntity,
        team_patches: Vec<(Uuid, TeamPatch)>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Hard reset: wipe teams and session, restore the given prize ladder.
    /// Question sets persist independently of game sessions.
    fn factory_reset(
        &self,
        default_ladder: PrizeLadderEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Subscribe to committed-write notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
    /// Cheap liveness probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
