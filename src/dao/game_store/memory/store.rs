use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::dao::{
    game_store::{GameStore, StoreChange},
    models::{
        PrizeLadderEntity, QuestionSetEntity, SessionEntity, SessionPatch, TeamEntity, TeamPatch,
    },
    storage::StorageResult,
};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Process-local store keeping every collection behind one lock, with a
/// broadcast channel standing in for the replication change stream.
#[derive(Clone)]
pub struct MemoryGameStore {
    inner: Arc<Inner>,
}

struct Inner {
    data: RwLock<Collections>,
    changes: broadcast::Sender<StoreChange>,
}

#[derive(Default)]
struct Collections {
    session: Option<SessionEntity>,
    teams: IndexMap<Uuid, TeamEntity>,
    question_sets: HashMap<Uuid, QuestionSetEntity>,
    prize_ladder: Option<PrizeLadderEntity>,
}

impl MemoryGameStore {
    /// Build an empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(Collections::default()),
                changes,
            }),
        }
    }

    /// Build a store pre-seeded with a prize ladder, as `main` does on boot.
    pub fn with_prize_ladder(ladder: PrizeLadderEntity) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(Collections {
                    prize_ladder: Some(ladder),
                    ..Collections::default()
                }),
                changes,
            }),
        }
    }

    fn notify(&self, change: StoreChange) {
        // Nobody listening is fine; subscribers re-read snapshots anyway.
        let _ = self.inner.changes.send(change);
    }
}

impl Default for MemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore for MemoryGameStore {
    fn session(&self) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.data.read().await.session.clone()) })
    }

    fn patch_session(&self, patch: SessionPatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            {
                let mut data = store.inner.data.write().await;
                let session = data.session.get_or_insert_with(SessionEntity::default);
                patch.apply_to(session);
            }
            store.notify(StoreChange::Session);
            Ok(())
        })
    }

    fn team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.data.read().await.teams.get(&id).cloned()) })
    }

    fn teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.data.read().await.teams.values().cloned().collect()) })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = team.id;
            store.inner.data.write().await.teams.insert(id, team);
            store.notify(StoreChange::Team(id));
            Ok(())
        })
    }

    fn patch_team(
        &self,
        id: Uuid,
        patch: TeamPatch,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let updated = {
                let mut data = store.inner.data.write().await;
                match data.teams.get_mut(&id) {
                    Some(team) => {
                        patch.apply_to(team);
                        Some(team.clone())
                    }
                    None => None,
                }
            };
            if updated.is_some() {
                store.notify(StoreChange::Team(id));
            }
            Ok(updated)
        })
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let removed = store
                .inner
                .data
                .write()
                .await
                .teams
                .shift_remove(&id)
                .is_some();
            if removed {
                store.notify(StoreChange::Teams);
            }
            Ok(removed)
        })
    }

    fn question_set(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionSetEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.data.read().await.question_sets.get(&id).cloned()) })
    }

    fn put_question_set(&self, set: QuestionSetEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = set.id;
            store.inner.data.write().await.question_sets.insert(id, set);
            store.notify(StoreChange::QuestionSet(id));
            Ok(())
        })
    }

    fn prize_ladder(&self) -> BoxFuture<'static, StorageResult<Option<PrizeLadderEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.data.read().await.prize_ladder.clone()) })
    }

    fn put_prize_ladder(
        &self,
        ladder: PrizeLadderEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.data.write().await.prize_ladder = Some(ladder);
            store.notify(StoreChange::PrizeLadder);
            Ok(())
        })
    }

    fn initialize_game(
        &self,
        session: SessionEntity,
        team_patches: Vec<(Uuid, TeamPatch)>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            {
                let mut data = store.inner.data.write().await;
                // Validate the whole batch before touching anything so the
                // write stays all-or-nothing.
                for (id, _) in &team_patches {
                    if !data.teams.contains_key(id) {
                        return Err(crate::dao::storage::StorageError::conflict(format!(
                            "initialization references unknown team `{id}`"
                        )));
                    }
                }
                data.session = Some(session);
                for (id, patch) in team_patches {
                    if let Some(team) = data.teams.get_mut(&id) {
                        patch.apply_to(team);
                    }
                }
            }
            store.notify(StoreChange::Session);
            store.notify(StoreChange::Teams);
            Ok(())
        })
    }

    fn factory_reset(
        &self,
        default_ladder: PrizeLadderEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            {
                let mut data = store.inner.data.write().await;
                data.teams.clear();
                data.session = Some(SessionEntity::default());
                data.prize_ladder = Some(default_ladder);
                // Question sets persist across resets.
            }
            store.notify(StoreChange::Session);
            store.notify(StoreChange::Teams);
            store.notify(StoreChange::PrizeLadder);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.changes.subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::TeamStatus;

    fn team(name: &str) -> TeamEntity {
        TeamEntity::new(name.into(), vec![])
    }

    #[tokio::test]
    async fn patch_session_creates_singleton_on_first_write() {
        let store = MemoryGameStore::new();
        assert!(store.session().await.unwrap().is_none());

        store
            .patch_session(SessionPatch {
                current_question_number: Some(3),
                ..SessionPatch::default()
            })
            .await
            .unwrap();

        let session = store.session().await.unwrap().unwrap();
        assert_eq!(session.current_question_number, 3);
        assert_eq!(
            session.game_status,
            crate::dao::models::GameStatus::NotStarted
        );
    }

    #[tokio::test]
    async fn patch_team_returns_none_for_unknown_id() {
        let store = MemoryGameStore::new();
        let result = store
            .patch_team(Uuid::new_v4(), TeamPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn initialize_game_applies_session_and_assignments_together() {
        let store = MemoryGameStore::new();
        let alpha = team("alpha");
        let set_id = Uuid::new_v4();
        let alpha_id = alpha.id;
        store.insert_team(alpha).await.unwrap();

        let session = SessionEntity {
            play_queue: vec![alpha_id],
            ..SessionEntity::default()
        };
        store
            .initialize_game(
                session,
                vec![(
                    alpha_id,
                    TeamPatch {
                        question_set_id: Some(Some(set_id)),
                        ..TeamPatch::default()
                    },
                )],
            )
            .await
            .unwrap();

        let stored = store.session().await.unwrap().unwrap();
        assert_eq!(stored.play_queue, vec![alpha_id]);
        let stored_team = store.team(alpha_id).await.unwrap().unwrap();
        assert_eq!(stored_team.question_set_id, Some(set_id));
    }

    #[tokio::test]
    async fn initialize_game_rejects_unknown_team_without_partial_apply() {
        let store = MemoryGameStore::new();
        let session = SessionEntity {
            current_question_number: 9,
            ..SessionEntity::default()
        };

        let err = store
            .initialize_game(session, vec![(Uuid::new_v4(), TeamPatch::default())])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown team"));
        // Nothing was written.
        assert!(store.session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn writes_emit_change_notifications() {
        let store = MemoryGameStore::new();
        let mut changes = store.subscribe();

        let member = team("alpha");
        let id = member.id;
        store.insert_team(member).await.unwrap();
        store
            .patch_session(SessionPatch::default())
            .await
            .unwrap();

        assert_eq!(changes.recv().await.unwrap(), StoreChange::Team(id));
        assert_eq!(changes.recv().await.unwrap(), StoreChange::Session);
    }

    #[tokio::test]
    async fn factory_reset_wipes_teams_but_keeps_question_sets() {
        let store = MemoryGameStore::new();
        let set = QuestionSetEntity {
            id: Uuid::new_v4(),
            name: "pilot".into(),
            questions: vec![],
        };
        let set_id = set.id;
        store.put_question_set(set).await.unwrap();

        let mut member = team("alpha");
        member.status = TeamStatus::Eliminated;
        store.insert_team(member).await.unwrap();

        store
            .factory_reset(PrizeLadderEntity {
                amounts: vec![100, 200],
            })
            .await
            .unwrap();

        assert!(store.teams().await.unwrap().is_empty());
        assert!(store.question_set(set_id).await.unwrap().is_some());
        let session = store.session().await.unwrap().unwrap();
        assert_eq!(
            session.game_status,
            crate::dao::models::GameStatus::NotStarted
        );
        assert_eq!(
            store.prize_ladder().await.unwrap().unwrap().amounts,
            vec![100, 200]
        );
    }
}
