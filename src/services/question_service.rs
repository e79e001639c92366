//! Question-set cache and the host/public projection split.
//!
//! Sets are cached per id with a load timestamp; past the freshness TTL a
//! cached copy counts as a miss and is refetched before use, bounding how
//! long two independently-refreshing observers can disagree about set
//! contents.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{PublicQuestionEntity, QuestionEntity, QuestionSetEntity},
    },
    dto::{
        game::CacheInfoView,
        host::{UpsertQuestionSetRequest, UpsertQuestionSetResponse},
    },
    error::ServiceError,
    state::SharedState,
};

/// Freshness report for one cached set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    /// Seconds since the cached copy was fetched.
    pub age_seconds: u64,
    /// Whether the copy has outlived the TTL and must be refetched.
    pub is_stale: bool,
}

struct CacheEntry {
    set: Arc<QuestionSetEntity>,
    loaded_at: Instant,
}

/// Process-local cache of question sets keyed by set id.
pub struct QuestionCache {
    entries: DashMap<Uuid, CacheEntry>,
    ttl: Duration,
}

impl QuestionCache {
    /// Build an empty cache with the given freshness TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return the cached copy of a set, or fetch it from the store.
    ///
    /// A cached copy is served only while younger than the TTL and when
    /// `force_fresh` is false; otherwise the set is refetched and the cache
    /// entry replaced. Fails with `NotFound` when the set does not exist
    /// upstream.
    pub async fn load(
        &self,
        store: &Arc<dyn GameStore>,
        set_id: Uuid,
        force_fresh: bool,
    ) -> Result<Arc<QuestionSetEntity>, ServiceError> {
        if !force_fresh
            && let Some(cached) = self.fresh(set_id)
        {
            return Ok(cached);
        }

        let set = store
            .question_set(set_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("question set `{set_id}` not found")))?;

        let set = Arc::new(set);
        self.entries.insert(
            set_id,
            CacheEntry {
                set: set.clone(),
                loaded_at: Instant::now(),
            },
        );

        Ok(set)
    }

    /// The cached copy of a set, provided it is younger than the TTL.
    pub fn fresh(&self, set_id: Uuid) -> Option<Arc<QuestionSetEntity>> {
        let entry = self.entries.get(&set_id)?;
        if entry.loaded_at.elapsed() < self.ttl {
            Some(entry.set.clone())
        } else {
            None
        }
    }

    /// Bounds-checked access to one question of a freshly cached set.
    ///
    /// `None` covers both out-of-range and not-cached: "no such question" is
    /// a normal control-flow outcome for last-question checks, not an error.
    pub fn get_question(&self, set_id: Uuid, index: u32) -> Option<QuestionEntity> {
        let set = self.fresh(set_id)?;
        set.questions.get(index as usize).cloned()
    }

    /// Age and staleness of a cached set, or `None` when never loaded.
    pub fn cache_info(&self, set_id: Uuid) -> Option<CacheInfo> {
        let entry = self.entries.get(&set_id)?;
        let age = entry.loaded_at.elapsed();
        Some(CacheInfo {
            age_seconds: age.as_secs(),
            is_stale: age >= self.ttl,
        })
    }

    /// Drop one cached set so the next load refetches.
    pub fn invalidate(&self, set_id: Uuid) {
        self.entries.remove(&set_id);
    }

    /// Drop every cached set.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Create or replace a question set; a thin wrapper over the store that also
/// drops any cached copy so the next load sees the new contents.
pub async fn upsert_question_set(
    state: &SharedState,
    request: UpsertQuestionSetRequest,
) -> Result<UpsertQuestionSetResponse, ServiceError> {
    let store = state.require_game_store().await?;

    let id = request.id.unwrap_or_else(Uuid::new_v4);
    let questions: Vec<QuestionEntity> = request
        .questions
        .into_iter()
        .map(|question| QuestionEntity {
            text: question.text,
            options: question.options,
            correct_option: question.correct_option,
        })
        .collect();
    let question_count = questions.len();

    store
        .put_question_set(QuestionSetEntity {
            id,
            name: request.name,
            questions,
        })
        .await?;
    state.question_cache().invalidate(id);

    Ok(UpsertQuestionSetResponse { id, question_count })
}

/// Freshness report for one cached set, for the host's diagnostics view.
pub async fn set_cache_info(
    state: &SharedState,
    set_id: Uuid,
) -> Result<CacheInfoView, ServiceError> {
    state
        .question_cache()
        .cache_info(set_id)
        .map(|info| CacheInfoView {
            set_id,
            age_seconds: info.age_seconds,
            is_stale: info.is_stale,
        })
        .ok_or_else(|| ServiceError::NotFound(format!("question set `{set_id}` is not cached")))
}

/// Strip the correct option from a question for the public display.
///
/// The public projection never carries the correct-option field in any form;
/// the host view is simply the unmodified [`QuestionEntity`].
pub fn to_public_view(number: u32, question: &QuestionEntity) -> PublicQuestionEntity {
    PublicQuestionEntity {
        number,
        text: question.text.clone(),
        options: question.options.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        game_store::memory::MemoryGameStore,
        models::{OptionLabel, QuestionOptionEntity},
    };

    const TTL: Duration = Duration::from_secs(300);

    fn sample_set() -> QuestionSetEntity {
        QuestionSetEntity {
            id: Uuid::new_v4(),
            name: "warmup".into(),
            questions: vec![QuestionEntity {
                text: "What is the largest ocean?".into(),
                options: OptionLabel::ALL
                    .iter()
                    .map(|label| QuestionOptionEntity {
                        label: *label,
                        text: format!("ocean {label}"),
                    })
                    .collect(),
                correct_option: OptionLabel::B,
            }],
        }
    }

    async fn store_with(set: &QuestionSetEntity) -> Arc<dyn GameStore> {
        let store = MemoryGameStore::new();
        store.put_question_set(set.clone()).await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn load_caches_and_serves_until_ttl() {
        let set = sample_set();
        let store = store_with(&set).await;
        let cache = QuestionCache::new(TTL);

        let loaded = cache.load(&store, set.id, false).await.unwrap();
        assert_eq!(loaded.name, "warmup");
        assert!(cache.fresh(set.id).is_some());
        let info = cache.cache_info(set.id).unwrap();
        assert!(!info.is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_counts_as_miss_and_is_refetched() {
        let mut set = sample_set();
        let store_impl = MemoryGameStore::new();
        store_impl.put_question_set(set.clone()).await.unwrap();
        let store: Arc<dyn GameStore> = Arc::new(store_impl.clone());
        let cache = QuestionCache::new(TTL);

        cache.load(&store, set.id, false).await.unwrap();

        // Upstream changes while the cached copy ages past the TTL.
        set.name = "revised".into();
        store_impl.put_question_set(set.clone()).await.unwrap();
        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        assert!(cache.fresh(set.id).is_none());
        assert!(cache.cache_info(set.id).unwrap().is_stale);
        assert!(cache.get_question(set.id, 0).is_none());

        let reloaded = cache.load(&store, set.id, false).await.unwrap();
        assert_eq!(reloaded.name, "revised");
        assert!(!cache.cache_info(set.id).unwrap().is_stale);
    }

    #[tokio::test]
    async fn force_fresh_bypasses_a_fresh_cache_entry() {
        let mut set = sample_set();
        let store_impl = MemoryGameStore::new();
        store_impl.put_question_set(set.clone()).await.unwrap();
        let store: Arc<dyn GameStore> = Arc::new(store_impl.clone());
        let cache = QuestionCache::new(TTL);

        cache.load(&store, set.id, false).await.unwrap();
        set.name = "revised".into();
        store_impl.put_question_set(set.clone()).await.unwrap();

        let reloaded = cache.load(&store, set.id, true).await.unwrap();
        assert_eq!(reloaded.name, "revised");
    }

    #[tokio::test]
    async fn unknown_set_is_not_found() {
        let store: Arc<dyn GameStore> = Arc::new(MemoryGameStore::new());
        let cache = QuestionCache::new(TTL);
        let err = cache.load(&store, Uuid::new_v4(), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_question_is_bounds_checked() {
        let set = sample_set();
        let store = store_with(&set).await;
        let cache = QuestionCache::new(TTL);
        cache.load(&store, set.id, false).await.unwrap();

        assert!(cache.get_question(set.id, 0).is_some());
        assert!(cache.get_question(set.id, 1).is_none());
    }

    #[test]
    fn public_view_never_contains_the_correct_option() {
        let set = sample_set();
        let question = &set.questions[0];
        let public = to_public_view(7, question);

        assert_eq!(public.number, 7);
        assert_eq!(public.options.len(), 4);

        let json = serde_json::to_value(&public).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("correctOption"));
        assert!(!serde_json::to_string(&public).unwrap().contains("correctOption"));
    }
}
