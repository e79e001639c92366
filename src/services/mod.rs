/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Lifeline engine (50/50 and phone-a-friend flows).
pub mod lifeline_service;
/// Public service for read-only game information.
pub mod public_service;
/// Question-set cache and host/public projections.
pub mod question_service;
/// Game session controller driving the question flow.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
/// Store change-stream listener keeping observers converged.
pub mod store_sync;
/// Team registry owning team lifecycles.
pub mod team_service;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for service-level tests, all backed by the in-memory
    //! store.

    use std::sync::Arc;

    use indexmap::IndexMap;
    use uuid::Uuid;

    use crate::{
        config::AppConfig,
        dao::{
            game_store::{GameStore, memory::MemoryGameStore},
            models::{
                OptionLabel, QuestionEntity, QuestionOptionEntity, QuestionSetEntity, TeamEntity,
            },
        },
        dto::host::{InitializeGameRequest, LoadQuestionRequest},
        services::session_service,
        state::{AppState, SharedState},
    };

    /// Fresh app state with an installed in-memory store seeded with the
    /// default prize ladder.
    pub async fn test_state() -> (SharedState, MemoryGameStore) {
        let config = AppConfig::default();
        let store = MemoryGameStore::with_prize_ladder(config.default_prize_ladder());
        let state = AppState::new(config);
        state.set_game_store(Arc::new(store.clone())).await;
        (state, store)
    }

    /// Insert a waiting team straight into the store.
    pub async fn insert_waiting_team(store: &MemoryGameStore, name: &str) -> TeamEntity {
        let team = TeamEntity::new(name.into(), vec![]);
        store.insert_team(team.clone()).await.unwrap();
        team
    }

    /// Seed a question set with `count` questions; option A is always the
    /// correct answer so tests can lock deterministically.
    pub async fn seed_question_set(store: &MemoryGameStore, count: usize) -> QuestionSetEntity {
        let questions = (0..count)
            .map(|index| QuestionEntity {
                text: format!("question {}", index + 1),
                options: OptionLabel::ALL
                    .iter()
                    .map(|label| QuestionOptionEntity {
                        label: *label,
                        text: format!("answer {label} to {}", index + 1),
                    })
                    .collect(),
                correct_option: OptionLabel::A,
            })
            .collect();

        let set = QuestionSetEntity {
            id: Uuid::new_v4(),
            name: "fixture".into(),
            questions,
        };
        store.put_question_set(set.clone()).await.unwrap();
        set
    }

    /// Initialize and start a game with the given team names, one seeded set
    /// per team. Returns the play queue.
    pub async fn running_game(
        state: &SharedState,
        store: &MemoryGameStore,
        names: &[&str],
    ) -> Vec<Uuid> {
        let count = state.config().question_count() as usize;
        let mut queue = Vec::new();
        let mut assignments = IndexMap::new();
        for name in names {
            let team = insert_waiting_team(store, name).await;
            let set = seed_question_set(store, count).await;
            assignments.insert(team.id, set.id);
            queue.push(team.id);
        }

        session_service::initialize_game(
            state,
            InitializeGameRequest {
                play_queue: queue.clone(),
                question_set_assignments: assignments,
            },
        )
        .await
        .unwrap();
        session_service::start_game(state).await.unwrap();
        queue
    }

    /// Load question `number` for the current team and publish it.
    pub async fn load_and_show(state: &SharedState, number: u32) {
        session_service::load_question(state, LoadQuestionRequest { number })
            .await
            .unwrap();
        session_service::show_question(state).await.unwrap();
    }
}
