mod sse;
pub mod state_machine;
pub mod transitions;
pub mod turn;

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::{game_store::GameStore, models::GameStatus},
    error::ServiceError,
    services::question_service::QuestionCache,
    state::turn::TurnState,
};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::state_machine::{GameEvent, GameStateMachine};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;
/// Upper bound on the store work of a single status transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state: store handle, SSE hubs, the game-status
/// machine, and the host-local per-turn sub-state.
pub struct AppState {
    config: AppConfig,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    public_sse: SseHub,
    host_sse: SseHub,
    host_token: Mutex<Option<String>>,
    game: RwLock<GameStateMachine>,
    turn: Mutex<TurnState>,
    question_cache: QuestionCache,
    degraded: watch::Sender<bool>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let question_cache = QuestionCache::new(config.question_set_ttl());
        Arc::new(Self {
            config,
            game_store: RwLock::new(None),
            public_sse: SseHub::new(16),
            host_sse: SseHub::new(16),
            host_token: Mutex::new(None),
            game: RwLock::new(GameStateMachine::new()),
            turn: Mutex::new(TurnState::default()),
            question_cache,
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current game store or fail with a degraded-mode error.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    /// Broadcast hub used for the host SSE stream.
    pub fn host_sse(&self) -> &SseHub {
        &self.host_sse
    }

    /// Token slot that admits a single host SSE subscriber at a time.
    ///
    /// Holding the token is what makes a caller "the authorized host" as far
    /// as this backend is concerned.
    pub fn host_token(&self) -> &Mutex<Option<String>> {
        &self.host_token
    }

    /// Snapshot the current status of the shared game-status machine.
    pub async fn game_status(&self) -> GameStatus {
        self.game.read().await.status()
    }

    /// Re-seed the status machine from an authoritative store snapshot.
    pub async fn reseed_status(&self, status: GameStatus) {
        let mut sm = self.game.write().await;
        sm.reseed(status);
    }

    /// Host-local per-turn sub-state (loaded question, lifeline flags, countdown).
    pub fn turn(&self) -> &Mutex<TurnState> {
        &self.turn
    }

    /// Process-local question-set cache.
    pub fn question_cache(&self) -> &QuestionCache {
        &self.question_cache
    }

    /// Plan a transition on the shared game-status machine, returning the plan.
    async fn plan_transition(&self, event: GameEvent) -> Result<Plan, PlanError> {
        let mut sm = self.game.write().await;
        sm.plan(event)
    }

    /// Apply the planned transition, returning the next status.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<GameStatus, ApplyError> {
        let mut sm = self.game.write().await;
        sm.apply(plan_id)
    }

    /// Abort a planned transition of the shared game-status machine.
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut sm = self.game.write().await;
        sm.abort(plan_id)
    }

    /// Run a status transition around the given store work.
    ///
    /// The gate serializes transitions; the work future runs between plan and
    /// apply as a strict sequence of awaited store writes, so a failure or
    /// timeout aborts the plan and leaves the status unchanged.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: GameEvent,
        work: F,
    ) -> Result<(T, GameStatus), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}
