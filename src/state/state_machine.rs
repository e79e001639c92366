use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::GameStatus;

/// Indicates why the game transitioned to its completed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The last play-queue slot was resolved.
    QueueExhausted,
    /// The host decided to end the game early.
    ManualStop,
}

/// Events that can be applied to the game-status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Fix the play queue and question-set assignments.
    Initialize,
    /// Begin play with the first queued team.
    Start,
    /// Suspend play.
    Pause,
    /// Resume play after a pause.
    Resume,
    /// End the game, moving to the completed status.
    Finish(FinishReason),
    /// Tear the session down and return to the not-started status.
    Uninitialize,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The status the machine was in when the invalid event was received.
    pub from: GameStatus,
    /// The event that cannot be applied from this status.
    pub event: GameEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current status.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Status changed since the plan was created.
    StatusMismatch {
        /// Status when the plan was created.
        expected: GameStatus,
        /// Current status.
        actual: GameStatus,
    },
    /// Machine version changed since the plan was created.
    VersionMismatch {
        /// Version when the plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned status transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet. Store writes run
/// between planning and applying, so a failed write can abort cleanly.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Status the machine is currently in.
    pub from: GameStatus,
    /// Status the machine will transition to.
    pub to: GameStatus,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current status.
    pub status: GameStatus,
    /// Version number (increments on each applied transition).
    pub version: usize,
    /// Pending target status, if a transition is planned but not yet applied.
    pub pending: Option<GameStatus>,
}

/// State machine enforcing the game-status table:
/// `NOT_STARTED -> INITIALIZED -> ACTIVE <-> PAUSED -> COMPLETED`, with
/// uninitialize returning to `NOT_STARTED` from anywhere.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    status: GameStatus,
    version: usize,
    pending: Option<Plan>,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            status: GameStatus::NotStarted,
            version: 0,
            pending: None,
        }
    }
}

impl GameStateMachine {
    /// Create a new machine in the not-started status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Create a snapshot of the machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Force the machine to a status read back from the store.
    ///
    /// Used when a store is (re)installed and by the host's resync recovery
    /// action; any pending plan is discarded.
    pub fn reseed(&mut self, status: GameStatus) {
        self.status = status;
        self.version += 1;
        self.pending = None;
    }

    /// Plan a transition by validating that the event can be applied from the
    /// current status. Returns a plan that can later be applied or aborted.
    pub fn plan(&mut self, event: GameEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.status,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the machine to the next status.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<GameStatus, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.status != plan.from {
            return Err(ApplyError::StatusMismatch {
                expected: plan.from,
                actual: self.status,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.status = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.status)
    }

    /// Abort a planned transition without applying it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GameStatus, InvalidTransition> {
        let next = match (self.status, event) {
            (GameStatus::NotStarted, GameEvent::Initialize) => GameStatus::Initialized,
            (GameStatus::Initialized, GameEvent::Start) => GameStatus::Active,
            (GameStatus::Active, GameEvent::Pause) => GameStatus::Paused,
            (GameStatus::Paused, GameEvent::Resume) => GameStatus::Active,
            (GameStatus::Active | GameStatus::Paused, GameEvent::Finish(..)) => {
                GameStatus::Completed
            }
            (_, GameEvent::Uninitialize) => GameStatus::NotStarted,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut GameStateMachine, event: GameEvent) -> GameStatus {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_status_is_not_started() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.status(), GameStatus::NotStarted);
    }

    #[test]
    fn full_happy_path_through_game() {
        let mut sm = GameStateMachine::new();

        assert_eq!(apply(&mut sm, GameEvent::Initialize), GameStatus::Initialized);
        assert_eq!(apply(&mut sm, GameEvent::Start), GameStatus::Active);
        assert_eq!(apply(&mut sm, GameEvent::Pause), GameStatus::Paused);
        assert_eq!(apply(&mut sm, GameEvent::Resume), GameStatus::Active);
        assert_eq!(
            apply(&mut sm, GameEvent::Finish(FinishReason::QueueExhausted)),
            GameStatus::Completed
        );
        assert_eq!(apply(&mut sm, GameEvent::Uninitialize), GameStatus::NotStarted);
    }

    #[test]
    fn finish_is_legal_while_paused() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::Initialize);
        apply(&mut sm, GameEvent::Start);
        apply(&mut sm, GameEvent::Pause);
        assert_eq!(
            apply(&mut sm, GameEvent::Finish(FinishReason::ManualStop)),
            GameStatus::Completed
        );
    }

    #[test]
    fn uninitialize_is_legal_from_every_status() {
        for (events, label) in [
            (vec![], "not started"),
            (vec![GameEvent::Initialize], "initialized"),
            (vec![GameEvent::Initialize, GameEvent::Start], "active"),
            (
                vec![GameEvent::Initialize, GameEvent::Start, GameEvent::Pause],
                "paused",
            ),
            (
                vec![
                    GameEvent::Initialize,
                    GameEvent::Start,
                    GameEvent::Finish(FinishReason::ManualStop),
                ],
                "completed",
            ),
        ] {
            let mut sm = GameStateMachine::new();
            for event in events {
                apply(&mut sm, event);
            }
            assert_eq!(
                apply(&mut sm, GameEvent::Uninitialize),
                GameStatus::NotStarted,
                "uninitialize from {label}"
            );
        }
    }

    #[test]
    fn invalid_transition_returns_error_and_leaves_status() {
        let mut sm = GameStateMachine::new();
        let err = sm.plan(GameEvent::Start).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, GameStatus::NotStarted);
                assert_eq!(invalid.event, GameEvent::Start);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sm.status(), GameStatus::NotStarted);
    }

    #[test]
    fn pause_requires_active() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::Initialize);
        let err = sm.plan(GameEvent::Pause).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition(_)));
    }

    #[test]
    fn plan_while_pending_is_rejected() {
        let mut sm = GameStateMachine::new();
        let _plan = sm.plan(GameEvent::Initialize).unwrap();
        assert_eq!(
            sm.plan(GameEvent::Initialize).unwrap_err(),
            PlanError::AlreadyPending
        );
        let snapshot = sm.snapshot();
        assert_eq!(snapshot.status, GameStatus::NotStarted);
        assert_eq!(snapshot.pending, Some(GameStatus::Initialized));
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::Initialize).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
        assert_eq!(sm.status(), GameStatus::NotStarted);
    }

    #[test]
    fn reseed_discards_pending_plan() {
        let mut sm = GameStateMachine::new();
        let _plan = sm.plan(GameEvent::Initialize).unwrap();
        sm.reseed(GameStatus::Active);
        assert_eq!(sm.status(), GameStatus::Active);
        assert!(sm.plan(GameEvent::Pause).is_ok());
    }
}
