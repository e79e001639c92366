use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::dao::models::QuestionEntity;

/// The question currently loaded for the host, correct answer included.
///
/// Host-local only: this is the one place the correct option lives outside
/// the question-set collection, and it is never written to the session
/// record before the reveal.
#[derive(Debug, Clone)]
pub struct LoadedQuestion {
    /// 1-based number of the question within the current turn.
    pub number: u32,
    /// Full question, including the correct option.
    pub question: QuestionEntity,
}

/// Handle on a running phone-a-friend countdown.
///
/// The ticket ties the spawned expiry task to the activation that created
/// it, so a countdown that already resumed (manually or by expiring) can
/// never fire a second resume.
#[derive(Debug)]
pub struct PhoneCountdown {
    /// Identifier checked by the auto-resume path.
    pub ticket: Uuid,
    /// Spawned expiry task, aborted on manual resume.
    pub task: JoinHandle<()>,
}

/// Per-question sub-state of the current turn.
///
/// Lives in process memory beside the state machine; it is presentation and
/// bookkeeping for the host flow and is deliberately not replicated.
#[derive(Debug, Default)]
pub struct TurnState {
    /// Question loaded for the current slot, if any.
    pub loaded: Option<LoadedQuestion>,
    /// Whether the loaded question was resolved (locked or skipped).
    pub resolved: bool,
    /// Whether a lifeline has been used on the loaded question.
    pub lifeline_used: bool,
    /// Running phone-a-friend countdown, if any.
    pub phone_countdown: Option<PhoneCountdown>,
}

impl TurnState {
    /// Install a freshly loaded question, resetting all per-question flags.
    pub fn load(&mut self, number: u32, question: QuestionEntity) {
        self.cancel_countdown();
        self.loaded = Some(LoadedQuestion { number, question });
        self.resolved = false;
        self.lifeline_used = false;
    }

    /// Drop all per-turn state, e.g. when the active team changes.
    pub fn clear(&mut self) {
        self.cancel_countdown();
        self.loaded = None;
        self.resolved = false;
        self.lifeline_used = false;
    }

    /// Abort a running countdown task, if any, and drop its handle.
    pub fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.phone_countdown.take() {
            countdown.task.abort();
        }
    }
}
