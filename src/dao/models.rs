use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

/// Label of one of the four answer options of a question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum OptionLabel {
    /// First option.
    A,
    /// Second option.
    B,
    /// Third option.
    C,
    /// Fourth option.
    D,
}

impl OptionLabel {
    /// Every label in display order.
    pub const ALL: [OptionLabel; 4] = [
        OptionLabel::A,
        OptionLabel::B,
        OptionLabel::C,
        OptionLabel::D,
    ];

    /// Letter used on the wire and in host input.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl std::fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a competing team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamStatus {
    /// In the play queue, has not played yet.
    Waiting,
    /// Currently at the hot seat.
    Active,
    /// Locked a wrong answer; out of the game.
    Eliminated,
    /// Finished their question set.
    Completed,
}

impl TeamStatus {
    /// Whether this status is terminal (no further mutation except a full reset).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TeamStatus::Eliminated | TeamStatus::Completed)
    }

    /// Whether a direct transition to `next` is allowed.
    ///
    /// `ACTIVE -> WAITING` is allowed as a host override and is logged by the
    /// caller; terminal statuses only leave via a progress reset, which does
    /// not go through this check.
    pub fn can_transition_to(&self, next: TeamStatus) -> bool {
        matches!(
            (self, next),
            (TeamStatus::Waiting, TeamStatus::Active)
                | (TeamStatus::Active, TeamStatus::Eliminated)
                | (TeamStatus::Active, TeamStatus::Completed)
                | (TeamStatus::Active, TeamStatus::Waiting)
        )
    }
}

/// Global status of the game session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// No session has been initialized.
    NotStarted,
    /// Play queue and assignments are fixed, play has not begun.
    Initialized,
    /// A team is playing.
    Active,
    /// Play is suspended by the host.
    Paused,
    /// Every queue slot has been resolved.
    Completed,
}

/// One-time-per-game aids a team can spend before locking an answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum LifelineKind {
    /// Hide two incorrect options.
    FiftyFifty,
    /// Pause for a phone call, bounded by a countdown.
    PhoneAFriend,
}

/// Per-team availability of each lifeline. Spent flags are global for the
/// whole game, not per question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifelinesEntity {
    /// Phone-a-friend still unspent.
    pub phone_a_friend: bool,
    /// 50/50 still unspent.
    pub fifty_fifty: bool,
}

impl Default for LifelinesEntity {
    fn default() -> Self {
        Self {
            phone_a_friend: true,
            fifty_fifty: true,
        }
    }
}

/// One labeled answer option of a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOptionEntity {
    /// Label shown to players (A-D).
    pub label: OptionLabel,
    /// Option text.
    pub text: String,
}

/// A question as stored in a question set, correct answer included.
///
/// This shape must never be written to any collection the public projection
/// reads from; see [`PublicQuestionEntity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntity {
    /// Question text.
    pub text: String,
    /// The four labeled options.
    pub options: Vec<QuestionOptionEntity>,
    /// Label of the correct option.
    pub correct_option: OptionLabel,
}

/// Immutable-during-play bundle of questions assigned to one team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSetEntity {
    /// Stable identifier of the set.
    pub id: Uuid,
    /// Human readable set name.
    pub name: String,
    /// Ordered questions of the set.
    pub questions: Vec<QuestionEntity>,
}

/// Answer-stripped projection of a question, safe for the public display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestionEntity {
    /// 1-based number of the question within the current turn.
    pub number: u32,
    /// Question text.
    pub text: String,
    /// The four labeled options, without the correct label.
    pub options: Vec<QuestionOptionEntity>,
}

/// Ordered prize amounts; index `i` is the amount for question `i + 1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrizeLadderEntity {
    /// Prize amounts from the first rung upwards.
    pub amounts: Vec<u64>,
}

/// A competing team as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntity {
    /// Stable identifier assigned on creation.
    pub id: Uuid,
    /// Display name of the team.
    pub name: String,
    /// Free-text roster; carried but not interpreted.
    #[serde(default)]
    pub members: Vec<String>,
    /// Lifecycle status.
    pub status: TeamStatus,
    /// Prize secured so far; non-decreasing while the team is active.
    pub current_prize: u64,
    /// Question bank assigned for the whole session, set at initialization.
    pub question_set_id: Option<Uuid>,
    /// 0-based position in the assigned set; advances on answers and skips.
    pub current_question_index: u32,
    /// Count of questions answered correctly; never advanced by skips.
    pub questions_answered: u32,
    /// Remaining lifelines.
    #[serde(rename = "lifelinesAvailable")]
    pub lifelines: LifelinesEntity,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Set once when the team is eliminated.
    pub eliminated_at: Option<SystemTime>,
    /// Set once when the team completes its set.
    pub completed_at: Option<SystemTime>,
}

impl TeamEntity {
    /// Build a fresh team in the waiting state with both lifelines available.
    pub fn new(name: String, members: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            members,
            status: TeamStatus::Waiting,
            current_prize: 0,
            question_set_id: None,
            current_question_index: 0,
            questions_answered: 0,
            lifelines: LifelinesEntity::default(),
            created_at: SystemTime::now(),
            eliminated_at: None,
            completed_at: None,
        }
    }
}

/// The singleton game session record shared with the public display.
///
/// Every field here is safe for public consumers by construction:
/// `current_question` is answer-stripped and `correct_option` is only
/// populated together with `answer_revealed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntity {
    /// Global game status.
    pub game_status: GameStatus,
    /// Team at the hot seat; `None` only before initialization or after completion.
    pub current_team_id: Option<Uuid>,
    /// 1-based count of questions presented in the current turn; 0 between turns.
    pub current_question_number: u32,
    /// Fixed turn order of team ids.
    pub play_queue: Vec<Uuid>,
    /// Team id to question-set id, fixed at initialization.
    pub question_set_assignments: IndexMap<Uuid, Uuid>,
    /// The question currently published to the public display, if any.
    pub current_question: Option<PublicQuestionEntity>,
    /// Whether the public display currently shows the question.
    pub question_visible: bool,
    /// Option labels currently shown; shrinks to two after a 50/50.
    pub options_visible: Vec<OptionLabel>,
    /// Whether the correct option has been revealed for the current question.
    pub answer_revealed: bool,
    /// Correct option label, populated only at reveal time.
    pub correct_option: Option<OptionLabel>,
    /// Lifeline currently in use, if any.
    pub active_lifeline: Option<LifelineKind>,
    /// Set when the session is initialized.
    pub initialized_at: Option<SystemTime>,
    /// Set when play starts.
    pub started_at: Option<SystemTime>,
}

impl Default for SessionEntity {
    fn default() -> Self {
        Self {
            game_status: GameStatus::NotStarted,
            current_team_id: None,
            current_question_number: 0,
            play_queue: Vec::new(),
            question_set_assignments: IndexMap::new(),
            current_question: None,
            question_visible: false,
            options_visible: OptionLabel::ALL.to_vec(),
            answer_revealed: false,
            correct_option: None,
            active_lifeline: None,
            initialized_at: None,
            started_at: None,
        }
    }
}

/// Partial update of a [`TeamEntity`].
///
/// Absent fields leave the stored value untouched and are never serialized,
/// so the store never receives an explicit empty value. Nullable record
/// fields use a double option: `Some(None)` clears, `Some(Some(v))` sets.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamPatch {
    /// New display name.
    pub name: Option<String>,
    /// New roster.
    pub members: Option<Vec<String>>,
    /// New lifecycle status; legality is validated by the registry, not here.
    pub status: Option<TeamStatus>,
    /// New secured prize.
    pub current_prize: Option<u64>,
    /// Question bank assignment; `Some(None)` clears it on reset.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub question_set_id: Option<Option<Uuid>>,
    /// New 0-based set position.
    pub current_question_index: Option<u32>,
    /// New correct-answer count.
    pub questions_answered: Option<u32>,
    /// New lifeline availability.
    #[serde(rename = "lifelinesAvailable")]
    pub lifelines: Option<LifelinesEntity>,
    /// Elimination timestamp; `Some(None)` clears it on reset.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub eliminated_at: Option<Option<SystemTime>>,
    /// Completion timestamp; `Some(None)` clears it on reset.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub completed_at: Option<Option<SystemTime>>,
}

impl TeamPatch {
    /// Apply this patch over a stored team, field by field.
    pub fn apply_to(self, team: &mut TeamEntity) {
        if let Some(name) = self.name {
            team.name = name;
        }
        if let Some(members) = self.members {
            team.members = members;
        }
        if let Some(status) = self.status {
            team.status = status;
        }
        if let Some(prize) = self.current_prize {
            team.current_prize = prize;
        }
        if let Some(set_id) = self.question_set_id {
            team.question_set_id = set_id;
        }
        if let Some(index) = self.current_question_index {
            team.current_question_index = index;
        }
        if let Some(answered) = self.questions_answered {
            team.questions_answered = answered;
        }
        if let Some(lifelines) = self.lifelines {
            team.lifelines = lifelines;
        }
        if let Some(eliminated_at) = self.eliminated_at {
            team.eliminated_at = eliminated_at;
        }
        if let Some(completed_at) = self.completed_at {
            team.completed_at = completed_at;
        }
    }
}

/// Partial update of the [`SessionEntity`] singleton.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    /// New global status.
    pub game_status: Option<GameStatus>,
    /// New hot-seat team; `Some(None)` clears it.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub current_team_id: Option<Option<Uuid>>,
    /// New turn question counter.
    pub current_question_number: Option<u32>,
    /// New play queue.
    pub play_queue: Option<Vec<Uuid>>,
    /// New assignments map.
    pub question_set_assignments: Option<IndexMap<Uuid, Uuid>>,
    /// Published public question; `Some(None)` retracts it.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub current_question: Option<Option<PublicQuestionEntity>>,
    /// Public visibility flag.
    pub question_visible: Option<bool>,
    /// Labels currently shown to the public.
    pub options_visible: Option<Vec<OptionLabel>>,
    /// Reveal flag; always patched together with `correct_option`.
    pub answer_revealed: Option<bool>,
    /// Revealed correct option; `Some(None)` clears it.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub correct_option: Option<Option<OptionLabel>>,
    /// Lifeline indicator; `Some(None)` clears it.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub active_lifeline: Option<Option<LifelineKind>>,
    /// Initialization timestamp.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub initialized_at: Option<Option<SystemTime>>,
    /// Play start timestamp.
    #[serde(default, with = "serde_with::rust::double_option")]
    pub started_at: Option<Option<SystemTime>>,
}

impl SessionPatch {
    /// Patch retracting every per-question field from the public projection.
    ///
    /// Used before loading a new question and when a turn ends, so the public
    /// display can never pair a stale question with a new question number.
    pub fn clear_projection() -> Self {
        Self {
            current_question: Some(None),
            question_visible: Some(false),
            options_visible: Some(OptionLabel::ALL.to_vec()),
            answer_revealed: Some(false),
            correct_option: Some(None),
            active_lifeline: Some(None),
            ..Self::default()
        }
    }

    /// Apply this patch over the stored session, field by field.
    pub fn apply_to(self, session: &mut SessionEntity) {
        if let Some(status) = self.game_status {
            session.game_status = status;
        }
        if let Some(team_id) = self.current_team_id {
            session.current_team_id = team_id;
        }
        if let Some(number) = self.current_question_number {
            session.current_question_number = number;
        }
        if let Some(queue) = self.play_queue {
            session.play_queue = queue;
        }
        if let Some(assignments) = self.question_set_assignments {
            session.question_set_assignments = assignments;
        }
        if let Some(question) = self.current_question {
            session.current_question = question;
        }
        if let Some(visible) = self.question_visible {
            session.question_visible = visible;
        }
        if let Some(options) = self.options_visible {
            session.options_visible = options;
        }
        if let Some(revealed) = self.answer_revealed {
            session.answer_revealed = revealed;
        }
        if let Some(correct) = self.correct_option {
            session.correct_option = correct;
        }
        if let Some(lifeline) = self.active_lifeline {
            session.active_lifeline = lifeline;
        }
        if let Some(initialized_at) = self.initialized_at {
            session.initialized_at = initialized_at;
        }
        if let Some(started_at) = self.started_at {
            session.started_at = started_at;
        }
    }
}
