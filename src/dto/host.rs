//! DTO definitions used by the host REST API and documentation layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{OptionLabel, QuestionOptionEntity, TeamStatus},
    dto::{
        game::{HostQuestionView, SessionView, TeamView},
        validation::{validate_option_choice, validate_question_options},
    },
};

/// Payload creating a new team in the waiting state.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTeamRequest {
    /// Display name of the team.
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Free-text roster, carried as-is.
    #[serde(default)]
    pub members: Vec<String>,
}

/// Partial team update issued from the host panel.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateTeamRequest {
    /// New display name.
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    /// New roster.
    pub members: Option<Vec<String>>,
    /// New lifecycle status; must be a legal transition.
    pub status: Option<TeamStatus>,
}

/// Payload fixing the play queue and question-set assignments for a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitializeGameRequest {
    /// Turn order of team ids; every entry must be a known waiting team.
    #[validate(length(min = 1))]
    pub play_queue: Vec<Uuid>,
    /// Team id to question-set id; must cover every queued team.
    #[schema(value_type = Object)]
    pub question_set_assignments: IndexMap<Uuid, Uuid>,
}

/// Payload selecting which question of the current turn to load.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoadQuestionRequest {
    /// 1-based question number within the turn.
    #[validate(range(min = 1))]
    pub number: u32,
}

/// Payload locking the team's verbal answer.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LockAnswerRequest {
    /// Selected option letter, as typed by the host ("A".."D", any case).
    #[validate(custom(function = validate_option_choice))]
    pub selected: String,
    /// Consolation prize applied if the lock eliminates the team; omitted
    /// entirely when no consolation applies.
    pub consolation_prize: Option<u64>,
}

/// Payload tearing the session down.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UninitializeRequest {
    /// Also return every team to the waiting state, wiping their progress.
    #[serde(default)]
    pub reset_teams: bool,
}

/// One question supplied when upserting a question set.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    /// Question text.
    pub text: String,
    /// The four labeled options.
    pub options: Vec<QuestionOptionEntity>,
    /// Label of the correct option.
    pub correct_option: OptionLabel,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() {
            let mut err = validator::ValidationError::new("question_text_empty");
            err.message = Some("Question text must not be empty".into());
            errors.add("text", err);
        }

        if let Err(err) = validate_question_options(&self.options, self.correct_option) {
            errors.add("options", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload creating or replacing a question set.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpsertQuestionSetRequest {
    /// Existing set id to replace; a fresh id is allocated when omitted.
    pub id: Option<Uuid>,
    /// Human readable set name.
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// Ordered questions of the set.
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
}

/// Generic action acknowledgement used by host endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

/// Response returning the loaded question with its correct option, for the
/// host screen only.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoadQuestionResponse {
    pub question: HostQuestionView,
}

/// Outcome of locking an answer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LockAnswerResponse {
    /// Whether the locked selection was correct.
    pub correct: bool,
    /// The revealed correct option.
    pub correct_option: OptionLabel,
    /// The team after resolution (advanced, completed, or eliminated).
    pub team: TeamView,
    /// Prize awarded by this lock, when the answer was correct.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_prize: Option<u64>,
    /// Whether resolving this lock completed the whole game.
    pub game_completed: bool,
}

/// Outcome of skipping the current question.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkipQuestionResponse {
    /// Whether the skip exhausted the team's set, completing the team.
    pub team_completed: bool,
    /// The team after the skip.
    pub team: TeamView,
    /// Whether completing this team completed the whole game.
    pub game_completed: bool,
}

/// Response confirming the hot seat moved to the next queued team.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceTeamResponse {
    pub current_team: TeamView,
}

/// Options left standing after a 50/50.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiftyFiftyResponse {
    pub options_visible: Vec<OptionLabel>,
}

/// Countdown details returned when phone-a-friend is activated.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneAFriendResponse {
    pub countdown_seconds: u64,
}

/// Fresh snapshot returned by the resync recovery action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResyncResponse {
    pub session: SessionView,
    pub teams: Vec<TeamView>,
}

/// Response confirming a question set upsert.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertQuestionSetResponse {
    pub id: Uuid,
    pub question_count: usize,
}
