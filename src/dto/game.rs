use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{
        GameStatus, LifelineKind, LifelinesEntity, OptionLabel, PrizeLadderEntity,
        PublicQuestionEntity, QuestionEntity, QuestionOptionEntity, SessionEntity, TeamEntity,
        TeamStatus,
    },
    dto::format_system_time,
};

/// Exported projection of a team record.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<String>,
    pub status: TeamStatus,
    pub current_prize: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_set_id: Option<Uuid>,
    pub current_question_index: u32,
    pub questions_answered: u32,
    pub lifelines_available: LifelinesEntity,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eliminated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<TeamEntity> for TeamView {
    fn from(team: TeamEntity) -> Self {
        Self {
            id: team.id,
            name: team.name,
            members: team.members,
            status: team.status,
            current_prize: team.current_prize,
            question_set_id: team.question_set_id,
            current_question_index: team.current_question_index,
            questions_answered: team.questions_answered,
            lifelines_available: team.lifelines,
            created_at: format_system_time(team.created_at),
            eliminated_at: team.eliminated_at.map(format_system_time),
            completed_at: team.completed_at.map(format_system_time),
        }
    }
}

/// Exported projection of the session record. Carries only public-safe
/// fields; the public display renders purely from this shape.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub game_status: GameStatus,
    pub current_team_id: Option<Uuid>,
    pub current_question_number: u32,
    pub play_queue: Vec<Uuid>,
    #[schema(value_type = Object)]
    pub question_set_assignments: IndexMap<Uuid, Uuid>,
    pub current_question: Option<PublicQuestionEntity>,
    pub question_visible: bool,
    pub options_visible: Vec<OptionLabel>,
    pub answer_revealed: bool,
    pub correct_option: Option<OptionLabel>,
    pub active_lifeline: Option<LifelineKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialized_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

impl From<SessionEntity> for SessionView {
    fn from(session: SessionEntity) -> Self {
        Self {
            game_status: session.game_status,
            current_team_id: session.current_team_id,
            current_question_number: session.current_question_number,
            play_queue: session.play_queue,
            question_set_assignments: session.question_set_assignments,
            current_question: session.current_question,
            question_visible: session.question_visible,
            options_visible: session.options_visible,
            answer_revealed: session.answer_revealed,
            correct_option: session.correct_option,
            active_lifeline: session.active_lifeline,
            initialized_at: session.initialized_at.map(format_system_time),
            started_at: session.started_at.map(format_system_time),
        }
    }
}

/// The loaded question as seen by the host, correct option included.
///
/// Returned only on host routes; never part of the session record or any
/// public stream.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostQuestionView {
    pub number: u32,
    pub text: String,
    pub options: Vec<QuestionOptionEntity>,
    pub correct_option: OptionLabel,
}

impl HostQuestionView {
    /// Build the host view of a loaded question.
    pub fn from_question(number: u32, question: &QuestionEntity) -> Self {
        Self {
            number,
            text: question.text.clone(),
            options: question.options.clone(),
            correct_option: question.correct_option,
        }
    }
}

/// Prize ladder as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrizeLadderView {
    pub amounts: Vec<u64>,
}

impl From<PrizeLadderEntity> for PrizeLadderView {
    fn from(ladder: PrizeLadderEntity) -> Self {
        Self {
            amounts: ladder.amounts,
        }
    }
}

/// Freshness report of one cached question set.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfoView {
    pub set_id: Uuid,
    pub age_seconds: u64,
    pub is_stale: bool,
}
