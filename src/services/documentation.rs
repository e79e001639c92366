use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Ladder Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::host_stream,
        crate::routes::public::public_session,
        crate::routes::public::public_teams,
        crate::routes::public::public_prizes,
        crate::routes::host::create_team,
        crate::routes::host::list_teams,
        crate::routes::host::update_team,
        crate::routes::host::delete_team,
        crate::routes::host::initialize_game,
        crate::routes::host::start_game,
        crate::routes::host::pause_game,
        crate::routes::host::resume_game,
        crate::routes::host::stop_game,
        crate::routes::host::uninitialize_game,
        crate::routes::host::factory_reset,
        crate::routes::host::resync,
        crate::routes::host::get_session,
        crate::routes::host::load_question,
        crate::routes::host::show_question,
        crate::routes::host::hide_question,
        crate::routes::host::lock_answer,
        crate::routes::host::skip_question,
        crate::routes::host::advance_to_next_team,
        crate::routes::host::fifty_fifty,
        crate::routes::host::phone_a_friend,
        crate::routes::host::phone_resume,
        crate::routes::host::upsert_question_set,
        crate::routes::host::question_set_cache_info,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::HostHandshake,
            crate::dto::game::TeamView,
            crate::dto::game::SessionView,
            crate::dto::game::HostQuestionView,
            crate::dto::game::PrizeLadderView,
            crate::dto::game::CacheInfoView,
            crate::dao::models::TeamStatus,
            crate::dao::models::GameStatus,
            crate::dao::models::OptionLabel,
            crate::dao::models::LifelineKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "Read-only projections for the public display"),
        (name = "teams", description = "Team registry operations"),
        (name = "game", description = "Game lifecycle operations"),
        (name = "questions", description = "Question flow and question-set management"),
        (name = "lifelines", description = "Lifeline activations"),
    )
)]
pub struct ApiDoc;
