use crate::{
    error::ServiceError,
    services::sse_events::broadcast_status_changed,
    state::{SharedState, state_machine::GameEvent},
};

/// Run `work` inside a planned status transition and, once the new status
/// is committed, announce it on both SSE streams.
///
/// Failures abort the plan before anything is broadcast, so observers only
/// ever hear about statuses the machine actually reached.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    state: &SharedState,
    event: GameEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let (value, next) = state.run_transition(event, work).await?;
    broadcast_status_changed(state, next);
    Ok(value)
}
