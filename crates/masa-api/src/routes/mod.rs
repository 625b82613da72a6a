pub mod chat;
pub mod feedback;
pub mod health;
pub mod history;
pub mod support;

use masa_types::Conversation;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Look up a session, rejecting missing ids and unknown sessions with `invalid`.
pub(crate) async fn load_session(
    state: &AppState,
    user_id: Option<&str>,
    invalid: &str,
    apology: &'static str,
) -> ApiResult<Conversation> {
    let user_id = user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(invalid))?;

    state
        .persist
        .get_conversation(user_id)
        .await
        .map_err(ApiError::internal(apology))?
        .ok_or_else(|| {
            tracing::warn!(user_id, "Unknown session");
            ApiError::bad_request(invalid)
        })
}
