use permbit_core::{AppError, PersonId, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

mod bootstrap;
mod session;

pub use bootstrap::bootstrap_handler;
pub use session::{logout_handler, me_handler, refresh_handler};

pub const SESSION_USER_KEY: &str = "user_identity";
/// Absolute session creation timestamp.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";
/// Sessions older than this are discarded even when active, so a permission
/// snapshot never outlives a working day.
pub const SESSION_ABSOLUTE_LIFETIME_SECONDS: i64 = 8 * 60 * 60;

/// Returns the session principal, or `None` when the session is anonymous or
/// past its absolute lifetime. Expired sessions are flushed.
pub async fn current_identity(session: &Session) -> ApiResult<Option<UserIdentity>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| session_read_error("identity", error))?;
    let Some(identity) = identity else {
        return Ok(None);
    };

    let created_at = session
        .get::<i64>(SESSION_CREATED_AT_KEY)
        .await
        .map_err(|error| session_read_error("creation time", error))?;

    if session_has_expired(created_at, chrono::Utc::now().timestamp()) {
        session
            .flush()
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;
        info!(person_id = %identity.person_id(), "expired session discarded");
        return Ok(None);
    }

    Ok(Some(identity))
}

fn session_has_expired(created_at: Option<i64>, now: i64) -> bool {
    match created_at {
        Some(created_at) => now.saturating_sub(created_at) >= SESSION_ABSOLUTE_LIFETIME_SECONDS,
        None => true,
    }
}

fn session_read_error(what: &str, error: tower_sessions::session::Error) -> ApiError {
    AppError::Internal(format!("failed to read session {what}: {error}")).into()
}

/// Builds the identity stored in the session, with a permission snapshot
/// computed at this instant.
async fn issue_identity(
    state: &AppState,
    person_id: PersonId,
    display_name: String,
) -> ApiResult<UserIdentity> {
    let permissions = state
        .effective_permission_service
        .session_permissions(person_id)
        .await?;

    Ok(UserIdentity::new(person_id, display_name, permissions))
}

async fn store_identity(session: &Session, identity: &UserIdentity) -> ApiResult<()> {
    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    Ok(())
}
