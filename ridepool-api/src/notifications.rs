use axum::{
    extract::{Extension, Json, Path, State},
    routing::{get, patch},
    Router,
};
use ridepool_core::Notification;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", patch(mark_read))
}

/// GET /notifications
async fn list_notifications(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(state.inbox.list_notifications(user_id).await?))
}

/// PATCH /notifications/{id}/read
async fn mark_read(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    // Only the recipient may touch a notification; anyone else sees a 404.
    let owned = state
        .inbox
        .list_notifications(user_id)
        .await?
        .iter()
        .any(|n| n.id == id);
    if !owned {
        return Err(AppError::NotFoundError(format!("Not found: Notification {}", id)));
    }

    let notification = state
        .inbox
        .mark_notification_read(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Not found: Notification {}", id)))?;
    Ok(Json(notification))
}
