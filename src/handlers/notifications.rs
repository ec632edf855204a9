use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use super::ApiResult;
use crate::db::repositories::users::UserRepository;
use crate::expiry::ExpiryNotice;
use crate::router::AppState;
use crate::worker::run_expiry_sweep;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub success: bool,
    pub notifications_sent: Vec<ExpiryNotice>,
    pub count: usize,
}

// Handler for GET /v0/expiry-notifications
pub async fn send_expiry_notifications(
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    debug!("Running expiry sweep on demand");
    let users = Arc::new(UserRepository::new(state.pool.clone()));
    match run_expiry_sweep(users, state.notifier.as_ref(), Utc::now()).await {
        Ok(notices) => Ok(Json(SweepReport {
            success: true,
            count: notices.len(),
            notifications_sent: notices,
        })),
        Err(e) => {
            error!("Error sending expiry notifications: {:#}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
