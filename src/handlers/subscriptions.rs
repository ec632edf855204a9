use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{bad_request, not_found, optional_text, required_text, run_blocking, ApiResult};
use crate::access::{check_access, FeatureType, SubscriptionProfile};
use crate::db::models::subscription::{NewSubscription, Subscription};
use crate::db::repositories::users::UserRepository;
use crate::router::AppState;
use crate::subscription::{period_end, PlanInterval, STATUS_ACTIVE};

#[derive(Deserialize, Debug, Default)]
pub struct CheckSubscriptionRequest {
    pub user_id: Option<String>,
    pub feature_type: Option<FeatureType>,
}

#[derive(Deserialize, Debug)]
pub struct ActivateSubscriptionRequest {
    pub plan_name: String,
    pub price_id: Option<String>,
    pub interval: PlanInterval,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ActivatedSubscription {
    pub user_id: Uuid,
    pub subscription: String,
    pub subscription_status: String,
    pub subscription_period_end: DateTime<Utc>,
    pub record: Subscription,
}

// Handler for POST /v0/check-subscription
pub async fn check_subscription(
    State(state): State<AppState>,
    Json(body): Json<CheckSubscriptionRequest>,
) -> ApiResult<impl IntoResponse> {
    let raw_id = body
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request("Missing user ID"))?;
    let user_id = Uuid::parse_str(raw_id).map_err(|_| bad_request(format!("Invalid user ID: {}", raw_id)))?;
    let feature = body.feature_type.unwrap_or(FeatureType::Unknown);
    debug!(user_id = %user_id, feature = ?feature, "Checking subscription");

    let repo = UserRepository::new(state.pool.clone());
    let Some(user) = run_blocking("fetching user", move || repo.find(user_id)).await? else {
        return Err(not_found("User not found"));
    };

    let decision = check_access(&SubscriptionProfile::from(&user), feature, Utc::now());
    Ok(Json(decision))
}

// Handler for POST /v0/users/:user_id/subscription
pub async fn activate_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<ActivateSubscriptionRequest>,
) -> ApiResult<impl IntoResponse> {
    let plan_name = required_text(&body.plan_name, "plan name")?;
    let now = Utc::now();
    let new_subscription = NewSubscription {
        id: Uuid::new_v4(),
        user_id,
        price_id: optional_text(body.price_id),
        plan_name,
        status: STATUS_ACTIVE.to_string(),
        current_period_start: now,
        current_period_end: period_end(now, body.interval),
        created_at: now,
        updated_at: now,
    };

    let repo = UserRepository::new(state.pool.clone());
    let Some((user, record)) =
        run_blocking("activating subscription", move || repo.activate_subscription(new_subscription)).await?
    else {
        return Err(not_found(format!("User with ID {} not found", user_id)));
    };
    info!(user_id = %user.id, plan = %record.plan_name, until = %record.current_period_end, "Subscription activated");

    Ok(Json(ActivatedSubscription {
        user_id: user.id,
        subscription: record.plan_name.clone(),
        subscription_status: record.status.clone(),
        subscription_period_end: record.current_period_end,
        record,
    }))
}
