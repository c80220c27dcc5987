//! Administrator credit grant handlers

use actix_web::{web, HttpResponse};
use folia_core::models::AccountPlan;
use folia_core::AppError;
use folia_services::GrantRequest;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::state::AppState;

/// Grant request body
#[derive(Debug, Deserialize, Validate)]
pub struct GrantBody {
    #[validate(length(min = 1, message = "admin_id is required"))]
    pub admin_id: String,
    #[validate(length(min = 1, message = "admin_name is required"))]
    pub admin_name: String,
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "user_name is required"))]
    pub user_name: String,
    #[serde(default)]
    pub plan: AccountPlan,
    #[validate(range(min = 1, message = "amount must be at least 1 credit"))]
    pub amount: u32,
    #[validate(length(min = 20, message = "reason must be at least 20 characters"))]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub adjustment_id: uuid::Uuid,
    pub user_id: String,
    pub amount: u32,
    pub extra_credits: u32,
    pub remaining: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemainingQuery {
    pub plan: Option<AccountPlan>,
}

#[derive(Debug, Serialize)]
pub struct RemainingResponse {
    pub user_id: String,
    pub remaining: u32,
}

/// Grant extra credits to a professional, against the shared monthly cap
///
/// POST /api/v1/adjustments
#[instrument(skip(state, body), fields(admin_id = %body.admin_id, user_id = %body.user_id))]
pub async fn grant(
    state: web::Data<AppState>,
    body: web::Json<GrantBody>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let outcome = state
        .adjustments
        .grant(GrantRequest {
            admin_id: body.admin_id,
            admin_name: body.admin_name,
            user_id: body.user_id,
            user_name: body.user_name,
            plan: body.plan,
            amount: body.amount,
            reason: body.reason,
        })
        .await?;

    Ok(HttpResponse::Created().json(GrantResponse {
        adjustment_id: outcome.adjustment.id,
        user_id: outcome.adjustment.user_id,
        amount: outcome.adjustment.amount,
        extra_credits: outcome.extra_credits,
        remaining: outcome.remaining,
    }))
}

/// Adjustment history, optionally filtered to one professional
///
/// GET /api/v1/adjustments?user_id=...
#[instrument(skip(state))]
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let adjustments = state.adjustments.list(query.user_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(adjustments))
}

/// Credits still grantable to a professional this calendar month
///
/// GET /api/v1/adjustments/{user_id}/remaining
#[instrument(skip(state))]
pub async fn remaining(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RemainingQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let plan = query.plan.unwrap_or_default();
    let remaining = state.adjustments.remaining(&user_id, plan).await?;
    Ok(HttpResponse::Ok().json(RemainingResponse { user_id, remaining }))
}

/// Configure adjustment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/adjustments")
            .route("", web::post().to(grant))
            .route("", web::get().to(list))
            .route("/{user_id}/remaining", web::get().to(remaining)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(amount: u32, reason: &str) -> GrantBody {
        GrantBody {
            admin_id: "adm1".to_string(),
            admin_name: "Admin One".to_string(),
            user_id: "u1".to_string(),
            user_name: "Dr. Example".to_string(),
            plan: AccountPlan::Standard,
            amount,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_grant_body_validation() {
        assert!(body(5, "compensation for an interrupted export")
            .validate()
            .is_ok());
        assert!(body(0, "compensation for an interrupted export")
            .validate()
            .is_err());
        assert!(body(5, "too short").validate().is_err());
    }

    #[test]
    fn test_grant_body_plan_defaults_to_standard() {
        let parsed: GrantBody = serde_json::from_str(
            r#"{
                "admin_id": "adm1",
                "admin_name": "Admin One",
                "user_id": "u1",
                "user_name": "Dr. Example",
                "amount": 3,
                "reason": "compensation for an interrupted export"
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.plan, AccountPlan::Standard);
    }
}
