//! Credit balance and reservation lifecycle handlers

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use folia_core::models::{AccountPlan, CreditBalance};
use folia_core::AppError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::state::AppState;

/// Balance response DTO
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub monthly_credits: u32,
    pub extra_credits: u32,
    pub reserved_credits: u32,
    pub available: u32,
    pub monthly_reset_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CreditBalance> for BalanceResponse {
    fn from(balance: CreditBalance) -> Self {
        Self {
            available: balance.available(),
            user_id: balance.user_id,
            monthly_credits: balance.monthly_credits,
            extra_credits: balance.extra_credits,
            reserved_credits: balance.reserved_credits,
            monthly_reset_at: balance.monthly_reset_at,
            updated_at: balance.updated_at,
        }
    }
}

/// Query parameters carrying the account plan
#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub plan: Option<AccountPlan>,
}

/// Request body for the reservation lifecycle operations
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub user_id: String,
    pub session_id: String,
    #[serde(default)]
    pub plan: AccountPlan,
}

#[derive(Debug, Serialize)]
pub struct ReserveResponse {
    pub reserved: bool,
    pub available: u32,
}

#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub pool: String,
    pub balance: BalanceResponse,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: bool,
}

/// Current balance for a professional
///
/// GET /api/v1/credits/{user_id}
#[instrument(skip(state))]
pub async fn get_balance(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PlanQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let plan = query.plan.unwrap_or_default();
    let balance = state.credits.balance(&user_id, plan).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(balance)))
}

/// Ledger entries for a professional, oldest first
///
/// GET /api/v1/credits/{user_id}/transactions
#[instrument(skip(state))]
pub async fn list_transactions(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let transactions = state.credits.transactions(Some(&user_id)).await?;
    Ok(HttpResponse::Ok().json(transactions))
}

/// Take a one-credit hold before a billable session starts
///
/// POST /api/v1/credits/reserve
#[instrument(skip(state, body), fields(user_id = %body.user_id, session_id = %body.session_id))]
pub async fn reserve(
    state: web::Data<AppState>,
    body: web::Json<SessionRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .credits
        .reserve(&body.user_id, body.plan, &body.session_id)
        .await?;
    if !outcome.reserved {
        // recoverable for the caller: prompt a purchase or top-up
        return Err(AppError::InsufficientCredits {
            available: outcome.available,
        });
    }
    Ok(HttpResponse::Ok().json(ReserveResponse {
        reserved: outcome.reserved,
        available: outcome.available,
    }))
}

/// Settle the session's hold on completion/export
///
/// POST /api/v1/credits/consume
#[instrument(skip(state, body), fields(user_id = %body.user_id, session_id = %body.session_id))]
pub async fn consume(
    state: web::Data<AppState>,
    body: web::Json<SessionRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .credits
        .consume(&body.user_id, body.plan, &body.session_id)
        .await?;
    Ok(HttpResponse::Ok().json(ConsumeResponse {
        pool: outcome.pool.to_string(),
        balance: outcome.balance.into(),
    }))
}

/// Drop the session's hold for abandoned work
///
/// POST /api/v1/credits/release
#[instrument(skip(state, body), fields(user_id = %body.user_id, session_id = %body.session_id))]
pub async fn release(
    state: web::Data<AppState>,
    body: web::Json<SessionRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .credits
        .release(&body.user_id, body.plan, &body.session_id)
        .await?;
    Ok(HttpResponse::Ok().json(ReleaseResponse {
        released: outcome.released,
    }))
}

/// Reset the monthly allotment (called by the external scheduler)
///
/// POST /api/v1/credits/{user_id}/reset
#[instrument(skip(state))]
pub async fn reset_monthly(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PlanQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let plan = query.plan.unwrap_or_default();
    let balance = state.credits.reset_monthly(&user_id, plan).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(balance)))
}

/// Configure credit routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/credits")
            .route("/reserve", web::post().to(reserve))
            .route("/consume", web::post().to(consume))
            .route("/release", web::post().to(release))
            .route("/{user_id}", web::get().to(get_balance))
            .route("/{user_id}/transactions", web::get().to(list_transactions))
            .route("/{user_id}/reset", web::post().to(reset_monthly)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_response_includes_available() {
        let mut balance = CreditBalance::new("u1", 10);
        balance.extra_credits = 2;
        balance.reserved_credits = 3;

        let response = BalanceResponse::from(balance);
        assert_eq!(response.available, 9);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"available\":9"));
        assert!(json.contains("\"user_id\":\"u1\""));
    }

    #[test]
    fn test_session_request_plan_defaults_to_standard() {
        let req: SessionRequest =
            serde_json::from_str(r#"{"user_id":"u1","session_id":"s1"}"#).unwrap();
        assert_eq!(req.plan, AccountPlan::Standard);

        let req: SessionRequest =
            serde_json::from_str(r#"{"user_id":"u1","session_id":"s1","plan":"privileged"}"#)
                .unwrap();
        assert_eq!(req.plan, AccountPlan::Privileged);
    }
}
