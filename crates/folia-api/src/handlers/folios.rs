//! Folio number handlers

use actix_web::{web, HttpResponse};
use folia_core::AppError;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct FolioBody {
    #[validate(length(min = 1, message = "scope is required"))]
    pub scope: String,
}

#[derive(Debug, Serialize)]
pub struct FolioResponse {
    pub folio: String,
}

/// Issue the next record number for a clinic scope
///
/// POST /api/v1/folios
#[instrument(skip(state, body), fields(scope = %body.scope))]
pub async fn next(
    state: web::Data<AppState>,
    body: web::Json<FolioBody>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let folio = state.folios.next(&body.scope).await?;
    Ok(HttpResponse::Created().json(FolioResponse { folio }))
}

/// Configure folio routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/folios").route("", web::post().to(next)));
}
