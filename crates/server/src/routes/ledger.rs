use actix_web::{get, web, HttpResponse};

use crate::state::AppState;
use crate::types::{error_response, LedgerResponse};

/// Integrity ledger of the loaded version
#[get("/ledger")]
pub async fn ledger(state: web::Data<std::sync::Arc<AppState>>) -> actix_web::Result<HttpResponse> {
    match state.service.ledger() {
        Ok((index_version, records)) => Ok(HttpResponse::Ok().json(LedgerResponse {
            index_version,
            records,
        })),
        Err(e) => Ok(error_response(&e)),
    }
}
