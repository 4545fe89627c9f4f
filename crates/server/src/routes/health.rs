use actix_web::{get, web, HttpResponse};

use crate::state::AppState;
use ragvec_vector::HealthResponse;

/// Loaded version, or 503 while nothing is loaded
#[get("/health")]
pub async fn health(state: web::Data<std::sync::Arc<AppState>>) -> actix_web::Result<HttpResponse> {
    match state.service.health() {
        Ok(health) => Ok(HttpResponse::Ok().json(health)),
        Err(_) => Ok(HttpResponse::ServiceUnavailable().json(HealthResponse::error())),
    }
}
