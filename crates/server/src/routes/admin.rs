use actix_web::{post, web, HttpResponse};
use tracing::{info, warn};

use crate::state::AppState;
use crate::types::{error_response, ReloadRequest, ReloadResponse};

/// Load a version (or the CURRENT one) and swap it in
///
/// A failed reload leaves the serving version untouched.
#[post("/admin/reload")]
pub async fn reload(
    req: Option<web::Json<ReloadRequest>>,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let version = req.and_then(|r| r.into_inner().version);
    info!(
        "Reload requested - {}",
        version.as_deref().unwrap_or("CURRENT")
    );

    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || match version {
        Some(v) => service.reload(&v),
        None => service.reload_current(),
    })
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    match result {
        Ok(loaded) => Ok(HttpResponse::Ok().json(ReloadResponse {
            loaded_index_version: loaded.version().to_string(),
            vector_count: loaded.len(),
            loaded_at: loaded.loaded_at(),
        })),
        Err(e) => {
            warn!("Reload rejected: {}", e);
            Ok(error_response(&e))
        }
    }
}
