use actix_web::{get, web, HttpResponse};

use crate::state::AppState;
use crate::types::{error_response, VersionsResponse};

#[get("/versions")]
pub async fn versions(
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let store = state.service.store();

    let listed = store
        .list_versions()
        .and_then(|versions| Ok((versions, store.current()?)));

    match listed {
        Ok((versions, current)) => Ok(HttpResponse::Ok().json(VersionsResponse {
            versions,
            current,
            loaded: state
                .service
                .handle()
                .ok()
                .map(|loaded| loaded.version().to_string()),
        })),
        Err(e) => Ok(error_response(&e)),
    }
}
