use actix_web::{post, web, HttpResponse};
use tracing::debug;

use crate::state::AppState;
use crate::types::{error_response, SearchRequest};

#[post("/search")]
pub async fn search(
    req: web::Json<SearchRequest>,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    debug!(
        "Search request - dim {}, top_n {}, {} filters",
        req.query_embedding.len(),
        req.top_n,
        req.filters.len()
    );

    match state
        .service
        .search(&req.query_embedding, req.top_n, &req.filters)
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(error_response(&e)),
    }
}
