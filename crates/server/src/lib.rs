//! ragvec HTTP server
//!
//! Actix-web JSON API over the search service

pub mod routes;
pub mod state;
pub mod types;

use actix_web::{error::InternalError, web, App, HttpServer};
use ragvec_common::{AppConfig, RagVecError, Result};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use state::AppState;

use crate::types::error_response;

/// Register every route plus JSON body handling
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .limit(4 * 1024 * 1024)
        .error_handler(|err, _req| {
            let response = error_response(&RagVecError::input_validation(err.to_string()));
            InternalError::from_response(err, response).into()
        });

    cfg.app_data(json)
        .service(routes::health::health)
        .service(routes::search::search)
        .service(routes::admin::reload)
        .service(routes::ledger::ledger)
        .service(routes::versions::versions);
}

/// Load the startup version and serve until shutdown
pub async fn start_server(config: AppConfig) -> Result<()> {
    let bind_addr = config.server_bind_address();
    let state = Arc::new(AppState::new(config)?);

    info!("Starting HTTP server on {}", bind_addr);

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(data.clone())
            .configure(configure)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use ragvec_embed::{embed, HashEmbedder};
    use ragvec_vector::{
        ArtifactStore, Chunk, HealthResponse, IndexBuilder, IndexParams, SearchResponse,
        SearchService,
    };
    use serde_json::json;

    const DIM: usize = 16;

    fn fixture(versions: &[&str]) -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let builder = IndexBuilder::new(Arc::new(HashEmbedder::new(DIM)), IndexParams::default());
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| Chunk::new(format!("c{}", i), format!("d{}", i / 5), format!("text {}", i)))
            .collect();
        for version in versions {
            builder.build_and_publish(&store, version, &chunks).unwrap();
        }

        let config = AppConfig {
            artifact_root: dir.path().to_path_buf(),
            embedding_dim: DIM,
            ..AppConfig::default()
        };
        let service = Arc::new(SearchService::new(store));
        (dir, Arc::new(AppState::with_service(config, service)))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health_before_and_after_reload() {
        let (_dir, state) = fixture(&["v1"]);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: HealthResponse = test::read_body_json(resp).await;
        assert_eq!(body, HealthResponse::error());

        let req = test::TestRequest::post()
            .uri("/admin/reload")
            .set_json(json!({"version": "v1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["loaded_index_version"], "v1");
        assert_eq!(body["vector_count"], 10);
        let loaded_at = body["loaded_at"].as_str().unwrap();
        assert!(loaded_at.parse::<chrono::DateTime<chrono::Utc>>().is_ok());

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, HealthResponse::ok("v1"));
    }

    #[actix_web::test]
    async fn test_search_route() {
        let (_dir, state) = fixture(&["v1"]);
        state.service.reload("v1").unwrap();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(json!({
                "query_embedding": embed("text 7", DIM),
                "top_n": 1
            }))
            .to_request();
        let body: SearchResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.index_version, "v1");
        assert_eq!(body.results[0].chunk_id, "c7");
        assert_eq!(body.results[0].doc_id, "d1");
    }

    #[actix_web::test]
    async fn test_search_error_statuses() {
        let (_dir, state) = fixture(&["v1"]);
        let app = app!(state);

        let search = |vector: Vec<f32>| {
            test::TestRequest::post()
                .uri("/search")
                .set_json(json!({"query_embedding": vector, "top_n": 3}))
                .to_request()
        };

        let resp = test::call_service(&app, search(embed("q", DIM))).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.service.reload("v1").unwrap();
        let resp = test::call_service(&app, search(vec![0.1; 3])).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: types::ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.kind, "DimensionMismatch");

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(json!({"top_n": 3}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_failed_reload_keeps_version() {
        let (_dir, state) = fixture(&["v1"]);
        state.service.reload("v1").unwrap();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/admin/reload")
            .set_json(json!({"version": "v9"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // no body and no CURRENT pointer
        let req = test::TestRequest::post().uri("/admin/reload").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        assert_eq!(state.service.health().unwrap(), HealthResponse::ok("v1"));
    }

    #[actix_web::test]
    async fn test_ledger_and_versions() {
        let (_dir, state) = fixture(&["v1", "v2"]);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/ledger").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.service.store().activate("v2").unwrap();
        state.service.reload_current().unwrap();

        let req = test::TestRequest::get().uri("/ledger").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["index_version"], "v2");
        assert_eq!(body["records"].as_array().unwrap().len(), 10);

        let req = test::TestRequest::get().uri("/versions").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["versions"], json!(["v1", "v2"]));
        assert_eq!(body["current"], "v2");
        assert_eq!(body["loaded"], "v2");
    }
}
