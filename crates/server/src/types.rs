use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use chrono::{DateTime, Utc};
use ragvec_common::RagVecError;
use ragvec_vector::{Filters, IntegrityRecord};
use serde::{Deserialize, Serialize};

/// POST /search body
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    /// Query vector, same dimension as the loaded index
    pub query_embedding: Vec<f32>,

    /// Maximum number of results
    pub top_n: usize,

    /// Metadata filters (all pairs must match)
    #[serde(default)]
    pub filters: Filters,
}

/// POST /admin/reload body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReloadRequest {
    /// Version to load; the CURRENT pointer when omitted
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub loaded_index_version: String,
    pub vector_count: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub index_version: String,
    pub records: Vec<IntegrityRecord>,
}

#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    /// Published versions, sorted
    pub versions: Vec<String>,

    /// Version named by CURRENT
    pub current: Option<String>,

    /// Version currently serving queries
    pub loaded: Option<String>,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// Map a typed error onto its HTTP status and JSON body
pub fn error_response(err: &RagVecError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorResponse {
        error: err.to_string(),
        kind: err.kind().to_string(),
    })
}
