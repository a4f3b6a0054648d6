use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vsir_core::{DocId, DocStatus, IrError, RankedHit, SearchEngine, Term, Weight};

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    /// Documents with a non-zero score, before truncation to k.
    pub total_hits: usize,
    pub results: Vec<RankedHit>,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub blog_id: String,
    pub status: DocStatus,
    pub length: Option<f64>,
}

#[derive(Serialize)]
pub struct TermResponse {
    pub term: String,
    pub document_frequency: usize,
    pub postings: Vec<Weight>,
}

pub type AppState = Arc<SearchEngine>;

/// Maps engine errors onto HTTP statuses with a JSON `{ "error": ... }` body.
pub struct ApiError(IrError);

impl From<IrError> for ApiError {
    fn from(e: IrError) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            IrError::NotFound(_) => StatusCode::NOT_FOUND,
            IrError::Configuration(_) | IrError::ZeroDepth | IrError::Parse { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn cors_layer() -> CorsLayer {
    // CORS_ALLOW_ORIGIN is a comma-separated list; unset or unparsable means Any.
    let origins: Vec<_> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn build_app(engine: SearchEngine) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/term/:term", get(term_handler))
        .with_state(Arc::new(engine))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(engine): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.min(MAX_K);
    let ranked = engine.ranked(&params.q);
    let total_hits = ranked.len();
    let results: Vec<RankedHit> = ranked
        .into_iter()
        .take(k)
        .map(|(doc_id, score)| {
            let blog_id = engine.document(doc_id).map(|d| d.blog_id.clone()).unwrap_or_default();
            RankedHit { doc_id, blog_id, score }
        })
        .collect();
    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(query = %params.q, k, total_hits, took_s, "search");
    Json(SearchResponse { query: params.q, took_s, total_hits, results })
}

pub async fn doc_handler(State(engine): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<DocResponse>, ApiError> {
    let doc = engine.document(doc_id)?;
    Ok(Json(DocResponse {
        doc_id,
        blog_id: doc.blog_id.clone(),
        status: doc.status,
        length: engine.doc_length(doc_id),
    }))
}

/// Looks the term up verbatim, so it must already be in normalized form.
/// Two space-separated words address a bigram.
pub async fn term_handler(State(engine): State<AppState>, Path(raw): Path<String>) -> Result<Json<TermResponse>, ApiError> {
    let term = Term::parse(&raw);
    let postings = engine.postings(&term)?.to_vec();
    Ok(Json(TermResponse { term: term.to_string(), document_frequency: postings.len(), postings }))
}
