use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use vsir_core::{EngineConfig, IndexBuilder};

fn tiny_app() -> Router {
    let config = EngineConfig { normalize: true, ..Default::default() };
    let mut builder = IndexBuilder::new(&config).unwrap();
    builder.add_document("doc0", "rust rust systems programming");
    builder.add_document("doc1", "learning rust");
    builder.add_document("doc2", "gardening tips");
    builder.add_document("doc3", "");
    vsir_server::build_app(builder.finish().unwrap())
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_ok() {
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let resp = tiny_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (status, json) = call(tiny_app(), "/search?q=rust&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 2);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["blog_id"], "doc0");
    assert_eq!(arr[1]["blog_id"], "doc1");
    assert!(arr[0]["score"].as_f64().unwrap() >= arr[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn search_truncates_but_counts_all_hits() {
    let (status, json) = call(tiny_app(), "/search?q=rust+gardening&k=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 3);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_words_give_no_results() {
    let (status, json) = call(tiny_app(), "/search?q=zebra").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn doc_lookup_reports_status() {
    let (status, json) = call(tiny_app(), "/doc/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["blog_id"], "doc3");
    assert_eq!(json["status"], "blank");

    let (status, json) = call(tiny_app(), "/doc/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("42"));
}

#[tokio::test]
async fn term_lookup_lists_postings() {
    let (status, json) = call(tiny_app(), "/term/rust").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["document_frequency"], 2);
    assert_eq!(json["postings"].as_array().unwrap().len(), 2);

    let (status, _) = call(tiny_app(), "/term/zebra").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
