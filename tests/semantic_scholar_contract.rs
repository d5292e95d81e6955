//! Semantic Scholar Provider Contract Tests
//!
//! Verifies the paper search request format, the optional `x-api-key`
//! header, pagination via `next`, and 429 handling against a mock server.

use std::time::Duration;

use retrieval_services::config::HttpConfig;
use retrieval_services::providers::semantic_scholar::SemanticScholarConfig;
use retrieval_services::providers::{RetrieverOptions, SemanticScholarApi};
use retrieval_services::RetryPolicy;
use serde_json::{Value, json};
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer, key: Option<&str>) -> SemanticScholarApi {
    let mut config = SemanticScholarConfig::default().with_base_url(server.uri());
    if let Some(key) = key {
        config = config.with_api_key(key);
    }
    SemanticScholarApi::with_config(config, &HttpConfig::default()).expect("client")
}

fn options(num_results: usize) -> RetrieverOptions {
    RetrieverOptions::new(num_results)
        .with_verbose(false)
        .with_retry(RetryPolicy::new(5, Duration::from_millis(10)))
}

fn papers(total: usize, offset: usize, count: usize) -> Value {
    let data: Vec<Value> = (offset..offset + count)
        .map(|i| {
            json!({
                "paperId": format!("paper{i}"),
                "title": format!("Title {i}"),
                "abstract": "An abstract.",
                "year": 2020,
                "venue": "SIGIR",
                "url": format!("https://www.semanticscholar.org/paper/paper{i}"),
                "authors": [{"authorId": "1", "name": "A. Author"}]
            })
        })
        .collect();
    let mut body = json!({"total": total, "offset": offset, "data": data});
    if offset + count < total {
        body["next"] = json!(offset + count);
    }
    body
}

#[tokio::test]
async fn test_request_format_and_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "test"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "15"))
        .and(query_param("fields", "title,abstract,year,venue,url,authors"))
        .and(header("x-api-key", "s2-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(papers(200, 0, 15)))
        .expect(1)
        .mount(&server)
        .await;

    let results = api(&server, Some("s2-secret"))
        .retriever(options(15))
        .search("test")
        .await
        .expect("search");

    assert_eq!(results.len(), 15);
    let columns: Vec<&str> = results.columns().iter().map(String::as_str).collect();
    assert_eq!(
        columns,
        ["qid", "query", "docno", "score", "rank", "title", "abstract", "year", "venue", "url", "authors"]
    );
    assert_eq!(results.get(14, "docno"), Some(&json!("paper14")));
    assert_eq!(results.get(14, "rank"), Some(&json!(14)));
    assert_eq!(results.get(0, "authors"), Some(&json!(["A. Author"])));
}

#[tokio::test]
async fn test_no_key_header_without_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(header_exists("x-api-key"))
        .respond_with(ResponseTemplate::new(403))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(papers(1, 0, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let results = api(&server, None)
        .retriever(options(10))
        .search("test")
        .await
        .expect("search");
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_limit_clamped_and_paged() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(papers(500, 0, 100)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("offset", "100"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(papers(500, 100, 50)))
        .expect(1)
        .mount(&server)
        .await;

    let results = api(&server, None)
        .retriever(options(150))
        .search("test")
        .await
        .expect("search");
    assert_eq!(results.len(), 150);
    assert_eq!(results.get(149, "rank"), Some(&json!(149)));
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "message": "Too Many Requests. Please wait and try again or apply for a key."
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(papers(2, 0, 2)))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    let results = api(&server, None)
        .retriever(options(2))
        .search("test")
        .await
        .expect("search");
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_bad_request_message_preserved() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Unrecognized or unsupported fields: [bogus]"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = api(&server, None)
        .retriever(options(2))
        .search("test")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Unrecognized or unsupported fields"));
}

#[tokio::test]
#[ignore]
async fn live_semantic_scholar_search() {
    let results = SemanticScholarApi::new()
        .expect("client")
        .retriever(RetrieverOptions::new(15).with_verbose(false))
        .search("test")
        .await
        .expect("live search");
    assert_eq!(results.len(), 15);
}
