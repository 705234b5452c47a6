use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- fixed routes ---

#[tokio::test]
async fn foo_sets_answer_header() {
    let resp = app().oneshot(get("/foo")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-answer"], "42");
    assert_eq!(body_bytes(resp).await, "got foo");
}

#[tokio::test]
async fn bar_returns_text() {
    let resp = app().oneshot(get("/bar")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "got bar");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = app().oneshot(get("/404")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_method_headers_and_body() {
    let req = Request::builder()
        .method("PUT")
        .uri("/echo")
        .header(http::header::CONTENT_TYPE, "text/plain")
        .header("x-multi", "a")
        .header("x-multi", "b")
        .body("payload".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.body, "payload");
    assert_eq!(echo.headers["x-multi"], vec!["a", "b"]);
    assert_eq!(echo.headers["content-type"], vec!["text/plain"]);
}

// --- status ---

#[tokio::test]
async fn status_route_returns_requested_code() {
    let resp = app().oneshot(get("/status/503")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn status_route_rejects_non_numeric_code() {
    let resp = app().oneshot(get("/status/abc")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- cookie ---

#[tokio::test]
async fn cookie_route_requires_test_cookie() {
    let resp = app().oneshot(get("/cookie")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/cookie")
        .header(http::header::COOKIE, "lang=en; test=hello")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
