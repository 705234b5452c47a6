use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::Path,
    http::{HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw, returned as JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/foo", get(foo))
        .route("/bar", get(bar))
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/cookie", get(cookie))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    tracing::info!(addr = ?listener.local_addr().ok(), "mock server listening");
    axum::serve(listener, app()).await
}

async fn foo() -> impl IntoResponse {
    ([("x-answer", "42")], "got foo")
}

async fn bar() -> &'static str {
    "got bar"
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        seen.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    Json(Echo {
        method: method.to_string(),
        headers: seen,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

/// 200 only when the request carries the cookie `test=hello`.
async fn cookie(headers: HeaderMap) -> StatusCode {
    let found = headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .any(|pair| pair.trim() == "test=hello");
    if found {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}
