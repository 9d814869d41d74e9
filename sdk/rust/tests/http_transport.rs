//! Integration tests running the data source against a local HTTP upstream.

use bytes::Bytes;
use gqlds_sdk::{
    hook_fn, ApiErrorKind, DataSourceConfig, GraphQLDataSource, OperationDocument,
    OperationOptions, OperationRequest,
};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

async fn handle(req: Request<Incoming>) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body_bytes = body
        .collect()
        .await
        .map(|c| c.to_bytes())
        .unwrap_or_default();

    let (status, payload) = match parts.uri.path() {
        "/graphql" => {
            let received: serde_json::Value =
                serde_json::from_slice(&body_bytes).unwrap_or_default();
            let header = |name: &str| {
                parts
                    .headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned)
            };
            let payload = json!({
                "data": {
                    "received": received,
                    "authorization": header("authorization"),
                    "client": header("x-client"),
                    "contentType": header("content-type"),
                }
            });
            (StatusCode::OK, payload.to_string())
        }
        "/unauthorized" => (StatusCode::UNAUTHORIZED, "token expired".to_string()),
        "/forbidden" => (StatusCode::FORBIDDEN, "missing scope".to_string()),
        "/broken" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"errors": [{"message": "resolver panicked"}]}).to_string(),
        ),
        "/garbage" => (StatusCode::OK, "<html>not graphql</html>".to_string()),
        "/empty" => (StatusCode::OK, "{}".to_string()),
        "/null-data" => (
            StatusCode::OK,
            json!({"data": null, "errors": [{"message": "boom"}], "hasNext": false}).to_string(),
        ),
        _ => (StatusCode::NOT_FOUND, String::new()),
    };

    Ok(hyper::Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(payload)))
        .unwrap())
}

async fn spawn_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let io = TokioIo::new(stream);
            tokio::spawn(async move {
                let _ = http1::Builder::new()
                    .serve_connection(io, service_fn(handle))
                    .await;
            });
        }
    });

    addr
}

fn source(addr: SocketAddr, path: &str) -> GraphQLDataSource {
    GraphQLDataSource::new(
        DataSourceConfig::new(format!("http://{addr}{path}"))
            .timeout(Duration::from_secs(5))
            .header("x-client", "gateway"),
    )
    .unwrap()
}

fn get_user() -> OperationDocument {
    OperationDocument::parse("query GetUser($id: ID!) { user(id: $id) { id name } }").unwrap()
}

#[tokio::test]
async fn test_query_over_http() {
    let addr = spawn_upstream().await;
    let source = source(addr, "/graphql").with_hook(hook_fn(|request: &mut OperationRequest| {
        request.set_header("authorization", "Bearer secret");
    }));
    let document = get_user();

    let response = source
        .query(&document, OperationOptions::new().variable("id", "42"))
        .await
        .unwrap();

    let data = response.data.unwrap();
    assert_eq!(data["received"]["query"], document.source());
    assert_eq!(data["received"]["variables"], json!({"id": "42"}));
    assert_eq!(data["received"]["operationName"], "GetUser");
    assert_eq!(data["authorization"], "Bearer secret");
    assert_eq!(data["client"], "gateway");
    assert_eq!(data["contentType"], "application/json");
}

#[tokio::test]
async fn test_mutation_over_http_has_no_mutation_field() {
    let addr = spawn_upstream().await;
    let document = OperationDocument::parse("mutation Logout { logout }").unwrap();

    let response = source(addr, "/graphql")
        .mutation(&document, OperationOptions::new())
        .await
        .unwrap();

    let received = &response.data.unwrap()["received"];
    assert_eq!(received["query"], document.source());
    assert!(received.get("mutation").is_none());
}

#[tokio::test]
async fn test_http_401() {
    let addr = spawn_upstream().await;

    let err = source(addr, "/unauthorized")
        .query(&get_user(), OperationOptions::new())
        .await
        .unwrap_err();

    let api = err.as_api().unwrap();
    assert_eq!(api.kind(), ApiErrorKind::Authentication);
    assert_eq!(api.message(), "token expired");
    assert_eq!(api.status_code(), Some(401));
}

#[tokio::test]
async fn test_http_403() {
    let addr = spawn_upstream().await;

    let err = source(addr, "/forbidden")
        .query(&get_user(), OperationOptions::new())
        .await
        .unwrap_err();

    let api = err.as_api().unwrap();
    assert_eq!(api.kind(), ApiErrorKind::Forbidden);
    assert_eq!(api.message(), "missing scope");
}

#[tokio::test]
async fn test_http_500_with_graphql_errors() {
    let addr = spawn_upstream().await;

    let err = source(addr, "/broken")
        .query(&get_user(), OperationOptions::new())
        .await
        .unwrap_err();

    let api = err.as_api().unwrap();
    assert_eq!(api.kind(), ApiErrorKind::Generic);
    assert!(api.message().contains("resolver panicked"));
    assert_eq!(api.status_code(), Some(500));
}

#[tokio::test]
async fn test_non_graphql_body_is_generic() {
    let addr = spawn_upstream().await;

    let err = source(addr, "/garbage")
        .query(&get_user(), OperationOptions::new())
        .await
        .unwrap_err();

    let api = err.as_api().unwrap();
    assert_eq!(api.kind(), ApiErrorKind::Generic);
    assert_eq!(api.message(), "<html>not graphql</html>");
}

#[tokio::test]
async fn test_body_without_data_or_errors_is_generic() {
    let addr = spawn_upstream().await;

    let err = source(addr, "/empty")
        .query(&get_user(), OperationOptions::new())
        .await
        .unwrap_err();

    let api = err.as_api().unwrap();
    assert_eq!(api.kind(), ApiErrorKind::Generic);
    assert_eq!(api.message(), "{}");
    assert_eq!(api.status_code(), Some(200));
}

#[tokio::test]
async fn test_null_data_is_passed_through() {
    let addr = spawn_upstream().await;

    let response = source(addr, "/null-data")
        .query(&get_user(), OperationOptions::new())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"data": null, "errors": [{"message": "boom"}], "hasNext": false})
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_generic_with_empty_message() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    let err = source(addr, "/graphql")
        .query(&get_user(), OperationOptions::new())
        .await
        .unwrap_err();

    let api = err.as_api().unwrap();
    assert_eq!(api.kind(), ApiErrorKind::Generic);
    assert_eq!(api.message(), "");
    assert_eq!(api.status_code(), None);
}
