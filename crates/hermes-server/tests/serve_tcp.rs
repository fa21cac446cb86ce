//! Serving a dispatcher over a real socket.

use std::sync::Arc;
use std::time::Duration;

use hermes_core::{
    handler, ContractNode, DispatchOptions, Endpoint, Group, HandlerNode, HandlerResponse,
    HandlerResult, Request, Shape,
};
use hermes_dispatch::Dispatcher;
use hermes_server::{Server, ServerConfig, ShutdownSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn ping(request: Request) -> HandlerResult {
    Ok(HandlerResponse::ok(&serde_json::json!({"pong": request.body["ping"]})))
}

fn dispatcher() -> Arc<Dispatcher> {
    let contract: ContractNode = Group::new()
        .leaf(
            "ping",
            Endpoint::post("/ping")
                .body(Shape::object([("ping", Shape::string())]))
                .build(),
        )
        .into();
    let handlers: HandlerNode = Group::new().leaf("ping", handler(ping)).into();
    Arc::new(Dispatcher::new(contract, handlers, DispatchOptions::new()).unwrap())
}

/// Sends one raw HTTP/1.1 request and returns the raw response.
async fn roundtrip(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn start() -> (std::net::SocketAddr, ShutdownSignal, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();

    let config = ServerConfig::builder()
        .keep_alive(false)
        .shutdown_timeout(Duration::from_secs(1))
        .build();
    let server = Server::new(config, dispatcher());
    let signal = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.serve(listener, signal).await.unwrap();
    });

    (addr, shutdown, handle)
}

#[tokio::test]
async fn test_serves_dispatcher_over_tcp() {
    let (addr, shutdown, handle) = start().await;

    let body = r#"{"ping":"hello"}"#;
    let response = roundtrip(
        addr,
        &format!(
            "POST /ping HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("x-request-id:"));
    assert!(response.ends_with(r#"{"pong":"hello"}"#));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_validation_failure_over_tcp() {
    let (addr, shutdown, handle) = start().await;

    let response = roundtrip(
        addr,
        "POST /ping HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 400"), "{response}");
    assert!(response.contains(r#""bodyErrors":{"issues""#));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_health_over_tcp() {
    let (addr, shutdown, handle) = start().await;

    let response = roundtrip(
        addr,
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains(r#""status":"healthy""#));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_bind_error_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let server = Server::new(
        ServerConfig::builder().http_addr(addr.to_string()).build(),
        dispatcher(),
    );
    let error = server
        .run_with_shutdown(ShutdownSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(error, hermes_server::ServerError::Bind { .. }));
}
