//! Building and driving an application through the prelude.

use bytes::Bytes;
use hermes::prelude::*;

async fn greet(request: Request) -> HandlerResult {
    let name = request.params["name"].as_str().unwrap_or("stranger").to_string();
    Ok(HandlerResponse::ok(&serde_json::json!({ "greeting": format!("hello {name}") })))
}

fn app() -> App {
    let contract: ContractNode = Group::new()
        .prefix("/v1")
        .leaf(
            "greet",
            Endpoint::get("/greet/:name")
                .path_params(Shape::object([("name", Shape::string())]))
                .response(
                    StatusCode::OK,
                    ResponseSpec::new(Shape::object([("greeting", Shape::string())])),
                )
                .build(),
        )
        .into();
    let handlers: HandlerNode = Group::new().leaf("greet", handler(greet)).into();

    App::new(contract, handlers).options(|options| {
        options.hooks(Hooks::new().add(
            Phase::OnSend,
            hook_fn("tag", |_request, reply| {
                reply.header(
                    http::HeaderName::from_static("x-served-by"),
                    http::HeaderValue::from_static("hermes"),
                );
                Ok(())
            }),
        ))
    })
}

#[tokio::test]
async fn test_app_dispatches_through_global_hooks() {
    let dispatcher = app().dispatcher().unwrap();

    let request = http::Request::builder()
        .method("GET")
        .uri("/v1/greet/ada")
        .body(Bytes::new())
        .unwrap();
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-served-by"], "hermes");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_app_unmatched_route() {
    let dispatcher = app().dispatcher().unwrap();

    let request = http::Request::builder()
        .method("GET")
        .uri("/v1/nowhere")
        .body(Bytes::new())
        .unwrap();
    let response = dispatcher.dispatch(request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!response.headers().contains_key("x-served-by"));
}
