//! End-to-end pipeline tests: one contract, one implementation, requests in,
//! wire responses out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http::{header, Method, StatusCode};
use serde_json::{json, Value};

use hermes_core::{Contract, RouteError, RouteLeaf};
use hermes_schema::Schema;
use hermes_server::{
    handler_fn, middleware_fn, CorsConfig, CorsOrigin, HandlerResponse, ImplRouter,
    MiddlewareOutcome, PipelineError, ResponseBody, Router, RouterOptions, ServerRequest,
    ServerResponse,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn blog_contract() -> Contract {
    let posts = Contract::builder()
        .route(
            "listPosts",
            RouteLeaf::get("/posts")
                .query(Schema::object([
                    ("skip", Schema::integer()),
                    ("take", Schema::integer().optional()),
                ]))
                .response(
                    200,
                    Schema::object([("skip", Schema::integer())]),
                )
                .build(),
        )
        .route(
            "getPost",
            RouteLeaf::get("/posts/:id")
                .response(200, Schema::object([("id", Schema::string())]))
                .build(),
        )
        .route(
            "getMyPosts",
            RouteLeaf::get("/posts/mine")
                .response(200, Schema::object([("mine", Schema::boolean())]))
                .build(),
        )
        .route(
            "createPost",
            RouteLeaf::post("/posts")
                .headers(Schema::object([("x-api-key", Schema::string())]))
                .body(Schema::object([("title", Schema::string())]))
                .response(201, Schema::object([("id", Schema::string())]))
                .build(),
        )
        .build();

    Contract::builder()
        .router("posts", posts)
        .route("health", RouteLeaf::get("/health").no_body_response(204).build())
        .route(
            "ping",
            RouteLeaf::get("/ping").other_response(200, "text/plain").build(),
        )
        .route(
            "broken",
            RouteLeaf::get("/broken")
                .response(200, Schema::object([("id", Schema::string())]))
                .build(),
        )
        .route("boom", RouteLeaf::get("/boom").response(200, Schema::any()).build())
        .build()
}

fn blog_implementation() -> ImplRouter {
    let posts = ImplRouter::new()
        .handler(
            "listPosts",
            handler_fn(|request, _ctx| async move {
                Ok(HandlerResponse::json(
                    StatusCode::OK,
                    json!({"skip": request.query["skip"]}),
                ))
            }),
        )
        .handler(
            "getPost",
            handler_fn(|request, _ctx| async move {
                Ok(HandlerResponse::json(
                    StatusCode::OK,
                    json!({"id": request.params["id"]}),
                ))
            }),
        )
        .handler(
            "getMyPosts",
            handler_fn(|_request, _ctx| async move {
                Ok(HandlerResponse::json(StatusCode::OK, json!({"mine": true})))
            }),
        )
        .handler(
            "createPost",
            handler_fn(|request, ctx| async move {
                ctx.response_headers().set(header::LOCATION, "/posts/new-1");
                Ok(HandlerResponse::json(
                    StatusCode::CREATED,
                    json!({"id": "new-1", "title": request.body["title"]}),
                ))
            }),
        );

    ImplRouter::new()
        .router("posts", posts)
        .handler(
            "health",
            handler_fn(|_request, _ctx| async move {
                Ok(HandlerResponse::json(StatusCode::NO_CONTENT, Value::Null))
            }),
        )
        .handler(
            "ping",
            handler_fn(|_request, _ctx| async move {
                Ok(HandlerResponse::json(StatusCode::OK, json!("pong")))
            }),
        )
        .handler(
            "broken",
            handler_fn(|_request, _ctx| async move {
                // Violates the declared schema: id must be a string.
                Ok(HandlerResponse::json(StatusCode::OK, json!({"id": 7})))
            }),
        )
        .handler(
            "boom",
            handler_fn(|_request, _ctx| async move {
                Err(RouteError::unexpected(anyhow::anyhow!("disk on fire")))
            }),
        )
}

fn router(options: RouterOptions) -> Router {
    init_tracing();
    Router::bind(&blog_contract(), blog_implementation(), options).unwrap()
}

fn default_router() -> Router {
    router(RouterOptions::new().json_query().validate_responses())
}

#[tokio::test]
async fn test_happy_path_with_params() {
    let response = default_router()
        .handle(ServerRequest::get("/posts/42").build())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), &ResponseBody::Json(json!({"id": "42"})));
}

#[tokio::test]
async fn test_json_query_types_survive() {
    let response = default_router()
        .handle(ServerRequest::get("/posts?skip=5").build())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), &ResponseBody::Json(json!({"skip": 5})));
}

#[tokio::test]
async fn test_literal_segment_wins_over_param() {
    let response = default_router()
        .handle(ServerRequest::get("/posts/mine").build())
        .await;
    assert_eq!(response.body(), &ResponseBody::Json(json!({"mine": true})));
}

#[tokio::test]
async fn test_unmatched_request_gets_fixed_404() {
    let response = default_router()
        .handle(ServerRequest::get("/nowhere").build())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.body(),
        &ResponseBody::Json(json!({"message": "Not Found"}))
    );
}

#[tokio::test]
async fn test_method_mismatch_is_404() {
    let response = default_router()
        .handle(ServerRequest::builder(Method::DELETE, "/posts/42").build())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_failure_aggregates_parts() {
    // Missing header, bad query type, missing body field.
    let response = default_router()
        .handle(
            ServerRequest::post("/posts?skip=oops")
                .json_body(&json!({}))
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let ResponseBody::Json(body) = response.body() else {
        panic!("expected a JSON body");
    };
    assert!(body["params"].is_null());
    assert!(body["headers"].is_object());
    assert!(body["body"].is_object());
}

#[tokio::test]
async fn test_valid_mutation_with_response_headers() {
    let response = default_router()
        .handle(
            ServerRequest::post("/posts")
                .header("x-api-key", "secret")
                .json_body(&json!({"title": "hello"}))
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/posts/new-1");
    // The declared 201 schema strips the undeclared title echo.
    assert_eq!(response.body(), &ResponseBody::Json(json!({"id": "new-1"})));
}

#[tokio::test]
async fn test_no_body_response() {
    let response = default_router()
        .handle(ServerRequest::get("/health").build())
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.body(), &ResponseBody::None);
}

#[tokio::test]
async fn test_text_response_uses_declared_content_type() {
    let response = default_router()
        .handle(ServerRequest::get("/ping").build())
        .await;
    assert_eq!(response.body(), &ResponseBody::Text("pong".to_string()));
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
}

#[tokio::test]
async fn test_invalid_response_body_never_leaks() {
    let response = default_router()
        .handle(ServerRequest::get("/broken").build())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body(),
        &ResponseBody::Json(json!({"message": "Server Error"}))
    );
}

#[tokio::test]
async fn test_response_validation_off_passes_body_through() {
    let lenient = router(RouterOptions::new());
    let response = lenient.handle(ServerRequest::get("/broken").build()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), &ResponseBody::Json(json!({"id": 7})));
}

#[tokio::test]
async fn test_response_validation_off_still_drops_no_body_payload() {
    init_tracing();
    let contract = Contract::builder()
        .route("purge", RouteLeaf::delete("/cache").no_body_response(200).build())
        .build();
    let implementation = ImplRouter::new().handler(
        "purge",
        handler_fn(|_request, _ctx| async move {
            Ok(HandlerResponse::json(StatusCode::OK, json!({"leak": true})))
        }),
    );
    let lenient = Router::bind(&contract, implementation, RouterOptions::new()).unwrap();

    let response = lenient
        .handle(ServerRequest::builder(Method::DELETE, "/cache").build())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), &ResponseBody::None);
}

#[tokio::test]
async fn test_response_validation_off_still_shapes_declared_text() {
    let lenient = router(RouterOptions::new());
    let response = lenient.handle(ServerRequest::get("/ping").build()).await;
    assert_eq!(response.body(), &ResponseBody::Text("pong".to_string()));
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain"
    );
}

#[tokio::test]
async fn test_unexpected_handler_error_is_generic_500() {
    let response = default_router()
        .handle(ServerRequest::get("/boom").build())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body(),
        &ResponseBody::Json(json!({"message": "Server Error"}))
    );
}

#[tokio::test]
async fn test_error_hook_overrides_default() {
    let hooked = router(
        RouterOptions::new()
            .validate_responses()
            .error_hook(Arc::new(|error, _request| match error {
                PipelineError::Route(RouteError::Unexpected(_)) => Some(ServerResponse::json(
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({"message": "try later"}),
                )),
                _ => None,
            })),
    );

    let response = hooked.handle(ServerRequest::get("/boom").build()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // The hook declined the 404, so the default shape still applies.
    let response = hooked.handle(ServerRequest::get("/nowhere").build()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_base_path_mount() {
    let mounted = Router::bind(
        &blog_contract(),
        blog_implementation(),
        RouterOptions::new().base_path("/api/v1").json_query(),
    )
    .unwrap();

    let response = mounted
        .handle(ServerRequest::get("/api/v1/posts/42").build())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_outside_base_path_is_server_error() {
    let mounted = Router::bind(
        &blog_contract(),
        blog_implementation(),
        RouterOptions::new().base_path("/api/v1"),
    )
    .unwrap();

    let response = mounted
        .handle(ServerRequest::get("/elsewhere/posts/42").build())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body(),
        &ResponseBody::Json(json!({"message": "Server Error"}))
    );
}

#[tokio::test]
async fn test_global_middleware_short_circuits() {
    let counted = Arc::new(AtomicUsize::new(0));
    let seen = counted.clone();
    let guarded = router(RouterOptions::new().middleware(middleware_fn(move |request| {
        seen.fetch_add(1, Ordering::SeqCst);
        async move {
            let authorized = request
                .header(&header::AUTHORIZATION)
                .is_some_and(|value| value == "Bearer token");
            if authorized {
                Ok(MiddlewareOutcome::Continue(request))
            } else {
                Ok(MiddlewareOutcome::Respond(ServerResponse::json(
                    StatusCode::UNAUTHORIZED,
                    json!({"message": "unauthorized"}),
                )))
            }
        }
    })));

    let denied = guarded.handle(ServerRequest::get("/health").build()).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let allowed = guarded
        .handle(
            ServerRequest::get("/health")
                .header("authorization", "Bearer token")
                .build(),
        )
        .await;
    assert_eq!(allowed.status(), StatusCode::NO_CONTENT);
    assert_eq!(counted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_route_middleware_runs_after_matching() {
    let contract = Contract::builder()
        .route("health", RouteLeaf::get("/health").no_body_response(204).build())
        .build();
    let implementation = ImplRouter::new().route(
        "health",
        handler_fn(|_request, _ctx| async move {
            Ok(HandlerResponse::json(StatusCode::NO_CONTENT, Value::Null))
        }),
        vec![middleware_fn(|_request| async move {
            Ok(MiddlewareOutcome::Respond(ServerResponse::json(
                StatusCode::TOO_MANY_REQUESTS,
                json!({"message": "slow down"}),
            )))
        })],
    );
    let limited = Router::bind(&contract, implementation, RouterOptions::new()).unwrap();

    let response = limited.handle(ServerRequest::get("/health").build()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Unmatched paths never reach the route middleware.
    let response = limited.handle(ServerRequest::get("/other").build()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preflight_short_circuits_routing() {
    let cors = router(RouterOptions::new().cors(CorsConfig::new()));
    let response = cors
        .handle(
            ServerRequest::builder(Method::OPTIONS, "/posts")
                .header("origin", "https://a.dev")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type")
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .unwrap(),
        "content-type"
    );
    // Applied once by the preflight branch, not again on the way out.
    assert_eq!(
        response
            .headers()
            .get_all(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .iter()
            .count(),
        1
    );
}

#[tokio::test]
async fn test_preflight_never_runs_handler_side_effects() {
    let invoked = Arc::new(AtomicUsize::new(0));
    let counter = invoked.clone();

    let contract = Contract::builder()
        .route(
            "createPost",
            RouteLeaf::post("/posts").response(201, Schema::any()).build(),
        )
        .build();
    let implementation = ImplRouter::new().handler(
        "createPost",
        handler_fn(move |_request, _ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(HandlerResponse::json(StatusCode::CREATED, json!({})))
            }
        }),
    );
    let cors = Router::bind(
        &contract,
        implementation,
        RouterOptions::new().cors(CorsConfig::new()),
    )
    .unwrap();

    cors.handle(
        ServerRequest::builder(Method::OPTIONS, "/posts")
            .header("origin", "https://a.dev")
            .header("access-control-request-method", "POST")
            .build(),
    )
    .await;
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_mutation_without_body_schema_accepts_any_body() {
    let contract = Contract::builder()
        .route(
            "ingest",
            RouteLeaf::post("/ingest").response(202, Schema::any()).build(),
        )
        .build();
    let implementation = ImplRouter::new().handler(
        "ingest",
        handler_fn(|request, _ctx| async move {
            Ok(HandlerResponse::json(StatusCode::ACCEPTED, request.body))
        }),
    );
    let router = Router::bind(&contract, implementation, RouterOptions::new()).unwrap();

    let response = router
        .handle(
            ServerRequest::post("/ingest")
                .json_body(&json!({"anything": ["goes", 1, null]}))
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let empty = router.handle(ServerRequest::post("/ingest").build()).await;
    assert_eq!(empty.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_routed_responses_are_corsified() {
    let cors = router(
        RouterOptions::new()
            .json_query()
            .cors(CorsConfig::new().origin(CorsOrigin::List(vec!["https://a.dev".to_string()]))),
    );
    let response = cors
        .handle(
            ServerRequest::get("/posts/42")
                .header("origin", "https://a.dev")
                .build(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://a.dev"
    );
    assert_eq!(response.headers().get(header::VARY).unwrap(), "Origin");
}

#[tokio::test]
async fn test_error_responses_are_corsified_too() {
    let cors = router(RouterOptions::new().cors(CorsConfig::new()));
    let response = cors.handle(ServerRequest::get("/nowhere").build()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_trailing_slash_tolerated() {
    let response = default_router()
        .handle(ServerRequest::get("/posts/42/").build())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_body_fails_validation() {
    let response = default_router()
        .handle(
            ServerRequest::post("/posts")
                .header("x-api-key", "secret")
                .header("content-type", "application/json")
                .body(&b"{not json"[..])
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
