//! Dispatcher tests over a recording mock transport.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::json;

use hermes_client::{
    BoxFuture, CallArgs, Client, ClientConfig, ClientError, MultipartContent, MultipartPart,
    Transport, TransportBody, TransportRequest, TransportResponse,
};
use hermes_core::{Contract, RouteLeaf};
use hermes_schema::Schema;

/// Records every request and replays a canned response.
struct MockTransport {
    requests: Mutex<Vec<TransportRequest>>,
    status: StatusCode,
    body: Bytes,
}

impl MockTransport {
    fn replying(status: StatusCode, body: &serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            status,
            body: Bytes::from(serde_json::to_vec(body).unwrap()),
        })
    }

    fn last_request(&self) -> TransportRequest {
        self.requests.lock().unwrap().last().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, ClientError>> {
        self.requests.lock().unwrap().push(request);
        let response = TransportResponse {
            status: self.status,
            headers: HeaderMap::new(),
            body: self.body.clone(),
        };
        Box::pin(async move { Ok(response) })
    }
}

fn blog_contract() -> Contract {
    let posts = Contract::builder()
        .route(
            "listPosts",
            RouteLeaf::get("/posts")
                .query(Schema::object([("skip", Schema::integer())]))
                .response(200, Schema::array(Schema::any()))
                .build(),
        )
        .route(
            "getPost",
            RouteLeaf::get("/posts/:id")
                .response(200, Schema::object([("id", Schema::string())]))
                .build(),
        )
        .route(
            "createPost",
            RouteLeaf::post("/posts")
                .body(Schema::object([("title", Schema::string())]))
                .response(201, Schema::object([("id", Schema::string())]))
                .build(),
        )
        .route(
            "uploadCover",
            RouteLeaf::post("/posts/:id/cover")
                .content_type("multipart/form-data")
                .response(200, Schema::any())
                .build(),
        )
        .build();

    Contract::builder().router("posts", posts).build()
}

fn client_over(transport: Arc<MockTransport>) -> Client {
    Client::with_transport(
        ClientConfig::new("https://api.example.com/").base_header("x-api-key", "secret"),
        transport,
    )
}

#[tokio::test]
async fn test_params_and_query_assemble_the_url() {
    let transport = MockTransport::replying(StatusCode::OK, &json!({"id": "42"}));
    let api = client_over(transport.clone()).bind(&blog_contract());

    api.call("posts.getPost", CallArgs::new().param("id", "42"))
        .await
        .unwrap();
    assert_eq!(
        transport.last_request().url,
        "https://api.example.com/posts/42"
    );

    api.call(
        "posts.listPosts",
        CallArgs::new().query(json!({"skip": 0, "tags": ["a", "b"]})),
    )
    .await
    .unwrap();
    let request = transport.last_request();
    assert_eq!(
        request.url,
        "https://api.example.com/posts?skip=0&tags%5B%5D=a&tags%5B%5D=b"
    );
    assert_eq!(request.method, Method::GET);
}

#[tokio::test]
async fn test_base_headers_sent_and_overridable() {
    let transport = MockTransport::replying(StatusCode::OK, &json!([]));
    let api = client_over(transport.clone()).bind(&blog_contract());

    api.call("posts.listPosts", CallArgs::new()).await.unwrap();
    assert_eq!(
        transport.last_request().headers.get("x-api-key").unwrap(),
        "secret"
    );

    api.call(
        "posts.listPosts",
        CallArgs::new().header("x-api-key", "override"),
    )
    .await
    .unwrap();
    assert_eq!(
        transport.last_request().headers.get("x-api-key").unwrap(),
        "override"
    );
}

#[tokio::test]
async fn test_get_routes_never_send_a_body() {
    let transport = MockTransport::replying(StatusCode::OK, &json!([]));
    let api = client_over(transport.clone()).bind(&blog_contract());

    api.call("posts.listPosts", CallArgs::new().json(json!({"sneaky": true})))
        .await
        .unwrap();
    assert!(matches!(transport.last_request().body, TransportBody::None));
}

#[tokio::test]
async fn test_mutation_sends_json_body() {
    let transport = MockTransport::replying(StatusCode::CREATED, &json!({"id": "new-1"}));
    let api = client_over(transport.clone()).bind(&blog_contract());

    api.call(
        "posts.createPost",
        CallArgs::new().json(json!({"title": "hello"})),
    )
    .await
    .unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::POST);
    assert!(
        matches!(request.body, TransportBody::Json(body) if body == json!({"title": "hello"}))
    );
}

#[tokio::test]
async fn test_multipart_route_converts_json_body_to_fields() {
    let transport = MockTransport::replying(StatusCode::OK, &json!({}));
    let api = client_over(transport.clone()).bind(&blog_contract());

    api.call(
        "posts.uploadCover",
        CallArgs::new()
            .param("id", "42")
            .json(json!({"caption": "sunset", "width": 800, "tags": ["a", "b"]})),
    )
    .await
    .unwrap();

    let TransportBody::Multipart(parts) = transport.last_request().body else {
        panic!("expected a multipart body");
    };
    // Each field carries its value as JSON text, arrays as one field.
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].name, "caption");
    assert!(matches!(&parts[0].content, MultipartContent::Text(text) if text == "\"sunset\""));
    assert_eq!(parts[1].name, "tags");
    assert!(matches!(&parts[1].content, MultipartContent::Text(text) if text == "[\"a\",\"b\"]"));
    assert_eq!(parts[2].name, "width");
    assert!(matches!(&parts[2].content, MultipartContent::Text(text) if text == "800"));
}

#[tokio::test]
async fn test_explicit_multipart_passes_through() {
    let transport = MockTransport::replying(StatusCode::OK, &json!({}));
    let api = client_over(transport.clone()).bind(&blog_contract());

    api.call(
        "posts.uploadCover",
        CallArgs::new().param("id", "42").multipart(vec![MultipartPart::file(
            "cover",
            &b"png-bytes"[..],
            "cover.png",
            "image/png",
        )]),
    )
    .await
    .unwrap();

    let TransportBody::Multipart(parts) = transport.last_request().body else {
        panic!("expected a multipart body");
    };
    assert!(matches!(
        &parts[0].content,
        MultipartContent::Bytes { file_name: Some(name), .. } if name == "cover.png"
    ));
}

#[tokio::test]
async fn test_unknown_key_path() {
    let transport = MockTransport::replying(StatusCode::OK, &json!({}));
    let api = client_over(transport).bind(&blog_contract());

    let error = api.call("posts.missing", CallArgs::new()).await.unwrap_err();
    assert!(matches!(
        error,
        ClientError::UnknownRoute { key_path } if key_path == "posts.missing"
    ));
}

#[tokio::test]
async fn test_response_validation_flags_contract_breach() {
    let transport = MockTransport::replying(StatusCode::OK, &json!({"id": 7}));
    let api = Client::with_transport(
        ClientConfig::new("https://api.example.com").validate_responses(),
        transport,
    )
    .bind(&blog_contract());

    let error = api
        .call("posts.getPost", CallArgs::new().param("id", "42"))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ClientError::ResponseValidation { status: 200, .. }
    ));
}

#[tokio::test]
async fn test_undeclared_status_skips_validation() {
    let transport = MockTransport::replying(StatusCode::BAD_GATEWAY, &json!({"whatever": 1}));
    let api = Client::with_transport(
        ClientConfig::new("https://api.example.com").validate_responses(),
        transport,
    )
    .bind(&blog_contract());

    let response = api
        .call("posts.getPost", CallArgs::new().param("id", "42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.json().unwrap(), json!({"whatever": 1}));
}
