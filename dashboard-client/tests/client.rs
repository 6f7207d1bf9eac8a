use std::time::Duration;

use http::Method;
use serde::{Deserialize, Serialize};
use wiremock::matchers::{body_string_contains, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashboard_client::{
    api_call, ApiError, ApiPathBuilder, Client, ClientConfig, HttpApiClient, MultipartForm,
    RequestBody,
};

#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct Partner {
    id: String,
    name: String,
}

fn client_for(server: &MockServer) -> Client {
    let mut config = ClientConfig::new(server.uri().parse().unwrap());
    config.timeout = Some(Duration::from_millis(500));
    Client::new(config)
}

#[tokio::test]
async fn get_returns_envelope_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mitra"))
        .and(query_param("search", "acme co"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "ok",
            "data": [{ "id": "m1", "name": "Acme Co" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let path = ApiPathBuilder::resource("mitra")
        .arg("search", "acme co")
        .build();
    let partners: Vec<Partner> = api_call(&client, Method::GET, &path, RequestBody::Empty)
        .await
        .unwrap();

    assert_eq!(
        partners,
        vec![Partner {
            id: "m1".into(),
            name: "Acme Co".into()
        }]
    );
}

#[tokio::test]
async fn rejected_request_keeps_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mitra"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "success": false,
            "message": "name is required"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = RequestBody::json(&serde_json::json!({ "name": "" })).unwrap();
    let err = api_call::<Partner, _>(&client, Method::POST, "/api/mitra", body)
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::new(422, "name is required"));
}

#[tokio::test]
async fn multipart_upload_sets_boundary_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/articles/upload"))
        .and(header_regex(
            "content-type",
            "^multipart/form-data; boundary=----dashboard-form-[0-9a-f]{32}$",
        ))
        .and(body_string_contains("name=\"image\"; filename=\"cover.png\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "success": true,
            "message": "uploaded",
            "data": { "url": "/uploads/cover.png" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let form = MultipartForm::new().file("image", "cover.png", "image/png", b"png".to_vec());
    let data: serde_json::Value = api_call(
        &client,
        Method::POST,
        "/api/articles/upload",
        RequestBody::from(form),
    )
    .await
    .unwrap();

    assert_eq!(data["url"], "/uploads/cover.png");
}

#[tokio::test]
async fn session_cookies_are_replayed_and_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/sign-in"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "accessToken=a1; Path=/; HttpOnly")
                .append_header("set-cookie", "refreshToken=r1; Path=/; HttpOnly")
                .set_body_json(serde_json::json!({ "success": true, "message": "signed in" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("cookie", "accessToken=a1; refreshToken=r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "ok",
            "data": { "id": "u1", "name": "Admin" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/sign-out"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "accessToken=; Path=/; Max-Age=0")
                .append_header(
                    "set-cookie",
                    "refreshToken=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
                )
                .set_body_json(serde_json::json!({ "success": true, "message": "bye" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);

    client
        .post("/api/auth/sign-in", RequestBody::Empty)
        .await
        .unwrap()
        .nodata()
        .unwrap();
    assert_eq!(client.session().access_token(), Some("a1"));

    let me: Partner = api_call(&client, Method::GET, "/api/users/me", RequestBody::Empty)
        .await
        .unwrap();
    assert_eq!(me.id, "u1");

    client
        .post("/api/auth/sign-out", RequestBody::Empty)
        .await
        .unwrap()
        .nodata()
        .unwrap();
    assert!(!client.session().is_signed_in());
}

#[tokio::test]
async fn unreachable_proxy_is_a_transport_error() {
    // reserve a port and close it again, nothing listens there afterwards
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = ClientConfig::new(format!("http://{addr}").parse().unwrap());
    config.timeout = Some(Duration::from_millis(500));
    let client = Client::new(config);

    let err = api_call::<Partner, _>(&client, Method::GET, "/api/mitra", RequestBody::Empty)
        .await
        .unwrap_err();

    assert!(err.is_transport(), "unexpected error {err:?}");
    assert!(err.message.starts_with("request failed"));
    assert!(err.message.to_lowercase().contains("refused"), "{}", err.message);
}

#[tokio::test]
async fn slow_proxy_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/courses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(serde_json::json!({ "success": true, "message": "ok" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get("/api/courses").await.unwrap_err();

    assert_eq!(err, ApiError::new(0, "request timed out"));
}
