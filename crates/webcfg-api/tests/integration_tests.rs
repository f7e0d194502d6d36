//! # Integration Tests for webcfg-api
//!
//! Drives the full router with `tower::ServiceExt::oneshot`: reference
//! CRUD, subdocument links, config aggregation and negotiation, device
//! query params, poke validation, and the supplementary telemetry bundle
//! against wiremock upstreams.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webcfg_api::{AppConfig, AppState};
use webcfg_core::multipart;
use webcfg_store::MemoryBackend;

const MAC: &str = "b4f2e82c0a4e";

/// Helper: build the app with the given upstream endpoints.
fn app_with(config: AppConfig) -> axum::Router {
    app_with_timeout(config, Duration::from_secs(5))
}

fn app_with_timeout(config: AppConfig, timeout: Duration) -> axum::Router {
    let state = AppState::new(&config, Arc::new(MemoryBackend::new())).unwrap();
    webcfg_api::app(state, timeout)
}

/// Helper: build the app with unreachable upstreams.
fn test_app() -> axum::Router {
    app_with(AppConfig::local("http://127.0.0.1:1", None).unwrap())
}

async fn send(app: &axum::Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn header(response: &Response<Body>, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn inline(bytes: &[u8]) -> Vec<u8> {
    [&[0u8, 0, 0, 1][..], bytes].concat()
}

fn reference(ref_id: &str) -> Vec<u8> {
    [&[0u8, 0, 0, 0][..], ref_id.as_bytes()].concat()
}

fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

fn config_request(group: &str, tokens: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/device/{MAC}/config?group_id={group}"));
    if let Some(tokens) = tokens {
        builder = builder.header("If-None-Match", tokens);
    }
    builder.body(Body::empty()).unwrap()
}

async fn put_reference(app: &axum::Router, ref_id: &str, bytes: &[u8]) {
    let resp = send(
        app,
        request("POST", &format!("/api/v1/reference/{ref_id}/document"), bytes.to_vec()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn link(app: &axum::Router, subdoc: &str, body: Vec<u8>) -> String {
    let resp = send(
        app,
        request("POST", &format!("/api/v1/device/{MAC}/document/{subdoc}"), body),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    header(&resp, "etag")
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let resp = send(&test_app(), request("GET", "/health/liveness", Body::empty())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let resp = send(&test_app(), request("GET", "/health/readiness", Body::empty())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"ready");
}

// -- Reference Documents ------------------------------------------------------

#[tokio::test]
async fn reference_round_trip_is_byte_exact() {
    let app = test_app();
    let blob = vec![0x00, 0xff, 0x80, 0x0d, 0x0a, 0x2d, 0x2d];
    put_reference(&app, "ref-bin", &blob).await;

    let resp = send(&app, request("GET", "/api/v1/reference/ref-bin/document", Body::empty())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!header(&resp, "etag").is_empty());
    assert_eq!(body_bytes(resp).await, blob);
}

#[tokio::test]
async fn reference_delete_then_get_is_404() {
    let app = test_app();
    put_reference(&app, "r1", b"one").await;
    put_reference(&app, "r2", b"two").await;

    let uri = "/api/v1/reference/r1/document";
    assert_eq!(send(&app, request("DELETE", uri, Body::empty())).await.status(), StatusCode::OK);
    assert_eq!(send(&app, request("GET", uri, Body::empty())).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(send(&app, request("DELETE", uri, Body::empty())).await.status(), StatusCode::OK);

    let resp = send(&app, request("GET", "/api/v1/reference/r2/document", Body::empty())).await;
    assert_eq!(body_bytes(resp).await, b"two");
}

#[tokio::test]
async fn missing_reference_has_error_body() {
    let resp = send(
        &test_app(),
        request("GET", "/api/v1/reference/nope/document", Body::empty()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// -- Subdocument Links ----------------------------------------------------------

#[tokio::test]
async fn link_rejects_bad_input() {
    let app = test_app();
    let cases = [
        ("/api/v1/device/XYZ/document/lan", inline(b"x")),
        ("/api/v1/device/b4f2e82c0a4e/document/notasubdoc", inline(b"x")),
        ("/api/v1/device/b4f2e82c0a4e/document/root", inline(b"x")),
        ("/api/v1/device/b4f2e82c0a4e/document/lan", vec![0, 0]),
        ("/api/v1/device/b4f2e82c0a4e/document/lan", vec![9, 9, 9, 9, 1]),
        ("/api/v1/device/b4f2e82c0a4e/document/lan", vec![0, 0, 0, 0]),
    ];
    for (uri, body) in cases {
        let resp = send(&app, request("POST", uri, body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn subdocument_get_and_unlink() {
    let app = test_app();
    let version = link(&app, "lan", inline(b"\x81\xa3lan\x01")).await;
    let uri = format!("/api/v1/device/{MAC}/document/lan");

    let resp = send(&app, request("GET", &uri, Body::empty())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "etag"), version);
    assert_eq!(body_bytes(resp).await, b"\x81\xa3lan\x01");

    assert_eq!(send(&app, request("DELETE", &uri, Body::empty())).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, request("GET", &uri, Body::empty())).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn dangling_subdocument_get_is_404() {
    let app = test_app();
    link(&app, "defaultrfc", reference("missing")).await;
    let resp = send(
        &app,
        request("GET", &format!("/api/v1/device/{MAC}/document/defaultrfc"), Body::empty()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// -- Config Aggregation ---------------------------------------------------------

#[tokio::test]
async fn end_to_end_config_skips_dangling_reference() {
    let app = test_app();
    put_reference(&app, "R", b"X-bytes").await;
    put_reference(&app, "S", &[0x92, 0x00, 0xff]).await;
    link(&app, "defaultrfc", reference("R")).await;
    link(&app, "defaulttelemetry", reference("S")).await;
    link(&app, "defaultdcm", reference("does-not-exist")).await;

    let resp = send(
        &app,
        config_request("root,defaultrfc,defaulttelemetry,defaultdcm", Some("0,0,0,0")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = header(&resp, "content-type");
    assert!(content_type.starts_with("multipart/mixed; boundary="));
    assert!(!header(&resp, "etag").is_empty());

    let parts = multipart::decode(&content_type, &body_bytes(resp).await).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts["defaultrfc"].bytes, b"X-bytes");
    assert_eq!(parts["defaulttelemetry"].bytes, vec![0x92, 0x00, 0xff]);
}

#[tokio::test]
async fn dangling_reference_appears_once_created() {
    let app = test_app();
    link(&app, "defaultrfc", reference("late")).await;

    let resp = send(&app, config_request("root,defaultrfc", Some("0,0"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = header(&resp, "content-type");
    assert!(multipart::decode(&content_type, &body_bytes(resp).await)
        .unwrap()
        .is_empty());

    put_reference(&app, "late", b"now here").await;
    let resp = send(&app, config_request("root,defaultrfc", Some("0,0"))).await;
    let content_type = header(&resp, "content-type");
    let parts = multipart::decode(&content_type, &body_bytes(resp).await).unwrap();
    assert_eq!(parts["defaultrfc"].bytes, b"now here");
}

#[tokio::test]
async fn config_rejects_malformed_groups() {
    let app = test_app();
    let cases = [
        config_request("root,lan,wan", Some("0,0")),
        config_request("root,lan", None),
        config_request("lan,root", Some("0,0")),
        config_request("root,bogus", Some("0,0")),
        request("GET", &format!("/api/v1/device/{MAC}/config"), Body::empty()),
        config_request("root", Some("0")),
    ];
    let expected = [
        StatusCode::BAD_REQUEST,
        StatusCode::BAD_REQUEST,
        StatusCode::BAD_REQUEST,
        StatusCode::BAD_REQUEST,
        StatusCode::BAD_REQUEST,
        StatusCode::OK,
    ];
    for (req, want) in cases.into_iter().zip(expected) {
        let uri = req.uri().to_string();
        assert_eq!(send(&app, req).await.status(), want, "{uri}");
    }
}

#[tokio::test]
async fn config_not_modified_when_client_is_current() {
    let app = test_app();
    let v_lan = link(&app, "lan", inline(b"lan-bytes")).await;
    let v_wan = link(&app, "wan", inline(b"wan-bytes")).await;

    let resp = send(&app, config_request("root,lan,wan", Some("0,0,0"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let root = header(&resp, "etag");

    let tokens = format!("{root},{v_lan},{v_wan}");
    let resp = send(&app, config_request("root,lan,wan", Some(&tokens))).await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(header(&resp, "etag"), root);
    assert!(body_bytes(resp).await.is_empty());

    // One changed member returns the full present set.
    link(&app, "wan", inline(b"wan-bytes-v2")).await;
    let resp = send(&app, config_request("root,lan,wan", Some(&tokens))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = header(&resp, "content-type");
    let parts = multipart::decode(&content_type, &body_bytes(resp).await).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts["lan"].bytes, b"lan-bytes");
    assert_eq!(parts["wan"].bytes, b"wan-bytes-v2");
}

#[tokio::test]
async fn root_version_changes_when_membership_changes() {
    let app = test_app();
    link(&app, "lan", inline(b"lan-bytes")).await;
    let first = send(&app, config_request("root,lan,wan", Some("0,0,0"))).await;
    let root_before = header(&first, "etag");

    link(&app, "wan", inline(b"wan-bytes")).await;
    let second = send(&app, config_request("root,lan,wan", Some("0,0,0"))).await;
    assert_ne!(header(&second, "etag"), root_before);
}

// -- Device Query Params ----------------------------------------------------------

#[tokio::test]
async fn query_params_round_trip() {
    let app = test_app();
    let uri = format!("/api/v1/device/{MAC}/query_params");
    assert_eq!(
        send(&app, request("GET", &uri, Body::empty())).await.status(),
        StatusCode::NOT_FOUND
    );

    let resp = send(&app, request("PUT", &uri, "stormReadyWifi=true")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, request("GET", &uri, Body::empty())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"stormReadyWifi=true");
}

// -- Poke ---------------------------------------------------------------------------

#[tokio::test]
async fn poke_selects_action() {
    let app = test_app();
    let cases = [
        ("?doc=primary,telemetry", StatusCode::ACCEPTED, Some("primary,telemetry")),
        ("?route=mqtt", StatusCode::ACCEPTED, Some("mqtt")),
        ("?doc=telemetry&route=mqtt", StatusCode::ACCEPTED, Some("telemetry")),
        ("", StatusCode::ACCEPTED, Some("root")),
        ("?doc=primary,bogus", StatusCode::BAD_REQUEST, None),
        ("?route=carrier-pigeon", StatusCode::BAD_REQUEST, None),
    ];
    for (query, status, action) in cases {
        let resp = send(
            &app,
            request("POST", &format!("/api/v1/device/{MAC}/poke{query}"), Body::empty()),
        )
        .await;
        assert_eq!(resp.status(), status, "{query}");
        if let Some(action) = action {
            let body: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
            assert_eq!(body["action"], action);
            assert_eq!(body["mac"], "B4F2E82C0A4E");
        }
    }
}

// -- Request Context ----------------------------------------------------------------

#[tokio::test]
async fn audit_id_is_echoed_or_generated() {
    let app = test_app();
    let resp = send(
        &app,
        Request::builder()
            .uri("/api/v1/reference/any/document")
            .header("X-Auditid", "feedfacefeedfacefeedfacefeedface")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(header(&resp, "x-auditid"), "feedfacefeedfacefeedfacefeedface");

    let resp = send(&app, request("GET", "/api/v1/reference/any/document", Body::empty())).await;
    let generated = header(&resp, "x-auditid");
    assert_eq!(generated.len(), 32);
    assert!(generated.bytes().all(|b| b.is_ascii_hexdigit()));
}

// -- Supplementary ----------------------------------------------------------------

const XCONF_PATH: &str = "/loguploader/getTelemetryProfiles";

fn supplementary_request() -> Request<Body> {
    Request::builder()
        .uri(format!("/api/v1/device/{MAC}/supplementary"))
        .header("X-System-Telemetry-Profile-Version", "2.0")
        .header("X-System-Model-Name", "TG1682G")
        .header("X-System-PartnerID", "comcast")
        .header("X-System-AccountID", "1234567890")
        .header("X-System-Firmware-Version", "TG1682_3.14p9s6_PROD_sey")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn supplementary_merges_both_sources() {
    let xconf = MockServer::start().await;
    let profiles = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(XCONF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"profiles":[{"name":"A"}]}"#))
        .expect(1)
        .mount(&xconf)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/device/B4F2E82C0A4E/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"name":"B"}]"#))
        .expect(1)
        .mount(&profiles)
        .await;

    let app = app_with(AppConfig::local(&xconf.uri(), Some(&profiles.uri())).unwrap());
    let resp = send(
        &app,
        request("PUT", &format!("/api/v1/device/{MAC}/query_params"), "stormReadyWifi=true"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, supplementary_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!header(&resp, "etag").is_empty());
    let content_type = header(&resp, "content-type");
    let parts = multipart::decode(&content_type, &body_bytes(resp).await).unwrap();
    assert_eq!(parts.len(), 1);
    let telemetry: serde_json::Value = serde_json::from_slice(&parts["telemetry"].bytes).unwrap();
    assert_eq!(
        telemetry,
        serde_json::json!({"profiles": [{"name": "A"}, {"name": "B"}]})
    );
}

#[tokio::test]
async fn supplementary_primary_not_found_is_404_without_secondary() {
    let xconf = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&xconf)
        .await;

    let app = app_with(AppConfig::local(&xconf.uri(), None).unwrap());
    let resp = send(&app, supplementary_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn supplementary_upstream_failure_is_surfaced() {
    let xconf = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("secret detail"))
        .mount(&xconf)
        .await;

    let app = app_with(AppConfig::local(&xconf.uri(), None).unwrap());
    let resp = send(&app, supplementary_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(!body.contains("secret detail"));
}

#[tokio::test]
async fn supplementary_unreachable_upstream_is_bad_gateway() {
    let resp = send(&test_app(), supplementary_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn supplementary_rejects_bad_mac() {
    let resp = send(
        &test_app(),
        request("GET", "/api/v1/device/not-a-mac/supplementary", Body::empty()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// -- Large Bodies -------------------------------------------------------------------

#[tokio::test]
async fn large_reference_is_stored_without_limit() {
    let app = test_app();
    let blob = vec![0xAB; 3 * 1024 * 1024];
    put_reference(&app, "big", &blob).await;

    let resp = send(&app, request("GET", "/api/v1/reference/big/document", Body::empty())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, blob);
}

#[tokio::test]
async fn large_inline_link_is_accepted() {
    let app = test_app();
    let blob = vec![0x5A; 3 * 1024 * 1024];
    link(&app, "lan", inline(&blob)).await;

    let resp = send(
        &app,
        request("GET", &format!("/api/v1/device/{MAC}/document/lan"), Body::empty()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, blob);
}

#[tokio::test]
async fn other_routes_keep_the_default_limit() {
    let resp = send(
        &test_app(),
        request(
            "PUT",
            &format!("/api/v1/device/{MAC}/query_params"),
            vec![b'a'; 3 * 1024 * 1024],
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// -- Request Timeout ----------------------------------------------------------------

const SHORT_TIMEOUT: Duration = Duration::from_millis(200);

#[tokio::test]
async fn slow_primary_times_out_promptly() {
    let xconf = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(XCONF_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"profiles":[]}"#)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&xconf)
        .await;

    let app = app_with_timeout(AppConfig::local(&xconf.uri(), None).unwrap(), SHORT_TIMEOUT);
    let started = std::time::Instant::now();
    let resp = send(&app, supplementary_request()).await;
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn slow_secondary_yields_no_partial_bundle() {
    let xconf = MockServer::start().await;
    let profiles = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(XCONF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"profiles":[{"name":"A"}]}"#))
        .mount(&xconf)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/device/B4F2E82C0A4E/profiles"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{"name":"B"}]"#)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&profiles)
        .await;

    let app = app_with_timeout(
        AppConfig::local(&xconf.uri(), Some(&profiles.uri())).unwrap(),
        SHORT_TIMEOUT,
    );
    let resp = send(
        &app,
        request("PUT", &format!("/api/v1/device/{MAC}/query_params"), "stormReadyWifi=true"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let started = std::time::Instant::now();
    let resp = send(&app, supplementary_request()).await;
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(started.elapsed() < Duration::from_secs(2));
    let body = body_bytes(resp).await;
    assert!(!String::from_utf8_lossy(&body).contains("profiles"));
}
