//! # Integration Tests for ob-api
//!
//! Drives the assembled router: health probes, OpenAPI, and the full
//! path from a module to an activated environment state and an
//! announcement.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ob_api::state::AppState;
use ob_publication::report::{LVBB_NS, STOP_NS};

fn test_app() -> axum::Router {
    ob_api::app(AppState::new())
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn publication_report(delivery_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<lvbb:publicatieOpdrachtResultaat xmlns:lvbb="{LVBB_NS}" xmlns:stop="{STOP_NS}">
  <lvbb:uitkomst>succes</lvbb:uitkomst>
  <lvbb:verslag><lvbb:idLevering>{delivery_id}</lvbb:idLevering></lvbb:verslag>
  <stop:meldingen><stop:melding><stop:code>DL-0005</stop:code></stop:melding></stop:meldingen>
</lvbb:publicatieOpdrachtResultaat>"#
    )
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_openapi_served() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert!(spec["paths"]["/v1/act-packages/{id}/abort"].is_object());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (status, _) = send(&test_app(), "GET", "/v1/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/modules")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// -- Publication Flow ---------------------------------------------------------

#[tokio::test]
async fn test_module_to_published_state() {
    let app = test_app();

    // Environment with a state chain.
    let (status, environment) = send(
        &app,
        "POST",
        "/v1/environments",
        Some(json!({"title": "Pre-productie", "province_id": "pv28", "has_state": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let environment_id = environment["id"].as_str().unwrap().to_string();
    let initial_state = environment["active_state"].as_str().unwrap().to_string();

    // A module introduces one beleidskeuze and is completed.
    let (_, module) = send(&app, "POST", "/v1/modules", Some(json!({"title": "Zon"}))).await;
    let module_uri = format!("/v1/modules/{}", module["id"].as_str().unwrap());
    send(&app, "POST", &format!("{module_uri}/activate"), None).await;
    let (status, object) = send(
        &app,
        "POST",
        &format!("{module_uri}/objects"),
        Some(json!({
            "object_type": "beleidskeuze",
            "title": "Zon op dak",
            "text": "<p>Ruimte voor zon op daken.</p>",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = object["code"].as_str().unwrap().to_string();
    send(&app, "POST", &format!("{module_uri}/lock"), None).await;
    send(
        &app,
        "PATCH",
        &format!("{module_uri}/status"),
        Some(json!({"status": "Vastgesteld"})),
    )
    .await;
    let (status, completed) = send(&app, "POST", &format!("{module_uri}/complete"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["objects"].as_array().unwrap().len(), 1);

    // Act, publication and version.
    let (_, act) = send(
        &app,
        "POST",
        "/v1/acts",
        Some(json!({
            "environment_id": environment_id,
            "document_type": "omgevingsvisie",
            "procedure_type": "final",
            "title": "Omgevingsvisie",
        })),
    )
    .await;
    let (_, publication) = send(
        &app,
        "POST",
        "/v1/publications",
        Some(json!({
            "act_id": act["uuid"],
            "title": "Vaststelling omgevingsvisie",
            "template": format!("<object code=\"{code}\"/>"),
        })),
    )
    .await;
    let (status, version) = send(
        &app,
        "POST",
        &format!("/v1/publications/{}/versions", publication["uuid"].as_str().unwrap()),
        Some(json!({"effective_date": "2030-01-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let version_id = version["uuid"].as_str().unwrap().to_string();

    // Publication package locks the environment.
    let (status, created) = send(
        &app,
        "POST",
        &format!("/v1/versions/{version_id}/act-packages"),
        Some(json!({"package_type": "Publication"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let package_id = created["package_uuid"].as_str().unwrap().to_string();

    let (_, locked) = send(&app, "GET", &format!("/v1/environments/{environment_id}"), None).await;
    assert_eq!(locked["is_locked"], true);

    // A valid report activates the new state.
    let (_, package) = send(&app, "GET", &format!("/v1/act-packages/{package_id}"), None).await;
    assert_eq!(package["report_status"], "pending");
    let delivery_id = package["delivery_id"].as_str().unwrap();
    let (status, upload) = send(
        &app,
        "POST",
        &format!("/v1/act-packages/{package_id}/report"),
        Some(json!({"files": [{"filename": "report.xml", "content": publication_report(delivery_id)}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upload["status"], "valid");

    let (_, released) = send(&app, "GET", &format!("/v1/environments/{environment_id}"), None).await;
    assert_eq!(released["is_locked"], false);
    assert_eq!(released["active_state"], package["created_state"]);
    assert_ne!(released["active_state"].as_str().unwrap(), initial_state);

    let (status, active) = send(
        &app,
        "GET",
        &format!("/v1/environments/{environment_id}/active-state"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(active.is_object());

    let (_, states) = send(&app, "GET", &format!("/v1/environments/{environment_id}/states"), None).await;
    assert_eq!(states.as_array().unwrap().len(), 2);

    // The act now has its first expression.
    let (_, act) = send(&app, "GET", &format!("/v1/acts/{}", act["uuid"].as_str().unwrap()), None).await;
    assert_eq!(act["versions"].as_array().unwrap().len(), 1);

    // Announce it.
    let (status, announcement) = send(
        &app,
        "POST",
        &format!("/v1/act-packages/{package_id}/announcements"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        "POST",
        &format!("/v1/announcements/{}/packages", announcement["uuid"].as_str().unwrap()),
        Some(json!({"package_type": "Validation"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

/// Complete a module creating one object per title; returns the codes.
async fn complete_module(app: &axum::Router, titles: &[&str]) -> Vec<String> {
    let (_, module) = send(app, "POST", "/v1/modules", Some(json!({"title": "Module"}))).await;
    let module_uri = format!("/v1/modules/{}", module["id"].as_str().unwrap());
    send(app, "POST", &format!("{module_uri}/activate"), None).await;
    let mut codes = Vec::new();
    for title in titles {
        let (_, object) = send(
            app,
            "POST",
            &format!("{module_uri}/objects"),
            Some(json!({"object_type": "beleidskeuze", "title": title})),
        )
        .await;
        codes.push(object["code"].as_str().unwrap().to_string());
    }
    send(app, "POST", &format!("{module_uri}/lock"), None).await;
    send(
        app,
        "PATCH",
        &format!("{module_uri}/status"),
        Some(json!({"status": "Vastgesteld"})),
    )
    .await;
    let (status, _) = send(app, "POST", &format!("{module_uri}/complete"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    codes
}

#[tokio::test]
async fn test_object_missing_from_template_returns_441() {
    let app = test_app();
    let codes = complete_module(&app, &["Zon op dak", "Wind op land"]).await;

    let (_, environment) = send(
        &app,
        "POST",
        "/v1/environments",
        Some(json!({"title": "Pre-productie", "province_id": "pv28", "has_state": true})),
    )
    .await;
    let (_, act) = send(
        &app,
        "POST",
        "/v1/acts",
        Some(json!({
            "environment_id": environment["id"],
            "document_type": "programma",
            "procedure_type": "draft",
            "title": "Programma",
        })),
    )
    .await;
    let (_, publication) = send(
        &app,
        "POST",
        "/v1/publications",
        Some(json!({
            "act_id": act["uuid"],
            "title": "Ontwerp programma",
            "template": format!("<object code=\"{}\"/>", codes[0]),
        })),
    )
    .await;
    let (_, version) = send(
        &app,
        "POST",
        &format!("/v1/publications/{}/versions", publication["uuid"].as_str().unwrap()),
        Some(json!({})),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/versions/{}/act-packages", version["uuid"].as_str().unwrap()),
        Some(json!({"package_type": "Validation"})),
    )
    .await;
    assert_eq!(status.as_u16(), 441);
    assert_eq!(body["error"]["code"], "PUBLICATION_INPUT_ERROR");
    assert_eq!(body["error"]["details"][0]["rule"], "used_objects_exist_rule");

    let (_, environment) = send(
        &app,
        "GET",
        &format!("/v1/environments/{}", environment["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(environment["is_locked"], false);
}

/// Create a version of `publication_id`, publish it and settle the package
/// valid. Returns the package record.
async fn publish_version(app: &axum::Router, publication_id: &str) -> Value {
    let (status, version) = send(
        app,
        "POST",
        &format!("/v1/publications/{publication_id}/versions"),
        Some(json!({"effective_date": "2030-01-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, created) = send(
        app,
        "POST",
        &format!("/v1/versions/{}/act-packages", version["uuid"].as_str().unwrap()),
        Some(json!({"package_type": "Publication"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let package_id = created["package_uuid"].as_str().unwrap();
    let (_, package) = send(app, "GET", &format!("/v1/act-packages/{package_id}"), None).await;
    let (status, upload) = send(
        app,
        "POST",
        &format!("/v1/act-packages/{package_id}/report"),
        Some(json!({"files": [{
            "filename": "report.xml",
            "content": publication_report(package["delivery_id"].as_str().unwrap()),
        }]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upload["status"], "valid");
    package
}

#[tokio::test]
async fn test_unchanged_werkingsgebied_keeps_identity_across_publications() {
    let app = test_app();

    let (_, module) = send(&app, "POST", "/v1/modules", Some(json!({"title": "Zon"}))).await;
    let module_uri = format!("/v1/modules/{}", module["id"].as_str().unwrap());
    send(&app, "POST", &format!("{module_uri}/activate"), None).await;
    let (status, gebied) = send(
        &app,
        "POST",
        &format!("{module_uri}/objects"),
        Some(json!({
            "object_type": "werkingsgebied",
            "title": "Zonnegebied",
            "area": {
                "uuid": "0d5b3f5e-7d7c-4a53-9c43-3f8d3cbb2c11",
                "title": "Zonnegebied",
                "gml": "<gml:Polygon/>",
            },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let gebied_code = gebied["code"].as_str().unwrap().to_string();
    let (_, keuze) = send(
        &app,
        "POST",
        &format!("{module_uri}/objects"),
        Some(json!({
            "object_type": "beleidskeuze",
            "title": "Zon op dak",
            "text": "<p>Ruimte voor zon op daken.</p>",
            "werkingsgebied_code": gebied_code,
        })),
    )
    .await;
    send(&app, "POST", &format!("{module_uri}/lock"), None).await;
    send(
        &app,
        "PATCH",
        &format!("{module_uri}/status"),
        Some(json!({"status": "Vastgesteld"})),
    )
    .await;
    let (status, _) = send(&app, "POST", &format!("{module_uri}/complete"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, environment) = send(
        &app,
        "POST",
        "/v1/environments",
        Some(json!({"title": "Pre-productie", "province_id": "pv28", "has_state": true})),
    )
    .await;
    let environment_id = environment["id"].as_str().unwrap().to_string();
    let (_, act) = send(
        &app,
        "POST",
        "/v1/acts",
        Some(json!({
            "environment_id": environment_id,
            "document_type": "omgevingsvisie",
            "procedure_type": "final",
            "title": "Omgevingsvisie",
        })),
    )
    .await;
    let (_, publication) = send(
        &app,
        "POST",
        "/v1/publications",
        Some(json!({
            "act_id": act["uuid"],
            "title": "Vaststelling omgevingsvisie",
            "template": format!("<object code=\"{}\"/>", keuze["code"].as_str().unwrap()),
        })),
    )
    .await;
    let publication_id = publication["uuid"].as_str().unwrap().to_string();
    let active_state = format!("/v1/environments/{environment_id}/active-state");

    publish_version(&app, &publication_id).await;
    let (_, first) = send(&app, "GET", &active_state, None).await;
    let first_act = &first["Acts"]["omgevingsvisie-final"];
    let first_gebied = first_act["Werkingsgebieden"]["1"].clone();
    assert!(first_gebied.is_object());

    publish_version(&app, &publication_id).await;
    let (_, second) = send(&app, "GET", &active_state, None).await;
    let second_act = &second["Acts"]["omgevingsvisie-final"];
    let second_gebied = &second_act["Werkingsgebieden"]["1"];

    assert_eq!(first_act["Act_Frbr"]["Expression_Version"], 1);
    assert_eq!(second_act["Act_Frbr"]["Expression_Version"], 2);
    assert_eq!(second_gebied["UUID"], first_gebied["UUID"]);
    assert_eq!(second_gebied["Identifier"], first_gebied["Identifier"]);
    assert_eq!(second_gebied["Frbr"], first_gebied["Frbr"]);
}
