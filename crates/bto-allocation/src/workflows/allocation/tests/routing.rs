use super::common::*;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::workflows::allocation::UnitCategory;

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("valid request")
}

fn submission(actor: &str, category: &str) -> Value {
    json!({
        "actor": actor,
        "project": ACACIA,
        "category": category,
        "on": "2025-02-20",
    })
}

#[tokio::test]
async fn submit_route_creates_pending_application() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/bto/applications",
            submission(MARRIED_40, "THREEROOM"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("PENDING"));
    assert_eq!(payload["category"], json!("THREEROOM"));
    assert_eq!(payload["applicant"], json!(MARRIED_40));
}

#[tokio::test]
async fn policy_denials_map_to_unprocessable_entity() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/bto/applications",
            submission(SINGLE_25, "TWOROOM"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], json!("ineligible_single"));
    assert_eq!(payload["kind"], json!("policy_denial"));
}

#[tokio::test]
async fn duplicate_application_maps_to_conflict() {
    let (service, _) = build_service();
    service
        .submit_application(&pid(MARRIED_40), &acacia(), UnitCategory::TwoRoom, today())
        .expect("first submission");
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/bto/applications",
            submission(MARRIED_40, "THREEROOM"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], json!("duplicate_active_application"));
}

#[tokio::test]
async fn unknown_application_maps_to_not_found() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/bto/applications/app-999999/approve",
            json!({ "actor": MANAGER }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_actor_maps_to_bad_request() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/bto/applications",
            submission("not-an-nric", "TWOROOM"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], json!("invalid_person_id"));
}

#[tokio::test]
async fn approval_by_another_manager_is_forbidden() {
    let (service, _) = build_service();
    let application = service
        .submit_application(&pid(MARRIED_40), &acacia(), UnitCategory::TwoRoom, today())
        .expect("submitted");
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/bto/applications/{}/approve", application.id),
            json!({ "actor": SECOND_MANAGER }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unit_routes_read_and_override_counts() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/bto/projects/Acacia%20Breeze/units/2-room",
            json!({ "actor": MANAGER, "count": 7 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get_request(
            "/api/v1/bto/projects/Acacia%20Breeze/units/TWOROOM",
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["remaining"], json!(7));
    assert_eq!(payload["project"], json!(ACACIA));
}

#[tokio::test]
async fn officer_registration_flow_over_http() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/bto/projects/Acacia%20Breeze/officers",
            json!({ "officer": SECOND_OFFICER }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["standing"], json!("pending"));

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/bto/projects/Acacia%20Breeze/officers/{SECOND_OFFICER}/approve"),
            json!({ "actor": MANAGER }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["standing"], json!("assigned"));

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/bto/projects/Acacia%20Breeze/officers/{SECOND_OFFICER}/promote"),
            json!({ "actor": MANAGER }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_route_applies_query_filters() {
    let (service, _) = build_service();
    service
        .submit_application(&pid(SINGLE_35), &acacia(), UnitCategory::TwoRoom, today())
        .expect("submitted");
    service
        .submit_application(&pid(MARRIED_40), &acacia(), UnitCategory::TwoRoom, today())
        .expect("submitted");
    let router = router_with_service(service);

    let response = router
        .oneshot(get_request(&format!(
            "/api/v1/bto/projects/Acacia%20Breeze/report?actor={MANAGER}&marital_status=MARRIED"
        )))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let rows = payload.as_array().expect("array of rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["applicant"], json!(MARRIED_40));
}

#[tokio::test]
async fn eligible_projects_route_lists_open_projects() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get_request(&format!(
            "/api/v1/bto/people/{SINGLE_35}/eligible-projects?on=2025-02-20"
        )))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["name"], json!(ACACIA));
    assert_eq!(payload[0]["eligible_categories"], json!(["TWOROOM"]));
}
