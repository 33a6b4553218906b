use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use bto_allocation::workflows::allocation::{
    allocation_router, AllocationService, NoticePublisher,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_allocation_routes<N>(service: Arc<AllocationService<N>>) -> axum::Router
where
    N: NoticePublisher + 'static,
{
    allocation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{sample_today, InMemoryNoticePublisher};
    use crate::server::seed_coordinator;
    use axum::body::Body;
    use axum::http::Request;
    use bto_allocation::config::AllocationConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<InMemoryNoticePublisher>) {
        let coordinator =
            seed_coordinator(&AllocationConfig::default(), None).expect("sample roster");
        let notices = Arc::new(InMemoryNoticePublisher::default());
        let service = Arc::new(AllocationService::new(coordinator, notices.clone()));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        (with_allocation_routes(service).layer(Extension(state)), notices)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (router, _) = app(true);
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], json!("ok"));
    }

    #[tokio::test]
    async fn readiness_reflects_the_flag() {
        let (router, _) = app(false);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], json!("initializing"));
    }

    #[tokio::test]
    async fn allocation_routes_are_mounted_alongside_probes() {
        let (router, notices) = app(true);
        let submit = Request::post("/api/v1/bto/applications")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "actor": "T7654321B",
                    "project": "Acacia Breeze",
                    "category": "THREEROOM",
                    "on": sample_today(),
                })
                .to_string(),
            ))
            .expect("request");

        let response = router
            .clone()
            .oneshot(submit)
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["id"]
            .as_str()
            .expect("application id")
            .to_string();

        let approve = Request::post(format!("/api/v1/bto/applications/{id}/approve"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "actor": "S5678901G" }).to_string()))
            .expect("request");
        let response = router.oneshot(approve).await.expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], json!("SUCCESSFUL"));
        assert_eq!(notices.events().len(), 1);
    }
}
