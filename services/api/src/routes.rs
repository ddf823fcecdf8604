use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use petconnect::backend::PetConnectBackend;
use petconnect::workflows::{application_router, CoordinationService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes<B>(service: Arc<CoordinationService<B>>) -> axum::Router
where
    B: PetConnectBackend + 'static,
{
    application_router(service)
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
    use crate::infra::{demo_backend, DEMO_STAFF_TOKEN};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use petconnect::workflows::MeetingScheduler;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app() -> (axum::Router, Arc<AtomicBool>) {
        let readiness = Arc::new(AtomicBool::new(false));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let service = Arc::new(CoordinationService::new(
            Arc::new(demo_backend()),
            MeetingScheduler::default(),
        ));
        (with_application_routes(service).layer(Extension(state)), readiness)
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn readiness_flips_once_the_listener_is_bound() {
        let (app, readiness) = app();
        let request = || Request::get("/ready").body(Body::empty()).expect("request");

        let response = app.clone().oneshot(request()).await.expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json(response).await["status"], "initializing");

        readiness.store(true, Ordering::Release);
        let response = app.oneshot(request()).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_and_workflow_routes_share_one_router() {
        let (app, _) = app();

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(json(response).await["status"], "ok");

        let response = app
            .oneshot(
                Request::get("/api/v1/staff/dashboard")
                    .header("x-auth-token", DEMO_STAFF_TOKEN)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["request_counts"]["needs_review"], 2);
    }

    #[tokio::test]
    async fn metrics_are_rendered_as_prometheus_text() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
