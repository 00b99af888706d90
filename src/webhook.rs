//! Webhook signal ingestion.
//!
//! Thin HTTP adapter over the controller. Accepts the native event shape as
//! well as UptimeRobot-style alerts (`monitorFriendlyName`/`alertType`),
//! which are mapped onto configured regions by display-name match.
//!
//! Every processed request answers 200 with the decision status; only
//! processing failures answer 5xx.

use crate::controller::{Controller, SignalOutcome};
use crate::core::Timestamp;
use crate::signal::{HealthSignal, SignalDirection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Inbound webhook body, either native or UptimeRobot-shaped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WebhookPayload {
    /// Native event shape
    Native {
        /// Region the signal refers to
        region_id: String,
        /// up or down
        direction: SignalDirection,
        /// Source timestamp; defaults to receive time
        timestamp: Option<Timestamp>,
        /// Raw monitor payload
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },
    /// UptimeRobot alert shape
    UptimeRobot {
        /// Monitor display name, e.g. "Delhi Frontend LB"
        #[serde(rename = "monitorFriendlyName")]
        monitor_friendly_name: String,
        /// "Down" or "Up"
        #[serde(rename = "alertType")]
        alert_type: String,
        /// Alert details passed through as the raw payload
        #[serde(rename = "alertDetails", default)]
        alert_details: Option<serde_json::Value>,
    },
}

#[derive(Serialize)]
struct StatusBody {
    status: SignalOutcome,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Build the ingestion router.
pub fn router(controller: Arc<Controller>) -> Router {
    Router::new()
        .route("/webhook/health-event", post(health_event))
        .route("/healthz", get(healthz))
        .with_state(controller)
}

/// Bind and serve the router.
pub async fn serve(router: Router, addr: SocketAddr) -> crate::core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "webhook listener started");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn health_event(
    State(controller): State<Arc<Controller>>,
    Json(body): Json<WebhookPayload>,
) -> Response {
    let signal = match to_signal(&controller, body) {
        Some(signal) => signal,
        // Unmatched monitor or unhandled alert type: acknowledged, ignored.
        None => return ok(SignalOutcome::NoAction),
    };

    match controller.handle_signal(signal).await {
        Ok(outcome) => ok(outcome),
        Err(err) if err.reason_code() == "UnknownRegion" => {
            warn!(error = %err, "signal for unconfigured region");
            ok(SignalOutcome::NoAction)
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

fn ok(status: SignalOutcome) -> Response {
    (StatusCode::OK, Json(StatusBody { status })).into_response()
}

fn to_signal(controller: &Controller, body: WebhookPayload) -> Option<HealthSignal> {
    match body {
        WebhookPayload::Native {
            region_id,
            direction,
            timestamp,
            payload,
        } => {
            let mut signal = HealthSignal::new(&region_id, direction);
            if let Some(at) = timestamp {
                signal = signal.at(at);
            }
            if let Some(payload) = payload {
                signal = signal.with_payload(payload);
            }
            Some(signal)
        }
        WebhookPayload::UptimeRobot {
            monitor_friendly_name,
            alert_type,
            alert_details,
        } => {
            let region_id = controller.resolve_region(&monitor_friendly_name)?.to_string();
            let direction = match alert_type.as_str() {
                "Down" => SignalDirection::Down,
                "Up" => SignalDirection::Up,
                other => {
                    warn!(alert_type = %other, monitor = %monitor_friendly_name, "unhandled alert type");
                    return None;
                }
            };
            let mut signal = HealthSignal::new(&region_id, direction);
            if let Some(details) = alert_details {
                signal = signal.with_payload(details);
            }
            Some(signal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryStore;
    use crate::config::{ControllerConfig, DebounceConfig, GroupConfig, RegionConfig};
    use crate::control::memory::{InMemoryControlPlane, InMemoryNotificationSink};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn test_controller() -> Arc<Controller> {
        let mut config = ControllerConfig::new(vec![GroupConfig::new(
            "pg-main",
            vec![
                RegionConfig::new("delhi", "Delhi", "db-1").primary(),
                RegionConfig::new("chennai", "Chennai", "db-2"),
            ],
        )]);
        config.debounce = DebounceConfig {
            min_signals: 2,
            min_duration_ms: 0,
            unreachable_window_ms: 0,
        };
        let plane = Arc::new(InMemoryControlPlane::with_primary("delhi"));
        Arc::new(
            Controller::new(
                config,
                plane.clone(),
                plane,
                Arc::new(MemoryStore::new()),
                Arc::new(InMemoryNotificationSink::new()),
            )
            .await
            .unwrap(),
        )
    }

    async fn post_event(app: Router, json: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/health-event")
                    .header("content-type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_native_event_acknowledged() {
        let app = router(test_controller().await);
        let (status, body) = post_event(
            app,
            r#"{"region_id": "delhi", "direction": "down"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_action");
    }

    #[tokio::test]
    async fn test_uptimerobot_event_maps_to_region() {
        let controller = test_controller().await;
        let app = router(controller.clone());

        let payload = r#"{"monitorFriendlyName": "Delhi Frontend LB", "alertType": "Down", "alertDetails": {"reason": "timeout"}}"#;
        let (status, body) = post_event(app.clone(), payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_action");

        // Audit saw nothing yet: one signal never confirms.
        assert_eq!(controller.audit().len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_monitor_is_no_action() {
        let app = router(test_controller().await);
        let payload = r#"{"monitorFriendlyName": "Sydney LB", "alertType": "Down"}"#;
        let (status, body) = post_event(app, payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_action");
    }

    #[tokio::test]
    async fn test_unknown_native_region_is_no_action() {
        let app = router(test_controller().await);
        let (status, body) = post_event(
            app,
            r#"{"region_id": "sydney", "direction": "down"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_action");
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = router(test_controller().await);
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_confirmed_outage_reports_failover() {
        let controller = test_controller().await;
        let app = router(controller.clone());

        // Candidate must be confirmed healthy first.
        for _ in 0..2 {
            post_event(
                app.clone(),
                r#"{"region_id": "chennai", "direction": "up"}"#,
            )
            .await;
        }
        let payload = r#"{"monitorFriendlyName": "Delhi Frontend LB", "alertType": "Down"}"#;
        post_event(app.clone(), payload).await;
        let (status, body) = post_event(app, payload).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failover_initiated");
    }
}
