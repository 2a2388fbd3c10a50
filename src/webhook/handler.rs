use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::Instrument;

use crate::error::AppError;
use crate::server::AppState;
use crate::webhook::events::EventPayload;
use crate::webhook::router::{classify, Intent};

/// Header names in order of preference; GitHub's native names are aliases.
const SIGNATURE_HEADERS: [&str; 2] = ["x-signature", "x-hub-signature-256"];
const EVENT_TYPE_HEADERS: [&str; 2] = ["x-event-type", "x-github-event"];
const DELIVERY_ID_HEADERS: [&str; 2] = ["x-delivery-id", "x-github-delivery"];

fn header<'a>(headers: &'a HeaderMap, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
}

fn ok(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "message": message.into() })),
    )
        .into_response()
}

pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match header(&headers, &SIGNATURE_HEADERS) {
        Some(sig) => sig.to_string(),
        None => {
            tracing::warn!("Missing signature header");
            return AppError::WebhookVerification("Missing signature header".to_string())
                .into_response();
        }
    };

    let event_type = match header(&headers, &EVENT_TYPE_HEADERS) {
        Some(et) => et.to_string(),
        None => {
            tracing::warn!("Missing event type header");
            return AppError::BadRequest("Missing event type header".to_string()).into_response();
        }
    };

    let delivery_id = header(&headers, &DELIVERY_ID_HEADERS)
        .unwrap_or("-")
        .to_string();

    let span = tracing::info_span!("webhook", event_type = %event_type, delivery_id = %delivery_id);

    async move {
        // The raw bytes, not a re-serialization, carry the signature.
        if !state.verifier.verify(&body, &signature) {
            return AppError::WebhookVerification("Invalid signature".to_string()).into_response();
        }

        let payload = match EventPayload::parse(&body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse webhook payload");
                return AppError::BadRequest(format!("Unparseable payload: {e}")).into_response();
            }
        };

        let intent = classify(
            &event_type,
            payload.action.as_deref(),
            &payload,
            state.reconciler.tracking(),
        );

        tracing::info!(action = ?payload.action, intent = intent.name(), "Received webhook event");

        if intent == Intent::Ignore {
            return ok("Event ignored");
        }

        match state.reconciler.handle(&intent).await {
            Ok(outcomes) => ok(outcomes
                .iter()
                .map(|o| o.describe())
                .collect::<Vec<_>>()
                .join("; ")),
            Err(e) => {
                tracing::error!(error = %e, intent = intent.name(), "Reconciliation failed");
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::assessment::AssessmentGenerator;
    use crate::config::{RuntimeEnvironment, TrackingConfig};
    use crate::platform::types::{IssueState, Repository};
    use crate::platform::Platform;
    use crate::scoring::ScoringModel;
    use crate::server::create_router;
    use crate::testing::{FakePlatform, ScriptedGenerator};
    use crate::webhook::signature::SignatureVerifier;
    use crate::workflow::template::RERUN_CONTROL_UNCHECKED;
    use crate::workflow::Reconciler;

    const SECRET: &str = "webhook-secret";

    fn state_with(
        platform: Option<Arc<FakePlatform>>,
        generator: Option<Arc<ScriptedGenerator>>,
    ) -> Arc<AppState> {
        let platform = platform.map(|p| p as Arc<dyn Platform>);
        let reconciler = Reconciler::new(
            platform.clone(),
            generator.map(|g| g as Arc<dyn AssessmentGenerator>),
            Arc::new(ScoringModel::default()),
            TrackingConfig::default(),
        );
        let verifier = SignatureVerifier::new(SECRET, RuntimeEnvironment::Production).unwrap();
        Arc::new(AppState::from_parts(verifier, platform, reconciler))
    }

    fn signed_request(event_type: &str, body: &serde_json::Value) -> Request<Body> {
        let bytes = serde_json::to_vec(body).unwrap();
        let signature = SignatureVerifier::new(SECRET, RuntimeEnvironment::Production)
            .unwrap()
            .sign(&bytes)
            .unwrap();
        Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("x-signature", signature)
            .header("x-event-type", event_type)
            .header("x-delivery-id", "delivery-1")
            .body(Body::from(bytes))
            .unwrap()
    }

    async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn repository_created() -> serde_json::Value {
        json!({
            "action": "created",
            "repository": { "owner": "acme", "name": "widgets" },
            "installation": { "id": 11 }
        })
    }

    fn widgets() -> Repository {
        Repository::new("acme", "widgets")
    }

    #[tokio::test]
    async fn test_repository_created_creates_issue() {
        let platform = Arc::new(FakePlatform::new());
        let state = state_with(Some(platform.clone()), None);

        let (status, body) = send(&state, signed_request("repository", &repository_created())).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().starts_with("Created scorecard issue"));
        let issues = platform.issues(&widgets());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "DevEx Scorecard");
        assert!(issues[0].has_label("devex-scorecard"));
        assert_eq!(issues[0].state, IssueState::Open);
    }

    #[tokio::test]
    async fn test_redelivery_with_open_issue_is_a_no_op() {
        let platform = Arc::new(FakePlatform::new());
        let state = state_with(Some(platform.clone()), None);

        send(&state, signed_request("repository", &repository_created())).await;
        let before = platform.issues(&widgets());
        let (status, body) = send(&state, signed_request("repository", &repository_created())).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("already open"));
        assert_eq!(platform.issues(&widgets()), before);
    }

    #[tokio::test]
    async fn test_redelivery_with_closed_issue_reopens() {
        let platform = Arc::new(FakePlatform::new());
        let number = platform.seed_issue(
            &widgets(),
            "DevEx Scorecard",
            "stale",
            IssueState::Closed,
            &["devex-scorecard"],
        );
        let state = state_with(
            Some(platform.clone()),
            Some(Arc::new(ScriptedGenerator::text(r#"{"score": 91}"#))),
        );

        let (status, _) = send(&state, signed_request("repository", &repository_created())).await;

        assert_eq!(status, StatusCode::OK);
        let issue = platform.issue(&widgets(), number).unwrap();
        assert_eq!(issue.state, IssueState::Open);
        assert!(issue.body.contains("Score: 91/100"));
    }

    #[tokio::test]
    async fn test_rerun_regenerates_and_comments() {
        let platform = Arc::new(FakePlatform::new());
        let number = platform.seed_issue(
            &widgets(),
            "DevEx Scorecard",
            "old\n- [x] **Re-run scorecard**",
            IssueState::Open,
            &["devex-scorecard"],
        );
        let state = state_with(
            Some(platform.clone()),
            Some(Arc::new(ScriptedGenerator::text(r#"{"score": 64}"#))),
        );
        let event = json!({
            "action": "edited",
            "issue": {
                "number": number,
                "title": "DevEx Scorecard",
                "body": "old\n- [x] **Re-run scorecard**",
                "state": "open"
            },
            "repository": { "name": "widgets", "full_name": "acme/widgets", "owner": { "login": "acme" } },
            "installation": { "id": 11 }
        });

        let (status, _) = send(&state, signed_request("issues", &event)).await;

        assert_eq!(status, StatusCode::OK);
        let issue = platform.issue(&widgets(), number).unwrap();
        assert!(issue.body.contains("Score: 64/100"));
        assert!(issue.body.contains(RERUN_CONTROL_UNCHECKED));
        assert_eq!(platform.comments(&widgets(), number).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_signature_is_unauthorized() {
        let state = state_with(Some(Arc::new(FakePlatform::new())), None);
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("x-event-type", "repository")
            .body(Body::from("{}"))
            .unwrap();

        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_signature_is_unauthorized_and_mutates_nothing() {
        let platform = Arc::new(FakePlatform::new());
        let state = state_with(Some(platform.clone()), None);
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("x-signature", "sha256=00")
            .header("x-event-type", "repository")
            .body(Body::from(serde_json::to_vec(&repository_created()).unwrap()))
            .unwrap();

        let (status, _) = send(&state, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(platform.issues(&widgets()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_event_type_is_bad_request() {
        let state = state_with(Some(Arc::new(FakePlatform::new())), None);
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("x-signature", "sha256=00")
            .body(Body::from("{}"))
            .unwrap();

        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_github_header_aliases_are_accepted() {
        let platform = Arc::new(FakePlatform::new());
        let state = state_with(Some(platform.clone()), None);
        let bytes = serde_json::to_vec(&repository_created()).unwrap();
        let signature = state.verifier.sign(&bytes).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("x-hub-signature-256", signature)
            .header("x-github-event", "repository")
            .header("x-github-delivery", "abc")
            .body(Body::from(bytes))
            .unwrap();

        let (status, _) = send(&state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(platform.issues(&widgets()).len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_bad_request() {
        let state = state_with(Some(Arc::new(FakePlatform::new())), None);
        let bytes = b"definitely not json".to_vec();
        let signature = state.verifier.sign(&bytes).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/github")
            .header("x-signature", signature)
            .header("x-event-type", "repository")
            .body(Body::from(bytes))
            .unwrap();

        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ignored_event_is_ok() {
        let state = state_with(Some(Arc::new(FakePlatform::new())), None);
        let (status, body) = send(&state, signed_request("ping", &json!({ "zen": "hi" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Event ignored");
    }

    #[tokio::test]
    async fn test_missing_tracker_is_server_error() {
        let state = state_with(None, None);
        let (status, _) = send(&state, signed_request("repository", &repository_created())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_tracker_write_failure_is_server_error() {
        let platform = Arc::new(FakePlatform::new());
        platform.fail_writes();
        let state = state_with(Some(platform), None);

        let (status, _) = send(&state, signed_request("repository", &repository_created())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_generator_failure_still_succeeds() {
        let platform = Arc::new(FakePlatform::new());
        let state = state_with(
            Some(platform.clone()),
            Some(Arc::new(ScriptedGenerator::failing())),
        );

        let (status, _) = send(&state, signed_request("repository", &repository_created())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(platform.issues(&widgets()).len(), 1);
    }

    #[tokio::test]
    async fn test_health() {
        let state = state_with(None, None);
        let response = create_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
