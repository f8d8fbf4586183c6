//! Route tests for the risk check server.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use riskwatch_core::{StreamEvent, UserId};
use riskwatch_server::http::create_router;
use riskwatch_server::UserStore;

use common::test_state;

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Parse every `data:` record of an SSE body.
fn sse_events(body: &str) -> Vec<StreamEvent> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).unwrap())
        .collect()
}

#[tokio::test]
async fn root_and_health_return_json() {
    let (state, _) = test_state();

    let (status, body) = body_string(create_router(state.clone()), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Allergy Prevention Agent API is running");

    let (status, body) = body_string(create_router(state), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn stream_endpoint_emits_steps_then_result() {
    let (state, _) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(post_json(
            "/api/check-risk-stream",
            r#"{"location": "Boston, MA", "allergies": ["pollen"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let events = sse_events(std::str::from_utf8(&body).unwrap());

    let kinds: Vec<(&str, Option<&str>)> = events
        .iter()
        .map(|e| (e.kind(), e.step_id().map(|s| s.as_str())))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("step_start", Some("fetch_enviro_data")),
            ("step_complete", Some("fetch_enviro_data")),
            ("step_start", Some("analyze_risk")),
            ("step_complete", Some("analyze_risk")),
            ("step_start", Some("generate_advice")),
            ("step_complete", Some("generate_advice")),
            ("step_start", Some("done")),
            ("step_complete", Some("done")),
            ("result", None),
        ]
    );

    let StreamEvent::Result { data } = &events[8] else {
        panic!("expected result event");
    };
    assert_eq!(data["location"], "Boston, MA");
    assert_eq!(data["risk_assessment"]["risk_level"], "high");
    assert_eq!(data["advice"], "Wear a mask in Boston, MA.");
}

#[tokio::test]
async fn stream_endpoint_rejects_empty_allergies_without_steps() {
    let (state, _) = test_state();
    let (status, body) = body_string(
        create_router(state),
        post_json(
            "/api/check-risk-stream",
            r#"{"location": "Boston, MA", "allergies": []}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = sse_events(&body);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], StreamEvent::Error { message } if message.contains("allergies")));
}

#[tokio::test]
async fn stream_endpoint_reports_malformed_body_as_error_event() {
    let (state, _) = test_state();
    let (status, body) = body_string(
        create_router(state),
        post_json("/api/check-risk-stream", "{not json"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = sse_events(&body);
    assert_eq!(events.len(), 1);
    assert!(events[0].is_terminal());
    assert_eq!(events[0].kind(), "error");
}

#[tokio::test]
async fn stream_endpoint_stops_at_failing_step() {
    let (state, _) = test_state();
    let (_, body) = body_string(
        create_router(state),
        post_json(
            "/api/check-risk-stream",
            r#"{"location": "Atlantis", "allergies": ["dust"]}"#,
        ),
    )
    .await;

    let events = sse_events(&body);
    assert_eq!(
        events,
        vec![
            StreamEvent::step_start(riskwatch_core::StepId::FetchEnviroData),
            StreamEvent::error("Could not find coordinates for Atlantis"),
        ]
    );
}

#[tokio::test]
async fn check_risk_returns_report_json() {
    let (state, _) = test_state();
    let (status, body) = body_string(
        create_router(state),
        post_json(
            "/api/check-risk",
            r#"{"location": "Denver", "allergies": ["grass"]}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["user_allergies"][0], "grass");
    assert_eq!(json["weather_data"]["pollen_count"]["grass"], 45.0);
}

#[tokio::test]
async fn check_risk_maps_errors_to_status_codes() {
    let (state, _) = test_state();

    let (status, body) = body_string(
        create_router(state.clone()),
        post_json("/api/check-risk", r#"{"location": "", "allergies": ["grass"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "invalid_input");

    let (status, body) = body_string(
        create_router(state.clone()),
        post_json(
            "/api/check-risk",
            r#"{"location": "Atlantis", "allergies": ["grass"]}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        json["error"]["message"],
        "Could not find coordinates for Atlantis"
    );

    let (status, _) = body_string(
        create_router(state),
        post_json("/api/check-risk", "[]"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stored_profile_drives_run_and_alert_history() {
    let (state, store) = test_state();
    store
        .set_profile(UserId::new("user-1"), vec!["ragweed".to_string()])
        .await;

    let (status, body) = body_string(
        create_router(state.clone()),
        post_json(
            "/api/check-risk",
            r#"{"location": "Austin", "user_id": "user-1"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["user_allergies"][0], "ragweed");

    // The alert write is fire-and-forget; wait for it to land.
    for _ in 0..50 {
        if store.alert_count().await > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let history = store.alert_history(&UserId::new("user-1"), 10).await.unwrap();
    assert_eq!(history.len(), 1);

    let (status, body) = body_string(
        create_router(state),
        get("/api/users/user-1/alerts?limit=5"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let alerts = json.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["location"], "Austin");
    assert_eq!(alerts[0]["risk_level"], "high");
}

#[tokio::test]
async fn metrics_count_finished_runs() {
    let (state, _) = test_state();
    body_string(
        create_router(state.clone()),
        post_json(
            "/api/check-risk",
            r#"{"location": "Boston", "allergies": ["pollen"]}"#,
        ),
    )
    .await;

    let (status, body) = body_string(create_router(state), get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("riskwatch_runs_total{outcome=\"succeeded\"} 1"));
    assert!(body.contains("riskwatch_runs_active 0"));
}
