use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use docker_driver::{ContainerRuntime, ExecOutput, ImageRef, RegistryAuth};
use http_body_util::BodyExt;
use lurch_core::config::Config;
use lurch_server::{app_state, auth, build_router};
use tower::ServiceExt;

/// Answers every `cat` with a one-project catalogue and every playbook run
/// with an empty result.
struct StaticRuntime;

#[async_trait]
impl ContainerRuntime for StaticRuntime {
    async fn pull(
        &self,
        _image: &ImageRef,
        _auth: Option<&RegistryAuth>,
    ) -> docker_driver::Result<String> {
        Ok("Status: Image is up to date for org/devops:latest".into())
    }

    async fn exec(
        &self,
        _image: &ImageRef,
        argv: &[String],
        _env: &[(String, String)],
    ) -> docker_driver::Result<ExecOutput> {
        let stdout = if argv.first().map(String::as_str) == Some("cat") {
            "shop:\n  playbooks:\n    web:\n      location: web.yml\n"
        } else {
            r#"{"plays": [], "stats": {}}"#
        };
        Ok(ExecOutput {
            exit_code: 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        })
    }
}

fn config(api_base: &str, secret: Option<&str>) -> Config {
    let mut config = Config::new("org/devops", "CDEPLOY");
    config.docker.update_image = false;
    config.slack.token = "xoxb-test".into();
    config.slack.api_base = api_base.to_string();
    config.slack.signing_secret = secret.map(str::to_string);
    config
}

fn router(api_base: &str, secret: Option<&str>) -> axum::Router {
    build_router(app_state(&config(api_base, secret), Arc::new(StaticRuntime)))
}

fn event_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let response = router("http://127.0.0.1:9", None)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn url_verification_echoes_challenge() {
    let response = router("http://127.0.0.1:9", None)
        .oneshot(event_request(
            r#"{"type":"url_verification","token":"t","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["challenge"],
        "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
    );
}

#[tokio::test]
async fn malformed_payload_is_400() {
    let response = router("http://127.0.0.1:9", None)
        .oneshot(event_request("not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("invalid event payload"));
}

#[tokio::test]
async fn unsigned_request_is_rejected_when_secret_set() {
    let response = router("http://127.0.0.1:9", Some("s3cret"))
        .oneshot(event_request(r#"{"type":"url_verification","challenge":"c"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_request_passes() {
    let body = r#"{"type":"url_verification","challenge":"c"}"#;
    let ts = chrono::Utc::now().timestamp().to_string();
    let sig = auth::sign("s3cret", &ts, body.as_bytes());

    let mut req = event_request(body);
    req.headers_mut()
        .insert("x-slack-request-timestamp", ts.parse().unwrap());
    req.headers_mut().insert("x-slack-signature", sig.parse().unwrap());

    let response = router("http://127.0.0.1:9", Some("s3cret"))
        .oneshot(req)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["challenge"], "c");
}

#[tokio::test]
async fn health_skips_signature_check() {
    let response = router("http://127.0.0.1:9", Some("s3cret"))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn retries_are_acknowledged_without_processing() {
    let mut slack = mockito::Server::new_async().await;
    let never = slack
        .mock("POST", "/chat.postMessage")
        .expect(0)
        .create_async()
        .await;

    let mut req = event_request(
        r#"{"type":"event_callback","event":{"type":"app_mention","channel":"C1","user":"U1","text":"<@ULURCH>","ts":"1.0"}}"#,
    );
    req.headers_mut().insert("x-slack-retry-num", "1".parse().unwrap());

    let response = router(&slack.url(), None).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(100)).await;
    never.assert_async().await;
}

#[tokio::test]
async fn mention_is_answered_in_thread() {
    let mut slack = mockito::Server::new_async().await;
    let greeting = slack
        .mock("POST", "/chat.postMessage")
        .match_header("authorization", "Bearer xoxb-test")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "channel": "C1",
            "text": "You rang?",
            "thread_ts": "1700000000.000100"
        })))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let response = router(&slack.url(), None)
        .oneshot(event_request(
            r#"{"type":"event_callback","event":{"type":"app_mention","channel":"C1","user":"U1","text":"<@ULURCH>","ts":"1700000000.000100"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The command runs on a spawned task after the acknowledgement.
    for _ in 0..50 {
        if greeting.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    greeting.assert_async().await;
}
