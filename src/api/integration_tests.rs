// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::api::{router, AppState, ErrorBody, MountResponse, ProcessList, SpawnResponse};
use crate::backends::script::{ScriptExecutor, ScriptModuleStore};
use crate::backends::stub::ManualExecutor;
use crate::engine::{Supervisor, SupervisorOptions};
use crate::registry::{Pid, ProcessState, Snapshot};
use crate::traits::ProcessExecutor;

const MAX_BODY: usize = 4 * 1024;

const COUNTER: &str = r#"
name: counter
steps:
  - op: emit
    value: {count: 1}
  - op: emit
    value: {count: 2}
  - op: complete
    value: 42
"#;

fn app_with(executor: Arc<dyn ProcessExecutor>) -> (Router, Supervisor) {
    let modules = Arc::new(ScriptModuleStore::new(MAX_BODY));
    let supervisor = Supervisor::new(modules, executor, SupervisorOptions::default());
    let app = router(AppState::new(supervisor.clone(), MAX_BODY * 2));
    (app, supervisor)
}

fn app() -> (Router, Supervisor) {
    app_with(Arc::new(ScriptExecutor::new()))
}

fn request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

fn spawn_request(mid: &str, wait: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/spawn")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(wait) = wait {
        builder = builder.header("Apeiro-Wait", wait);
    }
    builder
        .body(Body::from(json!({ "mid": mid }).to_string()))
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn json_body<T: DeserializeOwned>(response: Response<Body>) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn mount(app: &Router, source: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(Method::POST, "/mount", source.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body::<MountResponse>(response).await.mid.as_str().to_string()
}

/// Integration tests driving the HTTP router end to end
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ping() {
        let (app, _) = app();
        let response = app.oneshot(request(Method::GET, "/ping", Body::empty())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body::<Value>(response).await, json!({ "message": "pong" }));
    }

    #[tokio::test]
    async fn test_mount_rejects_invalid_source() {
        let (app, _) = app();
        let response = app
            .oneshot(request(Method::POST, "/mount", "steps: []"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = json_body(response).await;
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_mount_rejects_oversized_source() {
        let (app, _) = app();
        let mut source = String::from("steps:\n  - op: complete\n    value: 1\n");
        source.push_str(&"#".repeat(MAX_BODY));

        let response = app
            .oneshot(request(Method::POST, "/mount", source))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let _: ErrorBody = json_body(response).await;
    }

    #[tokio::test]
    async fn test_async_spawn_then_read() {
        let (executor, mut released) = ManualExecutor::new();
        let (app, _) = app_with(Arc::new(executor));
        let mid = mount(&app, COUNTER).await;

        let response = app.clone().oneshot(spawn_request(&mid, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let SpawnResponse { pid } = json_body(response).await;

        let uri = format!("/process/{}", pid);
        let response = app
            .clone()
            .oneshot(request(Method::GET, &uri, Body::empty()))
            .await
            .unwrap();
        let snapshot: Snapshot = json_body(response).await;
        assert_eq!(snapshot.state, ProcessState::Running);

        released.recv().await.unwrap().complete(json!(42)).unwrap();

        for method in [Method::GET, Method::POST] {
            let response = app
                .clone()
                .oneshot(request(method, &uri, Body::empty()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = json_body(response).await;
            assert_eq!(body["state"], json!("Completed"));
            assert_eq!(body["value"], json!(42));
            assert_eq!(body["pid"], json!(pid.to_string()));
        }
    }

    #[tokio::test]
    async fn test_sync_spawn_terminal_returns_final_snapshot() {
        let (app, _) = app();
        let mid = mount(&app, COUNTER).await;

        let response = app.oneshot(spawn_request(&mid, Some("terminal"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot: Snapshot = json_body(response).await;
        assert_eq!(snapshot.state, ProcessState::Completed);
        assert_eq!(snapshot.value, Some(json!(42)));
        assert_eq!(snapshot.revision, 3);
    }

    #[tokio::test]
    async fn test_sync_spawn_returns_first_progress() {
        let (executor, mut released) = ManualExecutor::new();
        let (app, _) = app_with(Arc::new(executor));
        let mid = mount(&app, COUNTER).await;

        let pending = tokio::spawn(app.clone().oneshot(spawn_request(&mid, Some("true"))));
        let handle = released.recv().await.unwrap();
        handle.update(json!({ "count": 1 })).unwrap();

        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot: Snapshot = json_body(response).await;
        assert_eq!(snapshot.pid, handle.pid());
        assert_eq!(snapshot.state, ProcessState::Running);
        assert_eq!(snapshot.value, Some(json!({ "count": 1 })));
    }

    #[tokio::test]
    async fn test_spawn_errors() {
        let (app, _) = app();
        let mid = mount(&app, COUNTER).await;

        let response = app.clone().oneshot(spawn_request("missing", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = json_body(response).await;
        assert!(body.error.contains("missing"));

        let response = app.clone().oneshot(spawn_request(&mid, Some("later"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(Method::POST, "/spawn", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let _: ErrorBody = json_body(response).await;
    }

    #[tokio::test]
    async fn test_spawn_at_capacity_is_unavailable() {
        let (executor, _released) = ManualExecutor::new();
        let modules = Arc::new(ScriptModuleStore::new(MAX_BODY));
        let options = SupervisorOptions {
            max_processes: 1,
            ..SupervisorOptions::default()
        };
        let supervisor = Supervisor::new(modules, Arc::new(executor), options);
        let app = router(AppState::new(supervisor, MAX_BODY));
        let mid = mount(&app, COUNTER).await;

        let response = app.clone().oneshot(spawn_request(&mid, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(spawn_request(&mid, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_pids() {
        let (app, _) = app();
        let unknown = format!("/process/{}", Pid::from_raw(77));

        let malformed = ["/process/zzz".to_string(), "/process/1".to_string()];
        for uri in [unknown.clone(), format!("{}/watch", unknown)].into_iter().chain(malformed) {
            let response = app
                .clone()
                .oneshot(request(Method::GET, &uri, Body::empty()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "application/json"
            );
            let _: ErrorBody = json_body(response).await;
        }
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (app, supervisor) = app();
        let mid = mount(&app, COUNTER).await;

        let response = app.clone().oneshot(spawn_request(&mid, Some("terminal"))).await.unwrap();
        let finished: Snapshot = json_body(response).await;

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/process", Body::empty()))
            .await
            .unwrap();
        let ProcessList { procs } = json_body(response).await;
        assert_eq!(procs, vec![finished.clone()]);

        let uri = format!("/process/{}", finished.pid);
        let response = app
            .clone()
            .oneshot(request(Method::DELETE, &uri, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(supervisor.list().is_empty());

        let response = app
            .oneshot(request(Method::DELETE, &uri, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_running_process_is_rejected() {
        let (executor, _released) = ManualExecutor::new();
        let (app, supervisor) = app_with(Arc::new(executor));
        let mid = mount(&app, COUNTER).await;

        let response = app.clone().oneshot(spawn_request(&mid, None)).await.unwrap();
        let SpawnResponse { pid } = json_body(response).await;

        let response = app
            .oneshot(request(Method::DELETE, &format!("/process/{}", pid), Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(supervisor.get(pid).is_ok());
    }

    #[tokio::test]
    async fn test_put_message_resumes_suspended_script() {
        let (app, supervisor) = app();
        let mid = mount(&app, "steps:\n  - op: suspend\n    value: waiting\n").await;

        let response = app.clone().oneshot(spawn_request(&mid, Some("true"))).await.unwrap();
        let suspended: Snapshot = json_body(response).await;
        assert_eq!(suspended.state, ProcessState::Suspended);

        let uri = format!("/process/{}", suspended.pid);
        let response = app
            .clone()
            .oneshot(request(Method::PUT, &uri, json!({ "msg": { "n": 5 } }).to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resumed: Snapshot = json_body(response).await;
        assert_eq!(resumed.state, ProcessState::Running);
        assert_eq!(resumed.value, Some(json!({ "n": 5 })));

        let mut stream = supervisor.open_stream(suspended.pid).unwrap();
        let mut last = None;
        while let Some(snapshot) = stream.next().await {
            last = Some(snapshot);
        }
        let finished = last.unwrap();
        assert_eq!(finished.state, ProcessState::Completed);
        assert_eq!(finished.value, Some(json!({ "n": 5 })));
    }

    #[tokio::test]
    async fn test_put_message_errors() {
        let (executor, _released) = ManualExecutor::new();
        let (app, _) = app_with(Arc::new(executor));
        let mid = mount(&app, COUNTER).await;
        let response = app.clone().oneshot(spawn_request(&mid, None)).await.unwrap();
        let SpawnResponse { pid } = json_body(response).await;
        let uri = format!("/process/{}", pid);

        // Running, not suspended.
        let response = app
            .clone()
            .oneshot(request(Method::PUT, &uri, json!({ "msg": 1 }).to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let _: ErrorBody = json_body(response).await;

        let response = app
            .clone()
            .oneshot(request(Method::PUT, &uri, "{\"message\": 1}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                Method::PUT,
                &format!("/process/{}", Pid::from_raw(999)),
                json!({ "msg": 1 }).to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_watch_finished_process_sends_terminal_and_ends() {
        let (app, _) = app();
        let mid = mount(&app, COUNTER).await;
        let response = app.clone().oneshot(spawn_request(&mid, Some("terminal"))).await.unwrap();
        let finished: Snapshot = json_body(response).await;

        let uri = format!("/process/{}/watch", finished.pid);
        let response = app
            .oneshot(request(Method::GET, &uri, Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()[header::CONNECTION], "keep-alive");

        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(body.matches("event: message").count(), 1);
        assert!(body.contains("\"state\":\"Completed\""));
        assert!(body.contains("\"value\":42"));
    }

    #[tokio::test]
    async fn test_watch_running_process_streams_every_update() {
        let (executor, mut released) = ManualExecutor::new();
        let (app, _) = app_with(Arc::new(executor));
        let mid = mount(&app, COUNTER).await;

        let response = app.clone().oneshot(spawn_request(&mid, None)).await.unwrap();
        let SpawnResponse { pid } = json_body(response).await;
        let handle = released.recv().await.unwrap();

        let response = app
            .oneshot(request(Method::GET, &format!("/process/{}/watch", pid), Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        for count in 1..=3 {
            handle.update(json!({ "count": count })).unwrap();
        }
        handle.complete(json!("done")).unwrap();

        let body = String::from_utf8(body_bytes(response).await).unwrap();
        let revisions: Vec<u64> = body
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|data| serde_json::from_str::<Snapshot>(data).unwrap().revision)
            .collect();
        assert_eq!(revisions, vec![0, 1, 2, 3, 4]);
        assert!(body.contains("\"value\":\"done\""));
    }
}
