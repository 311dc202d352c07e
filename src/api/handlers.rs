// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;

use crate::api::error::ApiError;
use crate::api::types::{
    MountResponse, PingResponse, ProcessList, SendRequest, SpawnRequest, SpawnResponse,
};
use crate::api::{AppState, APEIRO_WAIT};
use crate::engine::{SnapshotStream, WaitFor};
use crate::observability::messages::api::{StreamEncodeFailed, StreamOpened};
use crate::observability::messages::StructuredLog;
use crate::registry::{Pid, Snapshot};

type ApiResult<T> = Result<T, ApiError>;

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
    })
}

pub async fn mount(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<MountResponse>> {
    let source = body.map_err(rejected)?;
    let mid = state.supervisor.mount(&source)?;
    Ok(Json(MountResponse { mid }))
}

pub async fn spawn(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Response> {
    let wait = wait_mode(&headers)?;
    let body = body.map_err(rejected)?;
    let request: SpawnRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid spawn request: {}", e)))?;

    let supervisor = &state.supervisor;
    match wait {
        None => {
            let pid = supervisor.spawn(&request.mid, request.name)?;
            Ok(Json(SpawnResponse { pid }).into_response())
        }
        Some(until) => {
            let (_, snapshot) = supervisor
                .spawn_and_wait_for(&request.mid, request.name, until)
                .await?;
            Ok(Json(snapshot).into_response())
        }
    }
}

pub async fn list_processes(State(state): State<AppState>) -> Json<ProcessList> {
    Json(ProcessList {
        procs: state.supervisor.list(),
    })
}

pub async fn get_process(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> ApiResult<Json<Snapshot>> {
    let pid = parse_pid(&pid)?;
    Ok(Json(state.supervisor.get(pid)?))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<Snapshot>> {
    let pid = parse_pid(&pid)?;
    let body = body.map_err(rejected)?;
    let request: SendRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid send request: {}", e)))?;
    Ok(Json(state.supervisor.send(pid, request.msg)?))
}

pub async fn delete_process(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> ApiResult<Json<Snapshot>> {
    let pid = parse_pid(&pid)?;
    Ok(Json(state.supervisor.remove(pid)?))
}

/// Server-sent events for one process. The stream is the whole response:
/// unknown pids are rejected before it starts, and nothing follows its end.
pub async fn watch_process(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> ApiResult<Response> {
    let pid = parse_pid(&pid)?;
    let snapshots = state.supervisor.open_stream(pid)?;

    StreamOpened { pid }.log();

    let sse = Sse::new(sse_events(snapshots)).keep_alive(KeepAlive::default());
    Ok((
        [(header::CONNECTION, HeaderValue::from_static("keep-alive"))],
        sse,
    )
        .into_response())
}

/// One `message` event per snapshot. If a snapshot cannot be encoded, a
/// single `error` event is sent and the stream ends, which drops the
/// subscription.
fn sse_events(snapshots: SnapshotStream) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(Some(snapshots), |state| async move {
        let mut snapshots = state?;
        let snapshot = snapshots.next().await?;

        match Event::default().event("message").json_data(&snapshot) {
            Ok(event) => Some((Ok::<_, Infallible>(event), Some(snapshots))),
            Err(e) => {
                let error = e.to_string();
                StreamEncodeFailed {
                    pid: snapshots.pid(),
                    error: &error,
                }
                .log();
                Some((Ok(Event::default().event("error").data(error)), None))
            }
        }
    })
}

fn wait_mode(headers: &HeaderMap) -> ApiResult<Option<WaitFor>> {
    let Some(value) = headers.get(APEIRO_WAIT) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("Apeiro-Wait header is not valid text".to_string()))?;

    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" => Ok(None),
        "true" => Ok(Some(WaitFor::FirstProgress)),
        "terminal" => Ok(Some(WaitFor::Terminal)),
        other => Err(ApiError::BadRequest(format!(
            "unsupported Apeiro-Wait value '{}' (expected true, false or terminal)",
            other
        ))),
    }
}

fn parse_pid(raw: &str) -> ApiResult<Pid> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("{}", e)))
}

fn rejected(rejection: BytesRejection) -> ApiError {
    ApiError::Rejected {
        status: rejection.status(),
        message: rejection.body_text(),
    }
}
