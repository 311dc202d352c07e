// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! JSON-over-HTTP surface of the supervisor.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /ping` | liveness |
//! | `POST /mount` | mount raw module source |
//! | `POST /spawn` | spawn, optionally waiting per the `Apeiro-Wait` header |
//! | `GET /process` | list every held process |
//! | `GET`/`POST /process/:pid` | current snapshot |
//! | `PUT /process/:pid` | send `{"msg": ...}` to a suspended process |
//! | `DELETE /process/:pid` | delete a finished process |
//! | `GET /process/:pid/watch` | server-sent events, one per snapshot |
//!
//! Process reads, synchronous spawns and sends answer with the whole
//! `Snapshot` (`pid`, `mid`, `state`, `value`, `revision`, ...) rather than
//! the bare value, so callers see the state the value belongs to.
//!
//! Every failure is answered with `{"error": message}`; see `ApiError` for
//! the status codes.

mod error;
mod handlers;
mod types;
#[cfg(test)]
mod integration_tests;

pub use error::ApiError;
pub use types::{
    ErrorBody, MountResponse, PingResponse, ProcessList, SendRequest, SpawnRequest, SpawnResponse,
};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::engine::Supervisor;

/// Header selecting synchronous spawn: `true` waits for first progress,
/// `terminal` waits for the process to finish.
pub const APEIRO_WAIT: &str = "apeiro-wait";

#[derive(Clone, Debug)]
pub struct AppState {
    pub supervisor: Supervisor,
    /// Largest request body accepted, module source included.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(supervisor: Supervisor, max_body_bytes: usize) -> Self {
        Self {
            supervisor,
            max_body_bytes,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/mount", post(handlers::mount))
        .route("/spawn", post(handlers::spawn))
        .route("/process", get(handlers::list_processes))
        .route(
            "/process/:pid",
            get(handlers::get_process)
                .post(handlers::get_process)
                .put(handlers::send_message)
                .delete(handlers::delete_process),
        )
        .route("/process/:pid/watch", get(handlers::watch_process))
        .layer(body_limit)
        .with_state(state)
}
