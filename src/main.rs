// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::env;
use std::path::PathBuf;

use apeiro::api::{router, AppState};
use apeiro::config::consts::CONFIG_ENV_VAR;
use apeiro::config::{load_and_validate_config, validate_config, Config, RuntimeBuilder};
use apeiro::observability::init_tracing;
use apeiro::observability::messages::api::ServerListening;
use apeiro::observability::messages::StructuredLog;

/// Config path from the first argument, else `APEIRO_CONFIG`.
fn config_path() -> Option<PathBuf> {
    env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
}

fn load() -> anyhow::Result<Config> {
    match config_path() {
        Some(path) => load_and_validate_config(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            let cfg = Config::default();
            validate_config(&cfg).context("validating default config")?;
            Ok(cfg)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = load()?;
    init_tracing(cfg.logging.get_filter());

    let supervisor = RuntimeBuilder::with_script_backend(&cfg);
    let reaper = supervisor.start_reaper();

    let state = AppState::new(supervisor.clone(), cfg.modules.get_max_source_bytes());
    let bind = cfg.server.get_bind();
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    ServerListening {
        addr: listener.local_addr().unwrap_or(bind),
    }
    .log();

    let shutdown = supervisor.shutdown_token();
    let server = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = shutdown.cancelled() => {}
        }
    });

    let served = server.await.context("serving HTTP");
    supervisor.shutdown();
    if let Some(reaper) = reaper {
        reaper.await.context("joining retention reaper")?;
    }
    served
}
