mod config;
mod http;
mod jobs;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lazarus_core::{Cleaner, MetricsHandle, Topology, Worker, default_worker_id};
use lazarus_model::WorkerId;
use lazarus_observe::logger_init;
use lazarus_prometheus::PrometheusMetrics;
use lazarus_store::{RedisStore, SharedStore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{AgentConfig, Role};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AgentConfig::parse();

    // 1) Logger
    logger_init(&cfg.logger()?)?;
    cfg.validate().context("invalid configuration")?;

    // 2) Store
    let store: SharedStore = Arc::new(
        RedisStore::connect(&cfg.redis_url)
            .await
            .with_context(|| format!("connecting to {}", cfg.redis_url))?,
    );
    store.ping().await.context("store did not answer ping")?;
    info!(prefix = %cfg.prefix, "store connected");

    let topology = Topology::new(cfg.prefix.clone());
    let prometheus = Arc::new(PrometheusMetrics::new()?);
    let metrics: MetricsHandle = prometheus.clone();
    let ctx = CancellationToken::new();
    let mut tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();

    // 3) Roles
    if cfg.runs(Role::Cleaner) {
        let cleaner = Cleaner::new(store.clone(), topology.clone(), cfg.cleaner())
            .with_metrics(metrics.clone());
        let ctx = ctx.clone();
        tasks.spawn(async move {
            cleaner.run(ctx).await;
            Ok(())
        });
    }
    if cfg.runs(Role::Worker) {
        let id = cfg
            .worker_id
            .clone()
            .map(WorkerId::from)
            .unwrap_or_else(default_worker_id);
        let worker = Worker::new(
            id,
            store.clone(),
            topology.clone(),
            cfg.heartbeat(),
            Arc::new(jobs::builtin_router()),
            cfg.worker(),
        )
        .with_metrics(metrics.clone());
        let ctx = ctx.clone();
        tasks.spawn(async move { worker.run(ctx).await.map_err(anyhow::Error::from) });
    }

    // 4) Health and metrics
    tasks.spawn(http::serve(
        cfg.http_listen,
        http::HttpState {
            store: store.clone(),
            metrics: prometheus,
        },
        ctx.clone(),
    ));

    info!(roles = ?cfg.roles, "agent running; press Ctrl+C to stop");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown requested");
        }
        Some(early) = tasks.join_next() => {
            warn!(result = ?early, "component stopped unexpectedly; shutting down");
        }
    }

    ctx.cancel();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "component failed"),
            Err(e) => error!(error = %e, "component panicked"),
        }
    }
    info!("agent stopped");
    Ok(())
}
