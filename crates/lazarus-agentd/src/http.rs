use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use lazarus_prometheus::PrometheusMetrics;
use lazarus_store::SharedStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Clone)]
pub struct HttpState {
    pub store: SharedStore,
    pub metrics: Arc<PrometheusMetrics>,
}

/// Routes:
/// - GET /healthz - 200 when the store answers a ping, 503 otherwise
/// - GET /metrics - Prometheus text exposition
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: HttpState, ctx: CancellationToken) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "http endpoint listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(ctx.cancelled_owned())
        .await?;
    Ok(())
}

async fn healthz(State(state): State<HttpState>) -> (StatusCode, &'static str) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store unreachable")
        }
    }
}

async fn metrics(State(state): State<HttpState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use lazarus_core::MetricsBackend;
    use lazarus_store::MemoryStore;

    use super::*;

    fn state() -> HttpState {
        HttpState {
            store: Arc::new(MemoryStore::new()),
            metrics: Arc::new(PrometheusMetrics::new().unwrap()),
        }
    }

    #[tokio::test]
    async fn healthz_pings_store() {
        let (status, body) = healthz(State(state())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn metrics_are_exposed() {
        let state = state();
        state.metrics.record_worker_reclaimed();
        let resp = metrics(State(state)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; version=0.0.4"
        );
    }
}
