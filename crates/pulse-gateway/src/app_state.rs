//! Shared application state for the pulse gateway.

use std::sync::Arc;

use pulse_core::ConnIdGen;

use crate::config::GatewayConfig;
use crate::counter::CounterHandle;
use crate::obs::GatewayMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    counter: CounterHandle,
}

struct AppStateInner {
    cfg: GatewayConfig,
    conn_ids: ConnIdGen,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Build application state and start the counter service.
    /// Must be called inside a tokio runtime.
    pub fn new(cfg: GatewayConfig) -> Self {
        let metrics = Arc::new(GatewayMetrics::default());
        let counter = CounterHandle::spawn(Arc::clone(&metrics));
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                conn_ids: ConnIdGen::new(),
                metrics,
            }),
            counter,
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn counter(&self) -> &CounterHandle {
        &self.counter
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn next_conn_id(&self) -> pulse_core::ConnId {
        self.inner.conn_ids.next_id()
    }
}
