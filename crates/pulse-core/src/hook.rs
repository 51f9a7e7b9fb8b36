//! Client-side insight holder for one dashboard section.
//!
//! States: `Loading` until the first result, then `Ready`, with `Refreshing` while a
//! manual refresh is in flight (the previous list stays visible). At most one
//! generation is in flight per mount; mounts and refreshes issued meanwhile are
//! ignored. Every mount and unmount starts a new epoch, and a result only lands if
//! its epoch is still current, so results that arrive after [`InsightHook::unmount`]
//! are dropped even when the hook has been mounted again.

use crate::insight::{find_insight, GenerationResult, Insight, InsightSource, SummaryResult};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Anything that can produce a [`GenerationResult`]: the in-process generator or the
/// gateway over HTTP.
#[async_trait::async_trait]
pub trait InsightService: Send + Sync {
    async fn generate(&self, section: &str, metrics: &Value) -> GenerationResult;

    async fn summary(&self, metrics: &Value) -> SummaryResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Loading,
    Ready,
    Refreshing,
}

struct HookInner {
    state: HookState,
    insights: Vec<Insight>,
    source: Option<InsightSource>,
    message: Option<String>,
    mounted: bool,
    epoch: u64,
    in_flight: bool,
}

pub struct InsightHook {
    service: Arc<dyn InsightService>,
    section: String,
    metrics: Mutex<Value>,
    inner: Mutex<HookInner>,
}

impl InsightHook {
    pub fn new(service: Arc<dyn InsightService>, section: &str, metrics: Value) -> Self {
        Self {
            service,
            section: section.to_string(),
            metrics: Mutex::new(metrics),
            inner: Mutex::new(HookInner {
                state: HookState::Loading,
                insights: Vec::new(),
                source: None,
                message: None,
                mounted: false,
                epoch: 0,
                in_flight: false,
            }),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    /// Replace the snapshot used by the next mount or refresh.
    pub async fn set_metrics(&self, metrics: Value) {
        *self.metrics.lock().await = metrics;
    }

    /// Enter `Loading`, generate once, then `Ready` whatever the source. Returns `None`
    /// when a generation for the current mount is already in flight.
    pub async fn mount(&self) -> Option<GenerationResult> {
        let epoch = {
            let mut inner = self.inner.lock().await;
            if inner.mounted && inner.in_flight {
                tracing::debug!(target: "pulse::hook", section = %self.section, "mount ignored; generation in flight");
                return None;
            }
            inner.mounted = true;
            inner.epoch += 1;
            inner.in_flight = true;
            inner.state = HookState::Loading;
            inner.insights.clear();
            inner.source = None;
            inner.message = None;
            inner.epoch
        };
        Some(self.run(epoch).await)
    }

    /// Regenerate from `Ready`. Returns `None` when ignored (not mounted, still
    /// loading, or a refresh is already in flight).
    pub async fn refresh(&self) -> Option<GenerationResult> {
        let epoch = {
            let mut inner = self.inner.lock().await;
            if !inner.mounted || inner.in_flight || inner.state != HookState::Ready {
                tracing::debug!(target: "pulse::hook", section = %self.section, state = ?inner.state, "refresh ignored");
                return None;
            }
            inner.state = HookState::Refreshing;
            inner.in_flight = true;
            inner.epoch
        };
        Some(self.run(epoch).await)
    }

    async fn run(&self, epoch: u64) -> GenerationResult {
        let metrics = self.metrics.lock().await.clone();
        let result = self.service.generate(&self.section, &metrics).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            tracing::debug!(target: "pulse::hook", section = %self.section, "stale generation; dropping result");
            return result;
        }
        inner.in_flight = false;
        inner.state = HookState::Ready;
        inner.insights = result.insights.clone();
        inner.source = Some(result.source);
        inner.message = result.message.clone();
        result
    }

    /// Stop accepting results. The current list is left as it was.
    pub async fn unmount(&self) {
        let mut inner = self.inner.lock().await;
        inner.mounted = false;
        inner.epoch += 1;
        inner.in_flight = false;
    }

    pub async fn is_mounted(&self) -> bool {
        self.inner.lock().await.mounted
    }

    pub async fn state(&self) -> HookState {
        self.inner.lock().await.state
    }

    pub async fn insights(&self) -> Vec<Insight> {
        self.inner.lock().await.insights.clone()
    }

    /// First insight of `insight_type`; `None` means the caller renders its own default.
    pub async fn insight(&self, insight_type: &str) -> Option<Insight> {
        let inner = self.inner.lock().await;
        find_insight(&inner.insights, insight_type).cloned()
    }

    pub async fn source(&self) -> Option<InsightSource> {
        self.inner.lock().await.source
    }

    /// Advisory message from the last result (shown as a toast).
    pub async fn message(&self) -> Option<String> {
        self.inner.lock().await.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Counts calls; while `gated`, call `n` waits until `release(n)`.
    #[derive(Default)]
    struct Gated {
        calls: AtomicUsize,
        gated: AtomicBool,
        gates: std::sync::Mutex<HashMap<usize, Arc<Notify>>>,
    }

    impl Gated {
        fn gate(&self, n: usize) -> Arc<Notify> {
            self.gates.lock().unwrap().entry(n).or_default().clone()
        }

        fn release(&self, n: usize) {
            self.gate(n).notify_one();
        }
    }

    #[async_trait::async_trait]
    impl InsightService for Gated {
        async fn generate(&self, _section: &str, metrics: &Value) -> GenerationResult {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.gated.load(Ordering::SeqCst) {
                self.gate(n).notified().await;
            }
            let content = metrics["tag"].as_str().unwrap_or("c").to_string();
            GenerationResult::ai(vec![Insight::new("performance", &format!("call {n}"), &content)])
        }

        async fn summary(&self, _metrics: &Value) -> SummaryResult {
            SummaryResult {
                summary: String::new(),
                source: InsightSource::Ai,
            }
        }
    }

    async fn wait_for_calls(svc: &Gated, n: usize) {
        while svc.calls.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn mount_then_lookup_by_type() {
        let svc = Arc::new(Gated::default());
        let hook = InsightHook::new(svc, "sales", json!({}));
        assert_eq!(hook.state().await, HookState::Loading);
        assert!(!hook.is_mounted().await);
        hook.mount().await.unwrap();
        assert!(hook.is_mounted().await);
        assert_eq!(hook.state().await, HookState::Ready);
        assert_eq!(hook.insight("performance").await.map(|i| i.title), Some("call 1".into()));
        assert!(hook.insight("opportunity").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_refresh_makes_one_call() {
        let svc = Arc::new(Gated::default());
        let hook = Arc::new(InsightHook::new(svc.clone(), "sales", json!({})));
        hook.mount().await;

        svc.gated.store(true, Ordering::SeqCst);
        let first = tokio::spawn({
            let hook = hook.clone();
            async move { hook.refresh().await }
        });
        wait_for_calls(&svc, 2).await;
        assert_eq!(hook.state().await, HookState::Refreshing);
        // stale list still visible
        assert_eq!(hook.insights().await[0].title, "call 1");

        assert!(hook.refresh().await.is_none());
        svc.release(2);
        let done = first.await.unwrap();
        assert!(done.is_some());

        assert_eq!(svc.calls.load(Ordering::SeqCst), 2);
        assert_eq!(hook.state().await, HookState::Ready);
        assert_eq!(hook.insights().await[0].title, "call 2");
    }

    #[tokio::test]
    async fn result_after_unmount_is_dropped() {
        let svc = Arc::new(Gated::default());
        let hook = Arc::new(InsightHook::new(svc.clone(), "sales", json!({})));
        hook.mount().await;

        svc.gated.store(true, Ordering::SeqCst);
        let pending = tokio::spawn({
            let hook = hook.clone();
            async move { hook.refresh().await }
        });
        wait_for_calls(&svc, 2).await;
        hook.unmount().await;
        svc.release(2);
        pending.await.unwrap();

        assert_eq!(hook.insights().await[0].title, "call 1");
        assert!(hook.refresh().await.is_none());
    }

    #[tokio::test]
    async fn stale_refresh_does_not_land_after_remount() {
        let svc = Arc::new(Gated::default());
        let hook = Arc::new(InsightHook::new(svc.clone(), "sales", json!({})));
        hook.mount().await;

        svc.gated.store(true, Ordering::SeqCst);
        let stale = tokio::spawn({
            let hook = hook.clone();
            async move { hook.refresh().await }
        });
        wait_for_calls(&svc, 2).await;
        hook.unmount().await;

        let remount = tokio::spawn({
            let hook = hook.clone();
            async move { hook.mount().await }
        });
        wait_for_calls(&svc, 3).await;

        svc.release(2);
        assert!(stale.await.unwrap().is_some());
        assert_eq!(hook.state().await, HookState::Loading);
        assert!(hook.insights().await.is_empty());

        // remount still in flight: no second generation
        assert!(hook.refresh().await.is_none());
        assert!(hook.mount().await.is_none());
        assert_eq!(svc.calls.load(Ordering::SeqCst), 3);

        svc.release(3);
        assert!(remount.await.unwrap().is_some());
        assert_eq!(hook.state().await, HookState::Ready);
        assert_eq!(hook.insights().await[0].title, "call 3");
    }

    #[tokio::test]
    async fn second_mount_while_loading_is_ignored() {
        let svc = Arc::new(Gated::default());
        svc.gated.store(true, Ordering::SeqCst);
        let hook = Arc::new(InsightHook::new(svc.clone(), "sales", json!({})));

        let first = tokio::spawn({
            let hook = hook.clone();
            async move { hook.mount().await }
        });
        wait_for_calls(&svc, 1).await;
        assert!(hook.mount().await.is_none());

        svc.release(1);
        assert!(first.await.unwrap().is_some());
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
        assert_eq!(hook.state().await, HookState::Ready);
    }

    #[tokio::test]
    async fn refresh_uses_replaced_metrics() {
        let svc = Arc::new(Gated::default());
        let hook = InsightHook::new(svc, "sales", json!({ "tag": "before" }));
        hook.mount().await;
        assert_eq!(hook.insights().await[0].content, "before");

        hook.set_metrics(json!({ "tag": "after" })).await;
        hook.refresh().await.unwrap();
        assert_eq!(hook.insights().await[0].content, "after");
    }
}
