//! Background refresh: refetch a query on a fixed interval and publish each
//! result on a `watch` channel.
//!
//! The first fetch happens immediately. A failed refresh is published too,
//! so a view can show the error next to the last good data. The task stops
//! when its handle is dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use dispatch_core::{Incident, IncidentStats};

use crate::api::IncidentApi;
use crate::cache::QueryClient;
use crate::error::ClientError;

/// One published refresh.
pub struct Polled<T> {
    pub result: Result<Arc<T>, Arc<ClientError>>,
    /// Starts at 1 and increases with every refresh.
    pub sequence: u64,
}

impl<T> Clone for Polled<T> {
    fn clone(&self) -> Self {
        Polled {
            result: self.result.clone(),
            sequence: self.sequence,
        }
    }
}

pub struct PollHandle<T> {
    updates: watch::Receiver<Option<Polled<T>>>,
    task: JoinHandle<()>,
}

impl<T> PollHandle<T> {
    /// Wait for the next refresh. `None` once the poller has stopped.
    pub async fn next(&mut self) -> Option<Polled<T>> {
        self.updates.changed().await.ok()?;
        self.updates.borrow_and_update().clone()
    }

    pub fn latest(&self) -> Option<Polled<T>> {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Polled<T>>> {
        self.updates.clone()
    }

    pub fn stop(self) {}
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `fetch` every `every`, starting now.
pub fn spawn_poller<T, F, Fut>(name: &'static str, every: Duration, mut fetch: F) -> PollHandle<T>
where
    T: Send + Sync + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<T>, ClientError>> + Send,
{
    let (tx, rx) = watch::channel(None);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sequence = 0u64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tx.closed() => break,
            }
            let result = fetch().await.map_err(Arc::new);
            sequence += 1;
            match &result {
                Ok(_) => tracing::debug!(poller = name, sequence, "refreshed"),
                Err(e) => tracing::warn!(poller = name, sequence, error = %e, "refresh failed"),
            }
            if tx.send(Some(Polled { result, sequence })).is_err() {
                break;
            }
        }
    });
    PollHandle { updates: rx, task }
}

impl<A: IncidentApi> QueryClient<A> {
    /// Keep the incident list fresh.
    pub fn poll_incidents(self: &Arc<Self>, every: Duration) -> PollHandle<Vec<Incident>> {
        let client = Arc::clone(self);
        spawn_poller("incidents", every, move || {
            let client = Arc::clone(&client);
            async move { client.refetch_incidents().await }
        })
    }

    /// Keep the dashboard counters fresh.
    pub fn poll_stats(self: &Arc<Self>, every: Duration) -> PollHandle<IncidentStats> {
        let client = Arc::clone(self);
        spawn_poller("stats", every, move || {
            let client = Arc::clone(&client);
            async move { client.refetch_stats().await }
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
