//! Single-flight coalescing of concurrent cache misses
//!
//! While a computation for a key is running, its shared future sits in the
//! pending map. Callers that miss the cache for the same key await that
//! future instead of starting their own. The computation runs on its own
//! task and removes its entry when it completes, so a failed computation is
//! never replayed to later callers and an abandoned one does not linger.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::CacheKey;
use crate::errors::{AppError, AppResult};
use crate::fingerprint::FingerprintResult;

type SharedComputation = Shared<BoxFuture<'static, AppResult<FingerprintResult>>>;

/// Map of computations currently running, keyed by source identity
#[derive(Clone, Default)]
pub struct InFlight {
    pending: Arc<Mutex<HashMap<CacheKey, SharedComputation>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the running computation for `key`, or start one with `start`
    ///
    /// `start` is only invoked when no computation for `key` is pending.
    pub async fn join_or_start<F, Fut>(&self, key: &CacheKey, start: F) -> AppResult<FingerprintResult>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<FingerprintResult>> + Send + 'static,
    {
        let computation = {
            let mut pending = self.pending.lock().await;
            match pending.get(key) {
                Some(running) => {
                    debug!(cache_key = %key, "Joining in-flight computation");
                    running.clone()
                }
                None => {
                    let registry = Arc::clone(&self.pending);
                    let own_key = key.clone();
                    let work = start();
                    // Runs to completion even if every waiter goes away
                    let task = tokio::spawn(async move {
                        let result = work.await;
                        registry.lock().await.remove(&own_key);
                        result
                    });
                    let computation = async move {
                        task.await.unwrap_or_else(|e| {
                            Err(AppError::internal(format!("In-flight computation aborted: {e}")))
                        })
                    }
                    .boxed()
                    .shared();
                    pending.insert(key.clone(), computation.clone());
                    computation
                }
            }
        };

        computation.await
    }

    /// Number of computations currently pending
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
