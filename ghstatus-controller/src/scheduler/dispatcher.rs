//! Event dispatcher
//!
//! Consumes watch events, filters them, and runs reconciliations.
//! Different runs reconcile concurrently up to the configured limit; a run
//! never has more than one reconciliation in flight. Any event that arrives
//! for a busy run marks it dirty and it is reconciled once more afterwards.
//!
//! Updates whose conditions equal the last successfully reconciled set are
//! skipped. A failed or panicked reconciliation clears that set, so the next
//! delivery of the same snapshot is retried.

use ghstatus_core::domain::pipeline_run::{Condition, ObjectKey};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::repository::{PipelineRunCache, PipelineRunRepository};
use crate::scheduler::feed::WatchEvent;
use crate::scheduler::predicate::{LabelSelector, status_changed};
use crate::service::{ReconcileOutcome, Reconciler};

/// Counters reported when the dispatcher stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub reconciled: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// What an event means for its pipeline run
enum Admission {
    /// Deleted or no longer selected
    Forget(ObjectKey),
    /// Same conditions as the last successful reconciliation
    Unchanged(ObjectKey),
    Changed(ObjectKey),
}

pub struct Dispatcher {
    reconciler: Arc<Reconciler>,
    cache: Arc<PipelineRunCache>,
    selector: LabelSelector,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    /// `cache` must be the store the reconciler reads pipeline runs from
    pub fn new(
        reconciler: Arc<Reconciler>,
        cache: Arc<PipelineRunCache>,
        selector: LabelSelector,
        max_concurrent: usize,
    ) -> Self {
        Self {
            reconciler,
            cache,
            selector,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Runs until the feed closes and all work drains, or until `shutdown`
    ///
    /// On shutdown in-flight reconciliations are aborted.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<WatchEvent>,
        shutdown: CancellationToken,
    ) -> DispatchStats {
        info!(
            "Dispatching pipeline runs matching '{}' (max {} concurrent)",
            self.selector,
            self.semaphore.available_permits()
        );

        let mut tasks: JoinSet<bool> = JoinSet::new();
        let mut running: HashMap<task::Id, ObjectKey> = HashMap::new();
        let mut in_flight: HashSet<ObjectKey> = HashSet::new();
        let mut dirty: HashSet<ObjectKey> = HashSet::new();
        let mut reconciled: HashMap<ObjectKey, Vec<Condition>> = HashMap::new();
        let mut stats = DispatchStats::default();
        let mut feed_open = true;

        while feed_open || !tasks.is_empty() {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, aborting {} reconciliation(s)", tasks.len());
                    tasks.shutdown().await;
                    break;
                }

                Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    let (id, succeeded) = match joined {
                        Ok((id, succeeded)) => (id, succeeded),
                        Err(e) => {
                            warn!("Reconcile task panicked: {}", e);
                            (e.id(), false)
                        }
                    };

                    if succeeded {
                        stats.reconciled += 1;
                    } else {
                        stats.failed += 1;
                    }

                    let Some(key) = running.remove(&id) else {
                        continue;
                    };

                    if succeeded {
                        self.remember_reconciled(&mut reconciled, &key).await;
                    } else {
                        reconciled.remove(&key);
                    }

                    if dirty.remove(&key) {
                        debug!("{} changed while reconciling, running again", key);
                        let id = self.spawn_reconcile(&mut tasks, key.clone());
                        running.insert(id, key);
                    } else {
                        in_flight.remove(&key);
                    }
                }

                event = events.recv(), if feed_open => {
                    let Some(event) = event else {
                        debug!("Event feed closed, draining {} reconciliation(s)", tasks.len());
                        feed_open = false;
                        continue;
                    };

                    match self.admit(event, &reconciled).await {
                        Admission::Forget(key) => {
                            reconciled.remove(&key);
                            stats.skipped += 1;
                        }
                        Admission::Unchanged(key) if !in_flight.contains(&key) => {
                            debug!("Conditions of {} unchanged, skipping", key);
                            stats.skipped += 1;
                        }
                        Admission::Changed(key) | Admission::Unchanged(key) => {
                            if in_flight.contains(&key) {
                                dirty.insert(key);
                            } else {
                                in_flight.insert(key.clone());
                                let id = self.spawn_reconcile(&mut tasks, key.clone());
                                running.insert(id, key);
                            }
                        }
                    }
                }
            }
        }

        info!(
            "Dispatcher stopped: {} reconciled, {} failed, {} skipped, {} run(s) tracked",
            stats.reconciled,
            stats.failed,
            stats.skipped,
            self.cache.len().await
        );
        stats
    }

    /// Updates the cache and classifies the event
    async fn admit(
        &self,
        event: WatchEvent,
        reconciled: &HashMap<ObjectKey, Vec<Condition>>,
    ) -> Admission {
        let key = event.run().key();

        match event {
            WatchEvent::Deleted(_) => {
                if self.cache.remove(&key).await.is_some() {
                    debug!("Forgot deleted pipeline run {}", key);
                }
                Admission::Forget(key)
            }
            WatchEvent::Applied(run) => {
                if !self.selector.matches(run.labels()) {
                    if self.cache.remove(&key).await.is_some() {
                        debug!("{} no longer matches the selector", key);
                    }
                    return Admission::Forget(key);
                }

                let changed = status_changed(reconciled.get(&key).map(Vec::as_slice), &run);
                self.cache.upsert(run).await;

                if changed {
                    Admission::Changed(key)
                } else {
                    Admission::Unchanged(key)
                }
            }
        }
    }

    /// Records the conditions now current for `key` as reconciled
    async fn remember_reconciled(
        &self,
        reconciled: &mut HashMap<ObjectKey, Vec<Condition>>,
        key: &ObjectKey,
    ) {
        match self.cache.get(key).await {
            Ok(Some(run)) => {
                reconciled.insert(key.clone(), run.conditions().to_vec());
            }
            _ => {
                reconciled.remove(key);
            }
        }
    }

    fn spawn_reconcile(&self, tasks: &mut JoinSet<bool>, key: ObjectKey) -> task::Id {
        let reconciler = Arc::clone(&self.reconciler);
        let semaphore = Arc::clone(&self.semaphore);

        let handle = tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return false;
            };

            match reconciler.reconcile(&key).await {
                Ok(ReconcileOutcome::Gone) => true,
                Ok(ReconcileOutcome::Published(statuses)) => {
                    debug!("{} status(es) published for {}", statuses.len(), key);
                    true
                }
                Err(e) => {
                    error!("Failed to reconcile {}: {}", key, e);
                    false
                }
            }
        });
        handle.id()
    }
}
