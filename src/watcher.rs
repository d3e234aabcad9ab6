//! # Serving Watcher
//!
//! Background polling of active servings (order runs) in a kitchen. The
//! watcher is an explicit handle owned by the caller: spawn it, keep the
//! handle, and stop it when done. There is no process-global instance, so
//! two watchers over different kitchens can coexist and tests can run
//! watchers in isolation.
//!
//! The poll thread checks its stop flag at a finer granularity than the
//! poll period, so `stop` takes effect promptly even with long periods.

use crate::api::{RecipeService, ServingSummary};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const STOP_CHECK_GRANULARITY: Duration = Duration::from_millis(100);

/// Handle to a running watcher thread.
pub struct ServingWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ServingWatcher {
    /// Spawn a watcher polling `kitchen` every `period`.
    ///
    /// Poll failures are logged and do not stop the watcher; the next
    /// period retries.
    pub fn spawn<S>(service: S, kitchen: String, period: Duration) -> Self
    where
        S: RecipeService + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            let mut known: BTreeMap<String, String> = BTreeMap::new();
            while !stop_flag.load(Ordering::Relaxed) {
                match service.active_servings(&kitchen) {
                    Ok(servings) => log_transitions(&kitchen, &mut known, &servings),
                    Err(e) => warn!("serving poll for kitchen '{}' failed: {}", kitchen, e),
                }
                sleep_interruptibly(period, &stop_flag);
            }
            debug!("serving watcher for kitchen '{}' stopped", kitchen);
        });
        ServingWatcher {
            stop,
            handle: Some(handle),
        }
    }

    /// Ask the poll thread to stop. Returns immediately.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Stop and wait for the thread to exit, up to `timeout`.
    ///
    /// Returns `true` if the thread exited in time.
    pub fn join_timeout(mut self, timeout: Duration) -> bool {
        self.stop();
        let deadline = Instant::now() + timeout;
        loop {
            let finished = self
                .handle
                .as_ref()
                .map(|h| h.is_finished())
                .unwrap_or(true);
            if finished {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(STOP_CHECK_GRANULARITY.min(timeout));
        }
    }
}

impl Drop for ServingWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sleep_interruptibly(period: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + period;
    while Instant::now() < deadline && !stop.load(Ordering::Relaxed) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        std::thread::sleep(remaining.min(STOP_CHECK_GRANULARITY));
    }
}

/// Diff the polled servings against the last snapshot and log changes.
fn log_transitions(
    kitchen: &str,
    known: &mut BTreeMap<String, String>,
    servings: &[ServingSummary],
) {
    let mut current: BTreeMap<String, String> = BTreeMap::new();
    for serving in servings {
        current.insert(serving.order_run_id.clone(), serving.status.clone());
        match known.get(&serving.order_run_id) {
            None => info!(
                "kitchen '{}': serving {} (order {}) started, status {}",
                kitchen, serving.order_run_id, serving.order_id, serving.status
            ),
            Some(prior) if prior != &serving.status => info!(
                "kitchen '{}': serving {} changed {} -> {}",
                kitchen, serving.order_run_id, prior, serving.status
            ),
            Some(_) => {}
        }
    }
    for gone in known.keys().filter(|id| !current.contains_key(*id)) {
        info!("kitchen '{}': serving {} finished", kitchen, gone);
    }
    *known = current;
}
