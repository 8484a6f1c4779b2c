//! 调度模块：FIFO 队列与并发上限控制，失败请求按退避延迟重新排队。
//!
//! # Admission Scheduler
//!
//! Requests that miss the cache become [`FetchTask`]s in a FIFO queue. The
//! pump admits tasks from the front while fewer than `concurrency` are
//! running, and each admitted task runs on its own tokio task.
//!
//! ## Task lifecycle
//!
//! ```text
//! Queued -> Running -> Succeeded
//!                   -> Backoff -> (delay) -> Queued (front of queue)
//!                   -> Failed
//! ```
//!
//! A task in `Backoff` has already given its slot back; the retry delay runs
//! on a timer and the task re-enters the queue ahead of fresh requests.
//! Completion order across tasks is not defined.
//!
//! ## Invariants
//!
//! - `0 <= active <= concurrency` at admission time. The limit check and the
//!   increment happen under the same lock.
//! - `active` is decremented exactly once per admission, including when the
//!   network call panics.

mod task;

pub use task::TaskState;
pub(crate) use task::FetchTask;

use crate::cache::{CacheKey, CacheManager};
use crate::config::SharedConfig;
use crate::resilience::retry::Decision;
use crate::transport::Transport;
use crate::types::{Request, Response};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, warn};

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Network calls in flight.
    pub active: usize,
    /// Tasks waiting for a slot.
    pub queued: usize,
    /// Tasks sleeping before a retry.
    pub waiting: usize,
}

impl QueueStatus {
    pub fn is_idle(&self) -> bool {
        self.active == 0 && self.queued == 0 && self.waiting == 0
    }
}

#[derive(Default)]
struct State {
    queue: VecDeque<FetchTask>,
    active: usize,
    waiting: usize,
}

impl State {
    fn status(&self) -> QueueStatus {
        QueueStatus {
            active: self.active,
            queued: self.queue.len(),
            waiting: self.waiting,
        }
    }
}

struct Inner {
    state: Mutex<State>,
    idle: Notify,
    transport: Arc<dyn Transport>,
    cache: Arc<CacheManager>,
    config: SharedConfig,
}

/// Bounded-concurrency FIFO executor for fetch tasks.
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<CacheManager>,
        config: SharedConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                idle: Notify::new(),
                transport,
                cache,
                config,
            }),
        }
    }

    /// Append a task and return the channel its result arrives on.
    pub(crate) fn submit(
        &self,
        request: Request,
        cache_key: Option<CacheKey>,
    ) -> oneshot::Receiver<Result<Response>> {
        let (task, rx) = FetchTask::new(request, cache_key);
        if self.inner.config.load().enable_logging {
            debug!(task_id = %task.id, url = %task.request.url(), "request queued");
        }
        self.inner.lock().queue.push_back(task);
        self.inner.pump();
        rx
    }

    /// Admit queued work up to the current limit.
    pub(crate) fn pump(&self) {
        self.inner.pump();
    }

    pub fn status(&self) -> QueueStatus {
        self.inner.lock().status()
    }

    /// Wait until nothing is queued, running or sleeping before a retry.
    pub async fn drain(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.status().is_idle() {
                return;
            }
            notified.await;
        }
    }
}

/// One unit of `active`, handed back exactly once.
struct Slot {
    inner: Arc<Inner>,
    held: bool,
}

impl Slot {
    fn release(mut self) {
        self.held = false;
        self.inner.release_slot(false);
    }

    /// Give the slot back while the task sleeps before its retry.
    fn release_into_backoff(mut self) {
        self.held = false;
        self.inner.release_slot(true);
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if self.held {
            self.inner.release_slot(false);
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        // State is consistent between critical sections, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn pump(self: &Arc<Self>) {
        let limit = self.config.load().concurrency.max(1);
        let admitted: Vec<FetchTask> = {
            let mut st = self.lock();
            let mut out = Vec::new();
            while st.active < limit {
                match st.queue.pop_front() {
                    Some(task) => {
                        st.active += 1;
                        out.push(task);
                    }
                    None => break,
                }
            }
            out
        };

        for task in admitted {
            let slot = Slot {
                inner: Arc::clone(self),
                held: true,
            };
            tokio::spawn(Arc::clone(self).run(task, slot));
        }
    }

    fn release_slot(self: &Arc<Self>, into_backoff: bool) {
        let idle = {
            let mut st = self.lock();
            st.active = st.active.saturating_sub(1);
            if into_backoff {
                st.waiting += 1;
            }
            st.status().is_idle()
        };
        if idle {
            self.idle.notify_waiters();
        } else {
            self.pump();
        }
    }

    fn requeue(self: &Arc<Self>, mut task: FetchTask) {
        task.retries += 1;
        task.state = TaskState::Queued;
        {
            let mut st = self.lock();
            st.waiting = st.waiting.saturating_sub(1);
            st.queue.push_front(task);
        }
        self.pump();
    }

    async fn run(self: Arc<Self>, mut task: FetchTask, slot: Slot) {
        let cfg = self.config.load_full();
        let attempt = task.retries;
        let started = Instant::now();
        task.state = TaskState::Running;

        match self.transport.send(&task.request).await {
            Ok(response) => {
                if response.is_success() {
                    if let Some(ref key) = task.cache_key {
                        self.cache.store(key, &response).await;
                    }
                }
                let (task_id, url) = (task.id, task.request.url().clone());
                let status = response.status().as_u16();
                let state = task.complete(Ok(response));
                slot.release();
                if cfg.enable_logging {
                    debug!(
                        task_id = %task_id,
                        url = %url,
                        status,
                        attempt,
                        state = ?state,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "request completed"
                    );
                }
            }
            Err(err) => match cfg.retry_policy().decide(attempt) {
                Decision::Retry { delay } => {
                    task.state = TaskState::Backoff;
                    if cfg.enable_logging {
                        warn!(
                            task_id = %task.id,
                            url = %task.request.url(),
                            retry = attempt + 1,
                            max_retries = cfg.max_retries,
                            state = ?task.state,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "retrying request"
                        );
                    }
                    slot.release_into_backoff();
                    let inner = Arc::clone(&self);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        inner.requeue(task);
                    });
                }
                Decision::Fail => {
                    let (task_id, url) = (task.id, task.request.url().clone());
                    let error = err.to_string();
                    let state = task.complete(Err(Error::RetriesExhausted {
                        attempts: attempt + 1,
                        source: err,
                    }));
                    slot.release();
                    if cfg.enable_logging {
                        warn!(
                            task_id = %task_id,
                            url = %url,
                            attempts = attempt + 1,
                            state = ?state,
                            error = %error,
                            "request failed after retries"
                        );
                    }
                }
            },
        }
    }
}
