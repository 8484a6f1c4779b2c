//! Units of work owned by the scheduler.

use crate::cache::CacheKey;
use crate::types::{Request, Response};
use crate::Result;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Lifecycle of a task.
///
/// `Queued -> Running -> Succeeded | Backoff -> Queued | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Running,
    Succeeded,
    /// Transport failed and a retry is scheduled; holds no slot while waiting.
    Backoff,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// A request that missed the cache and waits for (or holds) a slot.
pub(crate) struct FetchTask {
    pub id: Uuid,
    pub request: Request,
    /// Write-back key, set when the request was cacheable at submission.
    pub cache_key: Option<CacheKey>,
    pub retries: u32,
    pub state: TaskState,
    responder: oneshot::Sender<Result<Response>>,
}

impl FetchTask {
    pub fn new(
        request: Request,
        cache_key: Option<CacheKey>,
    ) -> (Self, oneshot::Receiver<Result<Response>>) {
        let (tx, rx) = oneshot::channel();
        let task = Self {
            id: Uuid::new_v4(),
            request,
            cache_key,
            retries: 0,
            state: TaskState::Queued,
            responder: tx,
        };
        (task, rx)
    }

    /// Deliver the final result and return the terminal state. A caller that
    /// stopped waiting is not an error.
    pub fn complete(self, result: Result<Response>) -> TaskState {
        let state = if result.is_ok() {
            TaskState::Succeeded
        } else {
            TaskState::Failed
        };
        let _ = self.responder.send(result);
        state
    }
}
