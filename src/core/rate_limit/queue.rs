use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, error, warn};

use super::config::RateLimitConfig;

/// Implemented by task errors so the queue can tell a rate-limit rejection
/// (retried with backoff) from any other failure (propagated immediately).
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;
}

/// Failure delivered to the submitter of a queued task.
#[derive(Debug)]
pub enum QueueError<E> {
    /// The task itself failed; for rate-limit errors this is the final attempt
    Task(E),
    /// The task was dropped before it produced a result
    Abandoned,
}

impl<E: fmt::Display> fmt::Display for QueueError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Task(err) => write!(f, "{err}"),
            QueueError::Abandoned => write!(f, "queued task was dropped before completing"),
        }
    }
}

impl<E> std::error::Error for QueueError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueueError::Task(err) => Some(err),
            QueueError::Abandoned => None,
        }
    }
}

type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Deferred task. Returns `None` when its submitter has stopped waiting, in
/// which case the drain loop skips it without consuming a rate slot.
type QueuedTask = Box<dyn FnOnce() -> Option<TaskFuture> + Send>;

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<QueuedTask>,
    draining: bool,
    last_start: Option<Instant>,
}

/// Strictly sequential task queue with a fixed start rate and per-task
/// exponential backoff on rate-limit failures.
///
/// Tasks start in submission order, one at a time. Task `N + 1` never starts
/// before task `N` has settled and `1s / requests_per_second` has elapsed since
/// task `N` started. A single drain task runs while work is pending; it exits
/// when the queue empties and is respawned by the next submission.
///
/// # Example
///
/// ```rust,no_run
/// use quickcards::core::rate_limit::{RateLimitConfig, RateLimitedQueue};
/// use quickcards::core::tts::TTSError;
///
/// # async fn example() {
/// let queue = RateLimitedQueue::new(RateLimitConfig::default());
/// let result = queue
///     .submit(|| async { Ok::<_, TTSError>("audio.mp3".to_string()) })
///     .await;
/// assert!(result.is_ok());
/// # }
/// ```
#[derive(Clone)]
pub struct RateLimitedQueue {
    config: Arc<RateLimitConfig>,
    state: Arc<Mutex<QueueState>>,
}

impl RateLimitedQueue {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(QueueState::default())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Number of tasks waiting to start.
    pub fn pending(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Whether a drain loop is currently running.
    pub fn is_draining(&self) -> bool {
        self.state.lock().draining
    }

    /// Enqueue a task and return a future resolving to its result.
    ///
    /// The task is placed in the queue immediately, so submission order is the
    /// order of `submit` calls, not the order in which the returned futures are
    /// polled. `task` is invoked once per attempt. Must be called from within a
    /// Tokio runtime.
    pub fn submit<T, E, F, Fut>(
        &self,
        task: F,
    ) -> impl Future<Output = Result<T, QueueError<E>>> + Send + 'static
    where
        T: Send + 'static,
        E: RateLimitSignal + fmt::Display + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let config = self.config.clone();

        let queued: QueuedTask = Box::new(move || {
            if tx.is_closed() {
                return None;
            }
            let run: TaskFuture = Box::pin(async move {
                let result = run_with_backoff(task, &config).await;
                let _ = tx.send(result);
            });
            Some(run)
        });

        let spawn_drain = {
            let mut state = self.state.lock();
            state.tasks.push_back(queued);
            debug!("Task queued, {} pending", state.tasks.len());
            !std::mem::replace(&mut state.draining, true)
        };

        if spawn_drain {
            tokio::spawn(drain(self.state.clone(), self.config.clone()));
        }

        async move {
            rx.await
                .map_err(|_| QueueError::Abandoned)?
                .map_err(QueueError::Task)
        }
    }
}

async fn drain(state: Arc<Mutex<QueueState>>, config: Arc<RateLimitConfig>) {
    debug!("Rate-limited queue draining");
    let interval = config.min_interval();

    loop {
        let (queued, last_start) = {
            let mut guard = state.lock();
            match guard.tasks.pop_front() {
                Some(queued) => (queued, guard.last_start),
                None => {
                    guard.draining = false;
                    break;
                }
            }
        };

        if let Some(last_start) = last_start {
            sleep_until(last_start + interval).await;
        }

        // Checked after the wait so a submitter that gave up meanwhile is skipped
        let Some(task) = queued() else {
            debug!("Skipping queued task: submitter is no longer waiting");
            continue;
        };
        state.lock().last_start = Some(Instant::now());

        // A panicking task drops its result sender, so its submitter sees
        // `Abandoned`; the loop keeps serving the tasks behind it.
        if AssertUnwindSafe(task).catch_unwind().await.is_err() {
            error!("Queued task panicked");
        }
    }

    debug!("Rate-limited queue idle");
}

async fn run_with_backoff<T, E, F, Fut>(task: F, config: &RateLimitConfig) -> Result<T, E>
where
    E: RateLimitSignal + fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retry_count = 0;

    loop {
        match task().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() && retry_count < config.max_retries => {
                let delay = config.backoff_for(retry_count);
                warn!(
                    "Rate limited: {}. Retry {}/{} in {:?}",
                    err,
                    retry_count + 1,
                    config.max_retries,
                    delay
                );
                sleep(delay).await;
                retry_count += 1;
            }
            Err(err) => {
                if err.is_rate_limited() {
                    warn!("Rate limit retries exhausted after {} retries", retry_count);
                }
                return Err(err);
            }
        }
    }
}
