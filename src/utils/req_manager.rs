use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Counters for outbound requests made through a [`ReqManager`]
#[derive(Debug, Default)]
pub struct RequestMetrics {
    /// Total number of requests sent
    pub total_requests: AtomicU64,
    /// Requests that produced a response (any status)
    pub successful_requests: AtomicU64,
    /// Requests that failed at the transport level
    pub failed_requests: AtomicU64,
    /// Number of guards currently held
    pub active_requests: AtomicUsize,
    /// Peak concurrent guards observed
    pub peak_concurrent: AtomicUsize,
}

impl RequestMetrics {
    pub fn summary(&self) -> String {
        format!(
            "Requests - Total: {}, Success: {}, Failed: {}, Active: {}, Peak: {}",
            self.total_requests.load(Ordering::Relaxed),
            self.successful_requests.load(Ordering::Relaxed),
            self.failed_requests.load(Ordering::Relaxed),
            self.active_requests.load(Ordering::Relaxed),
            self.peak_concurrent.load(Ordering::Relaxed),
        )
    }
}

/// Shared HTTP client for the outbound provider APIs.
///
/// One long-lived `reqwest::Client` is reused by the language-model and
/// speech adapters so connections are pooled. A semaphore caps the number
/// of requests in flight across all adapters.
///
/// # Example
/// ```rust,no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// use quickcards::utils::req_manager::ReqManager;
///
/// let manager = ReqManager::new(10)?;
/// let guard = manager.acquire().await?;
/// let response = guard.send(guard.client().get("https://example.com")).await?;
/// println!("{} - {}", response.status(), manager.metrics().summary());
/// # Ok(())
/// # }
/// ```
pub struct ReqManager {
    max_concurrent_requests: usize,
    client: Arc<Client>,
    semaphore: Arc<Semaphore>,
    metrics: Arc<RequestMetrics>,
}

/// Holds one concurrency slot; released when dropped.
pub struct ClientGuard<'a> {
    manager: &'a ReqManager,
    _permit: SemaphorePermit<'a>,
}

impl<'a> ClientGuard<'a> {
    pub fn client(&self) -> &Client {
        &self.manager.client
    }

    /// Send a prepared request and record the outcome in the manager metrics.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, reqwest::Error> {
        let metrics = &self.manager.metrics;
        metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let result = request.send().await;
        match &result {
            Ok(_) => metrics.successful_requests.fetch_add(1, Ordering::Relaxed),
            Err(_) => metrics.failed_requests.fetch_add(1, Ordering::Relaxed),
        };
        result
    }
}

impl<'a> Drop for ClientGuard<'a> {
    fn drop(&mut self) {
        self.manager
            .metrics
            .active_requests
            .fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone)]
pub struct ReqManagerConfig {
    pub max_concurrent_requests: usize,
    pub pool_max_idle_per_host: usize,
    pub tcp_keepalive: Duration,
    pub connect_timeout: Duration,
    /// Upper bound for a whole request; adapters may set a shorter one per call
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ReqManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
            pool_max_idle_per_host: 32,
            tcp_keepalive: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(120),
            user_agent: "quick-cards-app".to_string(),
        }
    }
}

impl ReqManager {
    /// Create a manager with default settings and the given concurrency limit.
    pub fn new(
        max_concurrent_requests: usize,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Self::with_config(ReqManagerConfig {
            max_concurrent_requests,
            ..Default::default()
        })
    }

    pub fn with_config(
        config: ReqManagerConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if config.max_concurrent_requests == 0 {
            return Err("max_concurrent_requests must be greater than 0".into());
        }
        if config.max_concurrent_requests > 1000 {
            return Err("max_concurrent_requests must not exceed 1000".into());
        }

        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_keepalive(config.tcp_keepalive)
            .tcp_nodelay(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            max_concurrent_requests: config.max_concurrent_requests,
            client: Arc::new(client),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            metrics: Arc::new(RequestMetrics::default()),
        })
    }

    /// Wait for a free slot and return a guard holding it.
    pub async fn acquire(
        &self,
    ) -> Result<ClientGuard<'_>, Box<dyn std::error::Error + Send + Sync>> {
        let permit = self.semaphore.acquire().await?;

        let active = self.metrics.active_requests.fetch_add(1, Ordering::Relaxed) + 1;
        self.metrics
            .peak_concurrent
            .fetch_max(active, Ordering::Relaxed);

        Ok(ClientGuard {
            manager: self,
            _permit: permit,
        })
    }

    pub fn available_count(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent_requests
    }

    pub fn active_requests(&self) -> usize {
        self.metrics.active_requests.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> &RequestMetrics {
        &self.metrics
    }
}
