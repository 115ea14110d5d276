//! Pool lifecycle and concurrency tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tokio_test::{assert_pending, assert_ready, task};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::*;
use crate::app::client::Client;
use crate::errors::{ErrorKind, FetchResult};

/// Body is the requested URL without the trailing slash `Url` adds
#[derive(Debug, Default)]
struct EchoClient;

#[async_trait]
impl Client for EchoClient {
    async fn get(&self, url: &Url) -> FetchResult<Vec<u8>> {
        Ok(url.as_str().trim_end_matches('/').as_bytes().to_vec())
    }
}

/// Sleeps per request and records the highest concurrency it saw
#[derive(Debug)]
struct SlowClient {
    delay: Duration,
    current: AtomicUsize,
    max: AtomicUsize,
}

impl SlowClient {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: AtomicUsize::new(0),
            max: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Client for SlowClient {
    async fn get(&self, url: &Url) -> FetchResult<Vec<u8>> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(url.as_str().as_bytes().to_vec())
    }
}

/// Blocks every request until the test hands out a release
#[derive(Debug)]
struct BlockingClient {
    release: Semaphore,
}

impl BlockingClient {
    fn new() -> Self {
        Self {
            release: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl Client for BlockingClient {
    async fn get(&self, url: &Url) -> FetchResult<Vec<u8>> {
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
        Ok(url.as_str().as_bytes().to_vec())
    }
}

fn pool_with(parallelism: usize, mode: DispatchMode, client: Arc<dyn Client>) -> Arc<Pool> {
    let config = PoolConfigBuilder::new()
        .parallelism(parallelism)
        .request_timeout(Duration::from_secs(5))
        .dispatch_mode(mode)
        .build()
        .unwrap();
    Arc::new(Pool::new(config, client).unwrap())
}

async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let polled = timeout(Duration::from_secs(2), async {
        while !condition() {
            sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {}", what);
}

async fn stop(pool: &Arc<Pool>, cancel: CancellationToken, dispatcher: JoinHandle<PoolResult<()>>) {
    cancel.cancel();
    dispatcher.await.unwrap().unwrap();
    assert_eq!(pool.state(), PoolState::Stopped);
    pool.close().await;
}

#[tokio::test]
async fn test_end_to_end_digests() {
    for mode in [DispatchMode::SpawnPerTask, DispatchMode::FixedWorkers] {
        let pool = pool_with(3, mode, Arc::new(EchoClient));
        let cancel = CancellationToken::new();
        let dispatcher = pool.spawn_dispatcher(cancel.clone());

        pool.send("adjust.com").await;
        pool.send("google.com").await;

        let mut seen = HashSet::new();
        for _ in 0..2 {
            let result = pool.recv().await.unwrap();
            seen.insert((result.url().to_string(), result.digest().unwrap().to_hex()));
        }

        let expected: HashSet<_> = [
            ("http://adjust.com", "b53f3f2ec2e7e01d9e1130baac274a90"),
            ("http://google.com", "c7b920f57e553df2bb68272f61570210"),
        ]
        .into_iter()
        .map(|(url, hex)| (url.to_string(), hex.to_string()))
        .collect();
        assert_eq!(seen, expected, "mode {}", mode);

        stop(&pool, cancel, dispatcher).await;

        let stats = pool.stats();
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.in_flight, 0);
    }
}

#[tokio::test]
async fn test_invalid_urls_become_error_results() {
    let pool = pool_with(2, DispatchMode::SpawnPerTask, Arc::new(EchoClient));
    let cancel = CancellationToken::new();
    let dispatcher = pool.spawn_dispatcher(cancel.clone());

    pool.send("http://[::1").await;
    pool.send("reddit.com/r/funny").await;

    let mut results = Vec::new();
    for _ in 0..2 {
        results.push(pool.recv().await.unwrap());
    }
    results.sort_by(|a, b| a.url().cmp(b.url()));

    assert_eq!(results[0].url(), "http://[::1");
    assert_eq!(results[0].error_kind(), Some(ErrorKind::InvalidUrl));
    assert_eq!(results[1].url(), "http://reddit.com/r/funny");
    assert_eq!(
        results[1].digest().unwrap().to_hex(),
        "a700cd30f93446b941a501527064f998"
    );

    stop(&pool, cancel, dispatcher).await;
    assert_eq!(pool.stats().failed, 1);
}

#[tokio::test]
async fn test_concurrency_never_exceeds_parallelism() {
    for mode in [DispatchMode::SpawnPerTask, DispatchMode::FixedWorkers] {
        let client = Arc::new(SlowClient::new(Duration::from_millis(5)));
        let pool = pool_with(3, mode, client.clone());
        let cancel = CancellationToken::new();
        let dispatcher = pool.spawn_dispatcher(cancel.clone());

        let producer = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                for i in 0..30 {
                    pool.send(format!("host{}.example", i)).await;
                }
            })
        };

        let results: Vec<_> = pool.results().take(30).collect().await;
        producer.await.unwrap();

        assert_eq!(results.len(), 30);
        assert!(results.iter().all(|r| r.is_success()));
        assert!(client.max.load(Ordering::SeqCst) <= 3, "mode {}", mode);
        assert!(pool.gate().peak() <= 3);
        assert!(pool.gate().peak() >= 1);

        stop(&pool, cancel, dispatcher).await;
        assert_eq!(pool.stats().succeeded, 30);
    }
}

#[tokio::test]
async fn test_send_blocks_once_input_is_full() {
    let pool = pool_with(2, DispatchMode::SpawnPerTask, Arc::new(BlockingClient::new()));

    // Nothing consumes yet: the first `parallelism` sends still complete
    timeout(Duration::from_secs(1), async {
        pool.send("a.example").await;
        pool.send("b.example").await;
    })
    .await
    .expect("sends within capacity must not block");

    let mut third = task::spawn(pool.send("c.example"));
    assert_pending!(third.poll());

    let cancel = CancellationToken::new();
    let dispatcher = pool.spawn_dispatcher(cancel.clone());

    wait_until("dispatcher to drain input", || pool.stats().dispatched == 2).await;
    assert!(third.is_woken());
    assert_ready!(third.poll());
    drop(third);

    assert_eq!(pool.stats().submitted, 3);
    cancel.cancel();
    dispatcher.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_cancellation_stops_admission_but_delivers_admitted() {
    let client = Arc::new(BlockingClient::new());
    let pool = pool_with(1, DispatchMode::SpawnPerTask, client.clone());
    let cancel = CancellationToken::new();
    let dispatcher = pool.spawn_dispatcher(cancel.clone());

    pool.send("first.example").await;
    wait_until("first unit admitted", || pool.gate().in_flight() == 1).await;
    pool.send("second.example").await;
    wait_until("second task dispatched", || pool.stats().dispatched == 2).await;

    cancel.cancel();
    dispatcher.await.unwrap().unwrap();
    assert_eq!(pool.state(), PoolState::Stopped);

    wait_until("waiting unit abandoned", || pool.stats().abandoned == 1).await;

    // The admitted unit still finishes and publishes
    client.release.add_permits(1);
    let result = timeout(Duration::from_secs(1), pool.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.url(), "http://first.example");
    assert!(result.is_success());

    wait_until("slot released", || pool.gate().in_flight() == 0).await;
    let stats = pool.stats();
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.completed(), 1);
    assert_eq!(stats.peak_in_flight, 1);

    pool.close().await;
    assert!(pool.recv().await.is_none());
}

#[tokio::test]
async fn test_full_output_queue_holds_gate_slot() {
    for mode in [DispatchMode::SpawnPerTask, DispatchMode::FixedWorkers] {
        let pool = pool_with(1, mode, Arc::new(EchoClient));
        let cancel = CancellationToken::new();
        let dispatcher = pool.spawn_dispatcher(cancel.clone());

        pool.send("a.example").await;
        pool.send("b.example").await;
        pool.send("c.example").await;

        // a fills the output queue; b finishes but cannot publish
        wait_until("two fetches done", || pool.stats().completed() == 2).await;
        sleep(Duration::from_millis(30)).await;
        assert_eq!(pool.gate().in_flight(), 1, "mode {}", mode);
        assert_eq!(pool.stats().completed(), 2, "mode {}", mode);

        // Each recv frees room for exactly one more unit
        let mut urls = HashSet::new();
        urls.insert(pool.recv().await.unwrap().url().to_string());
        wait_until("third fetch admitted", || pool.stats().completed() == 3).await;
        assert_eq!(pool.gate().in_flight(), 1);

        for _ in 0..2 {
            urls.insert(pool.recv().await.unwrap().url().to_string());
        }
        assert_eq!(urls.len(), 3);
        wait_until("slot released", || pool.gate().in_flight() == 0).await;
        assert_eq!(pool.stats().peak_in_flight, 1);

        stop(&pool, cancel, dispatcher).await;
    }
}

#[tokio::test]
async fn test_fixed_workers_return_on_cancel_with_full_output() {
    let pool = pool_with(1, DispatchMode::FixedWorkers, Arc::new(EchoClient));
    let cancel = CancellationToken::new();
    let dispatcher = pool.spawn_dispatcher(cancel.clone());

    pool.send("a.example").await;
    pool.send("b.example").await;
    wait_until("worker blocked on output", || pool.stats().completed() == 2).await;

    cancel.cancel();
    let stopped = timeout(Duration::from_secs(2), dispatcher).await;
    assert!(stopped.is_ok(), "run must return once cancelled");
    stopped.unwrap().unwrap().unwrap();
    assert_eq!(pool.state(), PoolState::Stopped);

    // The stuck publish fails once the queues close; a stays readable
    pool.close().await;
    assert_eq!(pool.recv().await.unwrap().url(), "http://a.example");
    assert!(pool.recv().await.is_none());

    wait_until("worker gave up its slot", || pool.gate().in_flight() == 0).await;
    let stats = pool.stats();
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.undelivered, 1);
}

#[tokio::test]
async fn test_fixed_workers_take_nothing_after_cancel() {
    let client = Arc::new(BlockingClient::new());
    let pool = pool_with(1, DispatchMode::FixedWorkers, client.clone());
    let cancel = CancellationToken::new();
    let dispatcher = pool.spawn_dispatcher(cancel.clone());

    pool.send("first.example").await;
    wait_until("first task running", || pool.gate().in_flight() == 1).await;
    pool.send("second.example").await;

    cancel.cancel();
    timeout(Duration::from_secs(2), dispatcher)
        .await
        .expect("run must return while a worker is busy")
        .unwrap()
        .unwrap();

    client.release.add_permits(2);
    let result = timeout(Duration::from_secs(1), pool.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.url(), "http://first.example");

    wait_until("slot released", || pool.gate().in_flight() == 0).await;
    sleep(Duration::from_millis(20)).await;
    assert_eq!(pool.stats().dispatched, 1);
    assert_eq!(pool.stats().completed(), 1);

    pool.close().await;
    assert!(pool.recv().await.is_none());
}

#[tokio::test]
async fn test_cancel_before_any_task() {
    let pool = pool_with(2, DispatchMode::SpawnPerTask, Arc::new(EchoClient));
    let cancel = CancellationToken::new();
    cancel.cancel();

    pool.run(cancel).await.unwrap();
    assert_eq!(pool.state(), PoolState::Stopped);
    assert_eq!(pool.stats().dispatched, 0);
}

#[tokio::test]
async fn test_close_keeps_buffered_results() {
    let pool = pool_with(2, DispatchMode::SpawnPerTask, Arc::new(EchoClient));
    let cancel = CancellationToken::new();
    let dispatcher = pool.spawn_dispatcher(cancel.clone());

    pool.send("adjust.com").await;
    wait_until("result published", || pool.stats().completed() == 1).await;

    stop(&pool, cancel, dispatcher).await;
    assert_eq!(pool.state(), PoolState::Closed);

    let buffered = pool.recv().await.unwrap();
    assert_eq!(buffered.url(), "http://adjust.com");
    assert!(pool.recv().await.is_none());

    // Closing again is harmless
    pool.close().await;
}

#[tokio::test]
async fn test_second_run_is_rejected() {
    let pool = pool_with(2, DispatchMode::SpawnPerTask, Arc::new(EchoClient));
    let cancel = CancellationToken::new();
    let dispatcher = pool.spawn_dispatcher(cancel.clone());

    wait_until("dispatch loop running", || {
        pool.state() == PoolState::Dispatching
    })
    .await;
    assert!(matches!(
        pool.run(CancellationToken::new()).await,
        Err(PoolError::AlreadyRunning { .. })
    ));

    cancel.cancel();
    dispatcher.await.unwrap().unwrap();
    assert!(matches!(
        pool.run(CancellationToken::new()).await,
        Err(PoolError::AlreadyRunning { .. })
    ));

    pool.close().await;
    assert_eq!(
        pool.run(CancellationToken::new()).await,
        Err(PoolError::Closed)
    );
}

#[tokio::test]
#[should_panic(expected = "after Pool::close")]
async fn test_send_after_close_panics() {
    let pool = pool_with(1, DispatchMode::SpawnPerTask, Arc::new(EchoClient));
    pool.close().await;
    pool.send("adjust.com").await;
}

#[tokio::test]
#[should_panic(expected = "dispatch loop is running")]
async fn test_close_while_running_panics() {
    let pool = pool_with(1, DispatchMode::SpawnPerTask, Arc::new(EchoClient));
    let _dispatcher = pool.spawn_dispatcher(CancellationToken::new());

    wait_until("dispatch loop running", || {
        pool.state() == PoolState::Dispatching
    })
    .await;
    pool.close().await;
}

#[test]
fn test_new_rejects_zero_parallelism() {
    let config = PoolConfig {
        parallelism: 0,
        ..Default::default()
    };
    assert_eq!(
        Pool::new(config, Arc::new(EchoClient)).unwrap_err(),
        PoolError::InvalidParallelism { value: 0 }
    );
}

#[test]
fn test_new_rejects_parallelism_beyond_gate_capacity() {
    let config = PoolConfig {
        parallelism: crate::constants::pool::MAX_PARALLELISM + 1,
        ..Default::default()
    };
    assert!(matches!(
        Pool::new(config, Arc::new(EchoClient)),
        Err(PoolError::InvalidConfig { .. })
    ));
}
