//! Tests for the poller module.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use sqlmap_core::{LiveRegistry, ReloadScope};

use super::*;
use crate::error::ResolveError;
use crate::parser::YamlMappingParser;
use crate::resolver::{MemoryResourceResolver, ResourceDescriptor, ResourceResolver};
use crate::service::ReloadService;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn mapper(statement: &str) -> String {
    format!(
        "namespace: a.A\nstatements:\n  - id: {}\n    kind: select\n    sql: select 1\n",
        statement
    )
}

fn service(resolver: Arc<MemoryResourceResolver>) -> Arc<ReloadService> {
    Arc::new(ReloadService::new(
        vec!["m/*.yml".to_string()],
        ReloadScope::All,
        Arc::new(LiveRegistry::new()),
        resolver,
        Arc::new(YamlMappingParser::new()),
    ))
}

async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[test]
fn zero_period_is_clamped() {
    let poller = Poller::new(
        service(Arc::new(MemoryResourceResolver::new())),
        Duration::ZERO,
        Duration::ZERO,
    );
    assert_eq!(poller.period(), Duration::from_millis(1));
    assert!(!poller.is_running());
    assert!(!poller.stop());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_and_stop_are_idempotent() {
    let poller = Poller::new(
        service(Arc::new(MemoryResourceResolver::new())),
        Duration::from_secs(60),
        Duration::from_secs(60),
    );
    assert!(poller.start());
    assert!(!poller.start());
    assert!(poller.is_running());

    assert!(poller.stop());
    assert!(!poller.stop());
    assert!(!poller.is_running());
    assert_eq!(poller.tick_count(), 0);

    // A stopped poller can be started again.
    assert!(poller.start());
    assert!(poller.stop());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn picks_up_changes_after_start() {
    let resolver = Arc::new(MemoryResourceResolver::new());
    resolver.put("m/AMapper.yml", mapper("one"), at(1_000));
    let service = service(resolver.clone());
    service.bootstrap().unwrap();

    let poller = Poller::new(service.clone(), Duration::from_millis(10), Duration::from_millis(20));
    poller.start();

    resolver.put("m/AMapper.yml", mapper("two"), at(2_000));
    let reloaded = wait_for(|| service.registry().snapshot().statement("a.A.two").is_ok()).await;
    assert!(reloaded);
    assert!(poller.tick_count() >= 1);
    poller.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_ticks_do_not_stop_the_poller() {
    let resolver = Arc::new(MemoryResourceResolver::new());
    let service = Arc::new(ReloadService::new(
        vec!["m/[".to_string()],
        ReloadScope::All,
        Arc::new(LiveRegistry::new()),
        resolver,
        Arc::new(YamlMappingParser::new()),
    ));

    let poller = Poller::new(service, Duration::ZERO, Duration::from_millis(10));
    poller.start();
    assert!(wait_for(|| poller.tick_count() >= 3).await);
    assert!(poller.is_running());
    poller.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_halts_further_ticks() {
    let service = service(Arc::new(MemoryResourceResolver::new()));
    let poller = Poller::new(service, Duration::ZERO, Duration::from_millis(10));
    poller.start();
    assert!(wait_for(|| poller.tick_count() >= 1).await);
    poller.stop();

    // Let an in-flight tick finish, then the count must stay put.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stopped_at = poller.tick_count();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(poller.tick_count(), stopped_at);
}

/// Resolver whose scans block for `hold`, recording how many run at once.
struct BlockingResolver {
    hold: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl BlockingResolver {
    fn new(hold: Duration) -> Self {
        Self {
            hold,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }
}

impl ResourceResolver for BlockingResolver {
    fn resolve(&self, _pattern: &str) -> Result<Vec<ResourceDescriptor>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.hold);
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    fn open(
        &self,
        resource: &ResourceDescriptor,
    ) -> std::io::Result<Box<dyn std::io::Read + Send>> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, resource.id.clone()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_ticks_never_overlap() {
    let resolver = Arc::new(BlockingResolver::new(Duration::from_millis(150)));
    let service = Arc::new(ReloadService::new(
        vec!["m/*.yml".to_string()],
        ReloadScope::All,
        Arc::new(LiveRegistry::new()),
        resolver.clone(),
        Arc::new(YamlMappingParser::new()),
    ));
    let poller = Poller::new(service, Duration::ZERO, Duration::from_millis(10));

    poller.start();
    assert!(wait_for(|| resolver.calls.load(Ordering::SeqCst) >= 1).await);

    // Restart while the first scan is still blocked: the new task must skip.
    assert!(poller.stop());
    assert!(poller.start());
    assert!(wait_for(|| poller.skipped_count() >= 1).await);

    // Once the blocked scan finishes, ticks resume one at a time.
    assert!(wait_for(|| resolver.calls.load(Ordering::SeqCst) >= 3).await);
    poller.stop();

    assert_eq!(resolver.max_active.load(Ordering::SeqCst), 1);
}
