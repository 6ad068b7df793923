//! Tests for the scanner module.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::*;
use crate::error::ResolveError;
use crate::resolver::{MemoryResourceResolver, ResourceDescriptor, ResourceResolver};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn ids(resources: &[ResourceDescriptor]) -> Vec<&str> {
    resources.iter().map(|r| r.id.as_str()).collect()
}

fn seeded() -> (Arc<MemoryResourceResolver>, ChangeScanner) {
    let resolver = Arc::new(MemoryResourceResolver::new());
    resolver.put("m/AMapper.yml", "aaaa", at(1_000));
    resolver.put("m/BMapper.yml", "bbbb", at(1_000));
    resolver.put("m/CMapper.yml", "cccc", at(1_000));
    let scanner = ChangeScanner::new(resolver.clone());
    (resolver, scanner)
}

/// Resolver that fails for one pattern while `failing` is set.
struct FlakyResolver {
    inner: MemoryResourceResolver,
    bad_pattern: &'static str,
    failing: AtomicBool,
}

impl ResourceResolver for FlakyResolver {
    fn resolve(&self, pattern: &str) -> Result<Vec<ResourceDescriptor>, ResolveError> {
        if pattern == self.bad_pattern && self.failing.load(Ordering::SeqCst) {
            return Err(ResolveError::Io {
                pattern: pattern.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            });
        }
        self.inner.resolve(pattern)
    }

    fn open(
        &self,
        resource: &ResourceDescriptor,
    ) -> std::io::Result<Box<dyn std::io::Read + Send>> {
        self.inner.open(resource)
    }
}

#[test]
fn fingerprint_concatenates_len_and_millis() {
    let fingerprint = Fingerprint::new(42, Utc.timestamp_millis_opt(1_700_000_000_123).unwrap());
    assert_eq!(fingerprint.as_str(), "421700000000123");
}

#[test]
fn unchanged_resources_are_never_reported() {
    let (_resolver, mut scanner) = seeded();
    let p = patterns(&["m/*.yml"]);
    scanner.initial_scan(&p).unwrap();

    for _ in 0..5 {
        assert!(scanner.detect_changes(&p).unwrap().is_empty());
    }
    assert_eq!(scanner.store().len(), 3);
}

#[test]
fn length_change_reports_only_that_resource() {
    let (resolver, mut scanner) = seeded();
    let p = patterns(&["m/*.yml"]);
    scanner.initial_scan(&p).unwrap();

    resolver.put("m/BMapper.yml", "bbbbbb", at(1_000));
    let changed = scanner.detect_changes(&p).unwrap();
    assert_eq!(ids(&changed), vec!["m/BMapper.yml"]);

    assert!(scanner.detect_changes(&p).unwrap().is_empty());
}

#[test]
fn timestamp_change_reports_only_that_resource() {
    let (resolver, mut scanner) = seeded();
    let p = patterns(&["m/*.yml"]);
    scanner.initial_scan(&p).unwrap();

    assert!(resolver.touch("m/CMapper.yml", at(2_000)));
    let changed = scanner.detect_changes(&p).unwrap();
    assert_eq!(ids(&changed), vec!["m/CMapper.yml"]);
}

#[test]
fn new_resources_count_as_changed() {
    let (resolver, mut scanner) = seeded();
    let p = patterns(&["m/*.yml"]);
    scanner.initial_scan(&p).unwrap();

    resolver.put("m/DMapper.yml", "dd", at(1_000));
    let changed = scanner.detect_changes(&p).unwrap();
    assert_eq!(ids(&changed), vec!["m/DMapper.yml"]);
}

#[test]
fn detect_without_initial_scan_reports_everything() {
    let (_resolver, mut scanner) = seeded();
    let changed = scanner.detect_changes(&patterns(&["m/*.yml"])).unwrap();
    assert_eq!(changed.len(), 3);
}

#[test]
fn initial_scan_runs_once() {
    let (resolver, mut scanner) = seeded();
    let p = patterns(&["m/*.yml"]);
    scanner.initial_scan(&p).unwrap();

    resolver.put("m/AMapper.yml", "changed!", at(5_000));
    scanner.initial_scan(&p).unwrap();

    // The second initial scan must not have absorbed the change.
    let changed = scanner.detect_changes(&p).unwrap();
    assert_eq!(ids(&changed), vec!["m/AMapper.yml"]);
}

#[test]
fn overlapping_patterns_report_resource_once() {
    let (_resolver, mut scanner) = seeded();
    let changed = scanner
        .detect_changes(&patterns(&["m/AMapper.yml", "m/*.yml"]))
        .unwrap();
    assert_eq!(
        ids(&changed),
        vec!["m/AMapper.yml", "m/BMapper.yml", "m/CMapper.yml"]
    );
}

#[test]
fn removed_resources_are_pruned_and_reported() {
    let (resolver, mut scanner) = seeded();
    let p = patterns(&["m/*.yml"]);
    scanner.initial_scan(&p).unwrap();

    resolver.remove("m/BMapper.yml");
    assert!(scanner.detect_changes(&p).unwrap().is_empty());
    assert_eq!(scanner.removed().to_vec(), vec!["m/BMapper.yml".to_string()]);
    assert!(!scanner.store().contains("m/BMapper.yml"));
    assert_eq!(scanner.last_seen().len(), 2);

    assert!(scanner.detect_changes(&p).unwrap().is_empty());
    assert!(scanner.removed().is_empty());
}

#[test]
fn failed_scan_leaves_store_untouched() {
    let inner = MemoryResourceResolver::new();
    inner.put("a/AMapper.yml", "a", at(1_000));
    inner.put("b/BMapper.yml", "b", at(1_000));
    let resolver = Arc::new(FlakyResolver {
        inner,
        bad_pattern: "b/*.yml",
        failing: AtomicBool::new(false),
    });
    let mut scanner = ChangeScanner::new(resolver.clone());
    let p = patterns(&["a/*.yml", "b/*.yml"]);
    scanner.initial_scan(&p).unwrap();
    let before = scanner.store().clone();

    resolver.inner.put("a/AMapper.yml", "aaaa", at(2_000));
    resolver.failing.store(true, Ordering::SeqCst);
    let err = scanner.detect_changes(&p).unwrap_err();
    assert_eq!(err.pattern(), "b/*.yml");
    assert_eq!(scanner.store(), &before);

    // Once the resolver recovers the change is still detected.
    resolver.failing.store(false, Ordering::SeqCst);
    let changed = scanner.detect_changes(&p).unwrap();
    assert_eq!(ids(&changed), vec!["a/AMapper.yml"]);
}
