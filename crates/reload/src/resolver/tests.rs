//! Tests for the resolver module.

use std::fs;
use std::io::Read;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use super::*;

fn write(dir: &TempDir, relative: &str, contents: &str) {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn file_names(resources: &[ResourceDescriptor]) -> Vec<String> {
    resources
        .iter()
        .map(|r| r.location.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn all_roots_pattern_walks_every_root() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write(&first, "UserMapper.yml", "a");
    write(&first, "nested/OrderMapper.yml", "b");
    write(&first, "nested/notes.txt", "c");
    write(&second, "deep/er/ItemMapper.yml", "d");

    let resolver = FsResourceResolver::new(vec![
        first.path().to_path_buf(),
        second.path().to_path_buf(),
    ]);
    let resources = resolver.resolve("classpath*:**/*Mapper.yml").unwrap();

    assert_eq!(
        file_names(&resources),
        vec!["UserMapper.yml", "OrderMapper.yml", "ItemMapper.yml"]
    );
}

#[test]
fn first_root_pattern_stops_at_first_match() {
    let empty = TempDir::new().unwrap();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write(&first, "m/AMapper.yml", "a");
    write(&second, "m/BMapper.yml", "b");

    let resolver = FsResourceResolver::new(vec![
        empty.path().to_path_buf(),
        first.path().to_path_buf(),
        second.path().to_path_buf(),
    ]);
    let resources = resolver.resolve("classpath:m/*.yml").unwrap();

    assert_eq!(file_names(&resources), vec!["AMapper.yml"]);
}

#[test]
fn single_star_does_not_cross_directories() {
    let dir = TempDir::new().unwrap();
    write(&dir, "m/top.yml", "a");
    write(&dir, "m/sub/inner.yml", "b");

    let resolver = FsResourceResolver::new(vec![dir.path().to_path_buf()]);
    let resources = resolver.resolve("classpath*:m/*.yml").unwrap();

    assert_eq!(file_names(&resources), vec!["top.yml"]);
}

#[test]
fn absolute_file_pattern_and_literal_path() {
    let dir = TempDir::new().unwrap();
    write(&dir, "UserMapper.yml", "namespace: x");

    let resolver = FsResourceResolver::new(Vec::new());
    let pattern = format!("file:{}/*.yml", dir.path().display());
    let globbed = resolver.resolve(&pattern).unwrap();
    assert_eq!(globbed.len(), 1);
    assert_eq!(globbed[0].len, 12);

    let literal = dir.path().join("UserMapper.yml");
    let exact = resolver.resolve(&literal.display().to_string()).unwrap();
    assert_eq!(exact, globbed);
}

#[test]
fn missing_base_resolves_to_nothing() {
    let dir = TempDir::new().unwrap();
    let resolver = FsResourceResolver::new(vec![dir.path().join("absent")]);
    assert!(resolver.resolve("classpath*:**/*.yml").unwrap().is_empty());
}

#[test]
fn invalid_glob_is_a_pattern_error() {
    let dir = TempDir::new().unwrap();
    let resolver = FsResourceResolver::new(vec![dir.path().to_path_buf()]);
    let err = resolver.resolve("classpath*:m/[a.yml").unwrap_err();
    assert!(matches!(err, ResolveError::Pattern { .. }));
    assert_eq!(err.pattern(), "classpath*:m/[a.yml");
}

#[test]
fn descriptor_reflects_mtime_and_opens() {
    let dir = TempDir::new().unwrap();
    write(&dir, "AMapper.yml", "hello");
    let path = dir.path().join("AMapper.yml");
    filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

    let resolver = FsResourceResolver::new(vec![dir.path().to_path_buf()]);
    let resources = resolver.resolve("classpath*:*.yml").unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(
        resources[0].last_modified,
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    );

    let mut contents = String::new();
    resolver
        .open(&resources[0])
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "hello");
}

#[test]
fn memory_resolver_matches_ids() {
    let resolver = MemoryResourceResolver::new();
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    resolver.put("mappers/b/BMapper.yml", "bb", at);
    resolver.put("mappers/AMapper.yml", "a", at);
    resolver.put("other/CMapper.yml", "c", at);

    let resources = resolver.resolve("mappers/**/*.yml").unwrap();
    let ids: Vec<_> = resources.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["mappers/AMapper.yml", "mappers/b/BMapper.yml"]);
    assert_eq!(resources[1].len, 2);

    assert!(resolver.remove("mappers/AMapper.yml"));
    let err = resolver.open(&resources[0]).err().unwrap();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
