//! The always-breached walkthrough: spill, fall back, remove

use crate::common::*;
use spillkv::OverflowMap;
use std::collections::HashMap;
use tempfile::TempDir;

#[test]
fn test_first_put_spills_empty_snapshot() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u32, String> = always_spilling(&temp_dir);

    assert_eq!(map.put(1, "a".to_string()), None);

    let full: HashMap<u32, String> = read_snapshot(&map.paths().full).into_iter().collect();
    assert!(full.is_empty());
    assert_eq!(map.memory_len(), 1);
    assert!(map.contains_in_memory(&1));
    assert!(map.is_spilled());
}

#[test]
fn test_second_put_overwrites_full_snapshot() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u32, String> = always_spilling(&temp_dir);

    map.put(1, "a".to_string());
    map.put(2, "b".to_string());

    let full: HashMap<u32, String> = read_snapshot(&map.paths().full).into_iter().collect();
    assert_eq!(full, HashMap::from([(1, "a".to_string())]));
    assert_eq!(map.memory_len(), 1);
    assert!(map.contains_in_memory(&2));
}

#[test]
fn test_get_resolves_from_full_snapshot() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u32, String> = always_spilling(&temp_dir);
    map.put(1, "a".to_string());
    map.put(2, "b".to_string());

    assert_eq!(map.get(&1), Some("a".to_string()));

    // Memory is back to exactly what it held before the lookup
    assert_eq!(map.memory_len(), 1);
    assert_eq!(map.get(&2), Some("b".to_string()));
    assert!(!map.contains_in_memory(&1));

    // The full snapshot is unchanged by a lookup
    let full: HashMap<u32, String> = read_snapshot(&map.paths().full).into_iter().collect();
    assert_eq!(full, HashMap::from([(1, "a".to_string())]));
    assert!(!map.paths().temp.exists());
}

#[test]
fn test_third_put_drops_earlier_spill() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u32, String> = always_spilling(&temp_dir);
    map.put(1, "a".to_string());
    map.put(2, "b".to_string());
    map.put(3, "c".to_string());

    // Each spill replaces the full snapshot, so key 1 is gone
    assert_eq!(map.get(&1), None);
    assert_eq!(map.get(&2), Some("b".to_string()));
    assert_eq!(map.get(&3), Some("c".to_string()));
}

#[test]
fn test_remove_from_disk_then_lookup() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u32, String> = always_spilling(&temp_dir);
    map.put(1, "a".to_string());
    map.put(2, "b".to_string());

    assert_eq!(map.remove(&1), None);
    assert_eq!(map.get(&1), None);
    assert_eq!(map.get(&2), Some("b".to_string()));
    assert!(!map.paths().temp.exists());

    let full: HashMap<u32, String> = read_snapshot(&map.paths().full).into_iter().collect();
    assert!(full.is_empty());
    assert_eq!(map.stats().disk_removals, 1);
}

#[test]
fn test_remove_of_key_on_neither_tier() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u32, String> = always_spilling(&temp_dir);
    map.put(1, "a".to_string());
    map.put(2, "b".to_string());

    assert_eq!(map.remove(&99), None);
    assert_eq!(map.stats().disk_removals, 0);
    assert_eq!(map.get(&1), Some("a".to_string()));
    assert_eq!(map.memory_len(), 1);
}

#[test]
fn test_unreadable_full_snapshot_degrades_to_none() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u32, String> = always_spilling(&temp_dir);
    map.put(1, "a".to_string());
    map.put(2, "b".to_string());
    std::fs::write(&map.paths().full, b"garbage").unwrap();

    assert_eq!(map.get(&1), None);
    assert_eq!(map.remove(&1), None);
    assert!(map.try_get(&1).is_err());

    // Memory survived every failed fallback
    assert_eq!(map.get(&2), Some("b".to_string()));
    assert_eq!(map.stats().disk_failures, 3);
}
