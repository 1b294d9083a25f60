//! Behavior while the threshold is never breached

use crate::common::*;
use spillkv::{OverflowMap, OverflowStore};
use tempfile::TempDir;

#[test]
fn test_never_inserted_keys_are_absent_without_disk() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<String, u64> = never_spilling(&temp_dir);
    map.put("present".to_string(), 1);

    for key in ["a", "b", "missing", ""] {
        assert_eq!(map.get(&key.to_string()), None);
    }
    assert!(!map.is_spilled());
    assert_eq!(file_count(&temp_dir), 0);
}

#[test]
fn test_all_entries_retrievable_from_memory() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u64, Vec<u8>> = never_spilling(&temp_dir);

    let n = 5_000u64;
    for i in 0..n {
        map.put(i, i.to_le_bytes().to_vec());
    }

    assert_eq!(map.memory_len(), n as usize);
    for i in 0..n {
        assert_eq!(map.get(&i), Some(i.to_le_bytes().to_vec()));
    }
    assert_eq!(map.stats().disk_lookups, 0);
    assert_eq!(file_count(&temp_dir), 0);
}

#[test]
fn test_remove_absent_key_is_idempotent() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u64, String> = never_spilling(&temp_dir);

    assert_eq!(map.remove(&1), None);
    assert_eq!(map.remove(&1), None);
    assert!(map.is_memory_empty());
    assert_eq!(file_count(&temp_dir), 0);
}

#[test]
fn test_generic_store_usage() {
    fn fill<S: OverflowStore<u64, String>>(store: &S) {
        for i in 0..10 {
            store.put(i, format!("item-{}", i));
        }
    }

    let temp_dir = TempDir::new().unwrap();
    let map: OverflowMap<u64, String> = never_spilling(&temp_dir);
    fill(&map);

    assert_eq!(map.memory_len(), 10);
    assert_eq!(map.remove(&3), Some("item-3".to_string()));
    assert_eq!(map.get(&3), None);
}
