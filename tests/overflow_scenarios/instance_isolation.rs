//! Separate instances with separate paths never share snapshots

use crate::common::*;
use spillkv::{OverflowConfig, OverflowMap, SnapshotPaths};
use tempfile::TempDir;

#[test]
fn test_two_instances_in_separate_dirs() {
    init_tracing();
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let a: OverflowMap<u32, String> = always_spilling(&dir_a);
    let b: OverflowMap<u32, String> = always_spilling(&dir_b);

    a.put(1, "from-a".to_string());
    a.put(2, "x".to_string());
    b.put(1, "from-b".to_string());
    b.put(2, "y".to_string());

    assert_eq!(a.get(&1), Some("from-a".to_string()));
    assert_eq!(b.get(&1), Some("from-b".to_string()));
}

#[test]
fn test_two_instances_in_one_dir_with_distinct_names() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let open = |name: &str| -> OverflowMap<u32, String> {
        let paths = SnapshotPaths::new(
            temp_dir.path().join(format!("{}-full.snap", name)),
            temp_dir.path().join(format!("{}-temp.snap", name)),
        );
        let config = OverflowConfig::default()
            .with_paths(paths)
            .with_spill_threshold_mb(0);
        OverflowMap::with_probe(config, probe()).unwrap()
    };
    let left = open("left");
    let right = open("right");

    left.put(7, "l".to_string());
    left.put(8, "l8".to_string());
    right.put(7, "r".to_string());
    right.put(8, "r8".to_string());

    assert_eq!(left.get(&7), Some("l".to_string()));
    assert_eq!(right.get(&7), Some("r".to_string()));
    assert_eq!(file_count(&temp_dir), 2);
}
