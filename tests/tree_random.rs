use key_range_index::{verify, FileId, HashSet, KeyRangeLookupTree};
use rand::Rng;
use std::collections::BTreeMap;
use test_log::test;

fn key(n: u64) -> String {
    format!("{n:05}")
}

#[test]
fn tree_random_ranges() -> key_range_index::Result<()> {
    let mut rng = rand::rng();

    let mut tree = KeyRangeLookupTree::new();
    let mut expected: BTreeMap<u64, HashSet<FileId>> = BTreeMap::new();

    for _ in 0..100 {
        let a = rng.random_range(0..1_000_u64);
        let b = rng.random_range(0..1_000_u64);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        let file_id = FileId::from(nanoid::nanoid!());
        tree.insert(key(low), key(high), file_id.clone())?;

        for k in low..=high {
            expected.entry(k).or_default().insert(file_id.clone());
        }
    }

    assert!(verify::is_red_black(&tree));
    assert!(verify::is_max_high_consistent(&tree));
    assert!(verify::is_search_tree(&tree));

    for k in 0..=1_000 {
        let matches = tree.query(key(k));

        match expected.get(&k) {
            Some(ids) => assert_eq!(*ids, matches, "mismatch at key {k}"),
            None => assert!(matches.is_empty(), "expected no matches at key {k}"),
        }
    }

    Ok(())
}
