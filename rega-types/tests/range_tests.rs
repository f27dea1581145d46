use pretty_assertions::assert_eq;
use rega_types::{GlobalRangePool, PoolEntry, Range, RangeCatalogue, TypesError};

fn r(start: i64, end: i64) -> Range {
    Range::new(start, end).unwrap()
}

// ── Range ────────────────────────────────────────────────────────

#[test]
fn range_rejects_inverted_bounds() {
    let err = Range::new(10, 9).unwrap_err();
    assert!(matches!(err, TypesError::InvalidRange { start: 10, end: 9 }));
}

#[test]
fn single_number_range_has_size_one() {
    let range = r(7, 7);
    assert_eq!(range.size(), Some(1));
    assert!(range.contains(7));
    assert!(!range.contains(8));
}

#[test]
fn range_size_is_inclusive() {
    assert_eq!(r(1, 100).size(), Some(100));
    assert_eq!(r(101, 200).size(), Some(100));
}

#[test]
fn range_size_overflow_is_none() {
    assert_eq!(r(i64::MIN, i64::MAX).size(), None);
    assert_eq!(r(-1, i64::MAX).size(), None);
    assert_eq!(r(0, i64::MAX).size(), None);
    assert_eq!(r(1, i64::MAX).size(), Some(i64::MAX));
}

#[test]
fn overlap_detection() {
    assert!(r(1, 100).overlaps(&r(100, 200)));
    assert!(r(50, 60).overlaps(&r(1, 100)));
    assert!(!r(1, 100).overlaps(&r(101, 200)));
    assert!(!r(101, 200).overlaps(&r(1, 100)));
}

#[test]
fn range_display_and_parse() {
    let range: Range = "101-200".parse().unwrap();
    assert_eq!(range, r(101, 200));
    assert_eq!(range.to_string(), "101-200");

    let spaced: Range = " 1 - 100 ".parse().unwrap();
    assert_eq!(spaced, r(1, 100));
}

#[test]
fn range_parse_errors() {
    assert!(matches!(
        "100".parse::<Range>(),
        Err(TypesError::RangeFormat(_))
    ));
    assert!(matches!(
        "a-b".parse::<Range>(),
        Err(TypesError::RangeFormat(_))
    ));
    assert!(matches!(
        "200-100".parse::<Range>(),
        Err(TypesError::InvalidRange { .. })
    ));
}

#[test]
fn range_deserialize_validates_bounds() {
    let ok: Range = serde_json::from_str(r#"{"start":1,"end":100}"#).unwrap();
    assert_eq!(ok, r(1, 100));

    let bad = serde_json::from_str::<Range>(r#"{"start":100,"end":1}"#);
    assert!(bad.is_err());
}

// ── RangeCatalogue ───────────────────────────────────────────────

#[test]
fn standard_catalogue_tiles_one_to_two_thousand() {
    let catalogue = RangeCatalogue::standard();
    assert_eq!(catalogue.len(), 20);
    assert_eq!(catalogue.ranges()[0], r(1, 100));
    assert_eq!(catalogue.ranges()[19], r(1901, 2000));

    for pair in catalogue.ranges().windows(2) {
        assert_eq!(pair[0].end() + 1, pair[1].start());
        assert!(!pair[0].overlaps(&pair[1]));
    }
}

#[test]
fn tiled_matches_standard() {
    let tiled = RangeCatalogue::tiled(1, 2000, 100).unwrap();
    assert_eq!(tiled, RangeCatalogue::standard());
}

#[test]
fn tiled_truncates_last_interval() {
    let catalogue = RangeCatalogue::tiled(1, 250, 100).unwrap();
    assert_eq!(catalogue.ranges(), &[r(1, 100), r(101, 200), r(201, 250)]);
}

#[test]
fn tiled_rejects_non_positive_width() {
    assert!(RangeCatalogue::tiled(1, 100, 0).is_err());
    assert!(RangeCatalogue::tiled(1, 100, -5).is_err());
}

#[test]
fn catalogue_membership_is_exact() {
    let catalogue = RangeCatalogue::standard();
    assert!(catalogue.contains(&r(301, 400)));
    assert!(!catalogue.contains(&r(300, 399)));
    assert!(!catalogue.contains(&r(1, 200)));
}

// ── GlobalRangePool ──────────────────────────────────────────────

#[test]
fn new_pool_has_no_selection() {
    let pool = GlobalRangePool::standard();
    assert_eq!(pool.candidates().len(), 20);
    assert_eq!(pool.selected(), None);
}

#[test]
fn selecting_replaces_previous_selection() {
    let mut pool = GlobalRangePool::standard();
    pool.select(r(1, 100)).unwrap();
    pool.select(r(201, 300)).unwrap();
    assert_eq!(pool.selected(), Some(r(201, 300)));

    let selected: Vec<_> = pool.to_entries().into_iter().filter(|e| e.is_selected).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].start, 201);
}

#[test]
fn selecting_non_candidate_fails() {
    let mut pool = GlobalRangePool::standard();
    let err = pool.select(r(1, 150)).unwrap_err();
    assert!(matches!(err, TypesError::NotACandidate(_)));
    assert_eq!(pool.selected(), None);
}

#[test]
fn clear_selection() {
    let mut pool = GlobalRangePool::standard();
    pool.select(r(1, 100)).unwrap();
    pool.clear_selection();
    assert_eq!(pool.selected(), None);
}

#[test]
fn pool_from_entries_picks_the_selected_one() {
    let entries = vec![
        PoolEntry::new(r(101, 200), false),
        PoolEntry::new(r(1, 100), true),
    ];
    let pool = GlobalRangePool::from_entries(&entries).unwrap();
    assert_eq!(pool.selected(), Some(r(1, 100)));
    assert_eq!(pool.candidates(), &[r(1, 100), r(101, 200)]);
}

#[test]
fn pool_from_entries_collapses_duplicate_intervals() {
    let entries = vec![
        PoolEntry::new(r(1, 100), false),
        PoolEntry::new(r(101, 200), false),
        PoolEntry::new(r(1, 100), true),
    ];
    let pool = GlobalRangePool::from_entries(&entries).unwrap();
    assert_eq!(pool.candidates(), &[r(1, 100), r(101, 200)]);
    assert_eq!(pool.selected(), Some(r(1, 100)));
}

#[test]
fn pool_from_entries_rejects_two_selected() {
    let entries = vec![
        PoolEntry::new(r(1, 100), true),
        PoolEntry::new(r(101, 200), true),
    ];
    let err = GlobalRangePool::from_entries(&entries).unwrap_err();
    assert!(matches!(err, TypesError::MultipleSelectedPools(2)));
}

#[test]
fn pool_entry_wire_format_uses_integer_flag() {
    let entry = PoolEntry::new(r(1, 100), true);
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["isSelected"], 1);
    assert_eq!(json["range"], 100);
    assert!(json.get("id").is_none());

    let read: PoolEntry =
        serde_json::from_str(r#"{"start":1,"end":100,"isSelected":true}"#).unwrap();
    assert!(read.is_selected);

    let missing: PoolEntry = serde_json::from_str(r#"{"start":1,"end":100}"#).unwrap();
    assert!(!missing.is_selected);
}
