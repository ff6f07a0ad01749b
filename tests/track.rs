//! Decoded track ordering and range tests.

use encoded_video::{DecodedTrack, Timestamp};

fn track() -> DecodedTrack<&'static str> {
    [(30, "c"), (10, "a"), (20, "b"), (40, "d")].into_iter().collect()
}

#[test]
fn iteration_is_in_pts_order() {
    let values: Vec<&str> = track().iter().map(|(_, value)| *value).collect();
    assert_eq!(values, vec!["a", "b", "c", "d"]);
}

#[test]
fn range_is_inclusive_on_both_ends() {
    let track = track();
    let pts: Vec<i64> = track
        .range(Timestamp::Ticks(20), Timestamp::Ticks(30))
        .map(|(pts, _)| *pts)
        .collect();
    assert_eq!(pts, vec![20, 30]);

    let open: Vec<i64> = track
        .range(Timestamp::Ticks(25), Timestamp::Infinite)
        .map(|(pts, _)| *pts)
        .collect();
    assert_eq!(open, vec![30, 40]);
}

#[test]
fn inverted_or_infinite_start_range_is_empty() {
    let track = track();
    assert_eq!(track.range(Timestamp::Ticks(30), Timestamp::Ticks(20)).count(), 0);
    assert_eq!(track.range(Timestamp::Infinite, Timestamp::Infinite).count(), 0);
}

#[test]
fn reinserting_a_pts_replaces_the_payload() {
    let mut track = track();
    assert_eq!(track.insert(20, "B"), Some("b"));
    assert_eq!(track.len(), 4);
    assert_eq!(track.get(20), Some(&"B"));
    assert_eq!(track.first_pts(), Some(10));
    assert_eq!(track.last_pts(), Some(40));
}
