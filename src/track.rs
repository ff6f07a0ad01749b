//! In-memory decoded tracks.
//!
//! A [`DecodedTrack`] maps PTS to a decoded payload for one stream. Entries
//! are unique by PTS (inserting at an existing PTS replaces the old payload)
//! and always iterate in ascending PTS order.

use std::collections::{BTreeMap, btree_map};
use std::ops::Bound;

use crate::container::RgbFrame;
use crate::conversion::Timestamp;

/// Decoded video frames keyed by PTS.
pub type VideoTrack = DecodedTrack<RgbFrame>;

/// Mono audio sample buffers keyed by PTS.
pub type AudioTrack = DecodedTrack<Vec<f32>>;

/// Decoded payloads of one stream, ordered by PTS.
#[derive(Debug, Clone)]
pub struct DecodedTrack<T> {
    frames: BTreeMap<i64, T>,
}

impl<T> Default for DecodedTrack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DecodedTrack<T> {
    /// Create an empty track.
    pub fn new() -> Self {
        Self {
            frames: BTreeMap::new(),
        }
    }

    /// Store a payload at `pts`, returning the one it replaced.
    pub fn insert(&mut self, pts: i64, payload: T) -> Option<T> {
        self.frames.insert(pts, payload)
    }

    /// Number of distinct PTS values in the track.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the track holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// PTS of the first frame.
    pub fn first_pts(&self) -> Option<i64> {
        self.frames.keys().next().copied()
    }

    /// PTS of the last frame.
    pub fn last_pts(&self) -> Option<i64> {
        self.frames.keys().next_back().copied()
    }

    /// Payload stored at exactly `pts`.
    pub fn get(&self, pts: i64) -> Option<&T> {
        self.frames.get(&pts)
    }

    /// All frames in ascending PTS order.
    pub fn iter(&self) -> btree_map::Iter<'_, i64, T> {
        self.frames.iter()
    }

    /// Frames with `start <= pts <= end`, in ascending PTS order.
    ///
    /// An inverted window yields nothing.
    pub fn range(&self, start: Timestamp, end: Timestamp) -> btree_map::Range<'_, i64, T> {
        let lower = match start {
            Timestamp::Ticks(ticks) => ticks,
            Timestamp::Infinite => return self.frames.range(0..0),
        };
        let upper = match end {
            Timestamp::Ticks(ticks) if ticks < lower => return self.frames.range(0..0),
            Timestamp::Ticks(ticks) => Bound::Included(ticks),
            Timestamp::Infinite => Bound::Unbounded,
        };
        self.frames.range((Bound::Included(lower), upper))
    }
}

impl<'a, T> IntoIterator for &'a DecodedTrack<T> {
    type Item = (&'a i64, &'a T);
    type IntoIter = btree_map::Iter<'a, i64, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl<T> FromIterator<(i64, T)> for DecodedTrack<T> {
    fn from_iter<I: IntoIterator<Item = (i64, T)>>(iter: I) -> Self {
        let mut track = Self::new();
        for (pts, payload) in iter {
            track.insert(pts, payload);
        }
        track
    }
}
