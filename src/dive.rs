//! Dive records and time-based dive queries.
//!
//! Manages the dive log the merger writes into:
//! - Containment lookup (which dive was running at a given instant)
//! - N-th nearest lookup within a time window
//! - Set-if-absent mutation of coordinates and site names

use serde::{Deserialize, Serialize};

use crate::{GpsPoint, Timestamp};

/// A single dive log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dive {
    /// Dive number as shown in the log (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Start of the dive, seconds since epoch (UTC)
    pub when: Timestamp,
    /// Duration in seconds
    pub duration: u32,
    /// Dive site name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Dive site coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsPoint>,
}

impl Dive {
    /// Create a dive with no location data.
    pub fn new(when: Timestamp, duration: u32) -> Self {
        Self {
            number: None,
            when,
            duration,
            location: None,
            gps: None,
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_gps(mut self, gps: GpsPoint) -> Self {
        self.gps = Some(gps);
        self
    }

    pub fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    /// End of the dive (exclusive). Saturates at `Timestamp::MAX`.
    pub fn end_time(&self) -> Timestamp {
        self.when.saturating_add(Timestamp::from(self.duration))
    }

    /// Whether `when` falls inside `[start, end)`.
    pub fn includes(&self, when: Timestamp) -> bool {
        self.when <= when && when < self.end_time()
    }

    /// Seconds between `when` and the nearest edge of the dive, 0 if the
    /// dive includes it. Saturates at `Timestamp::MAX`.
    pub fn time_distance(&self, when: Timestamp) -> Timestamp {
        if when < self.when {
            self.when.saturating_sub(when)
        } else if when >= self.end_time() {
            // a zero-length dive still sits at distance 0 from its own start
            when.saturating_sub(self.end_time())
        } else {
            0
        }
    }

    pub fn has_gps_location(&self) -> bool {
        self.gps.is_some()
    }

    /// Set coordinates unless the dive already has some.
    ///
    /// Returns `true` if the dive changed.
    pub fn set_gps_if_absent(&mut self, gps: GpsPoint) -> bool {
        if self.gps.is_some() {
            return false;
        }
        self.gps = Some(gps);
        true
    }

    /// Set the site name unless the dive already has one.
    ///
    /// Returns `true` if the dive changed.
    pub fn set_location_if_absent(&mut self, location: &str) -> bool {
        if self.location.is_some() {
            return false;
        }
        self.location = Some(location.to_string());
        true
    }
}

/// Time-based queries the merger needs from a dive collection.
///
/// Dives are addressed by their index in table order.
pub trait DiveLog {
    /// First dive, in table order, that includes `when`.
    fn find_dive_including(&self, when: Timestamp) -> Option<usize>;

    /// The `n`-th (1-based) dive nearest to `when` among dives at most
    /// `window` seconds away. Ordered by time distance, ties broken by
    /// table order.
    fn find_dive_n_near(&self, when: Timestamp, n: usize, window: Timestamp) -> Option<usize>;

    fn dive(&self, index: usize) -> Option<&Dive>;

    fn dive_mut(&mut self, index: usize) -> Option<&mut Dive>;
}

/// Caller-owned dive log in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiveTable {
    dives: Vec<Dive>,
}

impl DiveTable {
    /// Create a new empty dive table.
    pub fn new() -> Self {
        Self { dives: Vec::new() }
    }

    pub fn from_dives(dives: Vec<Dive>) -> Self {
        Self { dives }
    }

    pub fn push(&mut self, dive: Dive) {
        self.dives.push(dive);
    }

    pub fn get(&self, index: usize) -> Option<&Dive> {
        self.dives.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Dive> {
        self.dives.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dive> {
        self.dives.iter()
    }

    pub fn len(&self) -> usize {
        self.dives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dives.is_empty()
    }

    /// Number of dives that have coordinates.
    pub fn located_count(&self) -> usize {
        self.dives.iter().filter(|d| d.has_gps_location()).count()
    }

    pub fn into_dives(self) -> Vec<Dive> {
        self.dives
    }
}

impl DiveLog for DiveTable {
    fn find_dive_including(&self, when: Timestamp) -> Option<usize> {
        self.dives.iter().position(|dive| dive.includes(when))
    }

    fn find_dive_n_near(&self, when: Timestamp, n: usize, window: Timestamp) -> Option<usize> {
        if n == 0 {
            return None;
        }

        let mut candidates: Vec<(Timestamp, usize)> = self
            .dives
            .iter()
            .enumerate()
            .map(|(idx, dive)| (dive.time_distance(when), idx))
            .filter(|&(distance, _)| distance <= window)
            .collect();

        // (distance, index) ordering gives the table-order tie-break
        candidates.sort_unstable();
        candidates.get(n - 1).map(|&(_, idx)| idx)
    }

    fn dive(&self, index: usize) -> Option<&Dive> {
        self.dives.get(index)
    }

    fn dive_mut(&mut self, index: usize) -> Option<&mut Dive> {
        self.dives.get_mut(index)
    }
}

impl From<Vec<Dive>> for DiveTable {
    fn from(dives: Vec<Dive>) -> Self {
        Self::from_dives(dives)
    }
}

impl FromIterator<Dive> for DiveTable {
    fn from_iter<I: IntoIterator<Item = Dive>>(iter: I) -> Self {
        Self::from_dives(iter.into_iter().collect())
    }
}
