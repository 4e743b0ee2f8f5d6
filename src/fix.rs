//! GPS fixes and the fix table.
//!
//! A fix is classified exactly once, when it is created: either it is an
//! automatic fix (periodic logger sample, no diver intent) or a named fix
//! (a dive site the diver checked in at). The merger never looks at the
//! raw name string again.

use serde::{Deserialize, Serialize};

use crate::error::{DiveGpsError, Result};
use crate::{GpsPoint, Timestamp};

/// Name the upstream service uses for fixes that were taken automatically.
pub const AUTOMATIC_FIX_NAME: &str = "automatic fix";

/// Classification of a GPS fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixKind {
    /// Periodic sample without a diver-assigned name.
    Automatic,
    /// A fix the diver labeled with a site name.
    Named(String),
}

impl FixKind {
    /// Classify a raw fix name.
    ///
    /// A missing name, an empty name and the automatic-fix sentinel all
    /// classify as [`FixKind::Automatic`].
    pub fn classify(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") | Some(AUTOMATIC_FIX_NAME) => FixKind::Automatic,
            Some(name) => FixKind::Named(name.to_string()),
        }
    }
}

/// A single timestamped geolocation sample.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub when: Timestamp,
    pub kind: FixKind,
    pub location: GpsPoint,
}

impl GpsFix {
    /// Create a fix from a raw, possibly absent name.
    pub fn new(when: Timestamp, name: Option<&str>, location: GpsPoint) -> Self {
        Self {
            when,
            kind: FixKind::classify(name),
            location,
        }
    }

    /// Like [`GpsFix::new`], but rejects coordinates outside the valid range.
    pub fn try_new(when: Timestamp, name: Option<&str>, location: GpsPoint) -> Result<Self> {
        if !location.is_valid() {
            return Err(DiveGpsError::InvalidCoordinates {
                when,
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }
        Ok(Self::new(when, name, location))
    }

    /// Create an automatic fix.
    pub fn automatic(when: Timestamp, location: GpsPoint) -> Self {
        Self {
            when,
            kind: FixKind::Automatic,
            location,
        }
    }

    /// Create a named fix. The name goes through the same classification
    /// as [`GpsFix::new`], so passing the sentinel yields an automatic fix.
    pub fn named(when: Timestamp, name: &str, location: GpsPoint) -> Self {
        Self::new(when, Some(name), location)
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self.kind, FixKind::Automatic)
    }

    /// The diver-assigned name, if this is a named fix.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            FixKind::Automatic => None,
            FixKind::Named(name) => Some(name),
        }
    }
}

/// Serialized form of a fix, as produced by the download pipeline.
///
/// `name` may be absent, `null`, or the automatic-fix sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub when: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<RawFix> for GpsFix {
    fn from(raw: RawFix) -> Self {
        GpsFix::new(
            raw.when,
            raw.name.as_deref(),
            GpsPoint::new(raw.latitude, raw.longitude),
        )
    }
}

impl From<&GpsFix> for RawFix {
    fn from(fix: &GpsFix) -> Self {
        RawFix {
            when: fix.when,
            name: Some(fix.name().unwrap_or(AUTOMATIC_FIX_NAME).to_string()),
            latitude: fix.location.latitude,
            longitude: fix.location.longitude,
        }
    }
}

/// Caller-owned collection of GPS fixes.
///
/// Fixes keep their insertion order until [`FixTable::sort`] is called.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<RawFix>", into = "Vec<RawFix>")]
pub struct FixTable {
    fixes: Vec<GpsFix>,
}

impl FixTable {
    /// Create a new empty fix table.
    pub fn new() -> Self {
        Self { fixes: Vec::new() }
    }

    pub fn from_fixes(fixes: Vec<GpsFix>) -> Self {
        Self { fixes }
    }

    pub fn push(&mut self, fix: GpsFix) {
        self.fixes.push(fix);
    }

    /// Sort ascending by timestamp. Stable: fixes sharing a timestamp keep
    /// their relative order.
    pub fn sort(&mut self) {
        self.fixes.sort_by_key(|fix| fix.when);
    }

    pub fn is_sorted(&self) -> bool {
        self.fixes.windows(2).all(|pair| pair[0].when <= pair[1].when)
    }

    pub fn get(&self, index: usize) -> Option<&GpsFix> {
        self.fixes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GpsFix> {
        self.fixes.iter()
    }

    pub fn as_slice(&self) -> &[GpsFix] {
        &self.fixes
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn clear(&mut self) {
        self.fixes.clear();
    }
}

impl From<Vec<RawFix>> for FixTable {
    fn from(raw: Vec<RawFix>) -> Self {
        Self::from_fixes(raw.into_iter().map(GpsFix::from).collect())
    }
}

impl From<FixTable> for Vec<RawFix> {
    fn from(table: FixTable) -> Self {
        table.fixes.iter().map(RawFix::from).collect()
    }
}

impl FromIterator<GpsFix> for FixTable {
    fn from_iter<I: IntoIterator<Item = GpsFix>>(iter: I) -> Self {
        Self::from_fixes(iter.into_iter().collect())
    }
}
