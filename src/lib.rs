//! # divegps
//!
//! Merge downloaded GPS fixes into dive log entries.
//!
//! This library provides:
//! - Typed GPS fixes, classified once into automatic and named fixes
//! - A dive table with time-containment and n-th-nearest queries
//! - The location merger that copies coordinates and site names onto dives
//! - A seeded generator of dive logs and fixes for stress testing
//!
//! ## Features
//!
//! - **`synthetic`** - Enable the synthetic dive/fix generator (uses rand)
//! - **`cli`** - Build the `divegps-cli` debug tool
//!
//! ## Quick Start
//!
//! ```rust
//! use divegps::{Dive, DiveTable, FixTable, GpsFix, GpsPoint, MergeConfig};
//! use divegps::merge_locations_into_dives;
//!
//! let mut dives = DiveTable::from_dives(vec![Dive::new(1_000, 2_400)]);
//! let mut fixes = FixTable::from_fixes(vec![GpsFix::named(
//!     1_200,
//!     "Blue Hole",
//!     GpsPoint::new(17.3158, -87.5347),
//! )]);
//!
//! let report = merge_locations_into_dives(&mut fixes, &mut dives, &MergeConfig::default());
//! assert_eq!(report.names_set, 1);
//! assert_eq!(dives.get(0).unwrap().location.as_deref(), Some("Blue Hole"));
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{DiveGpsError, Result};

// GPS fixes and the fix table
pub mod fix;
pub use fix::{FixKind, FixTable, GpsFix, RawFix, AUTOMATIC_FIX_NAME};

// Dive records and time-based dive queries
pub mod dive;
pub use dive::{Dive, DiveLog, DiveTable};

// The location merger
pub mod merge;
pub use merge::{
    merge_locations_into_dives, MergeConfig, MergeReport, NamedFixGroup, UnmatchedFix,
};

// Timestamp formatting for diagnostics
pub mod time_utils;

// Synthetic dive/fix generator for stress testing
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// Seconds since the Unix epoch, UTC.
pub type Timestamp = i64;

/// Window within which named fixes are grouped and matched to dives (six hours).
pub const SAME_GROUP_WINDOW: Timestamp = 6 * 3600;

/// A GPS coordinate with latitude and longitude in decimal degrees.
///
/// # Example
/// ```
/// use divegps::GpsPoint;
/// let point = GpsPoint::new(-16.5004, 145.4631); // Agincourt Reef
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}
