//! Merging GPS fixes into dives.
//!
//! Automatic fixes only fill in coordinates of the dive that was running
//! when the fix was taken. Named fixes may also name the dive. Several
//! named fixes logged within one window are spread over successive dives
//! near that window instead of all landing on the first match.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::dive::DiveLog;
use crate::error::{DiveGpsError, Result};
use crate::fix::{FixKind, FixTable, GpsFix};
use crate::time_utils::format_utc;
use crate::{Timestamp, SAME_GROUP_WINDOW};

/// Configuration for the location merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Seconds after an anchor fix during which further named fixes belong
    /// to the same group. Also the maximum time distance between a named
    /// fix and the dive it is matched to.
    /// Default: 21600 (six hours)
    pub same_group_window: Timestamp,

    /// Skip fixes whose coordinates are out of range instead of copying
    /// them onto dives. Skipped fixes do not affect grouping.
    /// Default: true
    pub skip_invalid_coordinates: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            same_group_window: SAME_GROUP_WINDOW,
            skip_invalid_coordinates: true,
        }
    }
}

impl MergeConfig {
    /// Check that all values are in range.
    pub fn validate(&self) -> Result<()> {
        if self.same_group_window <= 0 {
            return Err(DiveGpsError::InvalidConfig(format!(
                "same_group_window must be positive, got {}",
                self.same_group_window
            )));
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON config. Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MergeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// A named fix for which no dive was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedFix {
    pub name: String,
    pub when: Timestamp,
    /// `when` as `YYYY-MM-DD HH:MM:SS` UTC
    pub formatted_time: String,
}

/// Summary of a merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Fixes looked at, including skipped ones
    pub fixes_processed: usize,
    pub automatic_fixes: usize,
    pub named_fixes: usize,
    /// Fixes ignored because of invalid coordinates
    pub skipped_fixes: usize,
    /// Dives that received coordinates
    pub coordinates_set: usize,
    /// Dives that received a site name
    pub names_set: usize,
    /// Distinct dives changed by this pass
    pub dives_updated: usize,
    /// Named fixes without a matching dive, in timestamp order
    pub unmatched: Vec<UnmatchedFix>,
}

impl MergeReport {
    /// True if no dive was changed.
    pub fn is_noop(&self) -> bool {
        self.dives_updated == 0
    }
}

/// Rolling grouping state for named fixes within one pass.
///
/// The anchor is the named fix that opened the current group; the counter
/// is the ordinal of the latest named fix within it.
#[derive(Debug, Default)]
pub struct NamedFixGroup {
    anchor: Option<Timestamp>,
    counter: usize,
}

impl NamedFixGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the fix that opened the current group.
    pub fn anchor(&self) -> Option<Timestamp> {
        self.anchor
    }

    /// Register a named fix and return its ordinal within the current group.
    ///
    /// Only fixes after the anchor extend the group; anything else starts a
    /// new group anchored at `when`.
    pub fn advance(&mut self, when: Timestamp, window: Timestamp) -> usize {
        match self.anchor {
            Some(anchor) if when >= anchor && when.saturating_sub(anchor) <= window => {
                self.counter += 1;
            }
            _ => {
                self.counter = 1;
                self.anchor = Some(when);
            }
        }
        self.counter
    }
}

/// Merge the fixes into the dive log.
///
/// Sorts `fixes` by timestamp (stable), then walks them once:
/// - an automatic fix sets the coordinates of the dive that includes it
/// - a named fix picks the n-th nearest dive within the window, where n
///   counts the named fixes since the current anchor, and sets both
///   coordinates and site name
///
/// Nothing already present on a dive is overwritten, so running the same
/// merge twice changes nothing the second time. A named fix without a
/// matching dive is logged and reported, never fatal.
pub fn merge_locations_into_dives<D: DiveLog + ?Sized>(
    fixes: &mut FixTable,
    dives: &mut D,
    config: &MergeConfig,
) -> MergeReport {
    fixes.sort();

    let mut report = MergeReport::default();
    let mut group = NamedFixGroup::default();
    let mut touched: HashSet<usize> = HashSet::new();

    for fix in fixes.iter() {
        report.fixes_processed += 1;

        if config.skip_invalid_coordinates && !fix.location.is_valid() {
            debug!(
                "[Merge] Skipping fix @ {} with invalid coordinates ({}, {})",
                format_utc(fix.when),
                fix.location.latitude,
                fix.location.longitude
            );
            report.skipped_fixes += 1;
            continue;
        }

        match &fix.kind {
            FixKind::Automatic => {
                report.automatic_fixes += 1;
                if let Some(idx) = dives.find_dive_including(fix.when) {
                    apply_fix(fix, None, idx, dives, &mut report, &mut touched);
                }
            }
            FixKind::Named(name) => {
                report.named_fixes += 1;
                let nr = group.advance(fix.when, config.same_group_window);
                match dives.find_dive_n_near(fix.when, nr, config.same_group_window) {
                    Some(idx) => {
                        apply_fix(fix, Some(name.as_str()), idx, dives, &mut report, &mut touched);
                    }
                    None => {
                        let formatted_time = format_utc(fix.when);
                        warn!(
                            "didn't find dive matching gps fix named {} @ {}",
                            name, formatted_time
                        );
                        report.unmatched.push(UnmatchedFix {
                            name: name.clone(),
                            when: fix.when,
                            formatted_time,
                        });
                    }
                }
            }
        }
    }

    report.dives_updated = touched.len();

    info!(
        "[Merge] {} fixes ({} automatic, {} named, {} skipped): {} coordinates, {} names, {} unmatched",
        report.fixes_processed,
        report.automatic_fixes,
        report.named_fixes,
        report.skipped_fixes,
        report.coordinates_set,
        report.names_set,
        report.unmatched.len()
    );

    report
}

/// Copy location data from `fix` onto dive `idx` where the dive lacks it.
fn apply_fix<D: DiveLog + ?Sized>(
    fix: &GpsFix,
    name: Option<&str>,
    idx: usize,
    dives: &mut D,
    report: &mut MergeReport,
    touched: &mut HashSet<usize>,
) {
    let Some(dive) = dives.dive_mut(idx) else {
        return;
    };

    if dive.set_gps_if_absent(fix.location) {
        debug!(
            "[Merge] Dive {} @ {}: coordinates ({:.5}, {:.5})",
            idx,
            format_utc(dive.when),
            fix.location.latitude,
            fix.location.longitude
        );
        report.coordinates_set += 1;
        touched.insert(idx);
    }

    if let Some(name) = name {
        if dive.set_location_if_absent(name) {
            debug!(
                "[Merge] Dive {} @ {}: location '{}'",
                idx,
                format_utc(dive.when),
                name
            );
            report.names_set += 1;
            touched.insert(idx);
        }
    }
}
