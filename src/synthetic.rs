//! Synthetic dive log and GPS fix generator for stress testing and benchmarking.
//!
//! Generates dive trips with known ground truth: which site every dive was
//! at, which dives should receive a site name, and how many named fixes
//! cannot be matched to any dive.
//!
//! Only compiled with the `synthetic` feature, so production builds leave it out.
//!
//! # Example
//!
//! ```rust
//! use divegps::synthetic::SyntheticScenario;
//!
//! let dataset = SyntheticScenario::liveaboard_week().generate();
//! assert_eq!(dataset.dives.len(), dataset.expected_sites.len());
//! ```

use crate::{Dive, DiveTable, FixTable, GpsFix, GpsPoint, Timestamp};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

// ============================================================================
// Types
// ============================================================================

/// Metadata about a generated dataset.
#[derive(Debug, Clone)]
pub struct DatasetMetadata {
    pub dive_count: usize,
    pub automatic_fix_count: usize,
    /// Named check-in fixes, one per diving day
    pub named_fix_count: usize,
    /// Named fixes placed far from any dive
    pub stray_fix_count: usize,
}

/// A complete synthetic dataset with ground truth.
pub struct SyntheticDataset {
    /// Dives without any location data, in chronological order.
    pub dives: DiveTable,
    /// All fixes, shuffled.
    pub fixes: FixTable,
    /// Site each dive took place at (same order as `dives`).
    pub expected_sites: Vec<GpsPoint>,
    /// Site name each dive should receive after a merge.
    pub expected_names: Vec<Option<String>>,
    /// Dataset statistics.
    pub metadata: DatasetMetadata,
}

/// Scenario configuration for generating synthetic data.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Center of the dive area.
    pub origin: GpsPoint,
    /// Midnight UTC of the first diving day.
    pub start: Timestamp,
    /// Number of diving days.
    pub days: usize,
    /// Dives per day (clamped to 1..=4).
    pub dives_per_day: usize,
    /// Seconds between automatic fixes.
    pub automatic_fix_interval: u32,
    /// GPS noise standard deviation in meters.
    pub gps_noise_sigma_meters: f64,
    /// Add one named fix in the middle of each night, away from all dives.
    pub stray_named_fixes: bool,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

// ============================================================================
// Coordinate Helpers
// ============================================================================

/// Meters per degree of latitude (approximately constant).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

const DAY: Timestamp = 24 * 3600;
const FIRST_DIVE_OFFSET: Timestamp = 8 * 3600;
const AUTOMATIC_WINDOW: (Timestamp, Timestamp) = (7 * 3600, 17 * 3600);
const STRAY_FIX_OFFSET: Timestamp = 23 * 3600;

/// Convert meters to degrees of latitude.
fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

/// Convert meters to degrees of longitude at a given latitude.
fn meters_to_deg_lng(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg_lng = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg_lng.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_deg_lng
}

/// Approximate distance in meters between two GpsPoints (fast, no trig).
pub fn approx_distance(a: &GpsPoint, b: &GpsPoint) -> f64 {
    let dlat = (b.latitude - a.latitude) * METERS_PER_DEG_LAT;
    let avg_lat = (a.latitude + b.latitude) / 2.0;
    let dlng = (b.longitude - a.longitude) * METERS_PER_DEG_LAT * avg_lat.to_radians().cos();
    (dlat * dlat + dlng * dlng).sqrt()
}

/// Add Gaussian GPS noise to a point.
fn add_gps_noise(p: &GpsPoint, sigma_meters: f64, rng: &mut StdRng) -> GpsPoint {
    if sigma_meters <= 0.0 {
        return *p;
    }

    // Box-Muller transform for Gaussian noise
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    let z1 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();

    GpsPoint::new(
        p.latitude + meters_to_deg_lat(z0 * sigma_meters),
        p.longitude + meters_to_deg_lng(z1 * sigma_meters, p.latitude),
    )
}

/// Pick a dive site within a few kilometers of the origin.
fn random_site(origin: &GpsPoint, rng: &mut StdRng) -> GpsPoint {
    let heading: f64 = rng.gen_range(0.0..(2.0 * PI));
    let distance: f64 = rng.gen_range(500.0..5000.0);
    GpsPoint::new(
        origin.latitude + meters_to_deg_lat(distance * heading.sin()),
        origin.longitude + meters_to_deg_lng(distance * heading.cos(), origin.latitude),
    )
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticScenario {
    /// Generate a complete synthetic dataset from this scenario.
    ///
    /// Each day starts with a named check-in fix taken 5-20 minutes before
    /// the first dive, at the first site. Dives last 30-60 minutes with
    /// 60-90 minute surface intervals. Automatic fixes are logged every
    /// `automatic_fix_interval` seconds between 07:00 and 17:00, at the
    /// current site while a dive is running and on the boat otherwise.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let dives_per_day = self.dives_per_day.clamp(1, 4);
        let interval = Timestamp::from(self.automatic_fix_interval.max(60));

        let mut dives = DiveTable::new();
        let mut fixes: Vec<GpsFix> = Vec::new();
        let mut expected_sites = Vec::new();
        let mut expected_names = Vec::new();
        let mut automatic_fix_count = 0;
        let mut stray_fix_count = 0;

        for day in 0..self.days {
            let midnight = self.start + day as Timestamp * DAY;
            let mut day_dives: Vec<(Dive, GpsPoint)> = Vec::with_capacity(dives_per_day);

            let mut when = midnight + FIRST_DIVE_OFFSET;
            for _ in 0..dives_per_day {
                let duration: u32 = rng.gen_range(1800..=3600);
                let site = random_site(&self.origin, &mut rng);
                day_dives.push((Dive::new(when, duration), site));
                when += Timestamp::from(duration) + rng.gen_range(3600..=5400);
            }

            let site_name = format!("Site {:03}", day);
            let (first_dive, first_site) = &day_dives[0];
            let check_in = first_dive.when - rng.gen_range(300..=1200);
            fixes.push(GpsFix::named(check_in, &site_name, *first_site));

            let mut t = midnight + AUTOMATIC_WINDOW.0;
            while t < midnight + AUTOMATIC_WINDOW.1 {
                let position = day_dives
                    .iter()
                    .find(|(dive, _)| dive.includes(t))
                    .map(|(_, site)| *site)
                    .unwrap_or(self.origin);
                let noisy = add_gps_noise(&position, self.gps_noise_sigma_meters, &mut rng);
                fixes.push(GpsFix::automatic(t, noisy));
                automatic_fix_count += 1;
                t += interval;
            }

            if self.stray_named_fixes {
                let stray = random_site(&self.origin, &mut rng);
                fixes.push(GpsFix::named(
                    midnight + STRAY_FIX_OFFSET,
                    &format!("Harbor {:03}", day),
                    stray,
                ));
                stray_fix_count += 1;
            }

            for (i, (dive, site)) in day_dives.into_iter().enumerate() {
                let number = dives.len() as u32 + 1;
                dives.push(dive.with_number(number));
                expected_sites.push(site);
                expected_names.push((i == 0).then(|| site_name.clone()));
            }
        }

        fixes.shuffle(&mut rng);

        let metadata = DatasetMetadata {
            dive_count: dives.len(),
            automatic_fix_count,
            named_fix_count: self.days,
            stray_fix_count,
        };

        SyntheticDataset {
            dives,
            fixes: FixTable::from_fixes(fixes),
            expected_sites,
            expected_names,
            metadata,
        }
    }

    /// A week on a liveaboard: three dives a day, fixes every ten minutes.
    pub fn liveaboard_week() -> Self {
        Self {
            origin: GpsPoint::new(-16.5004, 145.4631),
            start: 1_356_998_400, // 2013-01-01
            days: 7,
            dives_per_day: 3,
            automatic_fix_interval: 600,
            gps_noise_sigma_meters: 5.0,
            stray_named_fixes: true,
            seed: 42,
        }
    }

    /// A long dive season for benchmarking.
    pub fn dive_season(days: usize) -> Self {
        Self {
            days,
            dives_per_day: 4,
            automatic_fix_interval: 300,
            seed: 7,
            ..Self::liveaboard_week()
        }
    }
}
