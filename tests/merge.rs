//! Tests for merge module

use divegps::{
    merge_locations_into_dives, Dive, DiveLog, DiveTable, FixTable, GpsFix, GpsPoint,
    MergeConfig, RawFix, SAME_GROUP_WINDOW,
};

fn reef() -> GpsPoint {
    GpsPoint::new(-16.5004, 145.4631)
}

fn wreck() -> GpsPoint {
    GpsPoint::new(-19.1383, 147.9447)
}

fn merge(fixes: Vec<GpsFix>, dives: &mut DiveTable) -> divegps::MergeReport {
    let mut fixes = FixTable::from_fixes(fixes);
    merge_locations_into_dives(&mut fixes, dives, &MergeConfig::default())
}

#[test]
fn test_mixed_fixes_scenario() {
    let auto_loc = GpsPoint::new(10.0, 20.0);
    let first_reef = GpsPoint::new(10.1, 20.1);
    let second_reef = GpsPoint::new(10.2, 20.2);

    let mut dives = DiveTable::from_dives(vec![Dive::new(990, 30), Dive::new(1004, 26)]);
    let report = merge(
        vec![
            GpsFix::new(1000, None, auto_loc),
            GpsFix::named(1005, "Reef", first_reef),
            GpsFix::named(1010, "Reef", second_reef),
        ],
        &mut dives,
    );

    // Automatic fix lands on the containing dive, the first named fix can
    // only add the name there, the second one moves on to the next dive.
    let d0 = dives.get(0).unwrap();
    assert_eq!(d0.gps, Some(auto_loc));
    assert_eq!(d0.location.as_deref(), Some("Reef"));

    let d1 = dives.get(1).unwrap();
    assert_eq!(d1.gps, Some(second_reef));
    assert_eq!(d1.location.as_deref(), Some("Reef"));

    assert_eq!(report.automatic_fixes, 1);
    assert_eq!(report.named_fixes, 2);
    assert_eq!(report.coordinates_set, 2);
    assert_eq!(report.names_set, 2);
    assert_eq!(report.dives_updated, 2);
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_empty_fix_table_is_noop() {
    let mut dives = DiveTable::from_dives(vec![Dive::new(0, 3600)]);
    let before = dives.clone();

    let report = merge(vec![], &mut dives);

    assert_eq!(dives, before);
    assert!(report.is_noop());
    assert_eq!(report.fixes_processed, 0);
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_empty_and_singleton_dive_tables() {
    let mut empty = DiveTable::new();
    let report = merge(
        vec![
            GpsFix::automatic(100, reef()),
            GpsFix::named(200, "Reef", reef()),
        ],
        &mut empty,
    );
    assert!(report.is_noop());
    assert_eq!(report.unmatched.len(), 1);

    let mut single = DiveTable::from_dives(vec![Dive::new(1_000, 3_000)]);
    let report = merge(
        vec![
            GpsFix::named(900, "Reef", reef()),
            GpsFix::named(950, "Reef", reef()),
        ],
        &mut single,
    );
    assert_eq!(single.get(0).unwrap().location.as_deref(), Some("Reef"));
    // Second fix of the group asks for the 2nd nearest dive, which does not exist
    assert_eq!(report.unmatched.len(), 1);
}

#[test]
fn test_named_fix_without_dive_is_reported() {
    let mut dives = DiveTable::from_dives(vec![Dive::new(1_356_700_000, 3_000)]);
    let before = dives.clone();

    // 2012-12-29 15:30:05 UTC, more than six hours after the dive ended
    let report = merge(
        vec![GpsFix::named(1_356_795_005, "Lonely Reef", reef())],
        &mut dives,
    );

    assert_eq!(dives, before);
    assert_eq!(report.unmatched.len(), 1);
    let unmatched = &report.unmatched[0];
    assert_eq!(unmatched.name, "Lonely Reef");
    assert_eq!(unmatched.when, 1_356_795_005);
    assert_eq!(unmatched.formatted_time, "2012-12-29 15:30:05");
}

#[test]
fn test_automatic_fix_outside_dives_changes_nothing() {
    let mut dives = DiveTable::from_dives(vec![Dive::new(1_000, 600), Dive::new(5_000, 600)]);
    let before = dives.clone();

    // Close to both dives but inside neither
    let report = merge(
        vec![
            GpsFix::automatic(1_600, reef()),
            GpsFix::automatic(4_999, reef()),
        ],
        &mut dives,
    );

    assert_eq!(dives, before);
    assert!(report.is_noop());
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_automatic_fix_never_sets_name() {
    let mut dives = DiveTable::from_dives(vec![Dive::new(1_000, 600)]);
    merge(vec![GpsFix::automatic(1_100, reef())], &mut dives);

    let dive = dives.get(0).unwrap();
    assert_eq!(dive.gps, Some(reef()));
    assert!(dive.location.is_none());
}

#[test]
fn test_sentinel_name_is_treated_as_automatic() {
    let raw = RawFix {
        when: 500,
        name: Some("automatic fix".to_string()),
        latitude: reef().latitude,
        longitude: reef().longitude,
    };
    // Within six hours of the dive, but not inside it
    let mut dives = DiveTable::from_dives(vec![Dive::new(1_000, 600)]);
    let report = merge(vec![GpsFix::from(raw)], &mut dives);

    assert!(report.is_noop());
    assert_eq!(report.automatic_fixes, 1);
    assert!(dives.get(0).unwrap().gps.is_none());
}

#[test]
fn test_named_fixes_in_one_window_spread_over_dives() {
    let mut dives = DiveTable::from_dives(vec![
        Dive::new(10_000, 2_400),
        Dive::new(16_000, 2_400),
    ]);

    // Two check-ins one hour apart, both before the first dive
    let report = merge(
        vec![
            GpsFix::named(9_000, "Reef", reef()),
            GpsFix::named(9_000 + 3_600, "Reef", wreck()),
        ],
        &mut dives,
    );

    let d0 = dives.get(0).unwrap();
    let d1 = dives.get(1).unwrap();
    assert_eq!(d0.gps, Some(reef()));
    assert_eq!(d1.gps, Some(wreck()));
    assert_eq!(d0.location.as_deref(), Some("Reef"));
    assert_eq!(d1.location.as_deref(), Some("Reef"));
    assert_eq!(report.dives_updated, 2);
}

#[test]
fn test_counter_resets_after_window() {
    let mut dives = DiveTable::from_dives(vec![
        Dive::new(0, 3_600),
        Dive::new(20_000, 3_600),
        Dive::new(40_000, 3_600),
    ]);

    // The second fix is more than six hours after the anchor, so it starts
    // a new group and takes the nearest dive rather than the 2nd nearest.
    merge(
        vec![
            GpsFix::named(1_000, "Reef", reef()),
            GpsFix::named(25_000, "Wreck", wreck()),
        ],
        &mut dives,
    );

    assert_eq!(dives.get(0).unwrap().location.as_deref(), Some("Reef"));
    assert_eq!(dives.get(1).unwrap().location.as_deref(), Some("Wreck"));
    assert!(dives.get(2).unwrap().location.is_none());
}

#[test]
fn test_group_ordinal_uses_nearest_ordering() {
    let mut dives = DiveTable::from_dives(vec![
        Dive::new(900, 1_000),
        Dive::new(2_500, 1_000),
        Dive::new(4_000, 2_000),
    ]);

    // Given out of order; equal timestamps keep their input order
    let report = merge(
        vec![
            GpsFix::named(5_000, "Later", wreck()),
            GpsFix::named(1_000, "First", reef()),
            GpsFix::named(1_000, "Second", reef()),
        ],
        &mut dives,
    );

    assert_eq!(dives.get(0).unwrap().location.as_deref(), Some("First"));
    assert_eq!(dives.get(1).unwrap().location.as_deref(), Some("Second"));
    // "Later" is the 3rd fix of the group; the 3rd nearest dive to it is
    // the first one, which is already fully located.
    assert!(dives.get(2).unwrap().location.is_none());
    assert!(dives.get(2).unwrap().gps.is_none());
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_existing_coordinates_are_never_overwritten() {
    let original = GpsPoint::new(1.0, 2.0);
    let mut dives = DiveTable::from_dives(vec![Dive::new(1_000, 3_600).with_gps(original)]);

    let report = merge(
        vec![
            GpsFix::automatic(1_500, reef()),
            GpsFix::named(1_600, "Wreck", wreck()),
        ],
        &mut dives,
    );

    let dive = dives.get(0).unwrap();
    assert_eq!(dive.gps, Some(original));
    assert_eq!(dive.location.as_deref(), Some("Wreck"));
    assert_eq!(report.coordinates_set, 0);
    assert_eq!(report.names_set, 1);
}

#[test]
fn test_existing_name_is_never_overwritten() {
    let mut dives =
        DiveTable::from_dives(vec![Dive::new(1_000, 3_600).with_location("House Reef")]);

    let report = merge(vec![GpsFix::named(1_500, "Wreck", wreck())], &mut dives);

    let dive = dives.get(0).unwrap();
    assert_eq!(dive.location.as_deref(), Some("House Reef"));
    assert_eq!(dive.gps, Some(wreck()));
    assert_eq!(report.names_set, 0);
    assert_eq!(report.dives_updated, 1);
}

#[test]
fn test_first_fix_wins_for_coordinates() {
    let mut dives = DiveTable::from_dives(vec![Dive::new(1_000, 3_600)]);

    merge(
        vec![
            GpsFix::automatic(2_000, wreck()),
            GpsFix::automatic(1_200, reef()),
        ],
        &mut dives,
    );

    assert_eq!(dives.get(0).unwrap().gps, Some(reef()));
}

#[test]
fn test_merge_is_idempotent() {
    let fixes = vec![
        GpsFix::automatic(1_200, reef()),
        GpsFix::named(8_000, "Wreck", wreck()),
        GpsFix::named(9_000, "Wreck", wreck()),
        GpsFix::named(100_000, "Nowhere", wreck()),
    ];
    let mut dives = DiveTable::from_dives(vec![
        Dive::new(1_000, 3_600),
        Dive::new(8_500, 3_600),
        Dive::new(15_000, 3_600),
    ]);

    let mut table = FixTable::from_fixes(fixes);
    let config = MergeConfig::default();
    let first = merge_locations_into_dives(&mut table, &mut dives, &config);
    let after_first = dives.clone();
    let second = merge_locations_into_dives(&mut table, &mut dives, &config);

    assert!(!first.is_noop());
    assert!(second.is_noop());
    assert_eq!(dives, after_first);
    assert_eq!(first.unmatched, second.unmatched);
}

#[test]
fn test_fix_table_is_sorted_after_merge() {
    let mut fixes = FixTable::from_fixes(vec![
        GpsFix::automatic(300, reef()),
        GpsFix::automatic(100, reef()),
        GpsFix::automatic(200, reef()),
    ]);
    let mut dives = DiveTable::new();

    merge_locations_into_dives(&mut fixes, &mut dives, &MergeConfig::default());

    assert!(fixes.is_sorted());
    assert_eq!(fixes.len(), 3);
}

#[test]
fn test_invalid_fixes_are_skipped_without_grouping() {
    let mut dives = DiveTable::from_dives(vec![Dive::new(1_000, 1_000), Dive::new(3_000, 1_000)]);

    let report = merge(
        vec![
            GpsFix::named(1_000, "Broken", GpsPoint::new(f64::NAN, 0.0)),
            GpsFix::named(1_100, "Reef", reef()),
        ],
        &mut dives,
    );

    // Had the broken fix opened the group, "Reef" would be 2nd and go to dive 1
    assert_eq!(dives.get(0).unwrap().location.as_deref(), Some("Reef"));
    assert!(dives.get(1).unwrap().location.is_none());
    assert_eq!(report.skipped_fixes, 1);
    assert_eq!(report.named_fixes, 1);
    assert_eq!(report.fixes_processed, 2);
}

#[test]
fn test_invalid_fixes_kept_when_skipping_disabled() {
    let config = MergeConfig {
        skip_invalid_coordinates: false,
        ..MergeConfig::default()
    };
    let bogus = GpsPoint::new(95.0, 0.0);
    let mut fixes = FixTable::from_fixes(vec![GpsFix::automatic(1_100, bogus)]);
    let mut dives = DiveTable::from_dives(vec![Dive::new(1_000, 1_000)]);

    let report = merge_locations_into_dives(&mut fixes, &mut dives, &config);

    assert_eq!(report.skipped_fixes, 0);
    assert_eq!(dives.get(0).unwrap().gps, Some(bogus));
}

#[test]
fn test_custom_window() {
    let config = MergeConfig {
        same_group_window: 3_600,
        ..MergeConfig::default()
    };
    let mut fixes = FixTable::from_fixes(vec![GpsFix::named(10_000 - 7_200, "Reef", reef())]);
    let mut dives = DiveTable::from_dives(vec![Dive::new(10_000, 1_800)]);

    let report = merge_locations_into_dives(&mut fixes, &mut dives, &config);
    assert_eq!(report.unmatched.len(), 1);

    // Same fix with the default six hour window matches
    let report = merge_locations_into_dives(&mut fixes, &mut dives, &MergeConfig::default());
    assert!(report.unmatched.is_empty());
    assert_eq!(dives.get(0).unwrap().location.as_deref(), Some("Reef"));
}

#[test]
fn test_window_boundary_is_inclusive() {
    let mut dives = DiveTable::from_dives(vec![Dive::new(SAME_GROUP_WINDOW + 100, 600)]);

    let report = merge(vec![GpsFix::named(99, "Reef", reef())], &mut dives);
    assert_eq!(report.unmatched.len(), 1);

    // Exactly six hours before the dive still matches
    let report = merge(vec![GpsFix::named(100, "Reef", reef())], &mut dives);
    assert!(report.unmatched.is_empty());
    assert_eq!(dives.get(0).unwrap().location.as_deref(), Some("Reef"));
}

#[test]
fn test_fix_exactly_one_window_after_anchor_stays_in_group() {
    let mut dives = DiveTable::from_dives(vec![Dive::new(0, 600), Dive::new(21_700, 600)]);

    let report = merge(
        vec![
            GpsFix::named(0, "A", reef()),
            GpsFix::named(SAME_GROUP_WINDOW, "B", wreck()),
        ],
        &mut dives,
    );

    // "B" is the 2nd fix of the group; its 2nd nearest dive is dive 0,
    // which "A" already located and named.
    assert_eq!(dives.get(0).unwrap().location.as_deref(), Some("A"));
    assert_eq!(dives.get(0).unwrap().gps, Some(reef()));
    assert!(dives.get(1).unwrap().location.is_none());
    assert!(dives.get(1).unwrap().gps.is_none());
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_extreme_timestamps_do_not_panic() {
    let mut dives = DiveTable::from_dives(vec![
        Dive::new(1_000, 3_600),
        Dive::new(i64::MAX - 10, 3_600),
    ]);
    let before = dives.clone();

    let report = merge(
        vec![
            GpsFix::named(i64::MIN + 5, "Reef", reef()),
            GpsFix::automatic(i64::MIN, reef()),
            GpsFix::named(i64::MAX, "Wreck", wreck()),
            GpsFix::automatic(i64::MAX - 1, wreck()),
        ],
        &mut dives,
    );

    // Only the far-future dive is close enough to anything
    assert_eq!(dives.get(0), before.get(0));
    let last = dives.get(1).unwrap();
    assert_eq!(last.gps, Some(wreck()));
    assert_eq!(last.location.as_deref(), Some("Wreck"));
    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.unmatched[0].name, "Reef");
}

#[test]
fn test_merge_through_trait_object() {
    let mut table = DiveTable::from_dives(vec![Dive::new(1_000, 600)]);
    let mut fixes = FixTable::from_fixes(vec![GpsFix::named(1_100, "Reef", reef())]);

    let dives: &mut dyn DiveLog = &mut table;
    let report = merge_locations_into_dives(&mut fixes, dives, &MergeConfig::default());

    assert_eq!(report.dives_updated, 1);
    assert_eq!(table.get(0).unwrap().location.as_deref(), Some("Reef"));
}
