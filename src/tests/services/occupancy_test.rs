use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::models::window::BookableWindow;
use crate::services::occupancy::{build_day_occupancy, build_occupancy, build_occupancy_in};
use crate::tests::fixtures::{
    at_hour, default_policy, reservation, reservation_between, test_date, window,
};

/// Occupancy builder test module
#[cfg(test)]
mod occupancy_tests {
    use super::*;

    #[test]
    fn test_no_reservations_is_all_free() {
        for (start, end) in [(9, 18), (0, 24), (8, 12)] {
            let window = window(start, end);
            let occupancy = build_occupancy(&window, &[]);

            assert_eq!(occupancy.len(), (end - start) as usize);
            assert!(occupancy.as_slice().iter().all(|&slot| slot == 0));
        }
    }

    #[test]
    fn test_end_hour_is_exclusive() {
        let occupancy = build_occupancy(&BookableWindow::default(), &[reservation("r1", 10, 12)]);

        assert_eq!(occupancy.as_slice(), &[0, 1, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(occupancy.to_string(), "011000000");
        assert!(occupancy.is_occupied(10));
        assert!(occupancy.is_occupied(11));
        assert!(!occupancy.is_occupied(12));
    }

    #[test]
    fn test_unsorted_and_overlapping_reservations() {
        let reservations = vec![
            reservation("r3", 15, 17),
            reservation("r1", 10, 12),
            // Overlaps r1, double-marks hour 11
            reservation("r2", 11, 13),
        ];
        let occupancy = build_occupancy(&BookableWindow::default(), &reservations);

        assert_eq!(occupancy.occupied_hours(), vec![10, 11, 12, 15, 16]);
        assert_eq!(occupancy.free_hours(), vec![9, 13, 14, 17]);
    }

    #[test]
    fn test_covers_hour_iff_some_reservation_covers_it() {
        let reservations = vec![
            reservation("r1", 9, 10),
            reservation("r2", 13, 16),
            reservation("r3", 17, 18),
        ];
        let window = BookableWindow::default();
        let occupancy = build_occupancy(&window, &reservations);

        for hour in window.hours() {
            let covered = reservations
                .iter()
                .any(|r| r.start_time <= at_hour(hour) && at_hour(hour) < r.end_time);
            assert_eq!(occupancy.is_occupied(hour), covered, "hour {}", hour);
        }
    }

    #[test]
    fn test_reservations_outside_window_are_clipped() {
        let reservations = vec![
            // Entirely before the window
            reservation("early", 6, 8),
            // Straddles the opening hour
            reservation("straddle", 7, 10),
            // Straddles closing
            reservation("late", 17, 20),
        ];
        let occupancy = build_occupancy(&BookableWindow::default(), &reservations);

        assert_eq!(occupancy.as_slice(), &[1, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_partial_hours_mark_every_touched_hour() {
        let start = at_hour(10) + Duration::minutes(30);
        let end = at_hour(11) + Duration::minutes(15);
        let occupancy = build_occupancy(
            &BookableWindow::default(),
            &[reservation_between("odd", start, end)],
        );

        assert_eq!(occupancy.occupied_hours(), vec![10, 11]);
    }

    #[test]
    fn test_inverted_reservation_is_ignored() {
        let occupancy = build_occupancy(
            &BookableWindow::default(),
            &[reservation_between("bad", at_hour(12), at_hour(10))],
        );
        assert!(occupancy.occupied_hours().is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let reservations = vec![reservation("r1", 10, 12), reservation("r2", 14, 15)];
        let window = BookableWindow::default();

        assert_eq!(
            build_occupancy(&window, &reservations),
            build_occupancy(&window, &reservations)
        );
    }

    #[test]
    fn test_hour_of_day_read_at_offset() {
        // 02:00-04:00 UTC is 10:00-12:00 in UTC+8
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        let occupancy = build_occupancy_in(
            &BookableWindow::default(),
            shanghai,
            &[reservation("r1", 2, 4)],
        );

        assert_eq!(occupancy.occupied_hours(), vec![10, 11]);
    }

    #[test]
    fn test_day_occupancy_only_counts_that_day() {
        let next_day = Utc.with_ymd_and_hms(2035, 3, 31, 10, 0, 0).unwrap();
        let reservations = vec![
            reservation("today", 10, 11),
            reservation_between("tomorrow", next_day, next_day + Duration::hours(2)),
        ];

        let today = build_day_occupancy(&default_policy(), test_date(), &reservations, None);
        assert_eq!(today.occupied_hours(), vec![10]);

        let tomorrow = build_day_occupancy(
            &default_policy(),
            NaiveDate::from_ymd_opt(2035, 3, 31).unwrap(),
            &reservations,
            None,
        );
        assert_eq!(tomorrow.occupied_hours(), vec![10, 11]);
    }

    #[test]
    fn test_day_occupancy_across_midnight() {
        let policy = default_policy().with_utc_offset(FixedOffset::east_opt(0).unwrap());
        let overnight = reservation_between(
            "overnight",
            Utc.with_ymd_and_hms(2035, 3, 30, 16, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2035, 3, 31, 11, 0, 0).unwrap(),
        );
        let reservations = vec![overnight];

        let first = build_day_occupancy(&policy, test_date(), &reservations, None);
        assert_eq!(first.occupied_hours(), vec![16, 17]);

        let second = build_day_occupancy(
            &policy,
            NaiveDate::from_ymd_opt(2035, 3, 31).unwrap(),
            &reservations,
            None,
        );
        assert_eq!(second.occupied_hours(), vec![9, 10]);
    }

    #[test]
    fn test_day_occupancy_excludes_edited_reservation() {
        let reservations = vec![reservation("keep", 9, 10), reservation("edit", 12, 14)];

        let occupancy =
            build_day_occupancy(&default_policy(), test_date(), &reservations, Some("edit"));
        assert_eq!(occupancy.occupied_hours(), vec![9]);
    }

    #[test]
    fn test_count_free_skips_reserved_and_out_of_window_hours() {
        let occupancy = build_occupancy(&BookableWindow::default(), &[reservation("r1", 11, 13)]);

        assert_eq!(occupancy.count_free(9..=14), 4);
        assert_eq!(occupancy.count_free(16..=20), 2);
        assert_eq!(occupancy.first_occupied(9..12), Some(11));
        assert_eq!(occupancy.first_occupied(13..18), None);
    }
}
