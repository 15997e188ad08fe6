use crate::error::SelectionError;
use crate::models::window::BookableWindow;
use crate::services::occupancy::{build_occupancy, OccupancyBitmap};
use crate::services::range_selector::{RangeSelector, SelectionEmission, SelectionRange};
use crate::tests::fixtures::{default_policy, range, reservation};

fn free_selector() -> RangeSelector {
    RangeSelector::new(OccupancyBitmap::empty(BookableWindow::default()), &default_policy())
}

/// Range selector test module
#[cfg(test)]
mod range_selector_tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let selector = free_selector();
        assert_eq!(selector.state(), SelectionRange::Empty);
        assert!(selector.candidate().is_none());
        assert!(!selector.is_selected(9));
    }

    #[test]
    fn test_two_taps_complete_selection() {
        let mut selector = free_selector();

        assert_eq!(selector.tap(9), Ok(SelectionEmission::Cleared));
        assert_eq!(selector.state(), SelectionRange::Partial { start: 9 });

        let emission = selector.tap(11).unwrap();
        assert_eq!(emission, SelectionEmission::Selected { start: 9, end: 11 });
        assert_eq!(emission.as_pair(), (Some(9), Some(11)));
        assert_eq!(selector.state(), SelectionRange::Complete { start: 9, end: 11 });
    }

    #[test]
    fn test_too_long_selection_restarts_at_tap() {
        let mut selector = free_selector();
        selector.tap(9).unwrap();

        // 9..=16 is eight free hours, cap is four
        let emission = selector.tap(16).unwrap();
        assert_eq!(emission, SelectionEmission::Cleared);
        assert_eq!(emission.as_pair(), (None, None));
        assert_eq!(selector.state(), SelectionRange::Partial { start: 16 });
    }

    #[test]
    fn test_selection_at_cap_is_accepted() {
        let mut selector = free_selector();
        selector.tap(10).unwrap();

        // Four cells: 10, 11, 12, 13
        assert_eq!(
            selector.tap(13),
            Ok(SelectionEmission::Selected { start: 10, end: 13 })
        );

        let mut selector = free_selector();
        selector.tap(10).unwrap();
        assert_eq!(selector.tap(14), Ok(SelectionEmission::Cleared));
    }

    #[test]
    fn test_tap_at_or_before_start_restarts() {
        let mut selector = free_selector();
        selector.tap(12).unwrap();

        assert_eq!(selector.tap(10), Ok(SelectionEmission::Cleared));
        assert_eq!(selector.state(), SelectionRange::Partial { start: 10 });

        assert_eq!(selector.tap(10), Ok(SelectionEmission::Cleared));
        assert_eq!(selector.state(), SelectionRange::Partial { start: 10 });
    }

    #[test]
    fn test_tap_after_complete_starts_over() {
        let mut selector = free_selector();
        selector.tap(9).unwrap();
        selector.tap(11).unwrap();

        assert_eq!(selector.tap(14), Ok(SelectionEmission::Cleared));
        assert_eq!(selector.state(), SelectionRange::Partial { start: 14 });
        assert!(selector.candidate().is_none());
    }

    #[test]
    fn test_reserved_hours_do_not_count_toward_cap() {
        let occupancy = build_occupancy(&BookableWindow::default(), &[reservation("r1", 11, 13)]);
        let mut selector = RangeSelector::new(occupancy, &default_policy());

        selector.tap(9).unwrap();
        // Cells 9..=14 hold six hours, two of them reserved
        assert_eq!(
            selector.tap(14),
            Ok(SelectionEmission::Selected { start: 9, end: 14 })
        );
    }

    #[test]
    fn test_reserved_and_out_of_window_taps_are_refused() {
        let occupancy = build_occupancy(&BookableWindow::default(), &[reservation("r1", 11, 12)]);
        let mut selector = RangeSelector::new(occupancy, &default_policy());
        selector.tap(9).unwrap();

        assert!(!selector.is_tappable(11));
        assert_eq!(selector.tap(11), Err(SelectionError::Reserved(11)));
        assert_eq!(selector.tap(18), Err(SelectionError::OutOfWindow(18)));
        assert_eq!(selector.tap(8), Err(SelectionError::OutOfWindow(8)));

        // Selection untouched
        assert_eq!(selector.state(), SelectionRange::Partial { start: 9 });
    }

    #[test]
    fn test_is_selected_per_state() {
        let mut selector = free_selector();
        assert!((9..18).all(|h| !selector.is_selected(h)));

        selector.tap(10).unwrap();
        let selected: Vec<u32> = (9..18).filter(|&h| selector.is_selected(h)).collect();
        assert_eq!(selected, vec![10]);

        selector.tap(12).unwrap();
        let selected: Vec<u32> = (9..18).filter(|&h| selector.is_selected(h)).collect();
        assert_eq!(selected, vec![10, 11, 12]);
    }

    #[test]
    fn test_candidate_converts_inclusive_cells_to_half_open_range() {
        let mut selector = free_selector();
        selector.tap(9).unwrap();
        selector.tap(11).unwrap();

        assert_eq!(selector.candidate(), Some(range(9, 12)));
    }

    #[test]
    fn test_reset_and_refresh_clear_selection() {
        let mut selector = free_selector();
        selector.tap(9).unwrap();
        selector.tap(10).unwrap();

        assert_eq!(selector.reset(), SelectionEmission::Cleared);
        assert_eq!(selector.state(), SelectionRange::Empty);

        selector.tap(13).unwrap();
        selector.tap(14).unwrap();
        let fresh = build_occupancy(&BookableWindow::default(), &[reservation("r1", 13, 14)]);
        assert_eq!(selector.refresh(fresh), SelectionEmission::Cleared);
        assert_eq!(selector.state(), SelectionRange::Empty);
        assert!(!selector.is_tappable(13));
    }
}
