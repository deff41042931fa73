//! Per-point visit-start windows.
//!
//! A visit may begin anywhere inside the intersection of the point's opening
//! hours and the day's travel window, minus the visit duration. When that
//! intersection cannot fit the visit (or the point's hours are degenerate),
//! the window is relaxed to the full day instead of the point being dropped:
//! the solver penalizes relaxed placements through its cost function rather
//! than excluding the point outright.

/// The minute interval within which a visit may begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub earliest_start: i32,
    pub latest_start: i32,
}

impl TimeWindow {
    pub fn new(earliest_start: i32, latest_start: i32) -> Self {
        debug_assert!(earliest_start <= latest_start);
        Self {
            earliest_start,
            latest_start,
        }
    }

    /// The whole daily span; used for the depot.
    pub fn full_day(daily_start: i32, daily_end: i32) -> Self {
        Self::new(daily_start, daily_end)
    }

    pub fn contains(&self, minute: i32) -> bool {
        self.earliest_start <= minute && minute <= self.latest_start
    }
}

/// A resolved window plus whether the relaxation policy had to kick in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub window: TimeWindow,
    pub relaxed: bool,
}

/// Compute the feasible visit-start interval for a point.
///
/// `earliest = max(open, daily_start)`, `latest = min(close, daily_end) -
/// duration`. If the result is empty, or the inputs are degenerate (closing
/// before opening, non-positive duration), the full-day window is substituted
/// and the point flagged for low-priority placement.
pub fn resolve(
    open_minute: i32,
    close_minute: i32,
    duration: i32,
    daily_start: i32,
    daily_end: i32,
) -> ResolvedWindow {
    debug_assert!(daily_start < daily_end);

    if open_minute >= close_minute || duration <= 0 {
        return relaxed(duration, daily_start, daily_end);
    }

    let earliest = open_minute.max(daily_start);
    let latest = close_minute.min(daily_end) - duration;
    if latest < earliest {
        return relaxed(duration, daily_start, daily_end);
    }

    ResolvedWindow {
        window: TimeWindow::new(earliest, latest),
        relaxed: false,
    }
}

fn relaxed(duration: i32, daily_start: i32, daily_end: i32) -> ResolvedWindow {
    // Keep the relaxed window non-empty even when the duration exceeds the
    // whole day.
    let latest = (daily_end - duration.max(0)).max(daily_start);
    ResolvedWindow {
        window: TimeWindow::new(daily_start, latest),
        relaxed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_inside_day() {
        // Open 9:00-17:00, 2h visit, day 9:00-21:00
        let resolved = resolve(540, 1020, 120, 540, 1260);
        assert!(!resolved.relaxed);
        assert_eq!(resolved.window, TimeWindow::new(540, 900));
    }

    #[test]
    fn test_window_clipped_by_day_start() {
        // Opens 8:00 but the day starts at 9:00
        let resolved = resolve(480, 1320, 180, 540, 1260);
        assert!(!resolved.relaxed);
        assert_eq!(resolved.window.earliest_start, 540);
        assert_eq!(resolved.window.latest_start, 1260 - 180);
    }

    #[test]
    fn test_window_clipped_by_close() {
        // Closes 16:00, day runs to 21:00
        let resolved = resolve(600, 960, 60, 540, 1260);
        assert!(!resolved.relaxed);
        assert_eq!(resolved.window.latest_start, 900);
    }

    #[test]
    fn test_duration_exceeding_open_interval_relaxes() {
        // 300-minute visit against a 60-minute open interval: relaxation,
        // not exclusion.
        let resolved = resolve(600, 660, 300, 540, 1260);
        assert!(resolved.relaxed);
        assert_eq!(resolved.window.earliest_start, 540);
        assert_eq!(resolved.window.latest_start, 1260 - 300);
    }

    #[test]
    fn test_degenerate_hours_relax() {
        // Closing minute before opening minute (bad source data)
        let resolved = resolve(900, 600, 60, 540, 1260);
        assert!(resolved.relaxed);
        assert!(resolved.window.earliest_start <= resolved.window.latest_start);
    }

    #[test]
    fn test_non_positive_duration_relaxes() {
        let resolved = resolve(600, 900, 0, 540, 1260);
        assert!(resolved.relaxed);
    }

    #[test]
    fn test_relaxed_window_stays_non_empty() {
        // Visit longer than the whole day
        let resolved = resolve(600, 660, 2000, 540, 1260);
        assert!(resolved.relaxed);
        assert_eq!(resolved.window.earliest_start, 540);
        assert_eq!(resolved.window.latest_start, 540);
    }

    #[test]
    fn test_contains() {
        let window = TimeWindow::new(540, 900);
        assert!(window.contains(540));
        assert!(window.contains(900));
        assert!(!window.contains(901));
    }
}
