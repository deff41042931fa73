//! Multi-day allocation tests
//!
//! Exercise the full pipeline: ranked pool in, one DayPlan per calendar day
//! out, pool shrinking by id as days are scheduled.

use std::collections::HashSet;

use itinerary_planner::allocator::{plan_itinerary, plan_with_haversine};
use itinerary_planner::haversine::HaversineMatrix;
use itinerary_planner::model::{Attraction, AttractionId, InputError, PlanningRequest};
use itinerary_planner::traits::TravelTimeProvider;

// ============================================================================
// Test Fixtures
// ============================================================================

/// An attraction with permissive defaults; tests tweak fields inline.
fn attraction(id: i64, name: &str, lat: f64, lon: f64) -> Attraction {
    Attraction {
        id: AttractionId(id),
        name: name.to_string(),
        latitude: lat,
        longitude: lon,
        rating: 4.5,
        review_count: 250,
        open_minute: 540,
        close_minute: 1260,
        visit_duration: 90,
        price_level: 1,
        themes: vec!["culture".to_string()],
        sentiment_score: 0.4,
        rank_score: 1.0,
    }
}

/// Five downtown points a few minutes' travel apart, in rank order.
fn downtown_pool() -> Vec<Attraction> {
    vec![
        attraction(1, "Museum A", 40.71, -74.00),
        attraction(2, "Park B", 40.72, -74.01),
        attraction(3, "Restaurant C", 40.73, -74.02),
        attraction(4, "Landmark D", 40.74, -74.03),
        attraction(5, "Gallery E", 40.75, -74.04),
    ]
}

fn request(start: &str, end: &str) -> PlanningRequest {
    let mut req = PlanningRequest::new(
        PlanningRequest::parse_date(start).unwrap(),
        PlanningRequest::parse_date(end).unwrap(),
        4,
    )
    .unwrap();
    req.solver_budget_ms = 500;
    req
}

/// Provider whose travel times dwarf any window; makes every day infeasible.
struct UnreachableMatrix;

impl TravelTimeProvider for UnreachableMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<i32>> {
        let n = locations.len();
        let mut matrix = vec![vec![10_000; n]; n];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 0;
        }
        matrix
    }
}

// ============================================================================
// Shape of the itinerary
// ============================================================================

#[test]
fn test_one_day_plan_per_date() {
    let req = request("2026-05-01", "2026-05-03");
    let itinerary = plan_with_haversine(&downtown_pool(), &req).unwrap();

    assert_eq!(itinerary.days.len(), 3);
    let dates: Vec<String> = itinerary.days.iter().map(|d| d.date.to_string()).collect();
    assert_eq!(dates, ["2026-05-01", "2026-05-02", "2026-05-03"]);
}

#[test]
fn test_at_most_once_scheduling() {
    let req = request("2026-05-01", "2026-05-04");
    let itinerary =
        plan_itinerary(&downtown_pool(), &req, &HaversineMatrix::default()).unwrap();

    let mut seen = HashSet::new();
    for day in &itinerary.days {
        for stop in day.stops().unwrap_or_default() {
            assert!(
                seen.insert(stop.point_id),
                "{} scheduled twice",
                stop.point_name
            );
        }
    }
    assert!(!seen.is_empty());
}

#[test]
fn test_pool_exhaustion_gets_explicit_note() {
    // Five candidates, four per day: day three finds an empty pool.
    let req = request("2026-05-01", "2026-05-03");
    let itinerary =
        plan_itinerary(&downtown_pool(), &req, &HaversineMatrix::default()).unwrap();

    let last = &itinerary.days[2];
    assert_eq!(last.note(), Some("no candidates remaining"));
    assert!(last.stops().is_none());
}

#[test]
fn test_empty_pool_noted_on_every_day() {
    let req = request("2026-05-01", "2026-05-02");
    let itinerary = plan_itinerary(&[], &req, &HaversineMatrix::default()).unwrap();

    assert_eq!(itinerary.days.len(), 2);
    for day in &itinerary.days {
        assert_eq!(day.note(), Some("no candidates remaining"));
    }
}

// ============================================================================
// Pool consumption
// ============================================================================

#[test]
fn test_leftovers_roll_forward() {
    // One candidate per day: the second-ranked attraction is scheduled on
    // day two, untouched.
    let mut req = request("2026-05-01", "2026-05-02");
    req.candidates_per_day = 1;
    let pool = vec![
        attraction(1, "Museum A", 40.71, -74.00),
        attraction(2, "Park B", 40.72, -74.01),
    ];

    let itinerary = plan_itinerary(&pool, &req, &HaversineMatrix::default()).unwrap();

    let day1 = itinerary.days[0].stops().unwrap();
    let day2 = itinerary.days[1].stops().unwrap();
    assert_eq!(day1.len(), 1);
    assert_eq!(day1[0].point_id, AttractionId(1));
    assert_eq!(day2.len(), 1);
    assert_eq!(day2[0].point_id, AttractionId(2));
}

#[test]
fn test_infeasible_day_leaves_pool_intact() {
    // Every day is unreachable; the pool never shrinks, so no day reports
    // pool exhaustion and every day carries the solver's reason.
    let req = request("2026-05-01", "2026-05-02");
    let itinerary =
        plan_itinerary(&downtown_pool(), &req, &UnreachableMatrix).unwrap();

    for day in &itinerary.days {
        let note = day.note().expect("day should carry a note");
        assert!(
            note.contains("no reachable candidate"),
            "unexpected note: {note}"
        );
    }
}

#[test]
fn test_rerun_on_remainder_never_readmits() {
    // Re-running the allocator on the unconsumed remainder of the pool must
    // not re-admit anything already scheduled.
    let pool = downtown_pool();
    let first =
        plan_itinerary(&pool, &request("2026-05-01", "2026-05-01"), &HaversineMatrix::default())
            .unwrap();
    let scheduled: HashSet<AttractionId> = first.days[0]
        .stops()
        .unwrap()
        .iter()
        .map(|s| s.point_id)
        .collect();
    assert!(!scheduled.is_empty());

    let remainder: Vec<Attraction> = pool
        .iter()
        .filter(|a| !scheduled.contains(&a.id))
        .cloned()
        .collect();
    let second = plan_itinerary(
        &remainder,
        &request("2026-05-02", "2026-05-02"),
        &HaversineMatrix::default(),
    )
    .unwrap();

    for stop in second.days[0].stops().unwrap_or_default() {
        assert!(!scheduled.contains(&stop.point_id));
    }
}

#[test]
fn test_budget_ceiling_filters_candidates() {
    let mut pricey = attraction(9, "Grand Tour", 40.71, -74.00);
    pricey.price_level = 4;
    let mut req = request("2026-05-01", "2026-05-01");
    req.budget = 2;

    let itinerary = plan_itinerary(&[pricey], &req, &HaversineMatrix::default()).unwrap();
    assert_eq!(itinerary.days[0].note(), Some("no candidates remaining"));
}

// ============================================================================
// Schedule validity
// ============================================================================

#[test]
fn test_stops_respect_windows_and_travel_times() {
    let req = request("2026-05-01", "2026-05-01");
    let pool = downtown_pool();
    let provider = HaversineMatrix::new(req.travel_speed_kmph);

    let itinerary = plan_itinerary(&pool, &req, &provider).unwrap();
    let stops = itinerary.days[0].stops().expect("day one should schedule");
    assert!(!stops.is_empty());

    // Rebuild the solver's inputs: depot anchored at the top-ranked
    // candidate, then the working set in rank order.
    let working: Vec<&Attraction> = pool.iter().take(req.candidates_per_day).collect();
    let mut locations = vec![working[0].location()];
    locations.extend(working.iter().map(|a| a.location()));
    let matrix = provider.matrix_for(&locations);

    let mut prev = 0;
    let mut prev_end = req.daily_start_minute;
    for stop in stops {
        let index = working
            .iter()
            .position(|a| a.id == stop.point_id)
            .expect("scheduled stop must come from the working set")
            + 1;
        assert!(
            stop.start_minute >= prev_end + matrix[prev][index],
            "{} starts before travel completes",
            stop.point_name
        );
        assert_eq!(stop.end_minute, stop.start_minute + 90);
        assert!(stop.start_minute >= 540);
        assert!(stop.end_minute <= 1260);
        prev = index;
        prev_end = stop.end_minute;
    }
}

#[test]
fn test_oversized_visit_does_not_sink_the_day() {
    // Duration exceeds the open interval: relaxation policy, the day still
    // plans.
    let mut marathon = attraction(7, "All-Day Tour", 40.72, -74.01);
    marathon.open_minute = 600;
    marathon.close_minute = 660;
    marathon.visit_duration = 300;
    let pool = vec![attraction(1, "Museum A", 40.71, -74.00), marathon];
    let req = request("2026-05-01", "2026-05-01");

    let itinerary = plan_itinerary(&pool, &req, &HaversineMatrix::default()).unwrap();
    assert!(!itinerary.days[0].stops().unwrap().is_empty());
}

// ============================================================================
// Input validation + serialization
// ============================================================================

#[test]
fn test_inverted_date_range_aborts_request() {
    let mut req = request("2026-05-03", "2026-05-03");
    req.end_date = PlanningRequest::parse_date("2026-05-01").unwrap();

    let err = plan_itinerary(&downtown_pool(), &req, &HaversineMatrix::default()).unwrap_err();
    assert!(matches!(err, InputError::InvertedDateRange { .. }));
}

#[test]
fn test_day_plan_serialized_shape() {
    let req = request("2026-05-01", "2026-05-02");
    let pool = vec![attraction(1, "Museum A", 40.71, -74.00)];
    let itinerary = plan_itinerary(&pool, &req, &HaversineMatrix::default()).unwrap();

    let value = serde_json::to_value(&itinerary).unwrap();
    let days = value["itinerary"].as_array().unwrap();
    assert_eq!(days.len(), 2);

    // Day one: stops with names, minutes, and a wall-clock string
    let stop = &days[0]["stops"][0];
    assert_eq!(stop["point_name"], "Museum A");
    assert_eq!(stop["start_minute"], 540);
    assert_eq!(stop["end_minute"], 630);
    assert_eq!(stop["arrival_clock"], "09:00");
    assert!(days[0].get("note").is_none());

    // Day two: the pool is spent, note instead of stops
    assert_eq!(days[1]["note"], "no candidates remaining");
    assert!(days[1].get("stops").is_none());
}
