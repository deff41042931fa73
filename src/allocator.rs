//! Multi-day itinerary allocation.
//!
//! Drives one daily solve per calendar day against a shrinking candidate
//! pool: the top-ranked not-yet-scheduled attractions form the day's working
//! set, scheduled attractions leave the pool by id, and everything else
//! rolls forward to the next day unchanged. Days are processed strictly in
//! calendar order because each outcome mutates the pool the next day reads.

use std::time::Duration;

use tracing::{debug, info};

use crate::haversine::HaversineMatrix;
use crate::model::{
    format_clock, Attraction, DayPlan, InputError, Itinerary, PlanningRequest, RouteStop,
};
use crate::solver::{solve_day, SolveOptions, VisitSlot};
use crate::traits::TravelTimeProvider;
use crate::windows;

/// Note attached to days for which the pool ran dry.
const POOL_EXHAUSTED_NOTE: &str = "no candidates remaining";

/// [`plan_itinerary`] with the request's own travel-speed assumption feeding
/// a haversine estimator; the common boundary-layer entry point.
pub fn plan_with_haversine(
    pool: &[Attraction],
    request: &PlanningRequest,
) -> Result<Itinerary, InputError> {
    let provider = HaversineMatrix::new(request.travel_speed_kmph);
    plan_itinerary(pool, request, &provider)
}

/// Plan a full itinerary for a request.
///
/// `pool` is the ranked candidate list from the external recommender,
/// sorted descending by rank score. It is copied: the caller's data is never
/// mutated, and concurrent requests over the same table never observe each
/// other. Only a malformed request fails the call; per-day trouble becomes a
/// note on that day's plan.
pub fn plan_itinerary<P>(
    pool: &[Attraction],
    request: &PlanningRequest,
    provider: &P,
) -> Result<Itinerary, InputError>
where
    P: TravelTimeProvider,
{
    request.validate()?;

    // Private working copy, budget ceiling applied. Rank order is preserved;
    // ranking itself is the recommender's job.
    let mut pool: Vec<Attraction> = pool
        .iter()
        .filter(|attraction| attraction.price_level <= request.budget)
        .cloned()
        .collect();

    let options = SolveOptions {
        time_budget: Duration::from_millis(request.solver_budget_ms),
        ..SolveOptions::default()
    };

    let mut days = Vec::new();
    for date in request.days() {
        if pool.is_empty() {
            debug!(%date, "pool exhausted");
            days.push(DayPlan::skipped(date, POOL_EXHAUSTED_NOTE));
            continue;
        }

        let working: Vec<Attraction> = pool
            .iter()
            .take(request.candidates_per_day)
            .cloned()
            .collect();
        days.push(plan_day(date, &working, request, provider, &options, &mut pool));
    }

    Ok(Itinerary { days })
}

fn plan_day<P>(
    date: chrono::NaiveDate,
    working: &[Attraction],
    request: &PlanningRequest,
    provider: &P,
    options: &SolveOptions,
    pool: &mut Vec<Attraction>,
) -> DayPlan
where
    P: TravelTimeProvider,
{
    // The day is anchored at the top-ranked candidate's coordinates; the
    // depot is virtual, so any consistent anchor works.
    let depot = working[0].location();
    let mut locations = Vec::with_capacity(working.len() + 1);
    locations.push(depot);
    locations.extend(working.iter().map(Attraction::location));

    let matrix = provider.matrix_for(&locations);

    let slots: Vec<VisitSlot> = working
        .iter()
        .map(|attraction| {
            let resolved = windows::resolve(
                attraction.open_minute,
                attraction.close_minute,
                attraction.visit_duration,
                request.daily_start_minute,
                request.daily_end_minute,
            );
            VisitSlot {
                window: resolved.window,
                duration: attraction.visit_duration.max(0),
                relaxed: resolved.relaxed,
            }
        })
        .collect();

    match solve_day(&matrix, &slots, request.daily_start_minute, options) {
        Ok(route) => {
            let stops: Vec<RouteStop> = route
                .stops
                .iter()
                .map(|visit| {
                    let attraction = &working[visit.candidate];
                    RouteStop {
                        point_id: attraction.id,
                        point_name: attraction.name.clone(),
                        start_minute: visit.start_minute,
                        end_minute: visit.end_minute,
                        arrival_clock: format_clock(visit.start_minute),
                    }
                })
                .collect();

            // Scheduled attractions leave the pool by id so later days can
            // never re-offer them; unplaced candidates roll forward.
            let scheduled: Vec<_> = stops.iter().map(|stop| stop.point_id).collect();
            pool.retain(|attraction| !scheduled.contains(&attraction.id));

            info!(
                %date,
                scheduled = stops.len(),
                rolled_forward = route.unplaced.len(),
                makespan = route.makespan,
                "day planned"
            );
            DayPlan::scheduled(date, stops)
        }
        Err(infeasible) => {
            // Nothing placeable today; the same candidates stay eligible
            // for the next day.
            info!(%date, reason = %infeasible, "day infeasible");
            DayPlan::skipped(date, infeasible.reason)
        }
    }
}
