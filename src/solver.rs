//! Daily route solver.
//!
//! Single-vehicle time-windowed path search: starting from a virtual depot,
//! visit as many candidates as feasibly possible while minimizing the
//! completion time of the last stop (the makespan). Two phases: a greedy
//! cheapest-feasible-arc construction, then bounded local search (pairwise
//! exchange, single-stop relocation, re-insertion of unplaced candidates)
//! under a wall-clock budget, with a decaying-temperature acceptance rule to
//! escape local optima.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::windows::TimeWindow;

/// Starting temperature for the worsening-move acceptance rule, in minutes.
const INITIAL_TEMP: f64 = 45.0;

/// Per-round temperature decay.
const TEMP_DECAY: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Wall-clock budget for the whole solve.
    pub time_budget: Duration,
    /// Consecutive non-improving rounds before the search gives up.
    pub max_stale_rounds: usize,
    /// Construction-cost penalty (minutes) for candidates whose window had
    /// to be relaxed; pushes them toward the end of the route.
    pub relaxed_penalty: i32,
    /// Seed for the diversification RNG. Fixed by default so identical
    /// inputs give identical makespans.
    pub seed: u64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(5),
            max_stale_rounds: 20,
            relaxed_penalty: 240, // ~4 hours equivalent
            seed: 7,
        }
    }
}

/// Solver-facing view of one candidate: its resolved visit-start window,
/// service duration, and whether the window was relaxed.
#[derive(Debug, Clone, Copy)]
pub struct VisitSlot {
    pub window: TimeWindow,
    pub duration: i32,
    pub relaxed: bool,
}

/// One visit in the solved route, by candidate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedVisit {
    pub candidate: usize,
    pub start_minute: i32,
    pub end_minute: i32,
}

/// A feasible (possibly partial) route for one day.
#[derive(Debug, Clone)]
pub struct DayRoute {
    /// Visits in order. Never empty.
    pub stops: Vec<PlannedVisit>,
    /// Candidates that could not be feasibly placed, in index order.
    pub unplaced: Vec<usize>,
    /// Completion minute of the last stop.
    pub makespan: i32,
}

/// Not a single candidate could be placed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct RouteInfeasible {
    pub reason: String,
}

impl RouteInfeasible {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Solve one day's route.
///
/// `matrix` is the (N+1)x(N+1) travel-time matrix in minutes with the depot
/// at index 0; `slots[i]` describes candidate `i` (matrix index `i + 1`).
/// The depot's window is the full daily span and its service duration is
/// zero. Returns a route visiting a maximal-effort feasible subset, or
/// [`RouteInfeasible`] when nothing can be placed at all.
pub fn solve_day(
    matrix: &[Vec<i32>],
    slots: &[VisitSlot],
    day_start: i32,
    options: &SolveOptions,
) -> Result<DayRoute, RouteInfeasible> {
    if slots.is_empty() {
        return Err(RouteInfeasible::new("no candidates to schedule"));
    }

    let ctx = SearchContext {
        matrix,
        slots,
        day_start,
    };

    let constructed = construct(&ctx, options);
    if constructed.order.is_empty() {
        return Err(RouteInfeasible::new(
            "no reachable candidate within its time window from the depot",
        ));
    }
    debug!(
        placed = constructed.order.len(),
        unplaced = constructed.unplaced.len(),
        makespan = constructed.makespan,
        "constructed initial route"
    );

    let improved = improve(&ctx, constructed, options);
    debug!(
        placed = improved.order.len(),
        makespan = improved.makespan,
        "local search finished"
    );

    let stops = improved
        .order
        .iter()
        .zip(&improved.schedule)
        .map(|(&candidate, &(start_minute, end_minute))| PlannedVisit {
            candidate,
            start_minute,
            end_minute,
        })
        .collect();

    let mut unplaced: Vec<usize> =
        (0..slots.len()).filter(|c| !improved.order.contains(c)).collect();
    unplaced.sort_unstable();

    Ok(DayRoute {
        stops,
        unplaced,
        makespan: improved.makespan,
    })
}

// ============================================================================
// Search state
// ============================================================================

struct SearchContext<'a> {
    matrix: &'a [Vec<i32>],
    slots: &'a [VisitSlot],
    day_start: i32,
}

impl SearchContext<'_> {
    /// Travel time from a matrix index (0 = depot) to a candidate.
    fn arc(&self, from: usize, to_candidate: usize) -> i32 {
        self.matrix[from][to_candidate + 1]
    }

    /// Walk a visiting order and compute each stop's (start, end), or `None`
    /// if any window is violated. The second element is the makespan: the
    /// completion minute of the last stop. Waiting for a point to open is
    /// allowed; arriving after its latest start is not.
    fn compute_schedule(&self, order: &[usize]) -> Option<(Vec<(i32, i32)>, i32)> {
        let mut time = self.day_start;
        let mut prev = 0;
        let mut schedule = Vec::with_capacity(order.len());

        for &candidate in order {
            let slot = &self.slots[candidate];
            let arrival = time + self.arc(prev, candidate);
            let start = arrival.max(slot.window.earliest_start);
            if start > slot.window.latest_start {
                return None;
            }
            time = start + slot.duration;
            schedule.push((start, time));
            prev = candidate + 1;
        }

        Some((schedule, time))
    }
}

#[derive(Debug, Clone)]
struct RouteState {
    order: Vec<usize>,
    schedule: Vec<(i32, i32)>,
    unplaced: Vec<usize>,
    makespan: i32,
}

impl RouteState {
    /// More placed stops always beat a shorter makespan.
    fn beats(&self, other: &RouteState) -> bool {
        (self.order.len(), -self.makespan) > (other.order.len(), -other.makespan)
    }
}

// ============================================================================
// Construction: cheapest feasible arc
// ============================================================================

/// Greedy first solution: from the current position, take the unvisited
/// candidate with the cheapest feasible transition (travel plus wait, plus
/// the relaxation penalty for flagged candidates). Ties go to the candidate
/// with the earlier latest start, so time-pressured points are placed first.
fn construct(ctx: &SearchContext<'_>, options: &SolveOptions) -> RouteState {
    let mut unvisited: Vec<usize> = (0..ctx.slots.len()).collect();
    let mut order = Vec::new();
    let mut schedule = Vec::new();
    let mut time = ctx.day_start;
    let mut prev = 0;

    loop {
        let mut best: Option<(i32, i32, usize, i32)> = None; // (cost, latest, pos, start)

        for (pos, &candidate) in unvisited.iter().enumerate() {
            let slot = &ctx.slots[candidate];
            let arrival = time + ctx.arc(prev, candidate);
            let start = arrival.max(slot.window.earliest_start);
            if start > slot.window.latest_start {
                continue;
            }

            let mut cost = start - time; // travel + wait
            if slot.relaxed {
                cost += options.relaxed_penalty;
            }

            let better = match best {
                None => true,
                Some((best_cost, best_latest, _, _)) => {
                    cost < best_cost
                        || (cost == best_cost && slot.window.latest_start < best_latest)
                }
            };
            if better {
                best = Some((cost, slot.window.latest_start, pos, start));
            }
        }

        let Some((_, _, pos, start)) = best else {
            break;
        };

        let candidate = unvisited.remove(pos);
        let end = start + ctx.slots[candidate].duration;
        order.push(candidate);
        schedule.push((start, end));
        time = end;
        prev = candidate + 1;
    }

    let makespan = time;
    RouteState {
        order,
        schedule,
        unplaced: unvisited,
        makespan,
    }
}

// ============================================================================
// Local search
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Move {
    /// Exchange the stops at two positions.
    Swap(usize, usize),
    /// Remove the stop at `from` and re-insert it at `to`.
    Relocate { from: usize, to: usize },
}

fn enumerate_moves(len: usize) -> Vec<Move> {
    let mut moves = Vec::new();
    for i in 0..len {
        for j in i + 1..len {
            moves.push(Move::Swap(i, j));
        }
    }
    for from in 0..len {
        for to in 0..len {
            // to == from and to == from + 1 both leave the order unchanged
            if to == from || to == from + 1 {
                continue;
            }
            moves.push(Move::Relocate { from, to });
        }
    }
    moves
}

fn apply_move(order: &[usize], mv: Move) -> Vec<usize> {
    let mut next = order.to_vec();
    match mv {
        Move::Swap(i, j) => next.swap(i, j),
        Move::Relocate { from, to } => {
            let candidate = next.remove(from);
            let insert_at = if to > from { to - 1 } else { to };
            next.insert(insert_at, candidate);
        }
    }
    next
}

/// Cheapest feasible insertion of any unplaced candidate into the order.
fn best_insertion(
    ctx: &SearchContext<'_>,
    state: &RouteState,
) -> Option<(usize, usize, Vec<(i32, i32)>, i32)> {
    let mut best: Option<(usize, usize, Vec<(i32, i32)>, i32)> = None;

    for (unplaced_pos, &candidate) in state.unplaced.iter().enumerate() {
        for position in 0..=state.order.len() {
            let mut order = state.order.clone();
            order.insert(position, candidate);

            if let Some((schedule, makespan)) = ctx.compute_schedule(&order) {
                let better = best
                    .as_ref()
                    .is_none_or(|&(_, _, _, best_makespan)| makespan < best_makespan);
                if better {
                    best = Some((unplaced_pos, position, schedule, makespan));
                }
            }
        }
    }

    best
}

/// Improvement phase. Each round first tries to grow the route by inserting
/// an unplaced candidate (growth always wins), then evaluates all exchange
/// and relocation moves in parallel. The best improving move is applied; if
/// none improves, the least-worsening move may still be accepted with
/// probability `exp(-delta / temp)` under a decaying temperature. The best
/// route seen is retained and returned on budget expiry or after too many
/// non-improving rounds.
fn improve(ctx: &SearchContext<'_>, initial: RouteState, options: &SolveOptions) -> RouteState {
    let started = Instant::now();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut temp = INITIAL_TEMP;
    let mut stale = 0usize;

    let mut current = initial.clone();
    let mut best = initial;

    while started.elapsed() < options.time_budget && stale < options.max_stale_rounds {
        // Growth first: a longer feasible route beats any makespan.
        if let Some((unplaced_pos, position, schedule, makespan)) = best_insertion(ctx, &current) {
            let candidate = current.unplaced.remove(unplaced_pos);
            current.order.insert(position, candidate);
            current.schedule = schedule;
            current.makespan = makespan;
            stale = 0;
            if current.beats(&best) {
                best = current.clone();
            }
            continue;
        }

        let moves = enumerate_moves(current.order.len());
        if moves.is_empty() {
            break;
        }

        // Each move evaluation is a pure function of the current order, so
        // the round can fan out across threads. The (makespan, index) key
        // keeps the winner deterministic regardless of scheduling.
        let order = &current.order;
        let evaluated = moves
            .par_iter()
            .enumerate()
            .filter_map(|(index, &mv)| {
                let candidate_order = apply_move(order, mv);
                ctx.compute_schedule(&candidate_order)
                    .map(|(_, makespan)| (makespan, index))
            })
            .min();

        match evaluated {
            Some((makespan, index)) if makespan < current.makespan => {
                apply_to_state(ctx, &mut current, moves[index]);
                stale = 0;
                if current.beats(&best) {
                    best = current.clone();
                }
            }
            Some((makespan, index)) => {
                let delta = f64::from(makespan - current.makespan);
                if rng.r#gen::<f64>() < (-delta / temp).exp() {
                    apply_to_state(ctx, &mut current, moves[index]);
                }
                stale += 1;
            }
            None => {
                stale += 1;
            }
        }

        temp = (temp * TEMP_DECAY).max(1e-3);
    }

    best
}

fn apply_to_state(ctx: &SearchContext<'_>, state: &mut RouteState, mv: Move) {
    let order = apply_move(&state.order, mv);
    // Callers only pass moves whose schedule was just computed feasibly.
    if let Some((schedule, makespan)) = ctx.compute_schedule(&order) {
        state.order = order;
        state.schedule = schedule;
        state.makespan = makespan;
    }
}
