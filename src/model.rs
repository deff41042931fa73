//! Domain data model for itinerary planning.
//!
//! All times are integer minutes from midnight; dates are calendar dates.
//! Everything here is immutable once a request is underway: the allocator
//! works on its own copy of the candidate pool.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for an attraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttractionId(pub i64);

/// A point of interest, as supplied by the external ranking stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attraction {
    pub id: AttractionId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Aggregate rating in [0, 5].
    pub rating: f64,
    pub review_count: u32,
    /// Opening time, minutes from midnight.
    pub open_minute: i32,
    /// Closing time, minutes from midnight. Expected to exceed `open_minute`.
    pub close_minute: i32,
    /// Average visit duration in minutes.
    pub visit_duration: i32,
    /// Price level, 1 ($) to 4 ($$$$).
    pub price_level: u8,
    pub themes: Vec<String>,
    /// Review sentiment in [-1.0, 1.0].
    pub sentiment_score: f64,
    /// Composite score from the external recommender; opaque here, the pool
    /// arrives sorted descending by it.
    pub rank_score: f64,
}

impl Attraction {
    pub fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// User input for one planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Price-level ceiling, 1 to 4. Candidates above it are filtered out.
    pub budget: u8,
    /// Start of the daily travel window, minutes from midnight.
    pub daily_start_minute: i32,
    /// End of the daily travel window, minutes from midnight (exclusive).
    pub daily_end_minute: i32,
    /// Size of the per-day working set handed to the solver.
    #[serde(default = "default_candidates_per_day")]
    pub candidates_per_day: usize,
    /// Wall-clock budget for each daily solve, in milliseconds.
    #[serde(default = "default_solver_budget_ms")]
    pub solver_budget_ms: u64,
    /// Assumed travel speed for the haversine estimator, km/h.
    #[serde(default = "default_travel_speed_kmph")]
    pub travel_speed_kmph: f64,
}

fn default_candidates_per_day() -> usize {
    4
}

fn default_solver_budget_ms() -> u64 {
    5_000
}

fn default_travel_speed_kmph() -> f64 {
    20.0
}

impl PlanningRequest {
    /// Build a request with default daily window (09:00-21:00) and tuning
    /// parameters, validating the inputs.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: u8,
    ) -> Result<Self, InputError> {
        let request = Self {
            start_date,
            end_date,
            budget,
            daily_start_minute: 9 * 60,
            daily_end_minute: 21 * 60,
            candidates_per_day: default_candidates_per_day(),
            solver_budget_ms: default_solver_budget_ms(),
            travel_speed_kmph: default_travel_speed_kmph(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Parse a `YYYY-MM-DD` date as supplied at the request boundary.
    pub fn parse_date(text: &str) -> Result<NaiveDate, InputError> {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| InputError::UnparseableDate(text.to_string()))
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.start_date > self.end_date {
            return Err(InputError::InvertedDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.daily_start_minute >= self.daily_end_minute {
            return Err(InputError::EmptyDailyWindow {
                start: self.daily_start_minute,
                end: self.daily_end_minute,
            });
        }
        if self.candidates_per_day == 0 {
            return Err(InputError::NoCandidatesPerDay);
        }
        Ok(())
    }

    /// Calendar days covered by the request, in order, both ends inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |day| *day <= end)
    }
}

/// Malformed-request errors. These are the only errors that abort a whole
/// request; everything downstream degrades to per-day notes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("daily travel window [{start}, {end}) is empty")]
    EmptyDailyWindow { start: i32, end: i32 },
    #[error("unparseable date {0:?}, expected YYYY-MM-DD")]
    UnparseableDate(String),
    #[error("candidates per day must be positive")]
    NoCandidatesPerDay,
}

/// One scheduled visit within a day. Immutable once returned by the solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStop {
    pub point_id: AttractionId,
    pub point_name: String,
    pub start_minute: i32,
    /// `start_minute` plus the visit duration.
    pub end_minute: i32,
    /// Wall-clock rendering of `start_minute`, `HH:MM`.
    pub arrival_clock: String,
}

/// Render minutes from midnight as `HH:MM`.
pub fn format_clock(minute: i32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// The plan for a single calendar day: either an ordered visit sequence or a
/// note explaining why nothing was scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub outcome: DayOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayOutcome {
    Scheduled { stops: Vec<RouteStop> },
    Skipped { note: String },
}

impl DayPlan {
    pub fn scheduled(date: NaiveDate, stops: Vec<RouteStop>) -> Self {
        Self {
            date,
            outcome: DayOutcome::Scheduled { stops },
        }
    }

    pub fn skipped(date: NaiveDate, note: impl Into<String>) -> Self {
        Self {
            date,
            outcome: DayOutcome::Skipped { note: note.into() },
        }
    }

    /// Stops for this day, if any were scheduled.
    pub fn stops(&self) -> Option<&[RouteStop]> {
        match &self.outcome {
            DayOutcome::Scheduled { stops } => Some(stops),
            DayOutcome::Skipped { .. } => None,
        }
    }

    /// The skip note, if the day was not scheduled.
    pub fn note(&self) -> Option<&str> {
        match &self.outcome {
            DayOutcome::Scheduled { .. } => None,
            DayOutcome::Skipped { note } => Some(note),
        }
    }
}

/// The full multi-day plan, one entry per day of the request in date order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    #[serde(rename = "itinerary")]
    pub days: Vec<DayPlan>,
}
