//! itinerary-planner core
//!
//! Multi-day point-of-interest itinerary planning: a daily time-windowed
//! route solver plus the allocator that drives it over a shrinking ranked
//! candidate pool.

pub mod allocator;
pub mod haversine;
pub mod model;
pub mod solver;
pub mod traits;
pub mod windows;
