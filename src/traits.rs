//! Core seam between the planner and whatever estimates travel times.
//!
//! The solver is indifferent to the fidelity of the estimate; it only needs
//! an integer-minute matrix over the locations it is handed.

/// Provides a travel-time matrix for a set of locations.
///
/// The matrix is indexed by the provided location order and holds whole
/// minutes. The diagonal must be zero.
pub trait TravelTimeProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<i32>>;
}
