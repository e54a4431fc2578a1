//! Solver facade exposed to the host application.
//!
//! - [`RelativeSolver`]: add keyframes and constraints, query corrections,
//!   neighborhoods and markers

mod relative_solver;

pub use relative_solver::RelativeSolver;
