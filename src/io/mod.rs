//! I/O layer.
//!
//! # Contents
//!
//! - [`visualization`]: marker projection and publishing
//! - [`replay`]: JSON-lines command scripts driving the solver

pub mod replay;
pub mod visualization;
