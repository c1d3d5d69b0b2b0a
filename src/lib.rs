//! Intersection Simulation Library
//!
//! Adaptive signal control for a single four-way intersection with
//! emergency vehicle preemption.

pub mod simulation;
