//! Signalized Intersection Simulation Library
//!
//! A discrete-time simulation of a four-way signalized intersection that runs
//! headless; rendering and reporting consume read-only snapshots.

pub mod simulation;
