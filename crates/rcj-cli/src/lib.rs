//! Runs complete simulated matches: the referee, six robot controllers and
//! the kinematic simulation share one tick loop.

pub mod cli;
pub mod logging;
mod runner;

pub use runner::MatchRunner;
