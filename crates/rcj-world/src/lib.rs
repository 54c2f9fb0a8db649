//! A robot's local picture of the match: its teammates' poses, the ball and
//! the referee's kickoff flag.

mod ball;
mod model;

pub use ball::*;
pub use model::*;
