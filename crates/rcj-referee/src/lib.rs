//! The referee side of a match: rules, operator commands and persistence.

mod command;
mod console;
mod persistence;
mod referee;
mod snapshot;
mod supervisor;
mod watch;

pub use command::*;
pub use console::*;
pub use persistence::*;
pub use referee::*;
pub use snapshot::*;
pub use supervisor::*;
pub use watch::*;
