//! Wire formats and transports used between the referee, the robots and
//! external decision processes.

mod codec;
mod radio;
mod remote;

pub use codec::*;
pub use radio::*;
pub use remote::*;
