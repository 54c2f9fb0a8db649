mod angle;
mod geom;
mod oracle;
mod robot_id;
mod sensors;
mod settings;
mod team_color;
mod timer;

pub use angle::*;
pub use geom::*;
pub use oracle::*;
pub use robot_id::*;
pub use sensors::*;
pub use settings::*;
pub use team_color::*;
pub use timer::*;
