pub mod angle;
pub mod bolt;
pub mod branch;
pub mod transform;
pub mod units;

pub use angle::*;
pub use bolt::*;
pub use branch::*;
pub use transform::*;
pub use units::*;
