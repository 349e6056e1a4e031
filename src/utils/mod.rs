pub mod fixed_point;
pub mod logging;

pub use fixed_point::*;
pub use logging::init_logging;
