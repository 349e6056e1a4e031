pub mod rate_composer;
pub mod static_rate;
pub mod traits;

pub use rate_composer::RateComposer;
pub use static_rate::StaticRateAdapter;
pub use traits::*;
