pub mod price_fallback;
pub mod underlying_resolver;
pub mod valuation;

pub use price_fallback::PriceFallback;
pub use underlying_resolver::UnderlyingResolver;
pub use valuation::{summarize, value_usd, TreeValuation, Valuation};
