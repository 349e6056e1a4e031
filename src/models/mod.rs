pub mod chain;
pub mod movement;
pub mod token;

pub use chain::*;
pub use movement::*;
pub use token::*;
