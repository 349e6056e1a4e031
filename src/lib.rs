pub mod adapters;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod services;
pub mod utils;

pub use error::types::*;
