//! Lore Core - Core types and domain models for the Lore knowledge pipeline.

mod error;
mod extraction;
mod types;

pub use error::{Error, Result};
pub use extraction::*;
pub use types::*;
