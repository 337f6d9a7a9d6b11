//! modroll - automated item modifier rolling
//!
//! modroll repeats a scripted crafting action, reads the resulting item
//! description, and stops once the item's modifiers satisfy a set of targets.

pub mod catalog;
pub mod config;
pub mod error;
pub mod matching;
pub mod runner;

pub use error::{Result, RollError};
