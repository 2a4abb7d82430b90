//! Core types for tycho.

pub mod message;
pub mod outcome;
pub mod usage;

pub use message::*;
pub use outcome::*;
pub use usage::*;
