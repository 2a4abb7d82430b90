//! Agent: the turn loop and its counters.

pub mod agent;
pub mod stats;

pub use agent::Agent;
pub use stats::AgentStats;
