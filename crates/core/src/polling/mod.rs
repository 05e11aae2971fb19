pub mod states;
pub mod tracker;

pub use states::{PollDecision, PollPolicy, PollTransition, RunPhase};
pub use tracker::RunTracker;
