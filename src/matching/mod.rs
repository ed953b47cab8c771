//! Matching core: pure scoring functions and the greedy assignment engine.

pub mod engine;
pub mod scorer;
pub mod similarity;
pub mod tolerance;

pub use engine::{CandidatePool, MatchDecision, MatchOutcome, MatchingEngine};
pub use scorer::{score_pair, MATCH_THRESHOLD};
pub use similarity::similarity;
