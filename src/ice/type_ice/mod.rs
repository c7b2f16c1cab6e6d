pub mod candidate;
pub mod candidate_pair;
pub mod candidate_type;
pub mod ice_agent;
