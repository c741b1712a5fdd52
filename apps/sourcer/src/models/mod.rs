pub mod candidate;
pub mod job;
pub mod match_result;
pub mod outreach;
