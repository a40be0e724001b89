pub mod bid;
pub mod job;
pub mod outcome;
pub mod wire;
