pub mod bridge;
pub mod mortgage;
pub mod refinance;
pub mod schedule;
