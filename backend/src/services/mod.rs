pub mod dashboard;
pub mod judge;
pub mod progress;
pub mod streak;
