//! Progression, review and achievement engines

pub mod achievements;
pub mod progression;
pub mod review;
pub mod sweeper;

#[cfg(test)]
mod achievements_test;
#[cfg(test)]
mod progression_test;
#[cfg(test)]
mod review_test;

pub use achievements::AchievementChecker;
pub use progression::ProgressionEngine;
pub use review::ReviewWorkflow;
pub use sweeper::{SweeperConfig, TempFileSweeper};
