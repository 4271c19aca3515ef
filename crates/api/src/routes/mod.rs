//! API routes

pub mod achievements;
pub mod games;
pub mod health;
pub mod missions;
pub mod phases;
pub mod progress;
pub mod ranking;
pub mod tasks;
pub mod users;
