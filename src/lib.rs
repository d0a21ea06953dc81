pub mod actions;
pub mod activity;
pub mod collection;
pub mod config;
pub mod error;
pub mod milestones;
pub mod model;
pub mod report;
pub mod session;
pub mod stats;
