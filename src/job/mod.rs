pub mod config;
pub mod lock;
pub mod runner;
pub mod schedule;
pub mod updater;
