pub mod config;
pub mod endpoints;
pub mod gate;
pub mod report;
pub mod types;
