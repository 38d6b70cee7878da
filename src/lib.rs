pub mod agent;
pub mod attention;
pub mod classifier;
pub mod config;
pub mod countermeasure;
pub mod error;
pub mod feed;
pub mod scheduler;
pub mod types;
pub mod warning;
