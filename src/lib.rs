// Library for the binary and tests

pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod prometheus;
pub mod registry;
pub mod routes;
pub mod version;
