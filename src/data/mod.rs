//! Storage and aggregation of tracked activity.
//!  - [backend::JsonFileBackend] stores one json file per month plus a config file.
//!  - [repository::DataRepository] caches what was read, merges new intervals and computes
//!    [statistics::Statistics].

pub mod backend;
pub mod config;
pub mod entities;
pub mod error;
pub mod repository;
pub mod statistics;
