//! Records how long each desktop application stays focused and summarizes the time per day.
//! Data is kept in one json file per month inside the application directory.
//!

pub mod cli;
pub mod data;
pub mod focus_api;
pub mod tracker;
pub mod utils;
