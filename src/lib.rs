pub mod config;
pub mod data;
pub mod session;
pub mod ui;
pub mod utils;
