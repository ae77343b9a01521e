pub mod board;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod logging;
pub mod ui;
