pub mod cleanup;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod error;
pub mod people;
pub mod storage;
pub mod throttle;
pub mod utils;

pub use config::Config;
pub use error::{CleanupError, Result};
