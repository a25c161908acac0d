#![allow(missing_docs)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod logging;
pub mod prompt;

pub use config::Config;
