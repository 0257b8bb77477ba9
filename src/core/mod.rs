//! Core module
//!
//! Configuration, error types, logging bootstrap, and shared validation.

pub mod config;
pub mod error;
pub mod logging;
pub mod validate;

pub use config::Config;
pub use error::{PhonebookError, Result};
pub use logging::Logger;
