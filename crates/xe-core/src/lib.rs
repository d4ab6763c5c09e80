//! Core support crate for the Xenos shader translator
//!
//! This crate provides the error handling, configuration, and logging
//! infrastructure shared by the translator and its tools.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, ErrorPolicy, LogLevel, LoggingConfig, TranslatorConfig};
pub use error::{Result, XenosError};
