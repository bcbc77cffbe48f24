//! Infrastructure layer module
//!
//! Process-wide concerns that sit outside the aggregation tree:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;
